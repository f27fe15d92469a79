use chrono::Utc;
use coursetrack::renderer_client::RendererClient;
use migration::{Migrator, MigratorTrait};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection};
use uuid::Uuid;

pub async fn setup_db() -> DatabaseConnection {
    // Single connection: pooled in-memory sqlite would otherwise hand every
    // connection its own empty database.
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1);
    let db = Database::connect(opt)
        .await
        .expect("connect in-memory sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

pub async fn seed_user(db: &DatabaseConnection, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    entities::users::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        email: Set(format!("{}@example.com", id)),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert user");
    id
}

pub async fn seed_course(db: &DatabaseConnection, title: &str, duration_minutes: i32) -> Uuid {
    let id = Uuid::new_v4();
    entities::courses::ActiveModel {
        id: Set(id),
        title: Set(title.to_string()),
        duration_minutes: Set(duration_minutes),
        thumbnail: Set(Some(format!("https://cdn.example.com/{}.jpg", id))),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert course");
    id
}

pub async fn seed_payment(db: &DatabaseConnection, user_id: Uuid, course_id: Uuid, status: &str) {
    entities::payments::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        course_id: Set(course_id),
        status: Set(status.to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert payment");
}

/// Entitled (user, course) pair in one call.
pub async fn seed_entitled_pair(db: &DatabaseConnection) -> (Uuid, Uuid) {
    let user_id = seed_user(db, "Ada Lovelace").await;
    let course_id = seed_course(db, "Systems Programming", 540).await;
    seed_payment(db, user_id, course_id, entities::payments::STATUS_COMPLETED).await;
    (user_id, course_id)
}

/// Client pointing nowhere; fine for every path that never calls the renderer.
pub fn renderer_stub() -> RendererClient {
    RendererClient::new("http://localhost:9").expect("build renderer client")
}
