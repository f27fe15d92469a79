use std::{path::Path, sync::Arc};

use anyhow::Context;
use coursetrack::api::CourseTrackApi;
use coursetrack::auth::JwtAuthority;
use coursetrack::config::Config;
use coursetrack::renderer_client::RendererClient;
use migration::MigratorTrait;
use poem::{
    EndpointExt, Route, Server,
    listener::TcpListener,
    middleware::{Cors, Tracing as PoemTracing},
};
use poem_openapi::OpenApiService;
use sea_orm::Database;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt::SubscriberBuilder, prelude::*};

type CourseTrackResult<T> = anyhow::Result<T>;

#[tokio::main]
async fn main() -> CourseTrackResult<()> {
    // Initialize tracing (logs). Respect RUST_LOG if set, default to info for our crate and warn for deps.
    let default_filter = format!(
        "{}=info,poem=info,reqwest=warn,h2=warn",
        env!("CARGO_PKG_NAME")
    );
    let env_filter = std::env::var("RUST_LOG").unwrap_or(default_filter);
    SubscriberBuilder::default()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .with_level(true)
        .pretty()
        .finish()
        .with(ErrorLayer::default())
        .init();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting CourseTrack");

    // Load environment variables from .env files
    if Path::new(".env.local").exists() {
        dotenvy::from_filename(".env.local")?;
    } else if Path::new(".env").exists() {
        dotenvy::from_filename(".env")?;
    };
    let config = Config::load();
    match config.validate() {
        Ok(_) => {}
        Err(e) => {
            return Err(anyhow::anyhow!(e));
        }
    }

    let db_conn = Database::connect(&config.db_connection_string)
        .await
        .with_context(|| "Failed to connect to database")?;

    migration::Migrator::up(&db_conn, None)
        .await
        .with_context(|| "Failed to run database migrations")?;

    let mut renderer = RendererClient::new(&config.renderer_base_url)?;
    if !config.renderer_api_key.is_empty() {
        renderer = renderer.with_api_key(&config.renderer_api_key);
    }
    let has_api_key = !config.renderer_api_key.is_empty();
    tracing::info!(renderer_base = %config.renderer_base_url, has_api_key, "configured renderer client");

    run_poem(Arc::new(renderer), Arc::new(config), Arc::new(db_conn)).await?;
    Ok(())
}

pub async fn run_poem(
    renderer: Arc<RendererClient>,
    config: Arc<Config>,
    db: Arc<sea_orm::DatabaseConnection>,
) -> CourseTrackResult<()> {
    let version = env!("CARGO_PKG_VERSION");
    let api = CourseTrackApi { db, renderer };
    let api_service =
        OpenApiService::new(api, "CourseTrack API", version).server("http://localhost:3000");
    let ui = api_service.rapidoc();
    let spec = api_service.spec();
    let route = Route::new()
        .nest("/", api_service)
        .nest("/ui", ui)
        .nest("/spec", poem::endpoint::make_sync(move |_| spec.clone()))
        .with(Cors::new())
        .with(PoemTracing)
        .data(JwtAuthority::new(&config.jwt_secret));

    tracing::info!(bind_addr = %config.bind_addr, "starting HTTP server");
    Server::new(TcpListener::bind(config.bind_addr.clone()))
        .run(route)
        .await?;
    Ok(())
}
