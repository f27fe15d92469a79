#[derive(Debug)]
pub struct Config {
    pub jwt_secret: String,
    pub renderer_base_url: String,
    pub renderer_api_key: String,
    pub db_connection_string: String,
    pub bind_addr: String,
}

const DEFAULT_DB_CONNECTION_STRING: &str = "sqlite://db.sqlite?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

impl Config {
    pub fn load() -> Self {
        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_default();
        let renderer_base_url = std::env::var("RENDERER_BASE_URL").unwrap_or_default();
        let renderer_api_key = std::env::var("RENDERER_API_KEY").unwrap_or_default();
        let db_connection_string =
            std::env::var("DB_CONNECTION_STRING").unwrap_or(DEFAULT_DB_CONNECTION_STRING.into());
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or(DEFAULT_BIND_ADDR.into());
        Config {
            jwt_secret,
            renderer_base_url,
            renderer_api_key,
            db_connection_string,
            bind_addr,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.jwt_secret.is_empty() {
            return Err("JWT_SECRET is missing".into());
        }
        if self.renderer_base_url.is_empty() {
            return Err("RENDERER_BASE_URL is missing".into());
        }
        Ok(())
    }
}
