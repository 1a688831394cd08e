// config.rs
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_maxage: i64,
    pub port: u16,
    pub log_level: LevelFilter,
    pub cors_origins: Vec<String>,
    pub static_dir: Option<String>,
    // WhatsApp bridge
    pub bridge_url: Option<String>,
    pub bridge_session: String,
    pub bridge_token: Option<String>,
    pub bridge_timeout_secs: u64,
    pub bridge_webhook_secret: Option<String>,
}

fn optional_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parsed_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    optional_var(key)
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn init() -> Config {
        let jwt_secret = std::env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");

        let cors_origins = optional_var("CORS_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Config {
            database_url: optional_var("DATABASE_URL"),
            database_max_connections: parsed_var("DATABASE_MAX_CONNECTIONS", 10),
            jwt_secret,
            jwt_maxage: parsed_var("JWT_MAXAGE", 1440),
            port: parsed_var("PORT", 3000),
            log_level: parsed_var("LOG_LEVEL", LevelFilter::DEBUG),
            cors_origins,
            static_dir: optional_var("STATIC_DIR"),
            bridge_url: optional_var("BRIDGE_URL"),
            bridge_session: optional_var("BRIDGE_SESSION")
                .unwrap_or_else(|| "wpp-multi-atendimento".to_string()),
            bridge_token: optional_var("BRIDGE_TOKEN"),
            bridge_timeout_secs: parsed_var("BRIDGE_TIMEOUT_SECS", 15),
            bridge_webhook_secret: optional_var("BRIDGE_WEBHOOK_SECRET"),
        }
    }

    #[cfg(test)]
    pub fn for_tests() -> Config {
        Config {
            database_url: None,
            database_max_connections: 1,
            jwt_secret: "test-secret".to_string(),
            jwt_maxage: 60,
            port: 0,
            log_level: LevelFilter::OFF,
            cors_origins: Vec::new(),
            static_dir: None,
            bridge_url: None,
            bridge_session: "test".to_string(),
            bridge_token: None,
            bridge_timeout_secs: 1,
            bridge_webhook_secret: None,
        }
    }
}
