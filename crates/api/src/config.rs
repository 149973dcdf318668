use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host to bind to.
    pub host: String,
    /// Server port to bind to.
    pub port: u16,
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Directory for startup database backups.
    pub backup_dir: PathBuf,
    /// Maximum database connections in the pool.
    pub db_max_connections: u32,
    /// Ring buffer capacity.
    pub buffer_capacity: usize,
    /// Event bus per-channel capacity.
    pub event_bus_capacity: usize,
    /// Ingestion queue capacity.
    pub ingest_capacity: usize,
    /// Gateway heartbeat interval in seconds.
    pub heartbeat_secs: u64,
    /// Platform app client id for profile lookups, when configured.
    pub client_id: Option<String>,
    /// Access token for profile lookups, when configured.
    pub access_token: Option<String>,
    /// Log level (e.g., "info", "debug", "trace").
    pub log_level: String,
}

impl AppConfig {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "9847".to_string())
                .parse()
                .expect("PORT must be a valid u16"),
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "integron.db".to_string())
                .into(),
            backup_dir: env::var("BACKUP_DIR")
                .unwrap_or_else(|_| "backups".to_string())
                .into(),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .expect("DB_MAX_CONNECTIONS must be a valid u32"),
            buffer_capacity: env::var("BUFFER_CAPACITY")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .expect("BUFFER_CAPACITY must be a valid usize"),
            event_bus_capacity: env::var("EVENT_BUS_CAPACITY")
                .unwrap_or_else(|_| "1024".to_string())
                .parse()
                .expect("EVENT_BUS_CAPACITY must be a valid usize"),
            ingest_capacity: env::var("INGEST_CAPACITY")
                .unwrap_or_else(|_| "256".to_string())
                .parse()
                .expect("INGEST_CAPACITY must be a valid usize"),
            heartbeat_secs: env::var("HEARTBEAT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .expect("HEARTBEAT_SECS must be a valid u64"),
            client_id: env::var("CLIENT_ID").ok(),
            access_token: env::var("ACCESS_TOKEN").ok(),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// Build the socket address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs.max(1))
    }
}
