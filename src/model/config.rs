use clap::{Parser, command};
use serde::{Deserialize, Serialize};

/**
 * Command-line arguments for the application.
 */
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct ApplicationArguments {
    /**
     * Path to the configuration file.
     */
    #[arg(short, long)]
    pub config_file: String,
}

/**
 * Represents the configuration for the application.
 */
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /**
     * Logging configuration for the application.
     */
    pub logging: LoggingConfig,
    /**
     * Server configuration for the application.
     */
    pub server: Server,
    /**
     * Database configuration for the application.
     */
    pub database: Database,
    /**
     * Geocoding lookup configuration for city validation.
     */
    pub geocoding: GeocodingConfig,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /**
     * Whether to log the target of the log message.
     */
    pub target: bool,
    /**
     * Whether to log thread IDs .
     */
    pub thread_ids: bool,
    /**
     * Whether to log thread names.
     */
    pub thread_names: bool,
    /**
     * Whether to log line numbers.
     */
    pub line_number: bool,
    /**
     * Whether to use ANSI colors in logs.
     */
    pub ansi: bool,
    /**
     * Additional directives for logging configuration.
     */
    pub directives: Vec<String>,
}

impl LoggingConfig {
    #[allow(dead_code)]
    pub fn default() -> Self {
        LoggingConfig { target: true, thread_ids: true, thread_names: true, line_number: true, ansi: true, directives: vec![] }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    /**
     * Type of the database (e.g., `PostgreSQL`).
     */
    pub db_type: DatabaseType,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DatabaseType {
    /**
     * `PostgreSQL` database type.
     */
    #[serde(rename_all = "camelCase")]
    Postgresql { connection_string: String, max_connections: u32, min_connections: u32, acquire_timeout: u64, acquire_slow_threshold: u64, idle_timeout: u64, max_lifetime: u64 },
}

/**
 * Represents the external geocoding service used to verify that a city
 * name denotes a real location.
 */
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodingConfig {
    /**
     * Base URL of the geocoding endpoint.
     */
    pub url: String,
    /**
     * API key sent with every lookup.
     */
    pub api_key: String,
    /**
     * Request timeout in milliseconds.
     */
    pub timeout: u64,
}

/**
 * Represents the server configuration for the application.
 */
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    /**
     * Number of worker threads for the server.
     */
    pub workers: usize,
    /**
     * HTTP port for the server.
     */
    pub http_port: u16,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = Config {
            logging: LoggingConfig::default(),
            server: Server { workers: 4, http_port: 8080 },
            database: Database {
                db_type: DatabaseType::Postgresql {
                    connection_string: "postgres://localhost/picnic".to_string(),
                    max_connections: 5,
                    min_connections: 1,
                    acquire_timeout: 30,
                    acquire_slow_threshold: 60,
                    idle_timeout: 300,
                    max_lifetime: 3600,
                },
            },
            geocoding: GeocodingConfig { url: "https://graphhopper.com/api/1/geocode".to_string(), api_key: "secret".to_string(), timeout: 2000 },
        };
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config.logging.target, deserialized.logging.target);
        assert_eq!(config.logging.thread_ids, deserialized.logging.thread_ids);
        assert_eq!(config.logging.thread_names, deserialized.logging.thread_names);
        assert_eq!(config.logging.line_number, deserialized.logging.line_number);
        assert_eq!(config.logging.ansi, deserialized.logging.ansi);
        assert_eq!(config.logging.directives, deserialized.logging.directives);
        assert_eq!(config.server.workers, deserialized.server.workers);
        assert_eq!(config.server.http_port, deserialized.server.http_port);
        assert_eq!(deserialized.geocoding.url, "https://graphhopper.com/api/1/geocode");
        assert_eq!(deserialized.geocoding.api_key, "secret");
        assert_eq!(deserialized.geocoding.timeout, 2000);
        let DatabaseType::Postgresql { connection_string, max_connections, .. } = deserialized.database.db_type;
        assert_eq!(connection_string, "postgres://localhost/picnic");
        assert_eq!(max_connections, 5);
    }

    #[test]
    fn test_config_parse_from_toml() {
        let config_str = r#"
            [logging]
            target = true
            thread_ids = false
            thread_names = false
            line_number = true
            ansi = false
            directives = ["picnic_api=debug"]

            [server]
            workers = 2
            httpPort = 8080

            [database.dbType.postgresql]
            connectionString = "postgres://localhost/picnic"
            maxConnections = 10
            minConnections = 2
            acquireTimeout = 500
            acquireSlowThreshold = 1000
            idleTimeout = 60000
            maxLifetime = 3600000

            [geocoding]
            url = "https://graphhopper.com/api/1/geocode"
            apiKey = "secret"
            timeout = 2000
        "#;
        let config: Config = toml::from_str(config_str).unwrap();
        assert_eq!(config.server.workers, 2);
        assert_eq!(config.logging.directives, vec!["picnic_api=debug".to_string()]);
        assert!(!config.logging.ansi);
    }
}
