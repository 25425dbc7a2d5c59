use once_cell::sync::Lazy;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub uploads: UploadConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub login_max_attempts: u32,
    pub login_window_secs: u64,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub directory: String,
    pub public_prefix: String,
    pub max_file_size_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::defaults().with_env_overrides()
    }

    fn defaults() -> Self {
        Self {
            server: ServerConfig { port: 8000 },
            database: DatabaseConfig {
                max_connections: 10,
                connect_timeout_secs: 30,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 8,
                login_max_attempts: 10,
                login_window_secs: 15 * 60,
            },
            uploads: UploadConfig {
                directory: "public/uploads".to_string(),
                public_prefix: "/public/uploads".to_string(),
                max_file_size_bytes: 5 * 1024 * 1024, // 5 MiB
            },
        }
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECT_TIMEOUT_SECS") {
            self.database.connect_timeout_secs =
                v.parse().unwrap_or(self.database.connect_timeout_secs);
        }

        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("LOGIN_MAX_ATTEMPTS") {
            self.security.login_max_attempts =
                v.parse().unwrap_or(self.security.login_max_attempts);
        }
        if let Ok(v) = env::var("LOGIN_WINDOW_SECS") {
            self.security.login_window_secs =
                v.parse().unwrap_or(self.security.login_window_secs);
        }

        if let Ok(v) = env::var("UPLOAD_DIR") {
            self.uploads.directory = v;
        }
        if let Ok(v) = env::var("UPLOAD_MAX_FILE_SIZE_BYTES") {
            self.uploads.max_file_size_bytes =
                v.parse().unwrap_or(self.uploads.max_file_size_bytes);
        }

        self
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_configuration() {
        let config = AppConfig::defaults();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.security.jwt_expiry_hours, 8);
        assert_eq!(config.security.login_max_attempts, 10);
        assert_eq!(config.security.login_window_secs, 900);
        assert_eq!(config.uploads.max_file_size_bytes, 5 * 1024 * 1024);
    }
}
