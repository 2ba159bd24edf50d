use chrono::{FixedOffset, Offset, Utc};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::error::{AppError, Result};

/// Message shown when the Supabase connection values are missing
pub const MISSING_SUPABASE_MESSAGE: &str =
    "Supabase connection is not configured: set SUPABASE_URL and SUPABASE_ANON_KEY \
     (for example in a .env file) before starting the portal.";

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub supabase: SupabaseConfig,
    pub session: SessionConfig,
    pub upload: UploadConfig,
    pub display: DisplayConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
}

/// Connection settings for the Supabase project backing the portal
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project endpoint, e.g. `https://xyzcompany.supabase.co`
    pub url: String,
    /// Anonymous (public) API key
    pub anon_key: String,
    /// Table holding file metadata rows
    pub files_table: String,
    /// Storage bucket holding the uploaded objects
    pub files_bucket: String,
    /// Per-request timeout; `None` leaves requests unbounded
    pub request_timeout: Option<Duration>,
    /// Where the current session is persisted between restarts (optional)
    pub session_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub auto_refresh: bool,
    /// Refresh the session this long before it expires
    pub refresh_margin: Duration,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_file_size: usize,
    /// Delete the stored object when the metadata insert fails
    pub compensate_orphans: bool,
}

#[derive(Debug, Clone)]
pub struct DisplayConfig {
    /// Fixed offset used to render creation dates
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            supabase: SupabaseConfig::from_env()?,
            session: SessionConfig::from_env()?,
            upload: UploadConfig::from_env()?,
            display: DisplayConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 60 * 1024 * 1024; // 60MB

    pub fn from_env() -> Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| AppError::Configuration(format!("Invalid PORT: {}", e)))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_request_body_size = env::var("MAX_REQUEST_BODY_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_REQUEST_BODY_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| {
                AppError::Configuration("MAX_REQUEST_BODY_SIZE must be a valid number".to_string())
            })?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_request_body_size,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl SupabaseConfig {
    const DEFAULT_FILES_TABLE: &'static str = "files";
    const DEFAULT_FILES_BUCKET: &'static str = "files";

    pub fn from_env() -> Result<Self> {
        let mut config = Self::from_values(
            env::var("SUPABASE_URL").ok(),
            env::var("SUPABASE_ANON_KEY").ok(),
        )?;

        if let Ok(table) = env::var("SUPABASE_FILES_TABLE") {
            config.files_table = table;
        }
        if let Ok(bucket) = env::var("SUPABASE_FILES_BUCKET") {
            config.files_bucket = bucket;
        }

        config.request_timeout = match env::var("SUPABASE_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => Some(Duration::from_secs(raw.parse::<u64>().map_err(|_| {
                AppError::Configuration(
                    "SUPABASE_REQUEST_TIMEOUT_SECS must be a valid number".to_string(),
                )
            })?)),
            Err(_) => None,
        };

        config.session_file = env::var("SUPABASE_SESSION_FILE")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Ok(config)
    }

    /// Build from the two required values; either one missing or blank is fatal
    pub fn from_values(url: Option<String>, anon_key: Option<String>) -> Result<Self> {
        let url = url
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty());
        let anon_key = anon_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let (Some(url), Some(anon_key)) = (url, anon_key) else {
            return Err(AppError::Configuration(
                MISSING_SUPABASE_MESSAGE.to_string(),
            ));
        };

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(AppError::Configuration(format!(
                "SUPABASE_URL must be an http(s) URL, got '{}'",
                url
            )));
        }

        Ok(Self {
            url,
            anon_key,
            files_table: Self::DEFAULT_FILES_TABLE.to_string(),
            files_bucket: Self::DEFAULT_FILES_BUCKET.to_string(),
            request_timeout: None,
            session_file: None,
        })
    }
}

impl SessionConfig {
    const DEFAULT_REFRESH_MARGIN_SECS: u64 = 60;

    pub fn from_env() -> Result<Self> {
        let auto_refresh = env::var("SESSION_AUTO_REFRESH")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let refresh_margin_secs = env::var("SESSION_REFRESH_MARGIN_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_REFRESH_MARGIN_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| {
                AppError::Configuration(
                    "SESSION_REFRESH_MARGIN_SECS must be a valid number".to_string(),
                )
            })?;

        Ok(Self {
            auto_refresh,
            refresh_margin: Duration::from_secs(refresh_margin_secs),
        })
    }
}

impl UploadConfig {
    const DEFAULT_MAX_FILE_SIZE: usize = 50 * 1024 * 1024; // 50MB

    pub fn from_env() -> Result<Self> {
        let max_file_size = env::var("UPLOAD_MAX_FILE_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_FILE_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| {
                AppError::Configuration("UPLOAD_MAX_FILE_SIZE must be a valid number".to_string())
            })?;

        let compensate_orphans = env::var("UPLOAD_COMPENSATE_ORPHANS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(Self {
            max_file_size,
            compensate_orphans,
        })
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            compensate_orphans: false,
        }
    }
}

impl DisplayConfig {
    // America/Sao_Paulo, no DST since 2019
    const DEFAULT_UTC_OFFSET_MINUTES: i32 = -180;

    pub fn from_env() -> Result<Self> {
        let utc_offset_minutes = env::var("DISPLAY_UTC_OFFSET_MINUTES")
            .unwrap_or_else(|_| Self::DEFAULT_UTC_OFFSET_MINUTES.to_string())
            .parse::<i32>()
            .map_err(|_| {
                AppError::Configuration(
                    "DISPLAY_UTC_OFFSET_MINUTES must be a valid number".to_string(),
                )
            })?;

        if utc_offset_minutes.abs() >= 24 * 60 {
            return Err(AppError::Configuration(
                "DISPLAY_UTC_OFFSET_MINUTES must be within +/- 1439".to_string(),
            ));
        }

        Ok(Self { utc_offset_minutes })
    }

    /// Offset creation dates are rendered in; out-of-range values fall back to UTC
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title =
            env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Classfiles Portal API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "Role-gated file sharing for teachers and coordinators".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}
