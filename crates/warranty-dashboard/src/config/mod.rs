use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    /// Set when running on the Render platform (`RENDER=true`).
    pub hosted: bool,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub data: DataConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let hosted = env::var("RENDER")
            .map(|value| value.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let default_environment = if hosted { "production" } else { "development" };
        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| default_environment.to_string()),
        );

        let default_host = if hosted { "0.0.0.0" } else { "127.0.0.1" };
        let host = env::var("APP_HOST").unwrap_or_else(|_| default_host.to_string());
        let port = env::var("APP_PORT")
            .or_else(|_| env::var("PORT"))
            .unwrap_or_else(|_| "8000".to_string())
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let data_dir =
            PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "/mnt/data".to_string()));
        let fiscal_months = match env::var("APP_FISCAL_MONTHS") {
            Ok(raw) => parse_fiscal_months(&raw)?,
            Err(_) => DataConfig::default_fiscal_months(),
        };
        let working_dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

        Ok(Self {
            environment,
            hosted,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            data: DataConfig {
                search_dirs: DataConfig::search_dirs_for(&data_dir, &working_dir),
                data_dir,
                fiscal_months,
            },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where the source workbooks live and which fiscal months the pivots cover.
#[derive(Debug, Clone)]
pub struct DataConfig {
    pub data_dir: PathBuf,
    /// Directories searched in order for each workbook.
    pub search_dirs: Vec<PathBuf>,
    pub fiscal_months: Vec<String>,
}

impl DataConfig {
    pub fn default_fiscal_months() -> Vec<String> {
        ["Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"]
            .iter()
            .map(|month| month.to_string())
            .collect()
    }

    /// Candidate directories: the data disk, the working directory and its
    /// data folders, then the Render project checkout.
    pub fn search_dirs_for(data_dir: &Path, working_dir: &Path) -> Vec<PathBuf> {
        let render_root = PathBuf::from("/opt/render/project/src");
        vec![
            data_dir.to_path_buf(),
            working_dir.to_path_buf(),
            working_dir.join("Data"),
            working_dir.join("data"),
            render_root.clone(),
            render_root.join("Data"),
            render_root.join("data"),
        ]
    }

    /// Configuration rooted at a single directory, used by tests and the CLI.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            search_dirs: vec![dir.clone()],
            data_dir: dir,
            fiscal_months: Self::default_fiscal_months(),
        }
    }
}

fn parse_fiscal_months(raw: &str) -> Result<Vec<String>, ConfigError> {
    let months: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|month| !month.is_empty())
        .map(str::to_string)
        .collect();

    if months.is_empty() || months.iter().any(|month| month.chars().count() != 3) {
        return Err(ConfigError::InvalidFiscalMonths {
            value: raw.to_string(),
        });
    }

    Ok(months)
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidFiscalMonths { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT/PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidFiscalMonths { value } => write!(
                f,
                "APP_FISCAL_MONTHS must be a comma separated list of 3-letter month keys, got '{}'",
                value
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidFiscalMonths { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "PORT",
            "APP_LOG_LEVEL",
            "RENDER",
            "DATA_DIR",
            "APP_FISCAL_MONTHS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert!(!config.hosted);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.data.data_dir, PathBuf::from("/mnt/data"));
        assert_eq!(config.data.search_dirs[0], PathBuf::from("/mnt/data"));
        assert_eq!(config.data.fiscal_months.len(), 9);
        assert_eq!(config.data.fiscal_months.first().map(String::as_str), Some("Apr"));
        assert_eq!(config.data.fiscal_months.last().map(String::as_str), Some("Dec"));
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 8000));
    }

    #[test]
    fn render_deployment_binds_all_interfaces_and_reads_port() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("RENDER", "TRUE");
        env::set_var("PORT", "10000");
        let config = AppConfig::load().expect("config loads");
        assert!(config.hosted);
        assert_eq!(config.environment, AppEnvironment::Production);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 10000);
        reset_env();
    }

    #[test]
    fn fiscal_months_can_be_shortened() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_FISCAL_MONTHS", "Apr, May ,Jun,Jul,Aug,Sep");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(
            config.data.fiscal_months,
            vec!["Apr", "May", "Jun", "Jul", "Aug", "Sep"]
        );

        env::set_var("APP_FISCAL_MONTHS", "April");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidFiscalMonths { .. })
        ));
        reset_env();
    }
}
