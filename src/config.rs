use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::prober::http::DEFAULT_USER_AGENT;
use crate::util::parse_duration;

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub port: u16,
    pub max_workers: usize,
    pub default_timeout_ms: u64,
    /// Deadline applied to each API batch as a whole
    pub batch_deadline_ms: u64,
    pub max_urls_per_request: usize,
    pub log_level: String,
    pub log_format: LogFormat,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: 8080,
            max_workers: 100,
            default_timeout_ms: 10_000,
            batch_deadline_ms: 60_000,
            max_urls_per_request: 1000,
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Command line flags. Each one can also come from its environment variable;
/// a flag given on the command line wins over the variable.
#[derive(Debug, Default, Parser)]
#[command(name = "url-status-probe", version, about = "Concurrent URL availability checker")]
pub struct Cli {
    /// Optional JSON settings file, applied before env and flags
    #[arg(long, env = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// HTTP server port
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Maximum concurrent workers per batch
    #[arg(long = "workers", env = "MAX_WORKERS")]
    pub max_workers: Option<usize>,

    /// Default per-request timeout, e.g. 10s or 500ms
    #[arg(long, env = "DEFAULT_TIMEOUT", value_parser = duration_arg)]
    pub timeout: Option<Duration>,

    /// Deadline for a whole batch
    #[arg(long, env = "BATCH_DEADLINE", value_parser = duration_arg)]
    pub batch_deadline: Option<Duration>,

    /// Maximum URLs accepted in one check request
    #[arg(long, env = "MAX_URLS")]
    pub max_urls: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    #[arg(long, env = "LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,

    /// User-Agent header sent with every probe
    #[arg(long, env = "USER_AGENT")]
    pub user_agent: Option<String>,
}

fn duration_arg(s: &str) -> Result<Duration, String> {
    parse_duration(s).map_err(|e| e.to_string())
}

fn saturating_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl Settings {
    /// Defaults, then the optional file, then env/flags.
    pub async fn load(cli: &Cli) -> Result<Self> {
        let base = match &cli.config {
            Some(path) => Self::load_file_config(path).await?,
            None => Settings::default(),
        };
        let settings = base.apply_overrides(cli);
        settings.validate()?;
        Ok(settings)
    }

    async fn load_file_config(path: &Path) -> Result<Settings> {
        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }

        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(settings)
    }

    pub fn apply_overrides(mut self, cli: &Cli) -> Self {
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(workers) = cli.max_workers {
            self.max_workers = workers;
        }
        if let Some(timeout) = cli.timeout {
            self.default_timeout_ms = saturating_millis(timeout);
        }
        if let Some(deadline) = cli.batch_deadline {
            self.batch_deadline_ms = saturating_millis(deadline);
        }
        if let Some(max_urls) = cli.max_urls {
            self.max_urls_per_request = max_urls;
        }
        if let Some(level) = &cli.log_level {
            self.log_level = level.clone();
        }
        if let Some(format) = cli.log_format {
            self.log_format = format;
        }
        if let Some(agent) = &cli.user_agent {
            self.user_agent = agent.clone();
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(anyhow::anyhow!("max_workers must be at least 1"));
        }
        if self.default_timeout_ms == 0 {
            return Err(anyhow::anyhow!("default timeout must be greater than zero"));
        }
        if self.batch_deadline_ms == 0 {
            return Err(anyhow::anyhow!("batch deadline must be greater than zero"));
        }
        if self.max_urls_per_request == 0 {
            return Err(anyhow::anyhow!("max_urls_per_request must be at least 1"));
        }
        self.validate_log_level()
    }

    /// Get the log level as a tracing::Level
    pub fn get_tracing_level(&self) -> Result<tracing::Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(tracing::Level::TRACE),
            "debug" => Ok(tracing::Level::DEBUG),
            "info" => Ok(tracing::Level::INFO),
            "warn" | "warning" => Ok(tracing::Level::WARN),
            "error" => Ok(tracing::Level::ERROR),
            _ => Err(anyhow::anyhow!(
                "Invalid log level: {}. Valid levels are: trace, debug, info, warn, error",
                self.log_level
            )),
        }
    }

    pub fn validate_log_level(&self) -> Result<()> {
        self.get_tracing_level().map(|_| ())
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    pub fn batch_deadline(&self) -> Duration {
        Duration::from_millis(self.batch_deadline_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let s = Settings::default();
        assert_eq!(s.port, 8080);
        assert_eq!(s.max_workers, 100);
        assert_eq!(s.default_timeout(), Duration::from_secs(10));
        assert_eq!(s.batch_deadline(), Duration::from_secs(60));
        assert_eq!(s.max_urls_per_request, 1000);
        assert_eq!(s.log_format, LogFormat::Json);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "url-status-probe",
            "--port",
            "9090",
            "--workers",
            "5",
            "--timeout",
            "1500ms",
            "--log-level",
            "debug",
            "--log-format",
            "pretty",
        ])
        .unwrap();

        let s = Settings::default().apply_overrides(&cli);

        assert_eq!(s.port, 9090);
        assert_eq!(s.max_workers, 5);
        assert_eq!(s.default_timeout_ms, 1500);
        assert_eq!(s.log_level, "debug");
        assert_eq!(s.log_format, LogFormat::Pretty);
        // untouched
        assert_eq!(s.batch_deadline_ms, 60_000);
    }

    #[test]
    fn bad_duration_flag_is_rejected() {
        assert!(Cli::try_parse_from(["url-status-probe", "--timeout", "soon"]).is_err());
    }

    #[test]
    fn overflowing_duration_flag_is_a_parse_error() {
        let err = Cli::try_parse_from(["url-status-probe", "--timeout", "999999999999999999h"])
            .unwrap_err();
        assert!(err.to_string().contains("out of range"), "{err}");

        let err = Cli::try_parse_from([
            "url-status-probe",
            "--batch-deadline",
            "18446744073709551615s1s",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("out of range"), "{err}");
    }

    #[test]
    fn huge_durations_saturate_in_millis() {
        let cli = Cli {
            timeout: Some(Duration::from_secs(u64::MAX)),
            ..Cli::default()
        };
        let s = Settings::default().apply_overrides(&cli);
        assert_eq!(s.default_timeout_ms, u64::MAX);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let s: Settings =
            serde_json::from_str(r#"{"port": 3000, "log_format": "pretty"}"#).unwrap();
        assert_eq!(s.port, 3000);
        assert_eq!(s.log_format, LogFormat::Pretty);
        assert_eq!(s.max_workers, 100);
    }

    #[test]
    fn validation_rejects_zero_workers_and_bad_levels() {
        let s = Settings {
            max_workers: 0,
            ..Settings::default()
        };
        assert!(s.validate().is_err());

        let s = Settings {
            log_level: "loud".into(),
            ..Settings::default()
        };
        assert!(s.validate().is_err());
        let s = Settings {
            log_level: "WARNING".into(),
            ..Settings::default()
        };
        assert_eq!(s.get_tracing_level().unwrap(), tracing::Level::WARN);
    }

    #[tokio::test]
    async fn load_reads_file_then_applies_flags() {
        let path = std::env::temp_dir()
            .join(format!("url-status-probe-{}.json", std::process::id()));
        tokio::fs::write(&path, r#"{"port": 7000, "max_workers": 7}"#)
            .await
            .unwrap();

        let cli = Cli {
            config: Some(path.clone()),
            max_workers: Some(3),
            ..Cli::default()
        };
        let s = Settings::load(&cli).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(s.port, 7000);
        assert_eq!(s.max_workers, 3);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let cli = Cli {
            config: Some(PathBuf::from("/definitely/not/here.json")),
            ..Cli::default()
        };
        assert!(Settings::load(&cli).await.is_err());
    }
}
