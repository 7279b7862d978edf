//! Run configuration.
//!
//! A [`Config`] is resolved once at startup (defaults, then an optional JSON
//! file, then command line overrides) and handed by value to the crawler and
//! the PageRank engine. Nothing reads configuration from global state.

use crate::crawler::CrawlSettings;
use crate::error::ConfigError;
use crate::pagerank::RankSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONCURRENCY: usize = 50;
pub const DEFAULT_PAGES: usize = 1000;
pub const DEFAULT_THRESHOLD: f64 = 0.0001;
pub const DEFAULT_DAMPING: f64 = 0.85;
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;
pub const DEFAULT_TOP: usize = 3;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOG_LEVEL: &str = "info";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of simultaneous fetch workers.
    pub concurrency: usize,
    /// Page budget: frontier capacity and target corpus size.
    pub pages: usize,
    /// PageRank stops once no page moves by this much in a sweep.
    pub threshold: f64,
    /// Probability of following a link rather than teleporting.
    pub damping: f64,
    pub output_dir: PathBuf,
    pub max_iterations: usize,
    /// Number of pages listed in each ranking of the report.
    pub top: usize,
    pub request_timeout_secs: u64,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            pages: DEFAULT_PAGES,
            threshold: DEFAULT_THRESHOLD,
            damping: DEFAULT_DAMPING,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            top: DEFAULT_TOP,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Loads a JSON config file. Missing fields fall back to their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pages == 0 {
            return Err(invalid("pages", "the page budget must be at least 1"));
        }
        if self.concurrency == 0 {
            return Err(invalid("concurrency", "at least one worker is required"));
        }
        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(invalid(
                "damping",
                format!("{} is outside the open interval (0, 1)", self.damping),
            ));
        }
        if !(self.threshold > 0.0 && self.threshold.is_finite()) {
            return Err(invalid(
                "threshold",
                format!("{} is not a positive number", self.threshold),
            ));
        }
        if self.max_iterations == 0 {
            return Err(invalid("max_iterations", "at least one sweep is required"));
        }
        if self.top == 0 {
            return Err(invalid("top", "must list at least one page"));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs", "must be at least 1 second"));
        }
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(invalid(
                "log_level",
                format!("`{}` is not one of {}", self.log_level, LOG_LEVELS.join(", ")),
            ));
        }
        Ok(())
    }

    pub fn crawl_settings(&self) -> CrawlSettings {
        CrawlSettings {
            pages: self.pages,
            concurrency: self.concurrency,
        }
    }

    pub fn rank_settings(&self) -> RankSettings {
        RankSettings {
            damping: self.damping,
            threshold: self.threshold,
            max_iterations: self.max_iterations,
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.concurrency, 50);
        assert_eq!(config.pages, 1000);
        assert_eq!(config.threshold, 0.0001);
        assert_eq!(config.damping, 0.85);
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_partial() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, r#"{{ "pages": 25, "damping": 0.9 }}"#)?;

        let config = Config::from_file(file.path())?;
        assert_eq!(config.pages, 25);
        assert_eq!(config.damping, 0.9);
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        Ok(())
    }

    #[test]
    fn test_from_file_missing() {
        let err = Config::from_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_from_file_malformed() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "pages = 25").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cases: Vec<(&str, Config)> = vec![
            ("pages", Config { pages: 0, ..Config::default() }),
            ("concurrency", Config { concurrency: 0, ..Config::default() }),
            ("damping", Config { damping: 1.0, ..Config::default() }),
            ("damping", Config { damping: 0.0, ..Config::default() }),
            ("threshold", Config { threshold: 0.0, ..Config::default() }),
            ("threshold", Config { threshold: f64::NAN, ..Config::default() }),
            ("max_iterations", Config { max_iterations: 0, ..Config::default() }),
            ("top", Config { top: 0, ..Config::default() }),
            ("request_timeout_secs", Config { request_timeout_secs: 0, ..Config::default() }),
            ("log_level", Config { log_level: "loud".into(), ..Config::default() }),
        ];

        for (expected, config) in cases {
            match config.validate() {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected {} to be rejected, got {:?}", expected, other),
            }
        }
    }

    #[test]
    fn test_settings_projection() {
        let config = Config {
            pages: 10,
            concurrency: 3,
            damping: 0.5,
            threshold: 0.01,
            max_iterations: 7,
            ..Config::default()
        };

        let crawl = config.crawl_settings();
        assert_eq!((crawl.pages, crawl.concurrency), (10, 3));

        let rank = config.rank_settings();
        assert_eq!(rank.damping, 0.5);
        assert_eq!(rank.threshold, 0.01);
        assert_eq!(rank.max_iterations, 7);
    }
}
