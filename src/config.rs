//! Configuration management for quiztrack
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{QuizTrackError, Result};
use crate::page::selector::Selector;
use crate::tracker::quiz_id::QuizIdStrategy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for quiztrack
///
/// Holds everything the tracker, the request client, and the dashboard
/// need. Every section has defaults so an empty file is a valid config.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Backend API and retry settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Slide detection and session tracking settings
    #[serde(default)]
    pub tracker: TrackerConfig,
    /// Analytics dashboard settings
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL the tracking and analytics endpoints hang off
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Maximum attempts per tracking request (including the first)
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Base delay between attempts; attempt `k` waits `k * retry_delay_ms`
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Transport timeout for a single request (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl ApiConfig {
    /// Base delay as a [`Duration`]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Request timeout as a [`Duration`]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Tracker configuration
///
/// Controls quiz id resolution, slide detection heuristics, and the
/// listener behaviour of the visit tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// How the quiz id is resolved for a page
    #[serde(default)]
    pub quiz_id: QuizIdStrategy,

    /// Quiz id used when the path yields a malformed id
    #[serde(default = "default_fallback_quiz_id")]
    pub fallback_quiz_id: String,

    /// Longest quiz id accepted from a path segment
    #[serde(default = "default_max_quiz_id_length")]
    pub max_quiz_id_length: usize,

    /// Slide selectors in priority order; first one matching anything wins
    #[serde(default = "default_slide_selectors")]
    pub slide_selectors: Vec<String>,

    /// Selector for the explicitly active slide
    #[serde(default = "default_active_selector")]
    pub active_selector: String,

    /// Selector for answer and navigation controls that trigger a recheck
    #[serde(default = "default_navigation_selector")]
    pub navigation_selector: String,

    /// Delay after a navigation click before the slide is rechecked (ms)
    #[serde(default = "default_click_settle_ms")]
    pub click_settle_ms: u64,

    /// Minimum width and height (px) for the visibility fallback
    #[serde(default = "default_min_slide_size")]
    pub min_slide_size_px: f64,

    /// Cap on slides found by the visibility fallback
    #[serde(default = "default_max_fallback_slides")]
    pub max_fallback_slides: usize,

    /// Tag the user agent and visit metadata with a per-tab id
    #[serde(default)]
    pub tag_tab_id: bool,
}

fn default_fallback_quiz_id() -> String {
    "lead2".to_string()
}

fn default_max_quiz_id_length() -> usize {
    50
}

fn default_slide_selectors() -> Vec<String> {
    [
        "[data-slide]",
        "[data-step]",
        ".slide",
        ".step",
        ".question",
        ".quiz-slide",
        ".quiz-step",
        "[class*=\"slide\"]",
        "[class*=\"step\"]",
        "[class*=\"question\"]",
        ".form-step",
        ".wizard-step",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_active_selector() -> String {
    ".slide.active".to_string()
}

fn default_navigation_selector() -> String {
    ".option, .btn-next, .btn-prev".to_string()
}

fn default_click_settle_ms() -> u64 {
    100
}

fn default_min_slide_size() -> f64 {
    100.0
}

fn default_max_fallback_slides() -> usize {
    20
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            quiz_id: QuizIdStrategy::default(),
            fallback_quiz_id: default_fallback_quiz_id(),
            max_quiz_id_length: default_max_quiz_id_length(),
            slide_selectors: default_slide_selectors(),
            active_selector: default_active_selector(),
            navigation_selector: default_navigation_selector(),
            click_settle_ms: default_click_settle_ms(),
            min_slide_size_px: default_min_slide_size(),
            max_fallback_slides: default_max_fallback_slides(),
            tag_tab_id: false,
        }
    }
}

impl TrackerConfig {
    /// Click settle delay as a [`Duration`]
    pub fn click_settle(&self) -> Duration {
        Duration::from_millis(self.click_settle_ms)
    }
}

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Base URL of the full analytics report (`analytics.php` lives here)
    #[serde(default = "default_analytics_base")]
    pub analytics_base: String,

    /// Quiz shown when none is selected
    #[serde(default = "default_dashboard_quiz")]
    pub default_quiz_id: String,

    /// Seconds between analytics refreshes in watch mode
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: u64,

    /// Seconds between quiz list refreshes in watch mode
    #[serde(default = "default_quiz_list_interval")]
    pub quiz_list_interval_seconds: u64,

    /// Directory exports are written to
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
}

fn default_analytics_base() -> String {
    "http://127.0.0.1:8000/server/api".to_string()
}

fn default_dashboard_quiz() -> String {
    "lead2".to_string()
}

fn default_refresh_interval() -> u64 {
    3
}

fn default_quiz_list_interval() -> u64 {
    5
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            analytics_base: default_analytics_base(),
            default_quiz_id: default_dashboard_quiz(),
            refresh_interval_seconds: default_refresh_interval(),
            quiz_list_interval_seconds: default_quiz_list_interval(),
            export_dir: default_export_dir(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON records instead of human-readable lines
    #[serde(default)]
    pub json_format: bool,

    /// Optional file that receives a copy of every record
    #[serde(default)]
    pub file_path: Option<PathBuf>,
}

fn default_log_level() -> String {
    "quiztrack=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| QuizTrackError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| QuizTrackError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("QUIZTRACK_API_BASE_URL") {
            self.api.base_url = base_url;
        }

        if let Ok(attempts) = std::env::var("QUIZTRACK_RETRY_ATTEMPTS") {
            if let Ok(value) = attempts.parse() {
                self.api.retry_attempts = value;
            } else {
                tracing::warn!("Invalid QUIZTRACK_RETRY_ATTEMPTS: {}", attempts);
            }
        }

        if let Ok(delay) = std::env::var("QUIZTRACK_RETRY_DELAY_MS") {
            if let Ok(value) = delay.parse() {
                self.api.retry_delay_ms = value;
            } else {
                tracing::warn!("Invalid QUIZTRACK_RETRY_DELAY_MS: {}", delay);
            }
        }

        if let Ok(quiz_id) = std::env::var("QUIZTRACK_QUIZ_ID") {
            tracing::debug!(quiz_id = %quiz_id, "Env override: QUIZTRACK_QUIZ_ID");
            self.tracker.quiz_id = QuizIdStrategy::Fixed { quiz_id };
        }

        if let Ok(analytics_base) = std::env::var("QUIZTRACK_ANALYTICS_BASE") {
            self.dashboard.analytics_base = analytics_base;
        }

        if let Ok(refresh) = std::env::var("QUIZTRACK_REFRESH_SECONDS") {
            match refresh.parse::<u64>() {
                Ok(v) => {
                    self.dashboard.refresh_interval_seconds = v;
                    tracing::debug!(refresh = v, "Env override: QUIZTRACK_REFRESH_SECONDS");
                }
                Err(_) => {
                    tracing::warn!("Invalid value for QUIZTRACK_REFRESH_SECONDS: {}", refresh);
                }
            }
        }

        if let Ok(level) = std::env::var("QUIZTRACK_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(json_logs) = std::env::var("QUIZTRACK_JSON_LOGS") {
            match json_logs.parse::<bool>() {
                Ok(v) => self.logging.json_format = v,
                Err(_) => {
                    tracing::warn!("Invalid value for QUIZTRACK_JSON_LOGS: {}", json_logs);
                }
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            self.logging.level = "quiztrack=debug".to_string();
        }
        if let Some(base_url) = &cli.base_url {
            self.api.base_url = base_url.clone();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(QuizTrackError::Config("api.base_url cannot be empty".to_string()).into());
        }

        if url::Url::parse(&self.api.base_url).is_err() {
            return Err(QuizTrackError::Config(format!(
                "api.base_url is not a valid URL: {}",
                self.api.base_url
            ))
            .into());
        }

        if self.api.retry_attempts == 0 {
            return Err(QuizTrackError::Config(
                "api.retry_attempts must be greater than 0".to_string(),
            )
            .into());
        }

        if self.api.retry_attempts > 10 {
            return Err(QuizTrackError::Config(
                "api.retry_attempts must be less than or equal to 10".to_string(),
            )
            .into());
        }

        if self.api.request_timeout_seconds == 0 {
            return Err(QuizTrackError::Config(
                "api.request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.tracker.slide_selectors.is_empty() {
            return Err(QuizTrackError::Config(
                "tracker.slide_selectors cannot be empty".to_string(),
            )
            .into());
        }

        for selector in self
            .tracker
            .slide_selectors
            .iter()
            .chain([&self.tracker.active_selector, &self.tracker.navigation_selector])
        {
            Selector::parse(selector).map_err(|e| {
                QuizTrackError::Config(format!("tracker selector {:?}: {}", selector, e))
            })?;
        }

        if self.tracker.max_quiz_id_length == 0 {
            return Err(QuizTrackError::Config(
                "tracker.max_quiz_id_length must be greater than 0".to_string(),
            )
            .into());
        }

        if self.tracker.fallback_quiz_id.is_empty() {
            return Err(QuizTrackError::Config(
                "tracker.fallback_quiz_id cannot be empty".to_string(),
            )
            .into());
        }

        if let QuizIdStrategy::Fixed { quiz_id } = &self.tracker.quiz_id {
            if quiz_id.is_empty() {
                return Err(QuizTrackError::Config(
                    "tracker.quiz_id.quiz_id cannot be empty".to_string(),
                )
                .into());
            }
        }

        if url::Url::parse(&self.dashboard.analytics_base).is_err() {
            return Err(QuizTrackError::Config(format!(
                "dashboard.analytics_base is not a valid URL: {}",
                self.dashboard.analytics_base
            ))
            .into());
        }

        if self.dashboard.refresh_interval_seconds == 0
            || self.dashboard.quiz_list_interval_seconds == 0
        {
            return Err(QuizTrackError::Config(
                "dashboard poll intervals must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
