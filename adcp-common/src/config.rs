//! Recorder configuration: a single flat JSON document.
//!
//! Every knob has a default so an empty document `{}` is a valid
//! configuration for everything except the serial port, which has no
//! sensible default and is validated at load time.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_DIR: &str = "./data_report";
pub const DEFAULT_BINARY_THRESHOLD: usize = 1024;
pub const DEFAULT_BINARY_QUIET_MS: u64 = 2000;
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;
pub const DEFAULT_HEARTBEAT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_RECONNECT_BACKOFF_MIN_MS: u64 = 1000;
pub const DEFAULT_RECONNECT_BACKOFF_MAX_MS: u64 = 60_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unable to read config file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("config file is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Number of data bits per serial character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum ByteSize {
    Five,
    Six,
    Seven,
    #[default]
    Eight,
}

impl TryFrom<u8> for ByteSize {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            5 => Ok(ByteSize::Five),
            6 => Ok(ByteSize::Six),
            7 => Ok(ByteSize::Seven),
            8 => Ok(ByteSize::Eight),
            other => Err(format!("byte_size must be 5..=8, got {other}")),
        }
    }
}

impl From<ByteSize> for u8 {
    fn from(v: ByteSize) -> u8 {
        match v {
            ByteSize::Five => 5,
            ByteSize::Six => 6,
            ByteSize::Seven => 7,
            ByteSize::Eight => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    #[default]
    None,
    Even,
    Odd,
    Mark,
    Space,
}

impl std::fmt::Display for Parity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Parity::None => "none",
            Parity::Even => "even",
            Parity::Odd => "odd",
            Parity::Mark => "mark",
            Parity::Space => "space",
        };
        f.write_str(s)
    }
}

/// Stop bits. `1.5` is accepted in the document for devices that advertise
/// it, and mapped to two stop bits by the serial layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(try_from = "f64", into = "f64")]
pub enum StopBits {
    #[default]
    One,
    OnePointFive,
    Two,
}

impl TryFrom<f64> for StopBits {
    type Error = String;

    fn try_from(v: f64) -> Result<Self, Self::Error> {
        if v == 1.0 {
            Ok(StopBits::One)
        } else if v == 1.5 {
            Ok(StopBits::OnePointFive)
        } else if v == 2.0 {
            Ok(StopBits::Two)
        } else {
            Err(format!("stop_bits must be 1, 1.5 or 2, got {v}"))
        }
    }
}

impl From<StopBits> for f64 {
    fn from(v: StopBits) -> f64 {
        match v {
            StopBits::One => 1.0,
            StopBits::OnePointFive => 1.5,
            StopBits::Two => 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub serial_port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default)]
    pub byte_size: ByteSize,
    #[serde(default)]
    pub parity: Parity,
    #[serde(default)]
    pub stop_bits: StopBits,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
    #[serde(default)]
    pub rts_cts: bool,
    #[serde(default)]
    pub dsr_dtr: bool,
    #[serde(default)]
    pub xon_xoff: bool,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Database file path; `null` derives `recorder.db` under `output_dir`.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    #[serde(default = "default_binary_threshold")]
    pub binary_threshold_bytes: usize,
    #[serde(default = "default_binary_quiet_ms")]
    pub binary_quiet_ms: u64,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_heartbeat_timeout_ms")]
    pub heartbeat_timeout_ms: u64,
    #[serde(default = "default_reconnect_backoff_min")]
    pub reconnect_backoff_ms_min: u64,
    #[serde(default = "default_reconnect_backoff_max")]
    pub reconnect_backoff_ms_max: u64,
    /// Give up reconnecting after this many consecutive failures; absent
    /// means retry forever.
    #[serde(default)]
    pub reconnect_max_attempts: Option<u32>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Maximum accepted head-id length. Instrument families disagree on the
    /// limit (20 vs 30), so it is configuration rather than a constant.
    #[serde(default = "default_head_id_max_len")]
    pub head_id_max_len: usize,
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_read_timeout_ms() -> u64 {
    1000
}

fn default_write_timeout_ms() -> u64 {
    1000
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_binary_threshold() -> usize {
    DEFAULT_BINARY_THRESHOLD
}

fn default_binary_quiet_ms() -> u64 {
    DEFAULT_BINARY_QUIET_MS
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_heartbeat_timeout_ms() -> u64 {
    DEFAULT_HEARTBEAT_TIMEOUT_MS
}

fn default_reconnect_backoff_min() -> u64 {
    DEFAULT_RECONNECT_BACKOFF_MIN_MS
}

fn default_reconnect_backoff_max() -> u64 {
    DEFAULT_RECONNECT_BACKOFF_MAX_MS
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_head_id_max_len() -> usize {
    30
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Config::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Config, ConfigError> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.serial_port.is_empty() {
            return Err(ConfigError::Invalid("serial_port must not be empty".into()));
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::Invalid("baud_rate must be positive".into()));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "queue_capacity must be positive".into(),
            ));
        }
        if self.binary_threshold_bytes == 0 {
            return Err(ConfigError::Invalid(
                "binary_threshold_bytes must be positive".into(),
            ));
        }
        if self.reconnect_backoff_ms_min == 0
            || self.reconnect_backoff_ms_min > self.reconnect_backoff_ms_max
        {
            return Err(ConfigError::Invalid(
                "reconnect backoff bounds must satisfy 0 < min <= max".into(),
            ));
        }
        if self.head_id_max_len == 0 {
            return Err(ConfigError::Invalid(
                "head_id_max_len must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Effective database path: explicit `db_path` or derived from the
    /// output directory.
    pub fn database_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| self.output_dir.join("recorder.db"))
    }
}
