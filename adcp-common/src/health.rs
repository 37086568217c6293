//! Lock-free liveness state shared between the workers and the supervisor.
//!
//! Every field is a single machine word updated with relaxed atomics; the
//! supervisor reads a consistent-enough snapshot without taking any lock.

use crate::error::ParseErrorKind;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current pipeline mode as observed by the consumer/producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineMode {
    Text,
    Binary,
    Disconnected,
}

impl PipelineMode {
    fn from_u8(v: u8) -> PipelineMode {
        match v {
            1 => PipelineMode::Binary,
            2 => PipelineMode::Disconnected,
            _ => PipelineMode::Text,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            PipelineMode::Text => 0,
            PipelineMode::Binary => 1,
            PipelineMode::Disconnected => 2,
        }
    }
}

/// Milliseconds since the Unix epoch, host wall clock.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[derive(Debug, Default)]
pub struct HealthState {
    producer_heartbeat_ms: AtomicI64,
    consumer_heartbeat_ms: AtomicI64,
    mode: std::sync::atomic::AtomicU8,
    last_reconnect_ms: AtomicI64,
    reconnect_failures: AtomicU32,
    frames_lost: AtomicU64,
    disk_write_failed: AtomicBool,
    supervisor_cooldowns: AtomicU32,
    error_counts: [AtomicU64; ParseErrorKind::ALL.len()],
}

/// Read-only view handed to `status()` callers; serialises to flat JSON.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub mode: PipelineMode,
    /// Epoch millis of the last producer heartbeat; `None` before first beat.
    pub producer_heartbeat_ms: Option<i64>,
    pub consumer_heartbeat_ms: Option<i64>,
    pub last_reconnect_ms: Option<i64>,
    pub reconnect_failures: u32,
    pub frames_lost: u64,
    pub disk_write_ok: bool,
    pub supervisor_cooldowns: u32,
    pub error_counts: BTreeMap<&'static str, u64>,
}

impl HealthState {
    pub fn new() -> HealthState {
        HealthState::default()
    }

    pub fn beat_producer(&self) {
        self.producer_heartbeat_ms.store(now_ms(), Ordering::Relaxed);
    }

    pub fn beat_consumer(&self) {
        self.consumer_heartbeat_ms.store(now_ms(), Ordering::Relaxed);
    }

    pub fn producer_heartbeat(&self) -> Option<i64> {
        match self.producer_heartbeat_ms.load(Ordering::Relaxed) {
            0 => None,
            ms => Some(ms),
        }
    }

    pub fn consumer_heartbeat(&self) -> Option<i64> {
        match self.consumer_heartbeat_ms.load(Ordering::Relaxed) {
            0 => None,
            ms => Some(ms),
        }
    }

    pub fn set_mode(&self, mode: PipelineMode) {
        self.mode.store(mode.as_u8(), Ordering::Relaxed);
    }

    pub fn mode(&self) -> PipelineMode {
        PipelineMode::from_u8(self.mode.load(Ordering::Relaxed))
    }

    pub fn record_reconnect_attempt(&self) {
        self.last_reconnect_ms.store(now_ms(), Ordering::Relaxed);
        self.reconnect_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reconnect_success(&self) {
        self.last_reconnect_ms.store(now_ms(), Ordering::Relaxed);
        self.reconnect_failures.store(0, Ordering::Relaxed);
    }

    pub fn reconnect_failures(&self) -> u32 {
        self.reconnect_failures.load(Ordering::Relaxed)
    }

    pub fn record_parse_error(&self, kind: ParseErrorKind) {
        self.error_counts[kind as usize].fetch_add(1, Ordering::Relaxed);
    }

    /// A frame that could not be committed to the database.
    pub fn record_frame_lost(&self) {
        self.frames_lost.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_disk_write_ok(&self, ok: bool) {
        self.disk_write_failed.store(!ok, Ordering::Relaxed);
    }

    pub fn record_supervisor_cooldown(&self) {
        self.supervisor_cooldowns.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        let mut error_counts = BTreeMap::new();
        for kind in ParseErrorKind::ALL {
            let count = self.error_counts[kind as usize].load(Ordering::Relaxed);
            if count > 0 {
                error_counts.insert(kind.as_str(), count);
            }
        }
        HealthSnapshot {
            mode: self.mode(),
            producer_heartbeat_ms: self.producer_heartbeat(),
            consumer_heartbeat_ms: self.consumer_heartbeat(),
            last_reconnect_ms: match self.last_reconnect_ms.load(Ordering::Relaxed) {
                0 => None,
                ms => Some(ms),
            },
            reconnect_failures: self.reconnect_failures(),
            frames_lost: self.frames_lost.load(Ordering::Relaxed),
            disk_write_ok: !self.disk_write_failed.load(Ordering::Relaxed),
            supervisor_cooldowns: self.supervisor_cooldowns.load(Ordering::Relaxed),
            error_counts,
        }
    }
}
