//! Always-on recorder for Nortek ADCP NMEA telemetry: owns the serial
//! producer, the framing/classifying consumer, and the supervisor that
//! keeps both alive. The CLI and service wrappers drive everything through
//! [`Recorder`].

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use adcp_common::config::Config;
use adcp_common::health::{HealthSnapshot, HealthState, PipelineMode};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::info;

pub mod consumer;
pub mod producer;
pub mod serial;
pub mod signals;
pub mod supervisor;

pub use serial::{list_ports, PortInfo};

/// What flows through the bounded producer→consumer queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// Bytes read from the device, in arrival order.
    Data(Vec<u8>),
    /// The device reconnected; any carry-over predates the drop and must
    /// be discarded.
    Reconnected,
}

/// Initialises process-wide tracing output. `level` accepts anything an
/// `EnvFilter` does; `RUST_LOG` wins when set.
pub fn enable_logging(level: &str) {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_owned()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}

struct Running {
    handle: JoinHandle<anyhow::Result<()>>,
    shutdown: Arc<AtomicBool>,
    health: Arc<HealthState>,
}

/// The control surface consumed by the external CLI and service wrappers.
pub struct Recorder {
    config: Config,
    running: Option<Running>,
}

impl Recorder {
    pub fn new(config: Config) -> Recorder {
        Recorder {
            config,
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }

    /// Spawns the supervisor (and through it the workers). No-op when
    /// already running.
    pub fn start(&mut self) -> anyhow::Result<()> {
        if self.is_running() {
            return Ok(());
        }
        self.config.validate()?;
        signals::clear_shutdown();
        let shutdown = Arc::new(AtomicBool::new(false));
        let health = Arc::new(HealthState::new());
        health.set_mode(PipelineMode::Disconnected);
        let opener = Arc::new(serial::SerialPortOpener::from_config(&self.config));
        let supervisor = supervisor::Supervisor::new(
            self.config.clone(),
            opener,
            Arc::clone(&health),
            Arc::clone(&shutdown),
        );
        let handle = std::thread::spawn(move || supervisor.run());
        info!(port = %self.config.serial_port, "recorder started");
        self.running = Some(Running {
            handle,
            shutdown,
            health,
        });
        Ok(())
    }

    /// Requests cooperative shutdown and waits for the supervisor to
    /// finish draining.
    pub fn stop(&mut self) -> anyhow::Result<()> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };
        running.shutdown.store(true, Ordering::SeqCst);
        match running.handle.join() {
            Ok(result) => result,
            Err(_) => anyhow::bail!("supervisor panicked"),
        }
    }

    pub fn restart(&mut self) -> anyhow::Result<()> {
        self.stop()?;
        self.start()
    }

    /// Blocks until the supervisor exits (signal or `stop()` from another
    /// handle). The daemon entry point lives here.
    pub fn wait(&mut self) -> anyhow::Result<()> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };
        match running.handle.join() {
            Ok(result) => result,
            Err(_) => anyhow::bail!("supervisor panicked"),
        }
    }

    /// Point-in-time health snapshot; `None` when not running.
    pub fn status(&self) -> Option<HealthSnapshot> {
        self.running.as_ref().map(|r| r.health.snapshot())
    }

    /// Updates the device and restarts the pipeline on it.
    pub fn set_port(&mut self, port: &str) -> anyhow::Result<()> {
        self.config.serial_port = port.to_owned();
        self.config.validate()?;
        if self.is_running() {
            self.restart()?;
        }
        Ok(())
    }

    /// Updates the output root (and the derived database path) and
    /// restarts the pipeline on it.
    pub fn set_output_dir(&mut self, dir: PathBuf) -> anyhow::Result<()> {
        self.config.output_dir = dir;
        self.config.validate()?;
        if self.is_running() {
            self.restart()?;
        }
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
