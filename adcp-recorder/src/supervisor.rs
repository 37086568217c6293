//! Worker lifecycle: spawns the producer/consumer pair over one bounded
//! queue, watches their heartbeats, respawns hung workers (with a
//! cool-down when respawns churn), bridges OS signals into the shared
//! shutdown flag, and joins everything within a grace period on the way
//! out.

use crate::consumer::{run_consumer, ConsumerHandle};
use crate::producer::{run_producer, ProducerHandle};
use crate::serial::SerialOpener;
use crate::signals;
use crate::PipelineEvent;
use adcp_common::config::Config;
use adcp_common::health::{now_ms, HealthState};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Heartbeat inspection cadence.
const WATCH_INTERVAL: Duration = Duration::from_secs(2);
/// Respawn-churn window and threshold.
const RESPAWN_WINDOW: Duration = Duration::from_secs(60);
const RESPAWN_LIMIT: usize = 3;
/// Cool-down after a churn episode.
const COOLDOWN: Duration = Duration::from_secs(30);
/// How long workers get to drain at shutdown before being abandoned.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

const POLL_SLICE: Duration = Duration::from_millis(500);

struct Worker {
    name: &'static str,
    handle: JoinHandle<anyhow::Result<()>>,
    kill: Arc<AtomicBool>,
    spawned_at_ms: i64,
    respawns: VecDeque<Instant>,
}

pub struct Supervisor {
    config: Config,
    opener: Arc<dyn SerialOpener>,
    health: Arc<HealthState>,
    shutdown: Arc<AtomicBool>,
    tx: Sender<PipelineEvent>,
    rx: Receiver<PipelineEvent>,
}

impl Supervisor {
    pub fn new(
        config: Config,
        opener: Arc<dyn SerialOpener>,
        health: Arc<HealthState>,
        shutdown: Arc<AtomicBool>,
    ) -> Supervisor {
        let (tx, rx) = bounded(config.queue_capacity);
        Supervisor {
            config,
            opener,
            health,
            shutdown,
            tx,
            rx,
        }
    }

    /// Runs until shutdown is requested (signal or `stop()`). Blocks the
    /// calling thread.
    pub fn run(self) -> anyhow::Result<()> {
        signals::install_handlers()?;
        self.preflight()?;
        let mut producer = self.spawn_producer();
        let mut consumer = self.spawn_consumer();
        info!("supervisor running");

        loop {
            if !self.sleep_watch_interval() {
                break;
            }
            self.watch(&mut producer, WorkerKind::Producer);
            self.watch(&mut consumer, WorkerKind::Consumer);
        }

        info!("shutdown requested; draining workers");
        self.shutdown.store(true, Ordering::SeqCst);
        join_with_grace(producer, SHUTDOWN_GRACE);
        join_with_grace(consumer, SHUTDOWN_GRACE);
        info!("supervisor stopped");
        Ok(())
    }

    /// Essential resources must be acquirable before any frame is
    /// accepted; failing here is fatal, unlike anything that happens once
    /// the pipeline is running. Also runs the schema migration so the
    /// consumer never races an empty database.
    fn preflight(&self) -> anyhow::Result<()> {
        use anyhow::Context;
        std::fs::create_dir_all(&self.config.output_dir)
            .with_context(|| format!("creating {}", self.config.output_dir.display()))?;
        let storage = adcp_storage::Storage::open(&self.config.database_path())?;
        storage.migrate()?;
        Ok(())
    }

    /// Sleeps one watch interval in slices; false once shutdown shows up.
    fn sleep_watch_interval(&self) -> bool {
        let deadline = Instant::now() + WATCH_INTERVAL;
        while Instant::now() < deadline {
            if self.shutdown.load(Ordering::SeqCst) || signals::shutdown_requested() {
                return false;
            }
            std::thread::sleep(POLL_SLICE);
        }
        !(self.shutdown.load(Ordering::SeqCst) || signals::shutdown_requested())
    }

    fn watch(&self, worker: &mut Worker, kind: WorkerKind) {
        let finished = worker.handle.is_finished();
        let last_beat = match kind {
            WorkerKind::Producer => self.health.producer_heartbeat(),
            WorkerKind::Consumer => self.health.consumer_heartbeat(),
        }
        .unwrap_or(0)
        .max(worker.spawned_at_ms);
        let stale = now_ms().saturating_sub(last_beat) > self.config.heartbeat_timeout_ms as i64;

        if !finished && !stale {
            return;
        }
        warn!(
            worker = worker.name,
            finished, stale, "worker unhealthy; respawning"
        );
        // Cooperative cancellation: the old thread notices its kill flag at
        // the next poll point and drains its own resources on the way out.
        worker.kill.store(true, Ordering::SeqCst);

        let now = Instant::now();
        worker.respawns.push_back(now);
        while worker
            .respawns
            .front()
            .is_some_and(|t| now.duration_since(*t) > RESPAWN_WINDOW)
        {
            worker.respawns.pop_front();
        }
        if worker.respawns.len() > RESPAWN_LIMIT {
            error!(
                worker = worker.name,
                "respawn churn; cooling down for {}s",
                COOLDOWN.as_secs()
            );
            self.health.record_supervisor_cooldown();
            let deadline = Instant::now() + COOLDOWN;
            while Instant::now() < deadline && !self.shutdown.load(Ordering::SeqCst) {
                std::thread::sleep(POLL_SLICE);
            }
            worker.respawns.clear();
        }

        let respawns = std::mem::take(&mut worker.respawns);
        *worker = match kind {
            WorkerKind::Producer => self.spawn_producer(),
            WorkerKind::Consumer => self.spawn_consumer(),
        };
        worker.respawns = respawns;
    }

    fn spawn_producer(&self) -> Worker {
        let kill = Arc::new(AtomicBool::new(false));
        let ctx = ProducerHandle {
            opener: Arc::clone(&self.opener),
            tx: self.tx.clone(),
            health: Arc::clone(&self.health),
            shutdown: Arc::clone(&self.shutdown),
            kill: Arc::clone(&kill),
            backoff_min: Duration::from_millis(self.config.reconnect_backoff_ms_min),
            backoff_max: Duration::from_millis(self.config.reconnect_backoff_ms_max),
            max_attempts: self.config.reconnect_max_attempts,
        };
        let handle = std::thread::spawn(move || run_producer(ctx));
        Worker {
            name: "producer",
            handle,
            kill,
            spawned_at_ms: now_ms(),
            respawns: VecDeque::new(),
        }
    }

    fn spawn_consumer(&self) -> Worker {
        let kill = Arc::new(AtomicBool::new(false));
        let ctx = ConsumerHandle {
            rx: self.rx.clone(),
            health: Arc::clone(&self.health),
            shutdown: Arc::clone(&self.shutdown),
            kill: Arc::clone(&kill),
            config: self.config.clone(),
        };
        let handle = std::thread::spawn(move || run_consumer(ctx));
        Worker {
            name: "consumer",
            handle,
            kill,
            spawned_at_ms: now_ms(),
            respawns: VecDeque::new(),
        }
    }
}

#[derive(Clone, Copy)]
enum WorkerKind {
    Producer,
    Consumer,
}

fn join_with_grace(worker: Worker, grace: Duration) {
    let deadline = Instant::now() + grace;
    while !worker.handle.is_finished() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(100));
    }
    if !worker.handle.is_finished() {
        // std threads cannot be killed; every blocking call in the workers
        // is bounded at ~1s, so reaching this means something is truly
        // wedged. Abandon it and report.
        error!(worker = worker.name, "did not stop within grace; abandoning");
        return;
    }
    match worker.handle.join() {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(worker = worker.name, %err, "worker exited with error"),
        Err(_) => error!(worker = worker.name, "worker panicked"),
    }
}
