//! The producer worker: drains the serial source into the bounded queue,
//! beats its heart after every read, and reconnects with jittered
//! exponential backoff when the device goes away.

use crate::serial::{ByteSource, SerialError, SerialOpener};
use crate::PipelineEvent;
use adcp_common::health::{HealthState, PipelineMode};
use crossbeam_channel::{SendTimeoutError, Sender};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Upper bound on one serial read; also the maximum frame length, so a
/// whole frame always fits in one chunk at the queue level.
const MAX_READ_BYTES: usize = 2048;

/// Slice used for all blocking waits so shutdown is honoured within ~1 s.
const POLL_SLICE: Duration = Duration::from_millis(500);

pub struct ProducerHandle {
    pub opener: Arc<dyn SerialOpener>,
    pub tx: Sender<PipelineEvent>,
    pub health: Arc<HealthState>,
    pub shutdown: Arc<AtomicBool>,
    pub kill: Arc<AtomicBool>,
    pub backoff_min: Duration,
    pub backoff_max: Duration,
    pub max_attempts: Option<u32>,
}

impl ProducerHandle {
    fn stopped(&self) -> bool {
        // The supervisor bridges OS signals into the shared shutdown flag;
        // workers only ever poll flags.
        self.shutdown.load(Ordering::SeqCst) || self.kill.load(Ordering::SeqCst)
    }
}

pub fn run_producer(ctx: ProducerHandle) -> anyhow::Result<()> {
    let mut source: Option<Box<dyn ByteSource>> = None;
    info!("producer started");
    loop {
        if ctx.stopped() {
            break;
        }
        match source.as_mut() {
            None => match reconnect(&ctx) {
                Some(new_source) => {
                    source = Some(new_source);
                    ctx.health.record_reconnect_success();
                    ctx.health.set_mode(PipelineMode::Text);
                    // Carry-over from before the drop cannot be trusted.
                    if !send_event(&ctx, PipelineEvent::Reconnected) {
                        break;
                    }
                }
                None => {
                    if ctx.stopped() {
                        break;
                    }
                    error!("reconnect attempts exhausted; producer giving up");
                    anyhow::bail!("serial reconnect attempts exhausted");
                }
            },
            Some(active) => match active.read_chunk(MAX_READ_BYTES) {
                Ok(chunk) => {
                    ctx.health.beat_producer();
                    if !chunk.is_empty() && !send_event(&ctx, PipelineEvent::Data(chunk)) {
                        break;
                    }
                }
                Err(err) => {
                    warn!(%err, "serial read failed; dropping handle");
                    if let Some(mut dead) = source.take() {
                        dead.close();
                    }
                    ctx.health.set_mode(PipelineMode::Disconnected);
                }
            },
        }
    }
    if let Some(mut active) = source.take() {
        active.close();
    }
    info!("producer stopped");
    Ok(())
}

/// Blocking send with backpressure: the queue being full stalls the
/// producer (serial bytes wait in the OS buffer), never drops data.
/// Returns false when shutdown interrupted the send.
fn send_event(ctx: &ProducerHandle, event: PipelineEvent) -> bool {
    let mut pending = event;
    loop {
        if ctx.stopped() {
            return false;
        }
        match ctx.tx.send_timeout(pending, POLL_SLICE) {
            Ok(()) => return true,
            Err(SendTimeoutError::Timeout(back)) => pending = back,
            Err(SendTimeoutError::Disconnected(_)) => return false,
        }
    }
}

/// Exponential backoff from `backoff_min` doubling up to `backoff_max`,
/// ±20% jitter, forever unless `max_attempts` is configured.
fn reconnect(ctx: &ProducerHandle) -> Option<Box<dyn ByteSource>> {
    let mut delay = ctx.backoff_min;
    let mut attempts = 0u32;
    loop {
        if ctx.stopped() {
            return None;
        }
        match ctx.opener.open() {
            Ok(source) => {
                info!(attempts, "serial device opened");
                return Some(source);
            }
            Err(err) => {
                attempts += 1;
                ctx.health.record_reconnect_attempt();
                // Still alive, just waiting on the device; the supervisor
                // must not mistake backoff for a hang.
                ctx.health.beat_producer();
                warn!(%err, attempts, "serial open failed");
                if matches!(err, SerialError::PermissionDenied(_)) {
                    // Permissions do not fix themselves; still retry, but
                    // make the log line unmissable.
                    error!(%err, "check device permissions");
                }
                if let Some(max) = ctx.max_attempts {
                    if attempts >= max {
                        return None;
                    }
                }
                if !sleep_with_jitter(ctx, delay) {
                    return None;
                }
                delay = (delay * 2).min(ctx.backoff_max);
            }
        }
    }
}

fn sleep_with_jitter(ctx: &ProducerHandle, base: Duration) -> bool {
    let factor = rand::thread_rng().gen_range(0.8..=1.2);
    let mut remaining = base.mul_f64(factor);
    while remaining > Duration::ZERO {
        if ctx.stopped() {
            return false;
        }
        ctx.health.beat_producer();
        let step = remaining.min(POLL_SLICE);
        std::thread::sleep(step);
        remaining = remaining.saturating_sub(step);
    }
    !ctx.stopped()
}
