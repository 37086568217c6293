//! The consumer worker: dequeues byte chunks, runs them through the frame
//! assembler and the classifier, and fans every frame out to the raw
//! table, a parsed/error row, and the per-type daily file. Binary-mode
//! bytes go to the blob capture instead; nothing binary touches the
//! database.

use crate::PipelineEvent;
use adcp_common::config::Config;
use adcp_common::error::ParseErrorKind;
use adcp_common::health::{HealthState, PipelineMode};
use adcp_nmea::assembler::{AssemblerEvent, FrameAssembler, Mode};
use adcp_nmea::classify::{classify, Outcome};
use adcp_nmea::frame::Frame;
use adcp_nmea::parser::ParserOptions;
use adcp_nmea::record::Prefix;
use adcp_storage::files::ERRORS_LABEL;
use adcp_storage::{BlobWriter, DailyFileWriter, Storage};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Dequeue timeout; short enough that heartbeats fire through idle
/// periods and shutdown is honoured within a second.
const RECV_SLICE: Duration = Duration::from_millis(500);

pub struct ConsumerHandle {
    pub rx: Receiver<PipelineEvent>,
    pub health: Arc<HealthState>,
    pub shutdown: Arc<AtomicBool>,
    pub kill: Arc<AtomicBool>,
    pub config: Config,
}

impl ConsumerHandle {
    fn stopped(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst) || self.kill.load(Ordering::SeqCst)
    }
}

pub fn run_consumer(ctx: ConsumerHandle) -> anyhow::Result<()> {
    // Resource acquisition failures here are fatal by design: a recorder
    // that cannot persist has nothing useful to do.
    let mut storage = Storage::open(&ctx.config.database_path())?;
    storage.migrate()?;
    let mut daily = DailyFileWriter::new(&ctx.config.output_dir)?;
    let mut blob = BlobWriter::new(&ctx.config.output_dir)?;
    let mut assembler = FrameAssembler::new(ctx.config.binary_threshold_bytes);
    let options = ParserOptions {
        head_id_max_len: ctx.config.head_id_max_len,
    };
    let quiet = Duration::from_millis(ctx.config.binary_quiet_ms);
    let mut last_byte_at = Instant::now();

    info!(db = %ctx.config.database_path().display(), "consumer started");
    loop {
        if ctx.stopped() {
            break;
        }
        match ctx.rx.recv_timeout(RECV_SLICE) {
            Ok(PipelineEvent::Data(chunk)) => {
                last_byte_at = Instant::now();
                for event in assembler.push_chunk(&chunk) {
                    handle_event(event, &ctx, &options, &mut storage, &mut daily, &mut blob);
                }
            }
            Ok(PipelineEvent::Reconnected) => {
                debug!("device reconnected; discarding carry-over");
                if let Some(event) = assembler.reset() {
                    handle_event(event, &ctx, &options, &mut storage, &mut daily, &mut blob);
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if assembler.mode() == Mode::Binary && last_byte_at.elapsed() >= quiet {
                    if let Some(event) = assembler.quiet_elapsed() {
                        handle_event(event, &ctx, &options, &mut storage, &mut daily, &mut blob);
                    }
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
        ctx.health.beat_consumer();
    }

    // Orderly close: flush files, close the capture, checkpoint the WAL.
    if let Err(err) = daily.flush_all() {
        error!(%err, "flushing daily files on shutdown");
    }
    daily.close_all();
    if let Err(err) = blob.close() {
        error!(%err, "closing binary capture on shutdown");
    }
    if let Err(err) = storage.checkpoint() {
        error!(%err, "database checkpoint on shutdown");
    }
    info!("consumer stopped");
    Ok(())
}

fn handle_event(
    event: AssemblerEvent,
    ctx: &ConsumerHandle,
    options: &ParserOptions,
    storage: &mut Storage,
    daily: &mut DailyFileWriter,
    blob: &mut BlobWriter,
) {
    match event {
        AssemblerEvent::Frame(frame) => handle_frame(&frame, ctx, options, storage, daily),
        AssemblerEvent::OversizeDiscard { len } => {
            ctx.health.record_parse_error(ParseErrorKind::FrameTooLong);
            if let Err(err) = storage.record_oversize_discard(len) {
                error!(%err, len, "recording oversize discard");
                ctx.health.record_frame_lost();
            }
        }
        AssemblerEvent::BinaryEntered => {
            ctx.health.set_mode(PipelineMode::Binary);
            match blob.open_next() {
                Ok(path) => debug!(path = %path.display(), "binary mode entered"),
                Err(err) => {
                    error!(%err, "opening binary capture");
                    ctx.health.set_disk_write_ok(false);
                }
            }
        }
        AssemblerEvent::BinaryData(bytes) => {
            if let Err(err) = blob.write(&bytes) {
                error!(%err, "writing binary capture");
                ctx.health.set_disk_write_ok(false);
            }
        }
        AssemblerEvent::BinaryExited(reason) => {
            debug!(?reason, "binary mode exited");
            if let Err(err) = blob.close() {
                error!(%err, "closing binary capture");
            }
            ctx.health.set_mode(PipelineMode::Text);
        }
    }
}

fn handle_frame(
    frame: &Frame,
    ctx: &ConsumerHandle,
    options: &ParserOptions,
    storage: &mut Storage,
    daily: &mut DailyFileWriter,
) {
    let outcome = classify(frame, options);
    if let Outcome::Failed(failure) = &outcome {
        ctx.health.record_parse_error(failure.kind);
        debug!(kind = %failure.kind, message = %failure.message, "frame failed classification");
    }

    // Database first, then the daily file; a crash between the two leaves
    // the file one line behind, never the reverse ordering.
    match storage.record_frame(frame, &outcome) {
        Ok(_) => {}
        Err(err) => {
            // Never silently drop a frame: the loss is logged and counted.
            error!(%err, sentence = %frame.sentence(), "database write failed; frame lost");
            ctx.health.record_frame_lost();
        }
    }

    let prefix = frame.prefix();
    let label = match Prefix::from_token(&prefix) {
        Some(known) => known.as_str(),
        None => ERRORS_LABEL,
    };
    match daily.append(label, &frame.sentence()) {
        Ok(()) => ctx.health.set_disk_write_ok(true),
        Err(err) => {
            error!(%err, label, "daily file append failed");
            ctx.health.set_disk_write_ok(false);
        }
    }
}
