//! End-to-end pipeline scenarios: scripted serial sessions in, database
//! rows and daily files out. Uses the real producer/consumer workers over
//! the real bounded queue; only the serial device is scripted.

use adcp_common::config::Config;
use adcp_common::health::HealthState;
use adcp_common::MutexExt;
use adcp_recorder::consumer::{run_consumer, ConsumerHandle};
use adcp_recorder::producer::{run_producer, ProducerHandle};
use adcp_recorder::serial::{ByteSource, SerialError, SerialOpener};
use adcp_storage::Storage;
use crossbeam_channel::bounded;
use rusqlite::types::Value;
use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// One scripted read from the fake device.
enum Read {
    Data(&'static [u8]),
    Lost,
}

struct ScriptedSource {
    reads: VecDeque<Read>,
}

impl ByteSource for ScriptedSource {
    fn read_chunk(&mut self, _max: usize) -> Result<Vec<u8>, SerialError> {
        match self.reads.pop_front() {
            Some(Read::Data(bytes)) => Ok(bytes.to_vec()),
            Some(Read::Lost) | None => Err(SerialError::DeviceLost("script over".into())),
        }
    }
}

/// Hands out one scripted session per successful open; `None` entries are
/// failed open attempts.
struct ScriptedOpener {
    sessions: Mutex<VecDeque<Option<ScriptedSource>>>,
}

impl SerialOpener for ScriptedOpener {
    fn open(&self) -> Result<Box<dyn ByteSource>, SerialError> {
        let mut sessions = self.sessions.lock_or_panic();
        match sessions.pop_front() {
            Some(Some(source)) => Ok(Box::new(source)),
            Some(None) | None => Err(SerialError::DeviceUnavailable("script over".into())),
        }
    }
}

struct PipelineRun {
    _dir: TempDir,
    output_dir: PathBuf,
    db_path: PathBuf,
}

/// Runs the scripted sessions through the full worker pair, waits for both
/// to drain, and hands back the output locations for inspection.
fn run_pipeline(sessions: Vec<Option<ScriptedSource>>) -> PipelineRun {
    let dir = TempDir::new().unwrap();
    let config = Config::from_json(
        &serde_json::json!({
            "serial_port": "scripted",
            "output_dir": dir.path(),
            "binary_quiet_ms": 100,
            "queue_capacity": 64,
        })
        .to_string(),
    )
    .unwrap();
    let db_path = config.database_path();
    let output_dir = config.output_dir.clone();

    let (tx, rx) = bounded(config.queue_capacity);
    let health = Arc::new(HealthState::new());
    let shutdown = Arc::new(AtomicBool::new(false));

    let producer_ctx = ProducerHandle {
        opener: Arc::new(ScriptedOpener {
            sessions: Mutex::new(sessions.into_iter().collect()),
        }),
        tx,
        health: Arc::clone(&health),
        shutdown: Arc::clone(&shutdown),
        kill: Arc::new(AtomicBool::new(false)),
        backoff_min: Duration::from_millis(1),
        backoff_max: Duration::from_millis(2),
        max_attempts: Some(2),
    };
    let consumer_ctx = ConsumerHandle {
        rx,
        health: Arc::clone(&health),
        shutdown: Arc::clone(&shutdown),
        kill: Arc::new(AtomicBool::new(false)),
        config,
    };

    let producer = std::thread::spawn(move || run_producer(producer_ctx));
    let consumer = std::thread::spawn(move || run_consumer(consumer_ctx));

    // The script always ends in device loss and exhausted reopens, so the
    // producer finishes on its own; its sender drops, the consumer drains
    // the queue and sees the disconnect.
    let _ = producer.join().unwrap();
    consumer.join().unwrap().unwrap();

    PipelineRun {
        output_dir,
        db_path,
        _dir: dir,
    }
}

fn open_db(run: &PipelineRun) -> Storage {
    Storage::open(&run.db_path).unwrap()
}

/// Finds today's daily file for a prefix label, if any.
fn daily_file(run: &PipelineRun, label: &str) -> Option<PathBuf> {
    let needle = format!("{label}_");
    fs::read_dir(&run.output_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .find(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&needle) && n.ends_with(".dat"))
        })
}

fn blob_files(run: &PipelineRun) -> Vec<PathBuf> {
    let dir = run.output_dir.join("errors_binary");
    if !dir.exists() {
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    files.sort();
    files
}

fn session(reads: Vec<Read>) -> Option<ScriptedSource> {
    Some(ScriptedSource {
        reads: reads.into_iter().collect(),
    })
}

#[test]
fn happy_path_fans_out_to_all_three_destinations() {
    let run = run_pipeline(vec![session(vec![Read::Data(
        b"$PNORI,4,Signature1000900001,4,20,0.20,1.00,0*1A\r\n",
    )])]);

    let db = open_db(&run);
    assert_eq!(db.raw_line_count().unwrap(), 1);
    let raw = db.raw_line(1).unwrap().unwrap();
    assert_eq!(raw.parse_status, "OK");
    assert_eq!(raw.prefix.as_deref(), Some("PNORI"));
    assert_eq!(raw.checksum_valid, Some(true));
    assert_eq!(
        raw.raw_sentence,
        "$PNORI,4,Signature1000900001,4,20,0.20,1.00,0*1A"
    );

    assert_eq!(db.table_count("pnori").unwrap(), 1);
    assert_eq!(
        db.query_value("SELECT head_id FROM pnori").unwrap(),
        Value::Text("Signature1000900001".into())
    );
    assert_eq!(
        db.query_value("SELECT beam_count FROM pnori").unwrap(),
        Value::Integer(4)
    );
    assert_eq!(
        db.query_value("SELECT blanking_distance FROM pnori").unwrap(),
        Value::Real(0.20)
    );
    assert_eq!(
        db.query_value("SELECT coord_system_code FROM pnori").unwrap(),
        Value::Integer(0)
    );

    let daily = daily_file(&run, "PNORI").expect("daily file");
    assert_eq!(
        fs::read_to_string(daily).unwrap(),
        "$PNORI,4,Signature1000900001,4,20,0.20,1.00,0*1A\n"
    );
}

#[test]
fn checksum_mismatch_is_recorded_not_dropped() {
    let run = run_pipeline(vec![session(vec![Read::Data(
        b"$PNORI,4,Signature1000900001,4,20,0.20,1.00,0*FF\r\n",
    )])]);

    let db = open_db(&run);
    let raw = db.raw_line(1).unwrap().unwrap();
    assert_eq!(raw.parse_status, "FAIL");
    assert_eq!(raw.checksum_valid, Some(false));

    let errors = db.recent_parse_errors(10).unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, "CHECKSUM_MISMATCH");
    assert_eq!(errors[0].checksum_expected.as_deref(), Some("1A"));
    assert_eq!(errors[0].checksum_actual.as_deref(), Some("FF"));
    assert_eq!(db.table_count("pnori").unwrap(), 0);

    // Known prefix: the sentence still reaches its own daily file.
    let daily = daily_file(&run, "PNORI").expect("daily file");
    assert!(fs::read_to_string(daily).unwrap().contains("*FF"));
}

#[test]
fn tagged_variant_with_reordered_fields_matches_canonical() {
    let run = run_pipeline(vec![session(vec![
        Read::Data(b"$PNORI2,SN=123456,IT=4,NC=30,NB=4,CS=5.00,BD=1.00,CY=BEAM*6F\r\n"),
        Read::Data(b"$PNORI2,IT=4,SN=123456,NB=4,NC=30,BD=1.00,CS=5.00,CY=BEAM*6F\r\n"),
    ])]);

    let db = open_db(&run);
    assert_eq!(db.table_count("pnori2").unwrap(), 2);
    let distinct = db
        .query_value(
            "SELECT COUNT(DISTINCT head_id || '|' || beam_count || '|' || cell_count
                           || '|' || cell_size || '|' || blanking_distance
                           || '|' || coord_system_code)
             FROM pnori2",
        )
        .unwrap();
    assert_eq!(distinct, Value::Integer(1));
}

#[test]
fn invalid_sentinel_lands_as_null_with_flag() {
    let run = run_pipeline(vec![session(vec![Read::Data(
        b"$PNORW,120720,093150,0,1,0.89,-9.00,1.13,1.52,4.12,5.20,4.01,181.1,30.02,179.99,0.61,12.01,0.00,0,0.08,92.1,0*7A\r\n",
    )])]);

    let db = open_db(&run);
    assert_eq!(db.table_count("pnorw").unwrap(), 1);
    assert_eq!(db.query_value("SELECT h3 FROM pnorw").unwrap(), Value::Null);
    assert_eq!(
        db.query_value("SELECT has_invalid_data FROM pnorw").unwrap(),
        Value::Integer(1)
    );
    assert_eq!(
        db.query_value("SELECT hm0 FROM pnorw").unwrap(),
        Value::Real(0.89)
    );
}

#[test]
fn binary_burst_diverts_to_blob_then_recovers() {
    static BURST: [u8; 2048] = [0xFF; 2048];
    let run = run_pipeline(vec![session(vec![
        Read::Data(&BURST),
        Read::Data(b"$PNORI,4,S1,4,20,0.20,1.00,0*35\r\n"),
    ])]);

    let blobs = blob_files(&run);
    assert_eq!(blobs.len(), 1);
    assert!(blobs[0]
        .file_name()
        .unwrap()
        .to_str()
        .unwrap()
        .ends_with("_000.dat"));
    let blob = fs::read(&blobs[0]).unwrap();
    assert!(blob.len() >= 2048, "blob holds the whole burst");
    assert!(blob.iter().all(|&b| b == 0xFF));

    // Binary mode never writes database rows; the sentence after the
    // resync still produces its raw+parsed pair.
    let db = open_db(&run);
    assert_eq!(db.raw_line_count().unwrap(), 1);
    assert_eq!(db.table_count("pnori").unwrap(), 1);
    assert_eq!(
        db.query_value("SELECT head_id FROM pnori").unwrap(),
        Value::Text("S1".into())
    );
}

#[test]
fn disconnect_mid_frame_discards_carry_over() {
    // The device drops after half a sentence; the remainder arrives after
    // reconnect. Gluing them would fabricate a frame, so neither half may
    // parse: the tail has no `$` and is silently dropped.
    let run = run_pipeline(vec![
        session(vec![Read::Data(b"$PNORI,4,Sig"), Read::Lost]),
        session(vec![Read::Data(b"nature1000900001,4,20,0.20,1.00,0*1A\r\n")]),
    ]);

    let db = open_db(&run);
    assert_eq!(db.raw_line_count().unwrap(), 0);
    assert_eq!(db.table_count("pnori").unwrap(), 0);
    assert_eq!(db.table_count("parse_errors").unwrap(), 0);
    assert!(daily_file(&run, "PNORI").is_none());
}

#[test]
fn two_frames_in_one_chunk_keep_receipt_order() {
    let run = run_pipeline(vec![session(vec![Read::Data(
        b"$PNORC3,CN=3,SP=0.54,DIR=333.0*32\r\n$PNORA,102115,135734,12.82,82,0*72\r\n",
    )])]);

    let db = open_db(&run);
    assert_eq!(db.raw_line_count().unwrap(), 2);
    let first = db.raw_line(1).unwrap().unwrap();
    let second = db.raw_line(2).unwrap().unwrap();
    assert_eq!(first.prefix.as_deref(), Some("PNORC3"));
    assert_eq!(second.prefix.as_deref(), Some("PNORA"));
    assert_eq!(db.table_count("pnorc3").unwrap(), 1);
    assert_eq!(db.table_count("pnora").unwrap(), 1);
}

#[test]
fn unknown_prefix_goes_to_the_errors_file() {
    let run = run_pipeline(vec![session(vec![Read::Data(
        b"$GPGGA,123519,4807.038,N*27\r\n",
    )])]);

    let db = open_db(&run);
    let raw = db.raw_line(1).unwrap().unwrap();
    assert_eq!(raw.parse_status, "FAIL");
    let errors = db.recent_parse_errors(1).unwrap();
    assert_eq!(errors[0].kind, "UNKNOWN_PREFIX");

    assert!(daily_file(&run, "ERRORS").is_some());
    assert!(daily_file(&run, "GPGGA").is_none());
}

#[test]
fn split_sentence_across_reads_reassembles() {
    let run = run_pipeline(vec![session(vec![
        Read::Data(b"$PNORI,4,Signature10009"),
        Read::Data(b"00001,4,20,0.20,1.00,0*1"),
        Read::Data(b"A\r\n"),
    ])]);

    let db = open_db(&run);
    assert_eq!(db.raw_line_count().unwrap(), 1);
    assert_eq!(db.raw_line(1).unwrap().unwrap().parse_status, "OK");
}

#[test]
fn oversize_garbage_yields_one_frame_too_long_row() {
    static NOISE: [u8; 2049] = [b'x'; 2049];
    let run = run_pipeline(vec![session(vec![
        Read::Data(&NOISE),
        Read::Data(b"$PNORA,102115,135734,12.82,82,0*72\r\n"),
    ])]);

    let db = open_db(&run);
    let errors = db.recent_parse_errors(10).unwrap();
    let too_long: Vec<_> = errors.iter().filter(|e| e.kind == "FRAME_TOO_LONG").collect();
    assert_eq!(too_long.len(), 1);
    assert_eq!(too_long[0].raw_line_id, None);
    // The assembler is ready again afterwards.
    assert_eq!(db.table_count("pnora").unwrap(), 1);
}

mod supervisor_smoke {
    use super::*;
    use adcp_recorder::supervisor::Supervisor;

    /// A device that opens instantly and produces one sentence, then idles
    /// on read timeouts forever.
    struct IdleOpener;

    struct OneShotThenIdle {
        sent: bool,
    }

    impl ByteSource for OneShotThenIdle {
        fn read_chunk(&mut self, _max: usize) -> Result<Vec<u8>, SerialError> {
            if !self.sent {
                self.sent = true;
                return Ok(b"$PNORC3,CN=3,SP=0.54,DIR=333.0*32\r\n".to_vec());
            }
            std::thread::sleep(Duration::from_millis(20));
            Ok(Vec::new())
        }
    }

    impl SerialOpener for IdleOpener {
        fn open(&self) -> Result<Box<dyn ByteSource>, SerialError> {
            Ok(Box::new(OneShotThenIdle { sent: false }))
        }
    }

    #[test]
    fn supervisor_runs_workers_and_drains_on_shutdown() {
        let dir = TempDir::new().unwrap();
        let config = Config::from_json(
            &serde_json::json!({
                "serial_port": "scripted",
                "output_dir": dir.path(),
            })
            .to_string(),
        )
        .unwrap();
        let db_path = config.database_path();
        let health = Arc::new(HealthState::new());
        let shutdown = Arc::new(AtomicBool::new(false));
        let supervisor = Supervisor::new(
            config,
            Arc::new(IdleOpener),
            Arc::clone(&health),
            Arc::clone(&shutdown),
        );
        let handle = std::thread::spawn(move || supervisor.run());

        // Wait until the frame landed, then ask for shutdown.
        let deadline = std::time::Instant::now() + Duration::from_secs(10);
        loop {
            if let Ok(db) = Storage::open(&db_path) {
                if db.raw_line_count().unwrap_or(0) >= 1 {
                    break;
                }
            }
            assert!(std::time::Instant::now() < deadline, "frame never arrived");
            std::thread::sleep(Duration::from_millis(50));
        }
        shutdown.store(true, Ordering::SeqCst);
        handle.join().unwrap().unwrap();

        let snapshot = health.snapshot();
        assert!(snapshot.producer_heartbeat_ms.is_some());
        assert!(snapshot.consumer_heartbeat_ms.is_some());
        let db = Storage::open(&db_path).unwrap();
        assert_eq!(db.table_count("pnorc3").unwrap(), 1);
    }
}
