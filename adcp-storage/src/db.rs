//! The embedded database: one long-lived connection owned by the consumer,
//! one transaction per frame. Commit-per-message bounds crash loss to the
//! single in-flight frame at the expected 1-2 Hz instrument rate.

use crate::schema;
use adcp_common::error::ParseErrorKind;
use adcp_nmea::classify::{FrameError, Outcome};
use adcp_nmea::frame::Frame;
use adcp_nmea::record::{FieldValue, ParsedRecord};
use chrono::{SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Transaction};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("unable to prepare database location: {0}")]
    Location(#[from] std::io::Error),
}

/// One row of `raw_lines`, as read back for status queries and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLineRow {
    pub id: i64,
    pub received_at: String,
    pub raw_sentence: String,
    pub parse_status: String,
    pub prefix: Option<String>,
    pub checksum_valid: Option<bool>,
    pub error_message: Option<String>,
}

/// One row of `parse_errors`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseErrorRow {
    pub id: i64,
    pub raw_line_id: Option<i64>,
    pub kind: String,
    pub message: String,
    pub prefix: Option<String>,
    pub checksum_expected: Option<String>,
    pub checksum_actual: Option<String>,
    pub raw_sentence: String,
}

pub struct Storage {
    conn: Connection,
}

fn utc_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Storage {
    /// Opens (creating if needed) the database file and applies the
    /// pragmas that let a respawned consumer reopen it while an abandoned
    /// handle lingers.
    pub fn open(path: &Path) -> Result<Storage, StorageError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        // journal_mode reports the resulting mode as a row.
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Storage { conn })
    }

    pub fn open_in_memory() -> Result<Storage, StorageError> {
        Ok(Storage {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Idempotent schema creation; re-running on an existing database is a
    /// no-op.
    pub fn migrate(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(&schema::build_ddl())?;
        Ok(())
    }

    /// The per-frame fan-out: raw PENDING insert, parsed or error insert,
    /// raw status update, committed together. Returns the raw-line id.
    pub fn record_frame(&mut self, frame: &Frame, outcome: &Outcome) -> Result<i64, StorageError> {
        let now = utc_now();
        let sentence = frame.sentence().into_owned();
        let prefix = frame.prefix().into_owned();
        let checksum_valid = frame.checksum_valid();

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO raw_lines (received_at, raw_sentence, parse_status, prefix, checksum_valid)
             VALUES (?1, ?2, 'PENDING', ?3, ?4)",
            params![now, sentence, prefix, checksum_valid],
        )?;
        let raw_id = tx.last_insert_rowid();
        match outcome {
            Outcome::Parsed(record) => {
                insert_parsed(&tx, &now, raw_id, frame, record)?;
                tx.execute(
                    "UPDATE raw_lines SET parse_status = 'OK' WHERE id = ?1",
                    [raw_id],
                )?;
            }
            Outcome::Failed(error) => {
                insert_parse_error(&tx, &now, Some(raw_id), &sentence, error)?;
                tx.execute(
                    "UPDATE raw_lines SET parse_status = 'FAIL', error_message = ?2 WHERE id = ?1",
                    params![raw_id, error.message],
                )?;
            }
        }
        tx.commit()?;
        debug!(raw_id, prefix = %prefix, ok = outcome.is_parsed(), "frame recorded");
        Ok(raw_id)
    }

    /// One aggregated FRAME_TOO_LONG row per oversize discard; there is no
    /// raw line to reference because no frame was ever formed.
    pub fn record_oversize_discard(&mut self, discarded_len: usize) -> Result<(), StorageError> {
        let now = utc_now();
        let error = FrameError {
            kind: ParseErrorKind::FrameTooLong,
            message: format!("discarded {discarded_len} bytes without a complete frame"),
            prefix: None,
            checksum_expected: None,
            checksum_actual: None,
        };
        let tx = self.conn.transaction()?;
        insert_parse_error(&tx, &now, None, "", &error)?;
        tx.commit()?;
        Ok(())
    }

    /// Final WAL checkpoint before the consumer exits.
    pub fn checkpoint(&self) -> Result<(), StorageError> {
        self.conn
            .query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
        Ok(())
    }

    pub fn raw_line_count(&self) -> Result<i64, StorageError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM raw_lines", [], |row| row.get(0))?)
    }

    pub fn table_count(&self, table: &str) -> Result<i64, StorageError> {
        Ok(self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {table}"),
            [],
            |row| row.get(0),
        )?)
    }

    pub fn raw_line(&self, id: i64) -> Result<Option<RawLineRow>, StorageError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, received_at, raw_sentence, parse_status, prefix, checksum_valid,
                        error_message
                 FROM raw_lines WHERE id = ?1",
                [id],
                |row| {
                    Ok(RawLineRow {
                        id: row.get(0)?,
                        received_at: row.get(1)?,
                        raw_sentence: row.get(2)?,
                        parse_status: row.get(3)?,
                        prefix: row.get(4)?,
                        checksum_valid: row.get(5)?,
                        error_message: row.get(6)?,
                    })
                },
            )
            .optional()?)
    }

    /// Most recent parse errors, newest first.
    pub fn recent_parse_errors(&self, limit: usize) -> Result<Vec<ParseErrorRow>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, raw_line_id, kind, message, prefix, checksum_expected, checksum_actual,
                    raw_sentence
             FROM parse_errors ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit as i64], |row| {
            Ok(ParseErrorRow {
                id: row.get(0)?,
                raw_line_id: row.get(1)?,
                kind: row.get(2)?,
                message: row.get(3)?,
                prefix: row.get(4)?,
                checksum_expected: row.get(5)?,
                checksum_actual: row.get(6)?,
                raw_sentence: row.get(7)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Scalar cell read for tests and ad-hoc status queries.
    pub fn query_value(&self, sql: &str) -> Result<Value, StorageError> {
        Ok(self.conn.query_row(sql, [], |row| row.get(0))?)
    }
}

fn to_sql_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Integer(v) => Value::Integer(*v),
        FieldValue::Real(v) => Value::Real(*v),
        FieldValue::Text(v) => Value::Text(v.clone()),
    }
}

fn insert_parsed(
    tx: &Transaction<'_>,
    now: &str,
    raw_id: i64,
    frame: &Frame,
    record: &ParsedRecord,
) -> Result<(), rusqlite::Error> {
    let columns = record.columns();
    let mut sql = format!(
        "INSERT INTO {} (ingested_at, raw_line_id, raw_sentence, checksum, checksum_valid",
        record.prefix().table_name()
    );
    for (name, _) in &columns {
        sql.push_str(", \"");
        sql.push_str(name);
        sql.push('"');
    }
    sql.push_str(") VALUES (?1, ?2, ?3, ?4, ?5");
    for i in 0..columns.len() {
        sql.push_str(&format!(", ?{}", i + 6));
    }
    sql.push(')');

    let mut values: Vec<Value> = vec![
        Value::Text(now.to_owned()),
        Value::Integer(raw_id),
        Value::Text(frame.sentence().into_owned()),
        Value::Text(frame.asserted_checksum_text().into_owned()),
        Value::Integer(frame.checksum_valid() as i64),
    ];
    values.extend(columns.iter().map(|(_, v)| to_sql_value(v)));
    tx.execute(&sql, params_from_iter(values))?;
    Ok(())
}

fn insert_parse_error(
    tx: &Transaction<'_>,
    now: &str,
    raw_id: Option<i64>,
    sentence: &str,
    error: &FrameError,
) -> Result<(), rusqlite::Error> {
    tx.execute(
        "INSERT INTO parse_errors (ingested_at, raw_line_id, kind, message, prefix,
                                   checksum_expected, checksum_actual, raw_sentence)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            now,
            raw_id,
            error.kind.as_str(),
            error.message,
            error.prefix,
            error.checksum_expected,
            error.checksum_actual,
            sentence,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use adcp_nmea::classify::classify;
    use adcp_nmea::parser::ParserOptions;

    fn storage() -> Storage {
        let storage = Storage::open_in_memory().unwrap();
        storage.migrate().unwrap();
        storage
    }

    fn classify_body(body: &str) -> (Frame, Outcome) {
        let frame = Frame::from_body(body);
        let outcome = classify(&frame, &ParserOptions::default());
        (frame, outcome)
    }

    #[test]
    fn migration_is_idempotent() {
        let storage = storage();
        storage.migrate().unwrap();
        storage.migrate().unwrap();
        assert_eq!(storage.raw_line_count().unwrap(), 0);
    }

    #[test]
    fn parsed_frame_writes_raw_and_typed_rows() {
        let mut storage = storage();
        let (frame, outcome) = classify_body("PNORI,4,Signature1000900001,4,20,0.20,1.00,0");
        let raw_id = storage.record_frame(&frame, &outcome).unwrap();

        let raw = storage.raw_line(raw_id).unwrap().unwrap();
        assert_eq!(raw.parse_status, "OK");
        assert_eq!(raw.prefix.as_deref(), Some("PNORI"));
        assert_eq!(raw.checksum_valid, Some(true));
        assert_eq!(
            raw.raw_sentence,
            "$PNORI,4,Signature1000900001,4,20,0.20,1.00,0*1A"
        );

        assert_eq!(storage.table_count("pnori").unwrap(), 1);
        assert_eq!(storage.table_count("parse_errors").unwrap(), 0);
        let head_id = storage
            .query_value("SELECT head_id FROM pnori WHERE raw_line_id = 1")
            .unwrap();
        assert_eq!(head_id, Value::Text("Signature1000900001".into()));
        let cells = storage.query_value("SELECT cell_count FROM pnori").unwrap();
        assert_eq!(cells, Value::Integer(20));
    }

    #[test]
    fn failed_frame_writes_error_row_instead() {
        let mut storage = storage();
        let frame =
            Frame::from_span(b"$PNORI,4,Signature1000900001,4,20,0.20,1.00,0*FF".to_vec());
        let outcome = classify(&frame, &ParserOptions::default());
        let raw_id = storage.record_frame(&frame, &outcome).unwrap();

        let raw = storage.raw_line(raw_id).unwrap().unwrap();
        assert_eq!(raw.parse_status, "FAIL");
        assert_eq!(raw.checksum_valid, Some(false));
        assert!(raw.error_message.is_some());

        assert_eq!(storage.table_count("pnori").unwrap(), 0);
        let errors = storage.recent_parse_errors(10).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, "CHECKSUM_MISMATCH");
        assert_eq!(errors[0].checksum_expected.as_deref(), Some("1A"));
        assert_eq!(errors[0].checksum_actual.as_deref(), Some("FF"));
        assert_eq!(errors[0].raw_line_id, Some(raw_id));
    }

    #[test]
    fn exactly_one_second_row_per_raw_line() {
        let mut storage = storage();
        let bodies = [
            "PNORI,4,Signature1000900001,4,20,0.20,1.00,0",
            "PNORW,120720,093150,0,1,0.89,-9.00,1.13,1.52,4.12,5.20,4.01,181.1,30.02,179.99,0.61,12.01,0.00,0,0.08,92.1,0",
            "PNORX,1,2,3",
            "PNORI,4,Signature1000900001,4,20",
        ];
        for body in bodies {
            let (frame, outcome) = classify_body(body);
            storage.record_frame(&frame, &outcome).unwrap();
        }
        let raw_count = storage.raw_line_count().unwrap();
        let mut second_rows = storage.table_count("parse_errors").unwrap();
        for prefix in adcp_nmea::record::Prefix::ALL {
            second_rows += storage.table_count(prefix.table_name()).unwrap();
        }
        assert_eq!(raw_count, 4);
        assert_eq!(second_rows, 4);
    }

    #[test]
    fn sentinel_field_is_stored_as_null_with_flag() {
        let mut storage = storage();
        let (frame, outcome) = classify_body(
            "PNORW,120720,093150,0,1,0.89,-9.00,1.13,1.52,4.12,5.20,4.01,181.1,30.02,179.99,0.61,12.01,0.00,0,0.08,92.1,0",
        );
        storage.record_frame(&frame, &outcome).unwrap();
        assert_eq!(
            storage.query_value("SELECT h3 FROM pnorw").unwrap(),
            Value::Null
        );
        assert_eq!(
            storage
                .query_value("SELECT has_invalid_data FROM pnorw")
                .unwrap(),
            Value::Integer(1)
        );
        assert_eq!(
            storage.query_value("SELECT hm0 FROM pnorw").unwrap(),
            Value::Real(0.89)
        );
    }

    #[test]
    fn raw_ids_increase_gap_free() {
        let mut storage = storage();
        for _ in 0..5 {
            let (frame, outcome) = classify_body("PNORC3,CN=3,SP=0.54,DIR=333.0");
            storage.record_frame(&frame, &outcome).unwrap();
        }
        let ids: Vec<i64> = (1..=5)
            .map(|id| storage.raw_line(id).unwrap().unwrap().id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn oversize_discard_row_has_no_raw_line() {
        let mut storage = storage();
        storage.record_oversize_discard(2049).unwrap();
        let errors = storage.recent_parse_errors(1).unwrap();
        assert_eq!(errors[0].kind, "FRAME_TOO_LONG");
        assert_eq!(errors[0].raw_line_id, None);
        assert!(errors[0].message.contains("2049"));
        assert_eq!(storage.raw_line_count().unwrap(), 0);
    }

    #[test]
    fn tagged_reorder_lands_identical_rows() {
        let mut storage = storage();
        for body in [
            "PNORI2,SN=123456,IT=4,NC=30,NB=4,CS=5.00,BD=1.00,CY=BEAM",
            "PNORI2,IT=4,SN=123456,NB=4,NC=30,BD=1.00,CS=5.00,CY=BEAM",
        ] {
            let (frame, outcome) = classify_body(body);
            storage.record_frame(&frame, &outcome).unwrap();
        }
        let distinct = storage
            .query_value(
                "SELECT COUNT(DISTINCT head_id || beam_count || cell_count || coord_system_code)
                 FROM pnori2",
            )
            .unwrap();
        assert_eq!(distinct, Value::Integer(1));
        assert_eq!(storage.table_count("pnori2").unwrap(), 2);
    }

    #[test]
    fn spectra_arrays_land_as_json_text() {
        let mut storage = storage();
        let (frame, outcome) =
            classify_body("PNORE,102115,135734,3,0.02,0.01,3,0.11,-9.00,0.33");
        storage.record_frame(&frame, &outcome).unwrap();
        assert_eq!(
            storage.query_value("SELECT energies FROM pnore").unwrap(),
            Value::Text("[0.11,null,0.33]".into())
        );
    }
}
