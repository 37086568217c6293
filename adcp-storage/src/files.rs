//! Append-only file outputs: per-type daily sentence files and the
//! binary-mode blob capture under `errors_binary/`.

use chrono::{Local, NaiveDate};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Catch-all label for unknown-prefix and undecodable frames.
pub const ERRORS_LABEL: &str = "ERRORS";

/// Cached append handles, one per prefix, all tied to one local date.
/// The first write of a new day closes every handle and starts fresh.
pub struct DailyFileWriter {
    root: PathBuf,
    date: NaiveDate,
    handles: HashMap<String, File>,
}

impl DailyFileWriter {
    pub fn new(root: &Path) -> io::Result<DailyFileWriter> {
        fs::create_dir_all(root)?;
        Ok(DailyFileWriter {
            root: root.to_path_buf(),
            date: Local::now().date_naive(),
            handles: HashMap::new(),
        })
    }

    /// Appends one sentence (exactly one trailing `\n`, never a CR) to
    /// `<root>/<LABEL>_YYYY_MM_DD.dat` for the current local date.
    pub fn append(&mut self, label: &str, sentence: &str) -> io::Result<()> {
        self.append_on(Local::now().date_naive(), label, sentence)
    }

    fn append_on(&mut self, today: NaiveDate, label: &str, sentence: &str) -> io::Result<()> {
        if today != self.date {
            debug!(%today, "daily rotation: closing {} handles", self.handles.len());
            self.handles.clear();
            self.date = today;
        }
        if !self.handles.contains_key(label) {
            let path = self.path_for(label, today);
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            self.handles.insert(label.to_owned(), file);
        }
        // Entry guaranteed by the insert above.
        let Some(file) = self.handles.get_mut(label) else {
            return Ok(());
        };
        file.write_all(sentence.trim_end_matches(['\r', '\n']).as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    }

    fn path_for(&self, label: &str, date: NaiveDate) -> PathBuf {
        self.root
            .join(format!("{label}_{}.dat", date.format("%Y_%m_%d")))
    }

    pub fn flush_all(&mut self) -> io::Result<()> {
        for file in self.handles.values_mut() {
            file.flush()?;
        }
        Ok(())
    }

    pub fn close_all(&mut self) {
        self.handles.clear();
    }
}

/// Dated, sequence-numbered capture files for Binary mode. Bytes are
/// appended verbatim; no database rows are written for blob content.
pub struct BlobWriter {
    dir: PathBuf,
    current: Option<File>,
    current_path: Option<PathBuf>,
}

impl BlobWriter {
    pub fn new(output_root: &Path) -> io::Result<BlobWriter> {
        let dir = output_root.join("errors_binary");
        fs::create_dir_all(&dir)?;
        Ok(BlobWriter {
            dir,
            current: None,
            current_path: None,
        })
    }

    /// Opens `YYYYMMDD_<seq>.dat` with the next free sequence number for
    /// today, resuming numbering across restarts by scanning the directory.
    pub fn open_next(&mut self) -> io::Result<&Path> {
        self.open_next_on(Local::now().date_naive())
    }

    fn open_next_on(&mut self, today: NaiveDate) -> io::Result<&Path> {
        let stamp = today.format("%Y%m%d").to_string();
        let seq = self.next_sequence(&stamp)?;
        let path = self.dir.join(format!("{stamp}_{seq:03}.dat"));
        let file = OpenOptions::new().create_new(true).append(true).open(&path)?;
        info!(path = %path.display(), "binary capture started");
        self.current = Some(file);
        Ok(self.current_path.insert(path).as_path())
    }

    fn next_sequence(&self, stamp: &str) -> io::Result<u32> {
        let mut next = 0;
        for entry in fs::read_dir(&self.dir)? {
            let name = entry?.file_name();
            let name = name.to_string_lossy();
            let Some(rest) = name
                .strip_prefix(stamp)
                .and_then(|r| r.strip_prefix('_'))
                .and_then(|r| r.strip_suffix(".dat"))
            else {
                continue;
            };
            if let Ok(seq) = rest.parse::<u32>() {
                next = next.max(seq + 1);
            }
        }
        Ok(next)
    }

    /// Appends raw bytes, opening a capture file first if none is current.
    pub fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.current.is_none() {
            self.open_next()?;
        }
        let Some(file) = self.current.as_mut() else {
            return Ok(());
        };
        file.write_all(bytes)
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// Flushes and closes the current capture, returning its path.
    pub fn close(&mut self) -> io::Result<Option<PathBuf>> {
        if let Some(mut file) = self.current.take() {
            file.flush()?;
        }
        let path = self.current_path.take();
        if let Some(p) = &path {
            info!(path = %p.display(), "binary capture closed");
        }
        Ok(path)
    }
}
