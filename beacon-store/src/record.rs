//! Append-only state log.
//!
//! One JSON object per line:
//! `{"id": 7, "layer": 0, "type": "weight", "data": "[0.1,...]", "timestamp": 1700000000000}`
//!
//! `data` holds the saved value JSON-encoded as a string, exactly as
//! received. The current state is the newest row per (layer, type).
//!
//! A write that fails halfway is rolled back. A final line left without its
//! newline (the process died mid-write) is dropped on replay and cut from the
//! file, so one torn write never makes the rest of the log unreadable.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;
use crate::protocol::LayerKey;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    pub id: u64,
    pub layer: LayerKey,
    #[serde(rename = "type")]
    pub kind: String,
    /// JSON-encoded payload.
    pub data: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl StateRecord {
    pub fn decode_data(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.data)
    }
}

pub fn write_record<W: Write>(w: &mut W, record: &StateRecord) -> io::Result<()> {
    serde_json::to_writer(&mut *w, record)?;
    w.write_all(b"\n")
}

/// Next record from `r`, skipping blank lines. `Ok(None)` at end of input.
///
/// # Errors
///
/// - `InvalidData` for a complete line that is not a record
/// - `UnexpectedEof` for an unparsable last line with no newline (a torn write)
pub fn read_record<R: BufRead>(r: &mut R) -> io::Result<Option<StateRecord>> {
    let mut line = String::new();
    loop {
        line.clear();
        if r.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.trim().is_empty() {
            continue;
        }
        return serde_json::from_str(line.trim_end()).map(Some).map_err(|e| {
            let kind = if line.ends_with('\n') {
                io::ErrorKind::InvalidData
            } else {
                io::ErrorKind::UnexpectedEof
            };
            io::Error::new(kind, e)
        });
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// All rows in memory, optionally mirrored to an append-only file.
#[derive(Debug, Default)]
pub struct RecordStore {
    rows: Vec<StateRecord>,
    next_id: u64,
    writer: Option<BufWriter<File>>,
    path: Option<PathBuf>,
}

impl RecordStore {
    pub fn in_memory() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// A read-only store over rows already in memory.
    pub fn from_rows(rows: Vec<StateRecord>) -> Self {
        let next_id = rows.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        Self {
            rows,
            next_id,
            ..Self::default()
        }
    }

    /// Open (or create) a log file and replay its rows.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let (rows, intact_len) = if path.exists() {
            replay(&path)?
        } else {
            (Vec::new(), 0)
        };
        let mut file = OpenOptions::new().create(true).read(true).append(true).open(&path)?;
        if file.metadata()?.len() > intact_len {
            file.set_len(intact_len)?;
        }
        if intact_len > 0 && !ends_with_newline(&mut file)? {
            file.write_all(b"\n")?;
        }
        info!("Opened state log {} ({} rows)", path.display(), rows.len());

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            path: Some(path),
            ..Self::from_rows(rows)
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[StateRecord] {
        &self.rows
    }

    /// Append one row. The row is on disk before this returns.
    pub fn append(&mut self, layer: LayerKey, kind: &str, data: &Value) -> Result<&StateRecord, StoreError> {
        let record = StateRecord {
            id: self.next_id,
            layer,
            kind: kind.to_string(),
            data: serde_json::to_string(data)?,
            timestamp: now_ms(),
        };
        if let Some(w) = self.writer.as_mut() {
            let len = w.get_ref().metadata()?.len();
            if let Err(e) = write_record(w, &record).and_then(|()| w.flush()) {
                self.truncate_to(len);
                return Err(e.into());
            }
        }
        self.next_id += 1;
        self.rows.push(record);
        Ok(&self.rows[self.rows.len() - 1])
    }

    /// Drop anything buffered and cut the file back to `len` bytes.
    fn truncate_to(&mut self, len: u64) {
        let Some(w) = self.writer.take() else {
            return;
        };
        let (file, _unwritten) = w.into_parts();
        if let Err(e) = file.set_len(len) {
            error!("Failed to roll back state log to {} bytes: {}", len, e);
        }
        self.writer = Some(BufWriter::new(file));
    }

    /// Newest row per (layer, type), ordered by layer then type.
    pub fn latest(&self) -> Vec<&StateRecord> {
        let mut newest: BTreeMap<(LayerKey, &str), &StateRecord> = BTreeMap::new();
        for row in &self.rows {
            let key = (row.layer, row.kind.as_str());
            match newest.get(&key) {
                Some(existing) if existing.id > row.id => {}
                _ => {
                    newest.insert(key, row);
                }
            }
        }
        newest.into_values().collect()
    }
}

fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(io::SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Read every row of a log file. A torn final line is skipped.
pub fn read_all<P: AsRef<Path>>(path: P) -> Result<Vec<StateRecord>, StoreError> {
    replay(path.as_ref()).map(|(rows, _)| rows)
}

/// Rows of a log file and the byte length of its intact prefix.
fn replay(path: &Path) -> Result<(Vec<StateRecord>, u64), StoreError> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut rows = Vec::new();
    loop {
        let start = reader.stream_position()?;
        match read_record(&mut reader) {
            Ok(Some(row)) => rows.push(row),
            Ok(None) => return Ok((rows, start)),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                warn!(
                    "Dropping torn record #{} at the end of {}: {}",
                    rows.len() + 1,
                    path.display(),
                    e
                );
                return Ok((rows, start));
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(StoreError::Corrupt {
                    record: rows.len() + 1,
                    reason: e.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        }
    }
}
