//! Event ledger with dual in-memory / durable persistence
//!
//! Every append is written to the durable file first (encoded into a buffer,
//! written in one call, flushed) and only then pushed onto the in-memory
//! sequence. Both steps run under the same lock, so the two stores advance
//! together and a failed durable write leaves neither changed.

use crate::codec;
use crate::error::LedgerError;
use crate::event::Event;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Ledger behavior options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerOptions {
    /// fsync the durable file after every append
    pub sync_on_append: bool,
    /// Hydrate the in-memory sequence from the durable file on open
    pub recover: bool,
}

impl LedgerOptions {
    /// Create default options (no fsync, no recovery)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With fsync after every append
    #[inline]
    #[must_use]
    pub fn with_sync_on_append(mut self, sync: bool) -> Self {
        self.sync_on_append = sync;
        self
    }

    /// With recovery of the in-memory sequence on open
    #[inline]
    #[must_use]
    pub fn with_recover(mut self, recover: bool) -> Self {
        self.recover = recover;
        self
    }
}

/// Append-only event ledger
///
/// The in-memory sequence lives for the process; the durable CSV file is the
/// source of truth for audit reads and survives restarts.
#[derive(Debug)]
pub struct EventLedger {
    /// Durable mirror
    path: PathBuf,
    /// Behavior options
    options: LedgerOptions,
    /// In-memory sequence, oldest first. The lock also serializes file access.
    events: Mutex<Vec<Event>>,
}

impl EventLedger {
    /// Create a ledger bound to `path` with an empty in-memory sequence
    ///
    /// Does not touch the disk; the file is created by the first append.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: LedgerOptions::default(),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Create a ledger with explicit options
    ///
    /// # Errors
    /// When `options.recover` is set, returns the errors of
    /// [`read_durable`](Self::read_durable).
    pub fn open(path: impl Into<PathBuf>, options: LedgerOptions) -> Result<Self, LedgerError> {
        let path = path.into();
        let events = if options.recover {
            let recovered = read_file(&path)?;
            info!(
                path = %path.display(),
                events = recovered.len(),
                "Recovered ledger from durable mirror"
            );
            recovered
        } else {
            Vec::new()
        };

        Ok(Self {
            path,
            options,
            events: Mutex::new(events),
        })
    }

    /// Durable file path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ledger options
    #[inline]
    #[must_use]
    pub fn options(&self) -> LedgerOptions {
        self.options
    }

    /// Append an event to both stores
    ///
    /// # Arguments
    /// * `event_type` - Event type tag
    /// * `details` - Free-text description
    ///
    /// # Returns
    /// The recorded event
    ///
    /// # Errors
    /// - `LedgerError::Persistence` if the durable write fails; the in-memory
    ///   sequence is left untouched and any partial bytes are truncated
    /// - `LedgerError::Encode` if the record cannot be encoded
    pub fn append(
        &self,
        event_type: impl Into<String>,
        details: impl Into<String>,
    ) -> Result<Event, LedgerError> {
        let mut events = self.events.lock();
        // Stamp under the lock so append order is timestamp order
        let event = Event::now(event_type.into(), details.into());
        self.persist(&event)?;
        events.push(event.clone());

        debug!(
            event_type = event.event_type(),
            len = events.len(),
            "Event appended"
        );
        Ok(event)
    }

    /// In-memory sequence, oldest first
    #[must_use]
    pub fn snapshot(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Number of events in the in-memory sequence
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Check if the in-memory sequence is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Re-read the durable file, newest first
    ///
    /// A missing file is an empty ledger, not an error.
    ///
    /// # Errors
    /// - `LedgerError::Read` if the file exists but cannot be read
    /// - `LedgerError::Corrupt` if a row does not decode
    pub fn read_durable(&self) -> Result<Vec<Event>, LedgerError> {
        // Hold the lock so a concurrent append is never observed half-written
        let _guard = self.events.lock();
        let mut events = read_file(&self.path)?;
        events.reverse();
        Ok(events)
    }

    /// At most the last `n` durable events
    ///
    /// # Arguments
    /// * `n` - Maximum number of events
    /// * `newest_first` - Ordering of the returned events
    ///
    /// # Errors
    /// Same as [`read_durable`](Self::read_durable)
    pub fn tail(&self, n: usize, newest_first: bool) -> Result<Vec<Event>, LedgerError> {
        let mut events = self.read_durable()?;
        events.truncate(n);
        if !newest_first {
            events.reverse();
        }
        Ok(events)
    }

    /// Write one record to the durable file, creating it with a header if needed
    fn persist(&self, event: &Event) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.persistence_error(source))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.persistence_error(source))?;

        let mut offset = file
            .metadata()
            .map_err(|source| self.persistence_error(source))?
            .len();
        if offset > 0 {
            offset = self
                .repair_torn_tail(&mut file, offset)
                .map_err(|source| self.persistence_error(source))?;
        }

        let record = codec::encode_record(event, offset == 0)?;

        if let Err(source) = write_record(&mut file, &record, self.options.sync_on_append) {
            if let Err(truncate_err) = file.set_len(offset) {
                warn!(
                    path = %self.path.display(),
                    offset,
                    error = %truncate_err,
                    "Failed to truncate partial ledger record"
                );
            }
            return Err(self.persistence_error(source));
        }
        Ok(())
    }

    /// Cut a record left half-written by a crash, returning the new length
    fn repair_torn_tail(&self, file: &mut File, len: u64) -> io::Result<u64> {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1))?;
        file.read_exact(&mut last)?;
        if last[0] == b'\n' {
            return Ok(len);
        }

        let data = fs::read(&self.path)?;
        let keep = codec::complete_prefix_len(&data) as u64;
        file.set_len(keep)?;
        warn!(
            path = %self.path.display(),
            dropped_bytes = len - keep,
            "Truncated torn ledger record"
        );
        Ok(keep)
    }

    fn persistence_error(&self, source: io::Error) -> LedgerError {
        LedgerError::Persistence {
            path: self.path.clone(),
            source,
        }
    }
}

fn write_record(file: &mut File, record: &[u8], sync: bool) -> io::Result<()> {
    file.write_all(record)?;
    file.flush()?;
    if sync {
        file.sync_data()?;
    }
    Ok(())
}

/// Decode the durable file oldest first; a missing file is empty
///
/// A torn final record is skipped; the next append truncates it.
fn read_file(path: &Path) -> Result<Vec<Event>, LedgerError> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(LedgerError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if codec::has_torn_tail(&data) {
        let complete = codec::complete_prefix_len(&data);
        warn!(
            path = %path.display(),
            torn_bytes = data.len() - complete,
            "Skipping torn ledger record"
        );
        return codec::decode_events(&data[..complete]);
    }
    codec::decode_events(data.as_slice())
}
