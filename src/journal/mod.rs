//! Append-only channel journal.
//!
//! The journal is the canonical ordering substrate for co-located
//! reactors: egress appends wire-encoded envelopes, the ingress tailer
//! reads them back in append order. The runtime relies on exactly three
//! properties: durable append, monotonic per-channel read position, and
//! tail reads observing writes in append order.
//!
//! On disk, each record is a self-describing document framed by a little
//! endian `u32` length prefix. The journal survives process restarts; a
//! tailer opened at the prior end-of-journal reads everything appended
//! before a crash, provided durability was enabled for the channel.

// Layer 1: Standard library imports
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

// Layer 2: Third-party crate imports
use parking_lot::Mutex;

// Layer 3: Internal module imports
// (none)

/// Upper bound on a single record; a larger length prefix means the
/// journal is corrupt, not that someone sent a very large message.
pub const MAX_RECORD_BYTES: u32 = 16 * 1024 * 1024;

const FRAME_HEADER_BYTES: u64 = 4;

/// Append side of one channel's journal.
///
/// Appends are serialized internally; any number of [`JournalTailer`]s may
/// read concurrently through their own file handles.
#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
    durable: bool,
    writer: Mutex<BufWriter<File>>,
}

impl Journal {
    /// Open (creating if needed) the journal for `channel_name` under
    /// `directory`.
    ///
    /// With `durable` set, every append is fsynced before returning;
    /// otherwise the write is only flushed to the OS, which is enough for
    /// same-host tailers but not for crash durability.
    pub fn open(directory: &Path, channel_name: &str, durable: bool) -> io::Result<Self> {
        fs::create_dir_all(directory)?;
        let path = Self::file_path(directory, channel_name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            durable,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Canonical journal file location for a channel.
    pub fn file_path(directory: &Path, channel_name: &str) -> PathBuf {
        directory.join(format!("{channel_name}.journal"))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, returning the end position after the write.
    pub fn append(&self, record: &[u8]) -> io::Result<u64> {
        if record.len() as u64 > MAX_RECORD_BYTES as u64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("record of {} bytes exceeds the frame limit", record.len()),
            ));
        }
        let mut writer = self.writer.lock();
        writer.write_all(&(record.len() as u32).to_le_bytes())?;
        writer.write_all(record)?;
        writer.flush()?;
        if self.durable {
            writer.get_ref().sync_data()?;
        }
        writer.get_ref().metadata().map(|meta| meta.len())
    }

    /// Current end of the journal.
    pub fn end_position(&self) -> io::Result<u64> {
        let mut writer = self.writer.lock();
        writer.flush()?;
        writer.get_ref().metadata().map(|meta| meta.len())
    }

    /// A tailer positioned at the current end: records appended before
    /// this call are not replayed.
    pub fn tailer(&self) -> io::Result<JournalTailer> {
        JournalTailer::open_at(&self.path, self.end_position()?)
    }
}

/// Positional reader over a channel journal.
///
/// `read_next` never blocks: a partially visible frame (a writer mid
/// append) reads as `None` and the position does not move, so the next
/// attempt sees the complete record.
#[derive(Debug)]
pub struct JournalTailer {
    file: File,
    position: u64,
}

impl JournalTailer {
    /// Open a tailer at an explicit byte position.
    pub fn open_at(path: &Path, position: u64) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self { file, position })
    }

    /// Open a tailer at the current end of the file.
    pub fn open_at_end(path: &Path) -> io::Result<Self> {
        let position = fs::metadata(path)?.len();
        Self::open_at(path, position)
    }

    /// Open a tailer at the start of the file, replaying every record.
    pub fn open_at_start(path: &Path) -> io::Result<Self> {
        Self::open_at(path, 0)
    }

    /// Current read position in bytes.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read the next complete record, or `None` when the journal has no
    /// fully written record past the current position.
    ///
    /// # Errors
    /// An `InvalidData` error means the frame header is corrupt; the
    /// tailer cannot advance past it and the channel must be considered
    /// broken.
    pub fn read_next(&mut self) -> io::Result<Option<Vec<u8>>> {
        let visible = self.file.metadata()?.len();
        if visible < self.position + FRAME_HEADER_BYTES {
            return Ok(None);
        }

        self.file.seek(SeekFrom::Start(self.position))?;
        let mut header = [0u8; 4];
        self.file.read_exact(&mut header)?;
        let length = u32::from_le_bytes(header);
        if length > MAX_RECORD_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("frame header claims {length} bytes; journal corrupt"),
            ));
        }

        if visible < self.position + FRAME_HEADER_BYTES + length as u64 {
            // Writer is mid-append; retry once the record is complete.
            return Ok(None);
        }

        let mut record = vec![0u8; length as usize];
        self.file.read_exact(&mut record)?;
        self.position += FRAME_HEADER_BYTES + length as u64;
        Ok(Some(record))
    }
}
