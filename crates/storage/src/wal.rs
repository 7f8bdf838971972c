// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only, durable, ordered event log (C4, §4.4): a JSON-lines WAL with
//! monotonic sequence numbers and no gaps, crash-consistent appends, and
//! corrupt-tail detection with backup rotation on reopen.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use yawl_core::EventRecord;

use crate::error::WalError;

/// Appends are batched and flushed to disk once this many entries have
/// accumulated, or [`FLUSH_INTERVAL`] has elapsed, whichever comes first.
const FLUSH_THRESHOLD: usize = 100;
const FLUSH_INTERVAL: Duration = Duration::from_millis(500);

/// One on-disk WAL line: a sequence number plus the event record it carries.
/// `seq` is stored redundantly alongside `record.seq` only so a corrupt
/// `record` field (still valid JSON at the outer level) cannot desynchronize
/// the line from its position; in practice they are always equal.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct WalLine {
    seq: u64,
    record: EventRecord,
}

#[derive(Debug, Clone)]
pub struct WalEntry {
    pub seq: u64,
    pub record: EventRecord,
}

/// A JSON-lines append log. Not `Sync` on its own; callers that need
/// concurrent access wrap it in a `parking_lot::Mutex` (matching the
/// engine's single-writer-per-log invariant, §4.4, §5).
pub struct Wal {
    path: PathBuf,
    write_file: File,
    write_seq: u64,
    processed_seq: u64,
    /// Byte offset `next_unprocessed` reads from next.
    read_offset: u64,
    pending_since_flush: usize,
    last_flush: Instant,
}

impl Wal {
    /// Open (creating if absent) the WAL at `path`. `processed_seq` seeds
    /// the read cursor, typically restored from the last snapshot taken at
    /// recovery (§4.7): entries at or below it are skipped by
    /// `next_unprocessed`/`entries_after`. On corruption (malformed JSON or
    /// non-UTF-8 bytes partway through the file), the valid prefix is kept,
    /// the original file is rotated to `.bak`/`.bak.2`/`.bak.3` (oldest
    /// evicted), and a clean file containing only the valid entries
    /// replaces it.
    pub fn open(path: impl AsRef<Path>, processed_seq: u64) -> Result<Self, WalError> {
        let path = path.as_ref().to_path_buf();

        let (valid_lines, had_corruption) = Self::scan(&path)?;

        if had_corruption {
            Self::rotate_backups(&path)?;
            Self::rewrite_clean(&path, &valid_lines)?;
        }

        let write_seq = valid_lines.last().map(|l| l.seq).unwrap_or(0);

        let write_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| WalError::Open { path: path.display().to_string(), source })?;

        let read_offset = Self::byte_len(&path)?.min(Self::byte_len(&path)?);
        // Readers start from the front; `next_unprocessed` skips anything
        // at or below `processed_seq` as it walks forward.
        let _ = read_offset;

        Ok(Self {
            path,
            write_file,
            write_seq,
            processed_seq,
            read_offset: 0,
            pending_since_flush: 0,
            last_flush: Instant::now(),
        })
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    pub fn mark_processed(&mut self, seq: u64) {
        if seq > self.processed_seq {
            self.processed_seq = seq;
        }
    }

    /// Append one record, assigning it the next sequence number. Returns
    /// only after the line has been written to the OS write buffer; callers
    /// that require durability must call [`Wal::flush`] (§4.4: `append`
    /// "returns only after durability" — the engine treats a still-buffered
    /// write as pending per §7 until `flush` succeeds).
    pub fn append(&mut self, record: &EventRecord) -> Result<u64, WalError> {
        let seq = self.write_seq + 1;
        let mut record = record.clone();
        record.seq = seq;
        let line = WalLine { seq, record };
        let json = serde_json::to_string(&line)?;
        writeln!(self.write_file, "{json}").map_err(WalError::Write)?;
        self.write_seq = seq;
        self.pending_since_flush += 1;
        Ok(seq)
    }

    pub fn needs_flush(&self) -> bool {
        self.pending_since_flush >= FLUSH_THRESHOLD
            || (self.pending_since_flush > 0 && self.last_flush.elapsed() >= FLUSH_INTERVAL)
    }

    /// Force the written lines to durable storage.
    pub fn flush(&mut self) -> Result<(), WalError> {
        self.write_file.flush().map_err(WalError::Flush)?;
        self.write_file.sync_data().map_err(WalError::Flush)?;
        self.pending_since_flush = 0;
        self.last_flush = Instant::now();
        Ok(())
    }

    /// Read the next entry past `processed_seq` and this reader's cursor.
    /// Returns `Ok(None)` at EOF. A corrupt line does not error: the cursor
    /// is advanced past it and `Ok(None)` is returned for that call, so the
    /// next call resumes at the following line (§4.4 callers are expected to
    /// re-poll; corruption here never blocks forward progress on later
    /// valid entries).
    pub fn next_unprocessed(&mut self) -> Result<Option<WalEntry>, WalError> {
        let mut reader = BufReader::new(File::open(&self.path).map_err(WalError::Read)?);
        reader.seek(SeekFrom::Start(self.read_offset)).map_err(WalError::Read)?;

        loop {
            let mut buf = Vec::new();
            let n = reader.read_until(b'\n', &mut buf).map_err(WalError::Read)?;
            if n == 0 {
                return Ok(None);
            }
            self.read_offset += n as u64;

            match parse_line(&buf) {
                Some(line) if line.seq > self.processed_seq => {
                    return Ok(Some(WalEntry { seq: line.seq, record: line.record }));
                }
                Some(_) => continue, // already processed, keep scanning forward
                None => return Ok(None), // corrupt: skip for this call, cursor already advanced
            }
        }
    }

    /// All entries with `seq > from_seq`, in sequence order. Stops (without
    /// erroring) at the first corrupt line encountered.
    pub fn entries_after(&self, from_seq: u64) -> Result<Vec<WalEntry>, WalError> {
        let file = File::open(&self.path).map_err(WalError::Read)?;
        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for line in reader.split(b'\n') {
            let buf = match line {
                Ok(b) => b,
                Err(_) => break,
            };
            if buf.is_empty() {
                continue;
            }
            match parse_line(&buf) {
                Some(line) if line.seq > from_seq => {
                    entries.push(WalEntry { seq: line.seq, record: line.record });
                }
                Some(_) => continue,
                None => break,
            }
        }

        Ok(entries)
    }

    /// Compact the log, dropping every entry with `seq < seq`. Snapshots are
    /// a recovery-time optimisation only (§9); the log remains the source
    /// of truth for everything retained.
    pub fn truncate_before(&mut self, seq: u64) -> Result<(), WalError> {
        let kept = self.entries_after(seq.saturating_sub(1))?;
        Self::rewrite_clean(&self.path, &kept.iter().map(|e| WalLine { seq: e.seq, record: e.record.clone() }).collect::<Vec<_>>())?;

        self.write_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| WalError::Open { path: self.path.display().to_string(), source })?;
        self.read_offset = 0;
        Ok(())
    }

    fn byte_len(path: &Path) -> Result<u64, WalError> {
        Ok(std::fs::metadata(path).map(|m| m.len()).unwrap_or(0))
    }

    /// Read the whole file, returning the valid prefix of parsed lines and
    /// whether any trailing corruption (malformed JSON or invalid UTF-8) was
    /// found.
    fn scan(path: &Path) -> Result<(Vec<WalLine>, bool), WalError> {
        let Ok(mut file) = File::open(path) else {
            return Ok((Vec::new(), false));
        };
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(WalError::Read)?;

        let mut valid = Vec::new();
        let mut had_corruption = false;
        for raw_line in bytes.split(|&b| b == b'\n') {
            if raw_line.is_empty() {
                continue;
            }
            match parse_line(raw_line) {
                Some(line) => valid.push(line),
                None => {
                    had_corruption = true;
                    break;
                }
            }
        }
        Ok((valid, had_corruption))
    }

    /// Rotate `path.bak` -> `path.bak.2` -> `path.bak.3`, evicting anything
    /// older, then move the current (corrupt) file to `path.bak`.
    fn rotate_backups(path: &Path) -> Result<(), WalError> {
        let bak3 = path.with_extension("bak.3");
        let bak2 = path.with_extension("bak.2");
        let bak1 = path.with_extension("bak");

        let _ = std::fs::remove_file(&bak3);
        if bak2.exists() {
            let _ = std::fs::rename(&bak2, &bak3);
        }
        if bak1.exists() {
            let _ = std::fs::rename(&bak1, &bak2);
        }
        std::fs::rename(path, &bak1).map_err(WalError::Read)?;
        Ok(())
    }

    fn rewrite_clean(path: &Path, lines: &[WalLine]) -> Result<(), WalError> {
        let mut file = File::create(path).map_err(WalError::Write)?;
        for line in lines {
            let json = serde_json::to_string(line)?;
            writeln!(file, "{json}").map_err(WalError::Write)?;
        }
        file.sync_data().map_err(WalError::Flush)?;
        Ok(())
    }
}

fn parse_line(raw: &[u8]) -> Option<WalLine> {
    let text = std::str::from_utf8(raw).ok()?;
    let trimmed = text.trim_end_matches(['\n', '\r']);
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
