use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};

use crate::types::ServerLogEntry;

const MISSING_MESSAGE: &str = "No message content";

/// Appends server log entries grouped under one header per turn. Entries at
/// or before the last written tick are skipped, so the same batch can be
/// offered again every turn.
pub struct TurnLogWriter<W: Write> {
    out: W,
    last_tick: Option<u64>,
}

impl TurnLogWriter<File> {
    /// Opens `round_<timestamp>.log` inside `dir`, creating the directory.
    pub fn create_in(dir: impl AsRef<Path>) -> io::Result<(Self, PathBuf)> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("round_{}.log", Utc::now().format("%Y%m%d_%H%M%S")));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok((Self::new(file), path))
    }
}

impl<W: Write> TurnLogWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last_tick: None,
        }
    }

    pub fn last_tick(&self) -> Option<u64> {
        self.last_tick
    }

    /// Writes the entries newer than anything written so far. Returns the
    /// number of message lines written.
    pub fn append(&mut self, entries: &[ServerLogEntry]) -> io::Result<usize> {
        let mut fresh: Vec<(u64, &str)> = entries
            .iter()
            .filter_map(|entry| {
                let tick = entry.tick?;
                let message = entry.message.as_deref().unwrap_or(MISSING_MESSAGE);
                Some((tick, message))
            })
            .filter(|(tick, _)| self.last_tick.map_or(true, |last| *tick > last))
            .collect();
        if fresh.is_empty() {
            return Ok(0);
        }
        fresh.sort_by_key(|(tick, _)| *tick);

        let mut current = None;
        for (tick, message) in &fresh {
            if current != Some(*tick) {
                writeln!(self.out, "--- Turn {tick} ---")?;
                current = Some(*tick);
            }
            writeln!(self.out, "[LOG] {message}")?;
        }
        self.out.flush()?;
        self.last_tick = current;
        Ok(fresh.len())
    }

    pub fn mark_round_end(&mut self) -> io::Result<()> {
        writeln!(
            self.out,
            "=== Round finished {} ===",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        )?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(tick: Option<u64>, message: Option<&str>) -> ServerLogEntry {
        ServerLogEntry {
            tick,
            message: message.map(str::to_string),
            time: None,
        }
    }

    #[test]
    fn entries_are_grouped_under_sorted_turn_headers() {
        let mut writer = TurnLogWriter::new(Vec::new());
        let written = writer
            .append(&[
                entry(Some(3), Some("late")),
                entry(Some(2), Some("first")),
                entry(None, Some("no tick")),
                entry(Some(2), None),
            ])
            .expect("write");
        assert_eq!(written, 3);
        assert_eq!(writer.last_tick(), Some(3));

        let text = String::from_utf8(writer.into_inner()).expect("utf8");
        assert_eq!(
            text,
            "--- Turn 2 ---\n[LOG] first\n[LOG] No message content\n--- Turn 3 ---\n[LOG] late\n"
        );
    }

    #[test]
    fn already_written_ticks_are_skipped() {
        let mut writer = TurnLogWriter::new(Vec::new());
        writer.append(&[entry(Some(5), Some("a"))]).expect("write");
        let written = writer
            .append(&[entry(Some(5), Some("a")), entry(Some(6), Some("b"))])
            .expect("write");
        assert_eq!(written, 1);
        assert_eq!(writer.append(&[]).expect("write"), 0);

        let text = String::from_utf8(writer.into_inner()).expect("utf8");
        assert_eq!(text.matches("--- Turn 5 ---").count(), 1);
        assert!(text.ends_with("--- Turn 6 ---\n[LOG] b\n"));
    }

    #[test]
    fn round_log_file_is_created_with_marker() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (mut writer, path) = TurnLogWriter::create_in(dir.path().join("logs")).expect("create");
        writer.append(&[entry(Some(1), Some("go"))]).expect("write");
        writer.mark_round_end().expect("marker");
        drop(writer);

        let name = path.file_name().and_then(|n| n.to_str()).expect("name");
        assert!(name.starts_with("round_") && name.ends_with(".log"));
        let text = fs::read_to_string(&path).expect("read");
        assert!(text.starts_with("--- Turn 1 ---\n[LOG] go\n=== Round finished "));
    }
}
