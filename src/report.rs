use crate::model::{Counts, Stat, State};
use anyhow::{Context, Result};
use rmp_serde::{decode, encode};
use std::{
    fmt,
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Destination of the per-second stats.
///
/// Recording is fire-and-forget: a sink that cannot take a stat right now
/// must buffer or drop it, never block or fail.
pub trait ReportSink {
    fn record(&mut self, stat: Stat);
}

/// Append-only in-memory report.
#[derive(Debug, Default)]
pub struct Report {
    stats: Vec<Stat>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &[Stat] {
        &self.stats
    }

    /// Save the report to a MessagePack file.
    pub fn save<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        encode::write(&mut writer, &self.stats).context("failed to serialize report")?;
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }

    /// Load a report saved by [`Report::save`].
    pub fn load<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);
        let stats = decode::from_read(&mut reader).context("failed to deserialize report")?;
        Ok(Self { stats })
    }
}

impl ReportSink for Report {
    fn record(&mut self, stat: Stat) {
        self.stats.push(stat);
    }
}

/// Status published once per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub elapsed_seconds: u64,
    pub frames_per_second: u32,
    pub counts: Counts,
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Time {}s, FPS: {} - Live {}, Touched {}, Cured {}, Dead {}",
            self.elapsed_seconds,
            self.frames_per_second,
            self.counts[State::Live],
            self.counts[State::Touched],
            self.counts[State::Cured],
            self.counts[State::Dead],
        )
    }
}
