use crate::model::Stat;
use crate::report::Report;
use crate::stats::{Accumulator, AccumulatorReport};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Summary of one run's report.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub n_agents: usize,
    pub duration: u64,
    pub peak_touched: usize,
    pub peak_time: u64,
    /// Fraction of agents no longer live at the end.
    pub attack_rate: f64,
    /// Counts at the last recorded second.
    pub last: Stat,
    /// Touched count over the run.
    pub touched: AccumulatorReport,
}

impl Analysis {
    pub fn new(stats: &[Stat]) -> Result<Self> {
        let (Some(first), Some(last)) = (stats.first(), stats.last()) else {
            bail!("report is empty");
        };

        let mut acc = Accumulator::new();
        let mut peak = first;
        for stat in stats {
            acc.add(stat.touched as f64);
            if stat.touched > peak.touched {
                peak = stat;
            }
        }

        let n_agents = last.total();
        let attack_rate = if n_agents == 0 {
            0.0
        } else {
            (n_agents - last.live) as f64 / n_agents as f64
        };

        Ok(Self {
            n_agents,
            duration: last.time - first.time,
            peak_touched: peak.touched,
            peak_time: peak.time,
            attack_rate,
            last: *last,
            touched: acc.report(),
        })
    }

    /// Analyze the report saved in `report_file`.
    pub fn from_report<P: AsRef<Path>>(report_file: P) -> Result<Self> {
        let report = Report::load(report_file).context("failed to load report")?;
        Self::new(report.stats())
    }

    pub fn save<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let contents = toml::to_string_pretty(self).context("failed to serialize analysis")?;
        fs::write(file, contents).with_context(|| format!("failed to write {file:?}"))?;
        Ok(())
    }
}
