use crate::analysis::Analysis;
use crate::config::Config;
use crate::engine::Engine;
use anyhow::{Context, Result};
use glob::glob;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(sim_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    pub fn create_run(&self) -> Result<()> {
        let run_dirs = self.run_dirs().context("failed to list run dirs")?;
        let run_idx = next_run_idx(&run_dirs);

        let run_dir = self.run_dir(run_idx);
        fs::create_dir_all(&run_dir).with_context(|| format!("failed to create {run_dir:?}"))?;
        log::info!("created {run_dir:?}");

        let mut engine = Engine::generate_initial_condition(self.cfg.clone())
            .context("failed to generate initial condition")?;

        engine
            .perform_simulation(&run_dir)
            .context("failed to perform simulation")?;

        Ok(())
    }

    pub fn analyze_sim(&self) -> Result<()> {
        for run_dir in self.run_dirs().context("failed to list run dirs")? {
            let report_file = run_dir.join("report.msgpack");
            let analysis = Analysis::from_report(&report_file)
                .with_context(|| format!("failed to analyze {report_file:?}"))?;

            let file = run_dir.join("analysis.toml");
            analysis.save(&file).context("failed to save analysis")?;
            log::info!("saved {file:?}");
        }

        Ok(())
    }

    pub fn clean_sim(&self) -> Result<()> {
        for run_dir in self.run_dirs().context("failed to list run dirs")? {
            fs::remove_dir_all(&run_dir)
                .with_context(|| format!("failed to remove {run_dir:?}"))?;
            log::info!("removed {run_dir:?}");
        }

        Ok(())
    }

    fn run_dirs(&self) -> Result<Vec<PathBuf>> {
        let pattern = self.sim_dir.join("run-*");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let dirs = glob(pattern)
            .context("failed to glob run dirs")?
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .collect();
        Ok(dirs)
    }

    fn run_dir(&self, run_idx: usize) -> PathBuf {
        self.sim_dir.join(format!("run-{run_idx:04}"))
    }
}

/// Index following the highest `run-NNNN` dir, so gaps left by removed runs
/// never cause an existing run to be overwritten.
fn next_run_idx(run_dirs: &[PathBuf]) -> usize {
    run_dirs
        .iter()
        .filter_map(|dir| dir.file_name()?.to_str()?.strip_prefix("run-")?.parse().ok())
        .map(|idx: usize| idx + 1)
        .max()
        .unwrap_or(0)
}
