use crate::clock::{Clock, SteppedTime, TimeSource, WallTime};
use crate::collision::{CollisionHandler, NoContact, Transmission};
use crate::config::{Config, ContactRule};
use crate::population::Population;
use crate::render;
use crate::report::{Metrics, Report, ReportSink};
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use std::{
    path::Path,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

/// Simulation engine.
///
/// Holds the configuration, the population and the frame clock, and drives
/// the frame loop until the epidemic is over or time runs out.
pub struct Engine {
    cfg: Config,
    pop: Population,
    clock: Clock<Box<dyn TimeSource>>,
    report: Report,
}

impl Engine {
    /// Create a new `Engine` with the given configuration and a random initial state.
    pub fn generate_initial_condition(cfg: Config) -> Result<Self> {
        let rng = match cfg.run.seed {
            Some(seed) => ChaCha12Rng::seed_from_u64(seed),
            None => ChaCha12Rng::try_from_os_rng().context("failed to seed rng")?,
        };

        let handler: Arc<dyn CollisionHandler> = match cfg.model.contact {
            ContactRule::Transmit => Arc::new(Transmission),
            ContactRule::Ignore => Arc::new(NoContact),
        };
        let (n_agents, n_touched) = cfg.init.counts();
        let pop = Population::new(&cfg.model, n_agents, n_touched, rng).with_handler(handler);

        let source: Box<dyn TimeSource> = match cfg.run.frame_dt {
            Some(frame_dt) => Box::new(SteppedTime::new(Duration::from_secs_f64(frame_dt))),
            None => Box::new(WallTime::new()),
        };

        let mut report = Report::new();
        report.record(pop.snapshot());

        Ok(Self {
            clock: Clock::new(source),
            cfg,
            pop,
            report,
        })
    }

    /// Run the frame loop to completion and save the outputs into `run_dir`.
    pub fn perform_simulation<P: AsRef<Path>>(&mut self, run_dir: P) -> Result<()> {
        let run_dir = run_dir.as_ref();

        while self.pop.running() && self.pop.elapsed_seconds() < self.cfg.run.max_seconds {
            let frame_start = Instant::now();

            self.perform_frame();

            if self.cfg.run.frame_dt.is_none() {
                let period = Duration::from_secs_f64(1.0 / self.cfg.run.max_fps as f64);
                if let Some(rest) = period.checked_sub(frame_start.elapsed()) {
                    thread::sleep(rest);
                }
            }
        }

        if self.pop.running() {
            log::info!("reached {}s, stopping", self.cfg.run.max_seconds);
        } else {
            log::info!("epidemic over after {}s", self.pop.elapsed_seconds());
        }

        self.save_outputs(run_dir).context("failed to save outputs")?;

        Ok(())
    }

    fn perform_frame(&mut self) {
        let tick = self.clock.tick();

        self.pop.step(tick.dt);

        if let Some(fps) = tick.fps {
            let stat = self.pop.advance_second();
            self.report.record(stat);

            let metrics = Metrics {
                elapsed_seconds: self.pop.elapsed_seconds(),
                frames_per_second: fps,
                counts: *self.pop.counts(),
            };
            log::info!("{metrics}");
        }

        self.pop.update_running();
    }

    fn save_outputs(&self, run_dir: &Path) -> Result<()> {
        let file = run_dir.join("report.msgpack");
        self.report.save(&file)?;
        log::info!("saved {file:?}");

        let file = run_dir.join("report.svg");
        render::write_svg(&file, &render::report_svg(self.report.stats()))?;
        log::info!("saved {file:?}");

        let file = run_dir.join("final.svg");
        let svg = render::frame_svg(self.pop.bounds(), self.pop.sprites());
        render::write_svg(&file, &svg)?;
        log::info!("saved {file:?}");

        Ok(())
    }
}
