use chrono::Local;
use std::collections::VecDeque;
use std::io::Write;
use std::time::Duration;

use crate::context::Context;
use crate::coord::{Coordinate, LongitudeConvention};
use crate::error::{DataSourceError, Error};
use crate::notify::{self, Formatter, Severity};
use crate::swpc::{ForecastSnapshot, ForecastSource, Lookup, DEFAULT_ENDPOINT};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(90);

/// Samples kept for `--graph`.
const GRAPH_HISTORY: usize = 60;

/// Everything the poller needs to know, fixed at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub location: Coordinate,
    pub lookup: Lookup,
    pub notify_global: bool,
    pub threshold: Option<u8>,
    pub interval: Duration,
    pub quiet: bool,
    pub graph: bool,
    pub retries: u32,
    pub longitude_convention: LongitudeConvention,
    pub endpoint: String,
    pub user_agent: String,
}

impl Config {
    pub fn new(location: Coordinate) -> Config {
        Config {
            location,
            lookup: Lookup::default(),
            notify_global: false,
            threshold: None,
            interval: DEFAULT_INTERVAL,
            quiet: false,
            graph: false,
            retries: 0,
            longitude_convention: LongitudeConvention::default(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: concat!("aurora-watch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// What one forecast did to the poll state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// The feed carried a new observation time.
    pub forecast_updated: bool,
    /// Probability at the user's location; only read on a forecast update.
    pub probability: Option<u8>,
    /// The probability should be reported to the user.
    pub notify: bool,
}

/// Change-detection state carried between iterations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollState {
    last_observation_time: Option<String>,
    last_notified_probability: Option<u8>,
}

impl PollState {
    pub fn last_observation_time(&self) -> Option<&str> {
        self.last_observation_time.as_deref()
    }

    pub fn last_notified_probability(&self) -> Option<u8> {
        self.last_notified_probability
    }

    pub fn observe(
        &mut self,
        snap: &ForecastSnapshot,
        config: &Config,
    ) -> Result<Observation, DataSourceError> {
        let mut obs = Observation {
            forecast_updated: self.last_observation_time() != Some(snap.observation_time()),
            probability: None,
            notify: false,
        };

        if obs.forecast_updated {
            let p = snap.probability_at(&config.location, config.lookup)?;
            let passes = config.threshold.map_or(true, |t| p >= t);
            obs.notify = passes && self.last_notified_probability != Some(p);
            obs.probability = Some(p);
            // Recorded even when the threshold held the message back.
            self.last_notified_probability = Some(p);
        }

        self.last_observation_time = Some(snap.observation_time().to_string());
        Ok(obs)
    }
}

pub struct Poller<S, W> {
    config: Config,
    source: S,
    out: W,
    fmt: Formatter,
    state: PollState,
    history: VecDeque<u8>,
}

impl<S: ForecastSource, W: Write> Poller<S, W> {
    pub fn new(config: Config, source: S, out: W, fmt: Formatter) -> Poller<S, W> {
        Poller {
            config,
            source,
            out,
            fmt,
            state: PollState::default(),
            history: VecDeque::with_capacity(GRAPH_HISTORY),
        }
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Poll until `ctx` is cancelled or a fetch fails for good.
    pub fn run(&mut self, ctx: &Context) -> Result<(), Error> {
        if !self.config.quiet {
            let (lat, lng) = self
                .config
                .location
                .to_cardinal(self.config.longitude_convention);
            let line = format!("Location set to {} {}", lat, lng);
            writeln!(self.out, "{}", self.fmt.heading(&line))?;
        }
        tracing::info!(
            "watching {} (cell {}) every {:?}",
            self.config.location,
            self.config.location.grid_index(),
            self.config.interval
        );

        while !ctx.is_cancelled() {
            self.poll_once(ctx)?;
            if ctx.wait_timeout(self.config.interval) {
                break;
            }
        }
        tracing::info!("poll loop stopped");
        Ok(())
    }

    /// One fetch-compare-report pass, without the trailing sleep. Returns
    /// `None` if cancelled while waiting to retry a fetch.
    pub fn poll_once(&mut self, ctx: &Context) -> Result<Option<Observation>, Error> {
        if !self.config.quiet {
            writeln!(self.out, "Checking NOAA @ {}", now())?;
        }

        let snap = match self.fetch(ctx)? {
            Some(snap) => snap,
            None => return Ok(None),
        };
        let obs = self.state.observe(&snap, &self.config)?;

        if obs.forecast_updated {
            tracing::info!("new forecast observed at {}", snap.observation_time());
            if self.config.notify_global && !self.config.quiet {
                let mut line = format!("\t{} @ {}", self.fmt.bold("UPDATED FORECAST"), now());
                if let Some(t) = snap.forecast_time() {
                    line.push_str(&format!(" (forecast for {})", t));
                }
                writeln!(self.out, "{}", line)?;
            }
        }

        if let Some(p) = obs.probability {
            let severity = Severity::classify(p);
            tracing::debug!("probability {}% ({}), notify: {}", p, severity, obs.notify);
            if obs.notify {
                writeln!(
                    self.out,
                    "\t({}): {}: {}",
                    now(),
                    self.fmt.heading("UPDATE IN YOUR AREA"),
                    self.fmt.format(p, severity)
                )?;
            }
            if self.config.graph {
                self.record(p)?;
            }
        }

        if !self.config.quiet {
            let local = snap.observed_at().with_timezone(&Local);
            writeln!(self.out, "Last update at {}", local.format("%H:%M"))?;
        }
        Ok(Some(obs))
    }

    fn fetch(&mut self, ctx: &Context) -> Result<Option<ForecastSnapshot>, DataSourceError> {
        let mut attempt = 0;
        loop {
            match self.source.fetch() {
                Ok(snap) => return Ok(Some(snap)),
                Err(e) if attempt < self.config.retries => {
                    attempt += 1;
                    tracing::warn!(
                        "fetch failed ({}), retry {} of {}",
                        e,
                        attempt,
                        self.config.retries
                    );
                    if ctx.wait_timeout(self.config.interval) {
                        return Ok(None);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn record(&mut self, p: u8) -> Result<(), Error> {
        if self.history.len() == GRAPH_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(p);
        if !self.config.quiet {
            let samples: Vec<u8> = self.history.iter().copied().collect();
            writeln!(self.out, "\t{} {}%", notify::sparkline(&samples), p)?;
        }
        Ok(())
    }
}

fn now() -> String {
    Local::now().format("%H:%M").to_string()
}
