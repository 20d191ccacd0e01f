//! Client for the NOAA Space Weather Prediction Center OVATION aurora feed.
//!
//! The feed is a single JSON document holding the latest 30-minute aurora
//! forecast as a 1°×1° raster of `[longitude, latitude, probability]` cells,
//! longitude-major, longitude 0..360 eastward and latitude -90..=90.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use reqwest::blocking;
use reqwest::header::USER_AGENT;
use reqwest::StatusCode;
use std::rc::Rc;

use crate::coord::Coordinate;
use crate::error::DataSourceError;

mod json;

pub const DEFAULT_ENDPOINT: &str = "https://services.swpc.noaa.gov/json/ovation_aurora_latest.json";

/// Something that can produce the latest forecast.
pub trait ForecastSource {
    fn fetch(&self) -> Result<ForecastSnapshot, DataSourceError>;
}

#[derive(Debug)]
struct ClientState {
    ua: String,
    endpoint: String,
    client: blocking::Client,
}

#[derive(Clone, Debug)]
pub struct Client {
    state: Rc<ClientState>,
}

impl Client {
    pub fn new(ua: &str, endpoint: &str) -> Client {
        Client {
            state: Rc::new(ClientState {
                ua: ua.to_string(),
                endpoint: endpoint.to_string(),
                client: blocking::Client::new(),
            }),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.state.endpoint
    }
}

impl ForecastSource for Client {
    fn fetch(&self) -> Result<ForecastSnapshot, DataSourceError> {
        let res = self
            .state
            .client
            .get(&self.state.endpoint)
            .header(USER_AGENT, &self.state.ua)
            .send()?;

        let status = res.status();
        tracing::debug!("fetched {} ({})", self.state.endpoint, status);
        if status != StatusCode::OK {
            return Err(DataSourceError::Status(status));
        }

        let body = res.text()?;
        let res = serde_json::from_str::<json::Response>(&body)?;
        res.to_snapshot()
    }
}

/// How the user's probability is picked out of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Lookup {
    /// Index straight into the raster with [`Coordinate::grid_index`].
    #[default]
    Index,
    /// Scan every cell for the one closest to [`Coordinate::feed_position`].
    Nearest,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    lng: f64,
    lat: f64,
    probability: u8,
}

impl Cell {
    pub fn new(lng: f64, lat: f64, probability: u8) -> Cell {
        Cell {
            lng,
            lat,
            probability,
        }
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn probability(&self) -> u8 {
        self.probability
    }

    fn distance_sq(&self, (lng, lat): (f64, f64)) -> f64 {
        (self.lng - lng).powi(2) + (self.lat - lat).powi(2)
    }
}

#[derive(Debug, Clone)]
pub struct ForecastSnapshot {
    observation_time: String,
    observed_at: DateTime<FixedOffset>,
    forecast_time: Option<String>,
    cells: Vec<Cell>,
}

impl ForecastSnapshot {
    pub fn new(
        observation_time: &str,
        forecast_time: Option<&str>,
        cells: Vec<Cell>,
    ) -> Result<ForecastSnapshot, DataSourceError> {
        Ok(ForecastSnapshot {
            observation_time: observation_time.to_string(),
            observed_at: parse_timestamp(observation_time)?,
            forecast_time: forecast_time.map(str::to_string),
            cells,
        })
    }

    /// The feed's own observation stamp, verbatim. Used as the change key.
    pub fn observation_time(&self) -> &str {
        &self.observation_time
    }

    pub fn observed_at(&self) -> DateTime<FixedOffset> {
        self.observed_at
    }

    pub fn forecast_time(&self) -> Option<&str> {
        self.forecast_time.as_deref()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn probability_at(&self, loc: &Coordinate, lookup: Lookup) -> Result<u8, DataSourceError> {
        match lookup {
            Lookup::Index => {
                let index = loc.grid_index().get();
                self.cells
                    .get(index)
                    .map(Cell::probability)
                    .ok_or(DataSourceError::MissingCell {
                        index,
                        len: self.cells.len(),
                    })
            }
            Lookup::Nearest => self
                .nearest(loc)
                .map(Cell::probability)
                .ok_or(DataSourceError::EmptyGrid),
        }
    }

    /// Closest cell by Euclidean distance in feed coordinates. Ties go to the
    /// earlier cell.
    pub fn nearest(&self, loc: &Coordinate) -> Option<&Cell> {
        let pos = loc.feed_position();
        let mut best: Option<(&Cell, f64)> = None;
        for cell in &self.cells {
            let d = cell.distance_sq(pos);
            match best {
                Some((_, bd)) if bd <= d => {}
                _ => best = Some((cell, d)),
            }
        }
        best.map(|(cell, _)| cell)
    }
}

/// Accepts RFC 3339 stamps, and offset-less ISO-8601 stamps taken as UTC.
fn parse_timestamp(s: &str) -> Result<DateTime<FixedOffset>, DataSourceError> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t);
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|t| t.and_utc().fixed_offset())
        .map_err(|source| DataSourceError::Timestamp {
            value: s.to_string(),
            source,
        })
}
