use serde_derive::Deserialize;

use super::{Cell, ForecastSnapshot};
use crate::error::DataSourceError;

#[derive(Debug, Deserialize)]
pub struct Response {
    #[serde(rename = "Observation Time")]
    observation_time: String,
    #[serde(rename = "Forecast Time", default)]
    forecast_time: Option<String>,
    coordinates: Vec<(f64, f64, u8)>,
}

impl Response {
    pub fn to_snapshot(&self) -> Result<ForecastSnapshot, DataSourceError> {
        let cells = self
            .coordinates
            .iter()
            .map(|&(lng, lat, p)| Cell::new(lng, lat, p))
            .collect();
        ForecastSnapshot::new(
            &self.observation_time,
            self.forecast_time.as_deref(),
            cells,
        )
    }
}
