//! Watches the NOAA SWPC aurora forecast for one location and reports when
//! the chance of seeing an aurora there changes.

pub mod context;
pub mod coord;
pub mod error;
pub mod notify;
pub mod poller;
pub mod swpc;
