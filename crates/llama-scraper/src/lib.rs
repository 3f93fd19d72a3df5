//! Scraper internals: pulls `/influxdata` off each collector and rewrites
//! the points into InfluxDB line protocol.

pub mod client;
pub mod influx;

pub use client::{CollectorClient, ScrapeError};
pub use influx::{InfluxSink, WriteError};
