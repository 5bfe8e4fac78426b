mod aggregate;
mod cell;
mod config;
mod error;
mod header;
mod metadata;
mod pipeline;
mod rules;
mod tracker;

pub use config::FormatConfig;
pub use pipeline::{Ingestion, TimetableParser};
