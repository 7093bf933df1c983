//! Data core of the admin calendar: turns user and job records from the
//! portal API into calendar events, caches fetched views, survives flaky
//! endpoints and drives a headless calendar view.

pub mod batch;
pub mod builder;
pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod mock;
pub mod notice;
pub mod orchestrator;
pub mod probe;
pub mod source;
pub mod store;

#[cfg(test)]
mod testing;

pub use batch::{BatchConfig, BatchRenderer, Visibility};
pub use builder::{BuildReport, EventBuilder, MissingResumeDate};
pub use config::{AppConfig, Environment, SourceConfig};
pub use controller::{CalendarController, ControllerConfig, ViewState};
pub use error::{CalendarError, CalendarResult};
pub use export::ExportFormat;
pub use notice::{Notice, NoticeLevel};
pub use orchestrator::{CalendarService, DataOrigin, FetchConfig, FetchOutcome, FetchRequest};
pub use source::{DataSource, HttpSource};
pub use store::{FilterStore, JsonStore};
