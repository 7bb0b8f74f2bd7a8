//! Analytics dashboard
//!
//! Reads aggregated analytics for a quiz and renders them in the terminal.
//!
//! # Modules
//!
//! - [`report`]: typed analytics payloads
//! - [`snapshot`]: one fetched report plus its raw payload, and export
//! - [`source`]: where analytics come from ([`source::HttpAnalyticsSource`])
//! - [`view`]: pure view models (counters, funnel, drop-off, answers)
//! - [`chart`]: the [`chart::ChartRenderer`] seam and a text renderer
//! - [`render`]: terminal tables and banners
//! - [`controller`]: the full-report [`Dashboard`]
//! - [`live`]: the quiz list and live summary

pub mod chart;
pub mod controller;
pub mod live;
pub mod render;
pub mod report;
pub mod snapshot;
pub mod source;
pub mod view;

pub use chart::{ChartRenderer, TextChartRenderer};
pub use controller::Dashboard;
pub use live::LiveSummary;
pub use snapshot::AnalyticsSnapshot;
pub use source::{AnalyticsSource, HttpAnalyticsSource};
