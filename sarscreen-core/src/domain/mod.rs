//! Domain types for SARSCREEN

pub mod bar;
pub mod window;

pub use bar::{Bar, PriceSeries};
pub use window::AggregationWindow;
