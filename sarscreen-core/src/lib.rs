//! SARSCREEN Core: domain types, N-day resampling, Parabolic SAR, signal rule.
//!
//! This crate contains the per-ticker computation and the data plumbing
//! around it:
//! - Domain types (bars, price series, aggregation windows)
//! - Epoch-anchored N-day resampling
//! - Parabolic SAR engine with an explicit recursion state
//! - SAR proximity signal
//! - Data providers (Yahoo Finance, CSV directory, synthetic) and the
//!   ticker universe reader

pub mod data;
pub mod domain;
pub mod indicators;
pub mod resample;
pub mod signal;
