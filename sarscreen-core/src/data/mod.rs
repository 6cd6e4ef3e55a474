//! Data sources: provider trait, concrete providers, and the ticker universe.

pub mod circuit_breaker;
pub mod csv_dir;
pub mod provider;
pub mod synthetic;
pub mod universe;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use csv_dir::CsvDirProvider;
pub use provider::{fetch_with_timeout, DataError, DataProvider, DataSource, FetchResult};
pub use synthetic::SyntheticProvider;
pub use universe::{Universe, UniverseEntry, UniverseError, UniverseOptions};
pub use yahoo::YahooProvider;
