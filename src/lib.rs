pub mod calculator;
pub mod calendar;
pub mod classify;
pub mod config;
pub mod error;
pub mod fetch;
pub mod geo;
pub mod index;
pub mod rates;
pub mod store;
pub mod view;

pub use config::AppConfig;
pub use error::{ClassifyError, ConfigError, DataFormatError, StoreError};
pub use store::{DivisionIndexStore, Resolution};
