//! Type definitions for the price signal server

pub mod log_entry;
pub mod request;
pub mod signal;

pub use log_entry::LogEntry;
pub use request::PredictionRequest;
pub use signal::Signal;
