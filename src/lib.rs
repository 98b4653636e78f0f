//! spicetools: ephemeris conveniences around SPICE kernels and JPL web services
//!
//! This crate writes kernel meta-files, loads SPK and text kernels, evaluates
//! geometric and aberration-corrected states, converts UTC to ephemeris time,
//! and queries the JPL Small-Body Database and Horizons services.

use thiserror::Error;

pub mod config;
pub mod constants;
pub mod ephem;
pub mod fastfunc;
pub mod frames;
pub mod jplephem;
pub mod kernel;
pub mod marshal;
pub mod phase;
pub mod query;
pub mod time;

// Re-export commonly used types
pub use config::Config;
pub use ephem::{Aberration, Ephemeris, RefLoc};
pub use frames::Frame;
pub use kernel::{make_meta, KernelPool, MetaKernel};
pub use phase::iau_hg_model;
pub use query::{download_jpl_de, HorizonsQuery, SbdbQuery, Table};
pub use time::{str2et, times2et, LeapSeconds};

/// Main error type for the spicetools library
#[derive(Debug, Error)]
pub enum SpiceToolsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ephemeris error: {0}")]
    Ephemeris(#[from] jplephem::JplephemError),

    #[error("Time error: {0}")]
    Time(#[from] time::TimeError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("String contains an interior NUL byte: {0}")]
    Nul(#[from] std::ffi::NulError),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Kernel pool error: {0}")]
    KernelPool(String),

    #[error("Frame error: {0}")]
    Frame(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),
}

/// Result type for spicetools operations
pub type Result<T> = std::result::Result<T, SpiceToolsError>;
