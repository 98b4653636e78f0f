//! JPL web services: small-body database, Horizons and kernel downloads

pub mod download;
pub mod horizons;
pub mod sbdb;
mod table;

pub use download::{download_generic_kernel, download_generic_kernel_with, download_jpl_de, download_jpl_de_with};
pub use horizons::{EphemType, HorizonsQuery};
pub use sbdb::{Numbering, SbGroup, SbKind, SbdbQuery};
pub use table::Table;
