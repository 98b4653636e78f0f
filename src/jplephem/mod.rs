//! JPL Ephemeris module for reading binary SPK kernels
//!
//! JPL Ephemerides and small-body trajectories are distributed as binary SPK
//! (Spacecraft Planet Kernel) files in the SPICE DAF container. This module
//! provides Rust implementations of the file readers and the interpolation
//! algorithms needed to extract states from them.
//!
//! # Main Components
//!
//! - `daf`: Double Array File format reader (underlying format of SPK files)
//! - `spk`: SPK segment index and evaluation
//! - `chebyshev`: Chebyshev series for segment types 2 and 3
//! - `mda`: modified difference arrays for segment types 1 and 21
//! - `names`: Mappings between celestial body names and ID numbers

pub mod calendar;
pub mod chebyshev;
pub mod daf;
pub mod errors;
pub mod mda;
pub mod names;
pub mod spk;

#[cfg(test)]
pub(crate) mod testdata;

// Re-export primary types for convenience
pub use self::errors::JplephemError;
pub use self::spk::{Segment, SPK};
