//! Inertial reference frames supported by the ephemeris layer
//!
//! Only the two frames used by planetary and small-body kernels are known:
//! the equatorial J2000 frame and the mean ecliptic of J2000.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use nalgebra::{Matrix3, Rotation3, Vector3, Vector6};

use crate::constants::{ARCSEC2RAD, OBLIQUITY_J2000_ARCSEC};
use crate::{Result, SpiceToolsError};

lazy_static! {
    /// Rotation taking J2000 vectors into ECLIPJ2000
    static ref J2000_TO_ECLIPJ2000: Matrix3<f64> =
        Rotation3::from_axis_angle(&Vector3::x_axis(), -OBLIQUITY_J2000_ARCSEC * ARCSEC2RAD)
            .into_inner();
}

/// A supported inertial frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frame {
    J2000,
    EclipJ2000,
}

impl Frame {
    /// NAIF frame ID as stored in SPK segment summaries
    pub fn id(self) -> i32 {
        match self {
            Frame::J2000 => 1,
            Frame::EclipJ2000 => 17,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Frame::J2000 => "J2000",
            Frame::EclipJ2000 => "ECLIPJ2000",
        }
    }

    pub fn from_id(id: i32) -> Result<Self> {
        match id {
            1 => Ok(Frame::J2000),
            17 => Ok(Frame::EclipJ2000),
            other => Err(SpiceToolsError::Frame(format!(
                "Frame ID {} is not a supported inertial frame",
                other
            ))),
        }
    }

    /// Matrix rotating vectors from J2000 into this frame
    fn from_j2000(self) -> Matrix3<f64> {
        match self {
            Frame::J2000 => Matrix3::identity(),
            Frame::EclipJ2000 => *J2000_TO_ECLIPJ2000,
        }
    }
}

impl FromStr for Frame {
    type Err = SpiceToolsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "J2000" | "EME2000" => Ok(Frame::J2000),
            "ECLIPJ2000" => Ok(Frame::EclipJ2000),
            other => Err(SpiceToolsError::Frame(format!(
                "Frame {:?} is not a supported inertial frame",
                other
            ))),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rotation matrix taking vectors in `from` to vectors in `to`
pub fn rotation(from: Frame, to: Frame) -> Matrix3<f64> {
    if from == to {
        return Matrix3::identity();
    }
    to.from_j2000() * from.from_j2000().transpose()
}

/// Rotate a position vector between frames
pub fn rotate_vector(vector: &Vector3<f64>, from: Frame, to: Frame) -> Vector3<f64> {
    rotation(from, to) * vector
}

/// Rotate a position/velocity state between inertial frames
pub fn rotate_state(state: &Vector6<f64>, from: Frame, to: Frame) -> Vector6<f64> {
    let m = rotation(from, to);
    let position = m * state.fixed_rows::<3>(0);
    let velocity = m * state.fixed_rows::<3>(3);
    Vector6::new(
        position[0], position[1], position[2], velocity[0], velocity[1], velocity[2],
    )
}
