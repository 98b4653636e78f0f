//! Constants module for unit conversions and ephemeris arithmetic

use std::f64::consts::PI;

// Angles
/// Radians to degrees conversion factor
pub const R2D: f64 = 180.0 / PI;
/// Degrees to radians conversion factor
pub const D2R: f64 = PI / 180.0;
/// Arcseconds to radians conversion factor
pub const ARCSEC2RAD: f64 = D2R / 3600.0;

// Astronomical distances
/// Astronomical Unit in kilometers (per IAU 2012 Resolution B2)
pub const AU2KM: f64 = 149_597_870.700;
/// Kilometers to Astronomical Units
pub const KM2AU: f64 = 1.0 / AU2KM;

// Time constants
/// Seconds in a day
pub const DAY_S: f64 = 86_400.0;
/// J2000.0 epoch as Julian date
pub const J2000_JD: f64 = 2_451_545.0;
/// TT minus TAI in seconds
pub const TT_MINUS_TAI_S: f64 = 32.184;

// Physics
/// Speed of light in km/s
pub const SPEED_OF_LIGHT_KM_S: f64 = 299_792.458;

// Frames
/// Mean obliquity of the ecliptic at J2000 used for the ECLIPJ2000 frame (arcsec)
pub const OBLIQUITY_J2000_ARCSEC: f64 = 84_381.448;
