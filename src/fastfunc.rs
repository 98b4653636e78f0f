//! Prebound state evaluators for tight loops
//!
//! [`Spkgps`] and [`Spkcvo`] parse and validate the arguments that stay
//! fixed across calls (frames, observer, aberration flags) once, so each
//! evaluation only resolves the target and runs the state computation.

use nalgebra::{Vector3, Vector6};

use crate::ephem::{parse_body, Aberration, Ephemeris, RefLoc};
use crate::frames::Frame;
use crate::Result;

/// Geometric position of targets relative to a fixed observer
#[derive(Debug, Clone, Copy)]
pub struct Spkgps<'a> {
    ephem: &'a Ephemeris,
    frame: Frame,
    observer: i32,
}

impl<'a> Spkgps<'a> {
    pub fn new(ephem: &'a Ephemeris, frame: &str, observer: i32) -> Result<Self> {
        Ok(Self {
            ephem,
            frame: frame.parse()?,
            observer,
        })
    }

    /// Position of `target` in km, discarding the light time
    pub fn call(&self, target: i32, et: f64) -> Result<Vector3<f64>> {
        Ok(self.call_with_lt(target, et)?.0)
    }

    /// Position of `target` in km and the one-way light time in seconds
    pub fn call_with_lt(&self, target: i32, et: f64) -> Result<(Vector3<f64>, f64)> {
        self.ephem.spkgps(target, et, self.frame, self.observer)
    }
}

/// States of targets seen from a constant-velocity observer
#[derive(Debug, Clone, Copy)]
pub struct Spkcvo<'a> {
    ephem: &'a Ephemeris,
    outref: Frame,
    refloc: RefLoc,
    abcorr: Aberration,
    obsctr: i32,
    obsref: Frame,
}

impl<'a> Spkcvo<'a> {
    pub fn new(
        ephem: &'a Ephemeris,
        outref: &str,
        refloc: &str,
        abcorr: &str,
        obsctr: &str,
        obsref: &str,
    ) -> Result<Self> {
        Ok(Self {
            ephem,
            outref: outref.parse()?,
            refloc: refloc.parse()?,
            abcorr: abcorr.parse()?,
            obsctr: parse_body(obsctr)?,
            obsref: obsref.parse()?,
        })
    }

    pub fn refloc(&self) -> RefLoc {
        self.refloc
    }

    pub fn abcorr(&self) -> Aberration {
        self.abcorr
    }

    /// State of `target`; the observer state `obssta` is taken at epoch `et`
    pub fn call(&self, target: &str, obssta: &Vector6<f64>, et: f64) -> Result<Vector6<f64>> {
        Ok(self.call_with_lt(target, obssta, et)?.0)
    }

    /// State of `target` and the one-way light time
    pub fn call_with_lt(&self, target: &str, obssta: &Vector6<f64>, et: f64) -> Result<(Vector6<f64>, f64)> {
        self.ephem.spkcvo_with(
            parse_body(target)?,
            et,
            self.outref,
            self.abcorr,
            obssta,
            et,
            self.obsctr,
            self.obsref,
        )
    }
}
