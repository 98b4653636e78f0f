//! Aberration correction flags and the corrections themselves

use std::fmt;
use std::str::FromStr;

use nalgebra::{Rotation3, Unit, Vector3};

use crate::constants::SPEED_OF_LIGHT_KM_S;
use crate::{Result, SpiceToolsError};

/// Light time and stellar aberration correction, as named by SPICE `abcorr`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aberration {
    None,
    Lt,
    LtS,
    Cn,
    CnS,
    XLt,
    XLtS,
    XCn,
    XCnS,
}

impl Aberration {
    /// Whether any light time correction is applied
    pub fn uses_light_time(self) -> bool {
        self != Aberration::None
    }

    /// Whether stellar aberration is applied on top of light time
    pub fn uses_stellar(self) -> bool {
        matches!(
            self,
            Aberration::LtS | Aberration::CnS | Aberration::XLtS | Aberration::XCnS
        )
    }

    /// Converged Newtonian light time instead of a single iteration
    pub fn converged(self) -> bool {
        matches!(
            self,
            Aberration::Cn | Aberration::CnS | Aberration::XCn | Aberration::XCnS
        )
    }

    /// Transmission case: light leaves the observer at `et`
    pub fn is_transmission(self) -> bool {
        matches!(
            self,
            Aberration::XLt | Aberration::XLtS | Aberration::XCn | Aberration::XCnS
        )
    }

    /// Number of light time iterations after the initial estimate
    pub(crate) fn iterations(self) -> usize {
        match self {
            Aberration::None => 0,
            _ if self.converged() => 5,
            _ => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Aberration::None => "NONE",
            Aberration::Lt => "LT",
            Aberration::LtS => "LT+S",
            Aberration::Cn => "CN",
            Aberration::CnS => "CN+S",
            Aberration::XLt => "XLT",
            Aberration::XLtS => "XLT+S",
            Aberration::XCn => "XCN",
            Aberration::XCnS => "XCN+S",
        }
    }
}

impl FromStr for Aberration {
    type Err = SpiceToolsError;

    fn from_str(s: &str) -> Result<Self> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        match compact.to_uppercase().as_str() {
            "NONE" => Ok(Aberration::None),
            "LT" => Ok(Aberration::Lt),
            "LT+S" => Ok(Aberration::LtS),
            "CN" => Ok(Aberration::Cn),
            "CN+S" => Ok(Aberration::CnS),
            "XLT" => Ok(Aberration::XLt),
            "XLT+S" => Ok(Aberration::XLtS),
            "XCN" => Ok(Aberration::XCn),
            "XCN+S" => Ok(Aberration::XCnS),
            _ => Err(SpiceToolsError::InvalidParameter(format!(
                "Unknown aberration correction {:?}",
                s
            ))),
        }
    }
}

impl fmt::Display for Aberration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the output frame is evaluated; irrelevant for inertial frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefLoc {
    Observer,
    Target,
    Center,
}

impl FromStr for RefLoc {
    type Err = SpiceToolsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "OBSERVER" => Ok(RefLoc::Observer),
            "TARGET" => Ok(RefLoc::Target),
            "CENTER" => Ok(RefLoc::Center),
            _ => Err(SpiceToolsError::InvalidParameter(format!(
                "Unknown reference location {:?}",
                s
            ))),
        }
    }
}

/// One-way light time for a separation vector in km
pub fn light_time(position: &Vector3<f64>) -> f64 {
    position.norm() / SPEED_OF_LIGHT_KM_S
}

/// Rate of change of light time for relative position `p`
///
/// `vt` is the target velocity at the light-time-shifted epoch and `vo` the
/// observer velocity, both relative to the solar-system barycenter.
pub fn light_time_rate(p: &Vector3<f64>, vt: &Vector3<f64>, vo: &Vector3<f64>, transmission: bool) -> f64 {
    let norm = p.norm();
    if norm == 0.0 {
        return 0.0;
    }
    let u = p / norm;
    let along_target = u.dot(vt);
    let denominator = if transmission {
        SPEED_OF_LIGHT_KM_S - along_target
    } else {
        SPEED_OF_LIGHT_KM_S + along_target
    };
    u.dot(&(vt - vo)) / denominator
}

/// Apply stellar aberration for an observer moving with `vobs` (km/s)
///
/// The apparent direction is rotated toward the observer velocity by
/// `asin(|u x v/c|)`. In the transmission case the sense is reversed.
pub fn stellar_aberration(position: &Vector3<f64>, vobs: &Vector3<f64>, transmission: bool) -> Vector3<f64> {
    let norm = position.norm();
    if norm == 0.0 {
        return *position;
    }
    let u = position / norm;
    let vbyc = if transmission {
        -vobs / SPEED_OF_LIGHT_KM_S
    } else {
        vobs / SPEED_OF_LIGHT_KM_S
    };
    let h = u.cross(&vbyc);
    let sin_phi = h.norm();
    if sin_phi == 0.0 {
        return *position;
    }
    let axis = Unit::new_normalize(h);
    Rotation3::from_axis_angle(&axis, sin_phi.min(1.0).asin()) * *position
}

/// Time step of the central differences used for aberration rates, seconds
pub const STELLAR_RATE_STEP_S: f64 = 1.0;

/// Stellar aberration of a moving position, with the rate of the result
///
/// `velocity` is the rate of `position` and `aobs` the observer
/// acceleration. The returned velocity is the time derivative of the
/// apparent position: the input velocity plus the rate of the aberration
/// correction, found by a central difference over `STELLAR_RATE_STEP_S`.
pub fn stellar_aberration_state(
    position: &Vector3<f64>,
    velocity: &Vector3<f64>,
    vobs: &Vector3<f64>,
    aobs: &Vector3<f64>,
    transmission: bool,
) -> (Vector3<f64>, Vector3<f64>) {
    let correction = |dt: f64| {
        let shifted = position + velocity * dt;
        stellar_aberration(&shifted, &(vobs + aobs * dt), transmission) - shifted
    };
    let h = STELLAR_RATE_STEP_S;
    let rate = (correction(h) - correction(-h)) / (2.0 * h);
    (
        stellar_aberration(position, vobs, transmission),
        velocity + rate,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case("NONE", Aberration::None)]
    #[case("lt", Aberration::Lt)]
    #[case("LT + S", Aberration::LtS)]
    #[case("CN", Aberration::Cn)]
    #[case("CN+S", Aberration::CnS)]
    #[case("XLT", Aberration::XLt)]
    #[case("XCN+S", Aberration::XCnS)]
    fn test_parse_aberration(#[case] text: &str, #[case] expected: Aberration) {
        let parsed: Aberration = text.parse().unwrap();
        assert_eq!(parsed, expected);
        assert_eq!(parsed.as_str().parse::<Aberration>().unwrap(), expected);
    }

    #[test]
    fn test_aberration_flags() {
        assert!(!Aberration::None.uses_light_time());
        assert_eq!(Aberration::None.iterations(), 0);
        assert_eq!(Aberration::Lt.iterations(), 1);
        assert!(Aberration::XCnS.converged());
        assert!(Aberration::XCnS.is_transmission());
        assert!(Aberration::XCnS.uses_stellar());
        assert!(!Aberration::Cn.uses_stellar());
        assert!("S".parse::<Aberration>().is_err());
    }

    #[test]
    fn test_parse_refloc() {
        assert_eq!("observer".parse::<RefLoc>().unwrap(), RefLoc::Observer);
        assert_eq!("TARGET".parse::<RefLoc>().unwrap(), RefLoc::Target);
        assert_eq!(" center ".parse::<RefLoc>().unwrap(), RefLoc::Center);
        assert!("ELSEWHERE".parse::<RefLoc>().is_err());
    }

    #[test]
    fn test_light_time_one_au() {
        let p = Vector3::new(crate::constants::AU2KM, 0.0, 0.0);
        assert_relative_eq!(light_time(&p), 499.00478383615643, epsilon = 1e-9);
    }

    #[test]
    fn test_stellar_aberration_magnitude() {
        // Earth orbital speed perpendicular to the line of sight: ~20.5 arcsec
        let p = Vector3::new(1.0e8, 0.0, 0.0);
        let v = Vector3::new(0.0, 29.78, 0.0);
        let apparent = stellar_aberration(&p, &v, false);
        assert_relative_eq!(apparent.norm(), p.norm(), max_relative = 1e-12);
        let angle = apparent.angle(&p) / crate::constants::ARCSEC2RAD;
        assert_relative_eq!(angle, 20.49, epsilon = 0.01);
        // Shifted toward the observer velocity
        assert!(apparent.y > 0.0);

        let transmitted = stellar_aberration(&p, &v, true);
        assert!(transmitted.y < 0.0);
    }

    #[rstest]
    fn test_stellar_aberration_rate_is_derivative(#[values(false, true)] transmission: bool) {
        let p = Vector3::new(1.2e8, -3.0e7, 4.0e6);
        let v = Vector3::new(-5.0, 22.0, 1.5);
        let vobs = Vector3::new(3.0, 29.0, -0.4);
        let aobs = Vector3::new(-5.9e-6, 1.0e-7, 0.0);

        let (apparent, rate) = stellar_aberration_state(&p, &v, &vobs, &aobs, transmission);
        assert_eq!(apparent, stellar_aberration(&p, &vobs, transmission));

        let dt = 50.0;
        let at = |t: f64| {
            let vo = vobs + aobs * t;
            stellar_aberration(&(p + v * t), &vo, transmission)
        };
        let numeric = (at(dt) - at(-dt)) / (2.0 * dt);
        assert_relative_eq!(rate, numeric, epsilon = 1e-7);
        // The rotation of the aberration itself moves the position by m/s here
        assert!((rate - v).norm() > 1.0e-4);
    }

    #[test]
    fn test_stellar_aberration_degenerate() {
        let zero = Vector3::zeros();
        assert_eq!(stellar_aberration(&zero, &Vector3::new(1.0, 2.0, 3.0), false), zero);
        let p = Vector3::new(1.0, 0.0, 0.0);
        assert_eq!(stellar_aberration(&p, &Vector3::new(5.0, 0.0, 0.0), false), p);
    }

    #[test]
    fn test_light_time_rate_receding() {
        let p = Vector3::new(1.0e6, 0.0, 0.0);
        let vt = Vector3::new(10.0, 0.0, 0.0);
        let vo = Vector3::zeros();
        let rate = light_time_rate(&p, &vt, &vo, false);
        assert_relative_eq!(rate, 10.0 / (SPEED_OF_LIGHT_KM_S + 10.0), epsilon = 1e-15);
        assert_eq!(light_time_rate(&Vector3::zeros(), &vt, &vo, false), 0.0);
    }
}
