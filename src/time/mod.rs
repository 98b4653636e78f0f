//! UTC to ephemeris time conversion
//!
//! Ephemeris time (ET, which SPICE kernels use as TDB) is counted in seconds
//! past J2000. The conversion from UTC adds the accumulated leap seconds,
//! the constant TT-TAI offset, and the small periodic TDB-TT term that
//! leapseconds kernels parameterise with `DELTET/K`, `DELTET/EB` and
//! `DELTET/M`.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use log::debug;
use thiserror::Error;

use crate::constants::{DAY_S, TT_MINUS_TAI_S};
use crate::kernel::{KernelPool, PoolValue};

/// Error type for time operations
#[derive(Debug, Error)]
pub enum TimeError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Time out of range: {0}")]
    OutOfRange(String),

    #[error("Leapseconds data incomplete: {0}")]
    LeapSecondData(String),
}

/// Result type for time operations
pub type Result<T> = std::result::Result<T, TimeError>;

/// TAI-UTC steps from naif0012.tls: (seconds, year, month)
const BUILTIN_DELTA_AT: [(f64, i32, u32); 28] = [
    (10.0, 1972, 1),
    (11.0, 1972, 7),
    (12.0, 1973, 1),
    (13.0, 1974, 1),
    (14.0, 1975, 1),
    (15.0, 1976, 1),
    (16.0, 1977, 1),
    (17.0, 1978, 1),
    (18.0, 1979, 1),
    (19.0, 1980, 1),
    (20.0, 1981, 7),
    (21.0, 1982, 7),
    (22.0, 1983, 7),
    (23.0, 1985, 7),
    (24.0, 1988, 1),
    (25.0, 1990, 1),
    (26.0, 1991, 1),
    (27.0, 1992, 7),
    (28.0, 1993, 7),
    (29.0, 1994, 7),
    (30.0, 1996, 1),
    (31.0, 1997, 7),
    (32.0, 1999, 1),
    (33.0, 2006, 1),
    (34.0, 2009, 1),
    (35.0, 2012, 7),
    (36.0, 2015, 7),
    (37.0, 2017, 1),
];

/// Parameters of a leapseconds kernel
#[derive(Debug, Clone, PartialEq)]
pub struct LeapSeconds {
    /// TT - TAI in seconds
    pub delta_t_a: f64,
    /// Amplitude of the TDB - TT periodic term
    pub k: f64,
    /// Eccentricity of the Earth-Moon barycenter orbit
    pub eb: f64,
    /// Mean anomaly at J2000 and its rate, radians and radians/second
    pub m: [f64; 2],
    /// (TAI - UTC, UTC seconds past J2000 at which it takes effect)
    pub delta_at: Vec<(f64, f64)>,
}

impl Default for LeapSeconds {
    fn default() -> Self {
        let delta_at = BUILTIN_DELTA_AT
            .iter()
            .map(|&(offset, year, month)| (offset, utc_seconds_of_month_start(year, month)))
            .collect();
        Self {
            delta_t_a: TT_MINUS_TAI_S,
            k: 1.657e-3,
            eb: 1.671e-2,
            m: [6.239996, 1.99096871e-7],
            delta_at,
        }
    }
}

fn utc_seconds_of_month_start(year: i32, month: u32) -> f64 {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| seconds_past_j2000(&dt))
        .unwrap_or(f64::NAN)
}

fn j2000_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap_or_default()
}

/// UTC seconds past 2000-01-01T12:00:00, counting a leap second as the 60th
fn seconds_past_j2000(dt: &NaiveDateTime) -> f64 {
    let whole = dt.and_utc().timestamp() - j2000_epoch().and_utc().timestamp();
    whole as f64 + f64::from(dt.nanosecond()) * 1e-9
}

impl LeapSeconds {
    /// Read `DELTET/*` variables from a kernel pool
    pub fn from_pool(pool: &KernelPool) -> crate::Result<Self> {
        let delta_t_a = pool.get_f64("DELTET/DELTA_T_A")?;
        let k = pool.get_f64("DELTET/K")?;
        let eb = pool.get_f64("DELTET/EB")?;
        let m = match pool.get_f64s("DELTET/M")?.as_slice() {
            [m0, m1] => [*m0, *m1],
            other => {
                return Err(TimeError::LeapSecondData(format!(
                    "DELTET/M holds {} values, expected 2",
                    other.len()
                ))
                .into())
            }
        };

        let raw = pool.get("DELTET/DELTA_AT").ok_or_else(|| {
            TimeError::LeapSecondData("DELTET/DELTA_AT not found".to_string())
        })?;
        if raw.len() % 2 != 0 {
            return Err(TimeError::LeapSecondData(
                "DELTET/DELTA_AT must hold offset/date pairs".to_string(),
            )
            .into());
        }
        let mut delta_at = Vec::with_capacity(raw.len() / 2);
        for pair in raw.chunks(2) {
            let offset = pair[0].as_f64().ok_or_else(|| {
                TimeError::LeapSecondData(format!("bad DELTA_AT offset {:?}", pair[0]))
            })?;
            let epoch = match &pair[1] {
                PoolValue::Date(text) => parse_utc(text)?,
                PoolValue::Number(seconds) => *seconds,
                other => {
                    return Err(TimeError::LeapSecondData(format!(
                        "bad DELTA_AT epoch {:?}",
                        other
                    ))
                    .into())
                }
            };
            delta_at.push((offset, epoch));
        }
        debug!("Leapseconds from pool: {} DELTA_AT entries", delta_at.len());

        Ok(Self {
            delta_t_a,
            k,
            eb,
            m,
            delta_at,
        })
    }

    /// TAI - UTC in effect at `utc` seconds past J2000
    pub fn delta_at(&self, utc: f64) -> Result<f64> {
        self.delta_at
            .iter()
            .take_while(|(_, epoch)| *epoch <= utc)
            .last()
            .map(|(offset, _)| *offset)
            .ok_or_else(|| {
                TimeError::OutOfRange(format!(
                    "{} s past J2000 precedes the first leap second entry",
                    utc
                ))
            })
    }

    /// TDB - TT at the given TT seconds past J2000
    pub fn tdb_minus_tt(&self, tt: f64) -> f64 {
        let m = self.m[0] + self.m[1] * tt;
        let e = m + self.eb * m.sin();
        self.k * e.sin()
    }

    /// Convert UTC seconds past J2000 to ET
    pub fn utc_seconds_to_et(&self, utc: f64) -> Result<f64> {
        let tt = utc + self.delta_at(utc)? + self.delta_t_a;
        Ok(tt + self.tdb_minus_tt(tt))
    }

    /// Convert a UTC calendar string to ET
    ///
    /// A leap second `23:59:60.x` uses the offset in effect before it, so
    /// it falls between `23:59:59` and the following midnight.
    pub fn utc_to_et(&self, utc: &str) -> Result<f64> {
        let dt = parse_datetime(utc)?;
        let leap = dt.nanosecond() >= 1_000_000_000;
        if !leap {
            return self.utc_seconds_to_et(seconds_past_j2000(&dt));
        }
        let whole = dt.with_nanosecond(0).map(|d| seconds_past_j2000(&d)).ok_or_else(|| {
            TimeError::InvalidFormat(utc.to_string())
        })?;
        Ok(self.utc_seconds_to_et(whole)? + f64::from(dt.nanosecond()) * 1e-9)
    }
}

const FORMATS: [&str; 7] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y-%b-%d %H:%M:%S%.f",
    "%Y-%b-%d",
    "%Y-%m-%d",
];

/// Parse a UTC calendar string into UTC seconds past J2000
///
/// Accepts ISO dates with a `T` or space separator, optional fractional
/// seconds, an optional trailing `Z`, date-only strings, and the
/// `1972-JAN-1` style used inside leapseconds kernels.
pub fn parse_utc(text: &str) -> Result<f64> {
    Ok(seconds_past_j2000(&parse_datetime(text)?))
}

fn parse_datetime(text: &str) -> Result<NaiveDateTime> {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_suffix('Z').unwrap_or(trimmed);

    for format in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(dt);
        }
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            if let Some(dt) = date.and_hms_opt(0, 0, 0) {
                return Ok(dt);
            }
        }
    }
    Err(TimeError::InvalidFormat(text.to_string()))
}

/// Convert one UTC string to ET using the built-in leap second table
pub fn str2et(utc: &str) -> Result<f64> {
    LeapSeconds::default().utc_to_et(utc)
}

/// Convert several UTC strings to ET, one value per input
pub fn times2et<S: AsRef<str>>(times: &[S]) -> Result<Vec<f64>> {
    let lsk = LeapSeconds::default();
    times.iter().map(|t| lsk.utc_to_et(t.as_ref())).collect()
}

/// ET seconds to a Julian date in TDB
pub fn et_to_jd(et: f64) -> f64 {
    crate::constants::J2000_JD + et / DAY_S
}
