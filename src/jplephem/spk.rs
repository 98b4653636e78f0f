//! Spacecraft Planet Kernel (SPK) format handling
//!
//! This module provides functionality for reading NASA SPICE SPK files which
//! contain position and velocity data for solar system bodies.
//!
//! The SPK format is described in:
//! http://naif.jpl.nasa.gov/pub/naif/toolkit_docs/FORTRAN/req/spk.html
use std::path::Path;
use std::sync::{Arc, OnceLock};

use log::debug;
use nalgebra::Vector3;

use crate::constants::{DAY_S, J2000_JD};
use crate::jplephem::chebyshev;
use crate::jplephem::daf::DAF;
use crate::jplephem::errors::{JplephemError, Result};
use crate::jplephem::mda::DifferenceLines;
use crate::jplephem::names;

/// Convert seconds since J2000 to Julian date
pub fn seconds_to_jd(seconds: f64) -> f64 {
    J2000_JD + seconds / DAY_S
}

/// Convert Julian date to seconds since J2000
pub fn jd_to_seconds(jd: f64) -> f64 {
    (jd - J2000_JD) * DAY_S
}

/// Spacecraft Planet Kernel (SPK) file reader
#[derive(Debug)]
pub struct SPK {
    /// The underlying DAF file
    pub daf: Arc<DAF>,
    /// List of segments in file order
    pub segments: Vec<Segment>,
}

/// A segment in an SPK file containing state data for one body
pub struct Segment {
    daf: Arc<DAF>,
    /// Source of the segment (e.g., "DE-0440LE-0440")
    pub source: String,
    /// Initial epoch in seconds since J2000
    pub start_second: f64,
    /// Final epoch in seconds since J2000
    pub end_second: f64,
    /// Target body ID
    pub target: i32,
    /// Center body ID
    pub center: i32,
    /// Reference frame ID
    pub frame: i32,
    /// SPK data type
    pub data_type: i32,
    /// Start word address in the file
    pub start_i: usize,
    /// End word address in the file
    pub end_i: usize,
    data: OnceLock<SegmentData>,
}

/// Decoded segment body, loaded on first use
#[derive(Debug)]
enum SegmentData {
    Chebyshev(ChebyshevRecords),
    Differences(DifferenceLines),
}

/// Fixed-length Chebyshev records of a type 2 or 3 segment
#[derive(Debug)]
struct ChebyshevRecords {
    /// Initial epoch (TDB seconds past J2000)
    init: f64,
    /// Interval length in seconds covered by each record
    intlen: f64,
    /// Record size in double-precision words
    rsize: usize,
    /// Number of records
    n_records: usize,
    /// Coefficients per component
    n_coeffs: usize,
    /// Concatenated records, directory excluded
    coefficients: Vec<f64>,
    /// 3 for position only, 6 for position and velocity
    components: usize,
}

impl SPK {
    /// Open an SPK file at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let daf = Arc::new(DAF::open(path)?);
        if daf.locidw != "DAF/SPK" && daf.locidw != "NAIF/DAF" {
            return Err(JplephemError::InvalidFormat(format!(
                "{} is a {} file, not an SPK",
                daf.path.display(),
                daf.locidw
            )));
        }
        if daf.nd != 2 || daf.ni != 6 {
            return Err(JplephemError::InvalidFormat(format!(
                "SPK summaries must have ND=2 and NI=6, found ND={} NI={}",
                daf.nd, daf.ni
            )));
        }

        let segments = daf
            .summaries()?
            .into_iter()
            .map(|summary| Segment {
                daf: Arc::clone(&daf),
                source: summary.name,
                start_second: summary.doubles[0],
                end_second: summary.doubles[1],
                target: summary.integers[0],
                center: summary.integers[1],
                frame: summary.integers[2],
                data_type: summary.integers[3],
                start_i: summary.integers[4] as usize,
                end_i: summary.integers[5] as usize,
                data: OnceLock::new(),
            })
            .collect::<Vec<_>>();

        debug!(
            "Opened SPK {} with {} segments",
            daf.path.display(),
            segments.len()
        );

        Ok(SPK { daf, segments })
    }

    /// Return the last segment for a center/target pair, if any
    pub fn get_segment(&self, center: i32, target: i32) -> Option<&Segment> {
        self.segments
            .iter()
            .rev()
            .find(|s| s.center == center && s.target == target)
    }

    /// Return the highest-priority segment for `target` covering `et`
    ///
    /// Segments later in the file take precedence, as in the SPICE toolkit.
    pub fn find_segment(&self, target: i32, et: f64) -> Option<&Segment> {
        self.segments
            .iter()
            .rev()
            .find(|s| s.target == target && s.covers(et))
    }

    /// Read the comments from the SPK file
    pub fn comments(&self) -> Result<String> {
        self.daf.comments()
    }

    /// Earliest segment start as Julian date (TDB), `None` without segments
    pub fn start_jd(&self) -> Option<f64> {
        self.segments.iter().map(Segment::start_jd).reduce(f64::min)
    }

    /// Latest segment end as Julian date (TDB), `None` without segments
    pub fn end_jd(&self) -> Option<f64> {
        self.segments.iter().map(Segment::end_jd).reduce(f64::max)
    }
}

impl Segment {
    /// Start of coverage as Julian date (TDB)
    pub fn start_jd(&self) -> f64 {
        seconds_to_jd(self.start_second)
    }

    /// End of coverage as Julian date (TDB)
    pub fn end_jd(&self) -> f64 {
        seconds_to_jd(self.end_second)
    }

    /// Whether the segment covers the epoch `et`
    pub fn covers(&self, et: f64) -> bool {
        et >= self.start_second && et <= self.end_second
    }

    /// Compute position at the given time
    pub fn compute(&self, et: f64) -> Result<Vector3<f64>> {
        Ok(self.compute_and_differentiate(et)?.0)
    }

    /// Compute position (km) and velocity (km/s) at the given time
    pub fn compute_and_differentiate(&self, et: f64) -> Result<(Vector3<f64>, Vector3<f64>)> {
        if !self.covers(et) {
            return Err(JplephemError::OutOfRange {
                et,
                start_et: self.start_second,
                end_et: self.end_second,
            });
        }

        match self.load_data()? {
            SegmentData::Chebyshev(records) => records.evaluate(et),
            SegmentData::Differences(lines) => lines.compute_and_differentiate(et),
        }
    }

    /// Load the segment data if not already loaded
    fn load_data(&self) -> Result<&SegmentData> {
        if let Some(data) = self.data.get() {
            return Ok(data);
        }

        let array = self.daf.read_array(self.start_i, self.end_i)?;
        let data = match self.data_type {
            2 | 3 => SegmentData::Chebyshev(ChebyshevRecords::from_array(&array, self.data_type)?),
            1 | 21 => SegmentData::Differences(DifferenceLines::from_array(&array, self.data_type)?),
            other => return Err(JplephemError::UnsupportedDataType(other)),
        };

        Ok(self.data.get_or_init(|| data))
    }

    /// Return a textual description of the segment
    pub fn describe(&self, verbose: bool) -> String {
        let start = crate::jplephem::calendar::format_date(self.start_jd());
        let end = crate::jplephem::calendar::format_date(self.end_jd());
        let center_name = names::target_name(self.center)
            .map(names::titlecase)
            .unwrap_or_else(|| "Unknown center".to_string());
        let target_name = names::target_name(self.target)
            .map(names::titlecase)
            .unwrap_or_else(|| "Unknown target".to_string());

        let mut text = format!(
            "{}..{}  Type {}  {} ({}) -> {} ({})",
            start, end, self.data_type, center_name, self.center, target_name, self.target
        );
        if verbose {
            let source = if self.source.is_empty() {
                "Unknown"
            } else {
                self.source.as_str()
            };
            text.push_str(&format!("\n  frame={} source={}", self.frame, source));
        }
        text
    }
}

impl ChebyshevRecords {
    /// Decode a type 2 or 3 segment; the last four words are the directory
    fn from_array(array: &[f64], data_type: i32) -> Result<Self> {
        let n = array.len();
        if n < 4 {
            return Err(JplephemError::InvalidFormat(format!(
                "Segment data array too small for Type {}",
                data_type
            )));
        }

        let init = array[n - 4];
        let intlen = array[n - 3];
        let rsize = array[n - 2] as usize;
        let n_records = array[n - 1] as usize;
        let components = if data_type == 2 { 3 } else { 6 };

        if rsize < 2 + components || intlen <= 0.0 || n_records == 0 {
            return Err(JplephemError::InvalidFormat(format!(
                "Invalid Type {} directory: rsize={}, intlen={}, n={}",
                data_type, rsize, intlen, n_records
            )));
        }

        let expected_size = n_records.checked_mul(rsize).and_then(|words| words.checked_add(4));
        if expected_size != Some(n) {
            return Err(JplephemError::InvalidFormat(format!(
                "Inconsistent array size: expected {} records of {} words, got {} words",
                n_records, rsize, n
            )));
        }

        Ok(Self {
            init,
            intlen,
            rsize,
            n_records,
            n_coeffs: (rsize - 2) / components,
            coefficients: array[..n - 4].to_vec(),
            components,
        })
    }

    fn evaluate(&self, et: f64) -> Result<(Vector3<f64>, Vector3<f64>)> {
        // The final epoch belongs to the last record
        let index = (((et - self.init) / self.intlen).floor().max(0.0) as usize)
            .min(self.n_records - 1);
        let record = &self.coefficients[index * self.rsize..(index + 1) * self.rsize];
        let (mid, radius) = (record[0], record[1]);
        let x = chebyshev::normalize_time(et, mid, radius)?;

        let series = |component: usize| {
            let start = 2 + component * self.n_coeffs;
            &record[start..start + self.n_coeffs]
        };

        let mut position = Vector3::zeros();
        let mut velocity = Vector3::zeros();
        for i in 0..3 {
            let (value, derivative) = chebyshev::evaluate_with_derivative(series(i), x);
            position[i] = value;
            velocity[i] = if self.components == 6 {
                chebyshev::evaluate(series(i + 3), x)
            } else {
                derivative / radius
            };
        }

        Ok((position, velocity))
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe(false))
    }
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe(true))
    }
}
