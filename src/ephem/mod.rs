//! Loaded kernel set and state evaluation
//!
//! An [`Ephemeris`] plays the part of the SPICE kernel subsystem: kernels are
//! furnished one at a time (or through a meta-kernel), SPK segments loaded
//! later take priority over earlier ones, and text kernels feed a shared
//! variable pool that supplies leapseconds data.
//!
//! States are computed in J2000 internally and rotated to the requested
//! output frame at the end.

pub mod correction;

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::{debug, info};
use nalgebra::{Vector3, Vector6};

use crate::frames::{self, Frame};
use crate::jplephem::names;
use crate::jplephem::{JplephemError, Segment, SPK};
use crate::kernel::{parse_text_kernel, resolve_kernels_to_load, KernelPool};
use crate::time::LeapSeconds;
use crate::{Result, SpiceToolsError};

pub use correction::{light_time, stellar_aberration, stellar_aberration_state, Aberration, RefLoc};

/// Longest center chain followed before giving up
const MAX_CHAIN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KernelKind {
    Spk,
    Text { meta: bool },
}

/// Split a state vector into position and velocity
fn split(state: &Vector6<f64>) -> (Vector3<f64>, Vector3<f64>) {
    (
        Vector3::new(state[0], state[1], state[2]),
        Vector3::new(state[3], state[4], state[5]),
    )
}

fn join(position: &Vector3<f64>, velocity: &Vector3<f64>) -> Vector6<f64> {
    Vector6::new(
        position.x, position.y, position.z, velocity.x, velocity.y, velocity.z,
    )
}

/// Resolve a body given as a name or NAIF integer code
pub fn parse_body(body: &str) -> Result<i32> {
    names::body_id(body)
        .ok_or_else(|| SpiceToolsError::ObjectNotFound(format!("Unknown body {:?}", body)))
}

/// A set of furnished kernels
#[derive(Debug, Default)]
pub struct Ephemeris {
    spks: Vec<SPK>,
    pool: KernelPool,
    loaded: Vec<PathBuf>,
}

impl Ephemeris {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a kernel: an SPK, a text kernel, or a meta-kernel
    ///
    /// Meta-kernels load every entry of `KERNELS_TO_LOAD` in order, after
    /// expanding `PATH_SYMBOLS`. Relative entries are taken relative to the
    /// current directory.
    pub fn furnsh<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        match Self::detect(path)? {
            KernelKind::Spk => {
                let spk = SPK::open(path)?;
                info!(
                    "Loaded SPK {} ({} segments)",
                    path.display(),
                    spk.segments.len()
                );
                self.spks.push(spk);
                self.loaded.push(path.to_path_buf());
            }
            KernelKind::Text { meta } => {
                let text = std::fs::read_to_string(path)?;
                let assignments = parse_text_kernel(&text)?;
                let mut local = KernelPool::new();
                for assignment in assignments {
                    local.insert(assignment.clone());
                    self.pool.insert(assignment);
                }
                self.loaded.push(path.to_path_buf());
                debug!("Loaded text kernel {} ({} variables)", path.display(), local.len());

                if meta {
                    let kernels = resolve_kernels_to_load(&local)?;
                    info!(
                        "Meta-kernel {} lists {} kernels",
                        path.display(),
                        kernels.len()
                    );
                    for kernel in kernels {
                        self.furnsh(&kernel)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn detect(path: &Path) -> Result<KernelKind> {
        let mut head = [0u8; 8];
        let mut file = File::open(path)?;
        let n = file.read(&mut head)?;
        let id_word = String::from_utf8_lossy(&head[..n]);

        if id_word.starts_with("DAF/SPK") || id_word.starts_with("NAIF/DAF") {
            return Ok(KernelKind::Spk);
        }
        if id_word.starts_with("DAF/") || id_word.starts_with("DAS/") {
            return Err(SpiceToolsError::InvalidParameter(format!(
                "{}: binary kernel type {} is not supported",
                path.display(),
                id_word.trim_end()
            )));
        }
        if id_word.starts_with("KPL/MK") {
            return Ok(KernelKind::Text { meta: true });
        }

        // Text kernels without an ID word are meta-kernels when they set
        // KERNELS_TO_LOAD
        let text = std::fs::read_to_string(path)?;
        let meta = parse_text_kernel(&text)?
            .iter()
            .any(|a| a.name == "KERNELS_TO_LOAD");
        Ok(KernelKind::Text { meta })
    }

    /// Forget every loaded kernel and clear the pool
    pub fn unload_all(&mut self) {
        self.spks.clear();
        self.pool.clear();
        self.loaded.clear();
        debug!("Unloaded all kernels");
    }

    /// Paths of every furnished file, meta-kernels included, in load order
    pub fn loaded_kernels(&self) -> &[PathBuf] {
        &self.loaded
    }

    pub fn pool(&self) -> &KernelPool {
        &self.pool
    }

    /// Leapseconds from the loaded LSK, or the built-in table
    pub fn leapseconds(&self) -> Result<LeapSeconds> {
        if self.pool.contains("DELTET/DELTA_AT") {
            LeapSeconds::from_pool(&self.pool)
        } else {
            debug!("No leapseconds kernel loaded; using built-in table");
            Ok(LeapSeconds::default())
        }
    }

    /// Convert a UTC string to ET
    pub fn str2et(&self, utc: &str) -> Result<f64> {
        Ok(self.leapseconds()?.utc_to_et(utc)?)
    }

    /// Convert several UTC strings to ET
    pub fn times2et<S: AsRef<str>>(&self, times: &[S]) -> Result<Vec<f64>> {
        let lsk = self.leapseconds()?;
        times
            .iter()
            .map(|t| lsk.utc_to_et(t.as_ref()).map_err(SpiceToolsError::from))
            .collect()
    }

    /// Highest-priority segment for `target` covering `et`
    pub fn find_segment(&self, target: i32, et: f64) -> Option<&Segment> {
        self.spks
            .iter()
            .rev()
            .find_map(|spk| spk.find_segment(target, et))
    }

    /// State of `body` relative to the solar-system barycenter
    pub fn state_ssb(&self, body: i32, et: f64, frame: Frame) -> Result<Vector6<f64>> {
        let mut state = Vector6::zeros();
        let mut current = body;

        for _ in 0..MAX_CHAIN {
            if current == names::targets::SOLAR_SYSTEM_BARYCENTER {
                return Ok(frames::rotate_state(&state, Frame::J2000, frame));
            }
            let segment = self
                .find_segment(current, et)
                .ok_or(JplephemError::NoCoverage { target: current, et })?;
            let (position, velocity) = segment.compute_and_differentiate(et)?;
            let relative = frames::rotate_state(
                &join(&position, &velocity),
                Frame::from_id(segment.frame)?,
                Frame::J2000,
            );
            state += relative;
            current = segment.center;
        }

        Err(SpiceToolsError::Ephemeris(JplephemError::InvalidFormat(format!(
            "Segment chain for body {} does not reach the barycenter",
            body
        ))))
    }

    /// Geometric state of `target` relative to `observer`, with one-way light time
    pub fn spkgeo(&self, target: i32, et: f64, frame: Frame, observer: i32) -> Result<(Vector6<f64>, f64)> {
        if target == observer {
            return Ok((Vector6::zeros(), 0.0));
        }
        let state = self.state_ssb(target, et, Frame::J2000)? - self.state_ssb(observer, et, Frame::J2000)?;
        let (position, _) = split(&state);
        let lt = light_time(&position);
        Ok((frames::rotate_state(&state, Frame::J2000, frame), lt))
    }

    /// Geometric position of `target` relative to `observer`, with one-way light time
    pub fn spkgps(&self, target: i32, et: f64, frame: Frame, observer: i32) -> Result<(Vector3<f64>, f64)> {
        let (state, lt) = self.spkgeo(target, et, frame, observer)?;
        Ok((split(&state).0, lt))
    }

    /// State of a target seen by an observer moving at constant velocity
    ///
    /// `obssta` is the observer state relative to `obsctr` in `obsref`, valid
    /// at epoch `obsepc`. The returned state is in `outref`. String arguments
    /// are parsed here; see [`Ephemeris::spkcvo_with`] for the pre-parsed form.
    #[allow(clippy::too_many_arguments)]
    pub fn spkcvo(
        &self,
        target: &str,
        et: f64,
        outref: &str,
        refloc: &str,
        abcorr: &str,
        obssta: &Vector6<f64>,
        obsepc: f64,
        obsctr: &str,
        obsref: &str,
    ) -> Result<(Vector6<f64>, f64)> {
        let _: RefLoc = refloc.parse()?;
        self.spkcvo_with(
            parse_body(target)?,
            et,
            outref.parse()?,
            abcorr.parse()?,
            obssta,
            obsepc,
            parse_body(obsctr)?,
            obsref.parse()?,
        )
    }

    /// [`Ephemeris::spkcvo`] with arguments already parsed
    #[allow(clippy::too_many_arguments)]
    pub fn spkcvo_with(
        &self,
        target: i32,
        et: f64,
        outref: Frame,
        abcorr: Aberration,
        obssta: &Vector6<f64>,
        obsepc: f64,
        obsctr: i32,
        obsref: Frame,
    ) -> Result<(Vector6<f64>, f64)> {
        // Observer relative to the barycenter, J2000
        let (offset, offset_velocity) = split(&frames::rotate_state(obssta, obsref, Frame::J2000));
        let (center, center_velocity) = split(&self.state_ssb(obsctr, et, Frame::J2000)?);
        let obs_pos = center + offset + offset_velocity * (et - obsepc);
        let obs_vel = center_velocity + offset_velocity;
        let obs_acc = if abcorr.uses_stellar() {
            self.acceleration_ssb(obsctr, et)?
        } else {
            Vector3::zeros()
        };

        let (state, lt) = self.corrected_state(target, et, abcorr, &obs_pos, &obs_vel, &obs_acc)?;
        Ok((frames::rotate_state(&state, Frame::J2000, outref), lt))
    }

    /// Barycentric acceleration of `body` in J2000 from a central difference
    fn acceleration_ssb(&self, body: i32, et: f64) -> Result<Vector3<f64>> {
        let h = correction::STELLAR_RATE_STEP_S;
        let (_, ahead) = split(&self.state_ssb(body, et + h, Frame::J2000)?);
        let (_, behind) = split(&self.state_ssb(body, et - h, Frame::J2000)?);
        Ok((ahead - behind) / (2.0 * h))
    }

    /// Target state relative to an observer at `obs_pos`/`obs_vel` (J2000, SSB)
    #[allow(clippy::too_many_arguments)]
    fn corrected_state(
        &self,
        target: i32,
        et: f64,
        abcorr: Aberration,
        obs_pos: &Vector3<f64>,
        obs_vel: &Vector3<f64>,
        obs_acc: &Vector3<f64>,
    ) -> Result<(Vector6<f64>, f64)> {
        let (target_pos, target_vel) = split(&self.state_ssb(target, et, Frame::J2000)?);
        let mut position = target_pos - obs_pos;
        let mut lt = light_time(&position);
        if !abcorr.uses_light_time() {
            return Ok((join(&position, &(target_vel - obs_vel)), lt));
        }

        let sign = if abcorr.is_transmission() { 1.0 } else { -1.0 };
        let mut shifted_vel = target_vel;
        for _ in 0..abcorr.iterations() {
            let (p, v) = split(&self.state_ssb(target, et + sign * lt, Frame::J2000)?);
            position = p - obs_pos;
            shifted_vel = v;
            let next = light_time(&position);
            let converged = (next - lt).abs() <= 1e-12 * next.abs().max(1.0);
            lt = next;
            if converged {
                break;
            }
        }

        let dlt = correction::light_time_rate(&position, &shifted_vel, obs_vel, abcorr.is_transmission());
        let velocity = shifted_vel * (1.0 + sign * dlt) - obs_vel;

        if abcorr.uses_stellar() {
            let (apparent, apparent_velocity) =
                stellar_aberration_state(&position, &velocity, obs_vel, obs_acc, abcorr.is_transmission());
            return Ok((join(&apparent, &apparent_velocity), lt));
        }
        Ok((join(&position, &velocity), lt))
    }
}
