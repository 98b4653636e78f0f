//! Modified difference array evaluation for SPK types 1 and 21
//!
//! Small-body kernels produced by Horizons are usually written as type 21
//! segments. Each difference line holds a reference epoch, a step-size vector,
//! a reference state and per-component divided difference coefficients. Type 1
//! is the same layout with a fixed table size of 15.

use nalgebra::Vector3;

use crate::jplephem::errors::{JplephemError, Result};

/// Maximum difference table size of a type 1 segment
pub const TYPE1_MAXDIM: usize = 15;

/// Length of one difference line in double words
pub fn line_size(maxdim: usize) -> usize {
    4 * maxdim + 11
}

/// Parsed segment body of a type 1 or 21 segment
#[derive(Debug, Clone)]
pub struct DifferenceLines {
    maxdim: usize,
    lines: Vec<f64>,
    epochs: Vec<f64>,
}

impl DifferenceLines {
    /// Split a raw segment array into difference lines and their final epochs
    pub fn from_array(array: &[f64], data_type: i32) -> Result<Self> {
        let n = array.len();
        if n < 2 {
            return Err(JplephemError::InvalidFormat(format!(
                "Type {} segment is too small",
                data_type
            )));
        }

        let (maxdim, n_rec) = match data_type {
            1 => (TYPE1_MAXDIM, array[n - 1] as usize),
            21 => (array[n - 2] as usize, array[n - 1] as usize),
            other => return Err(JplephemError::UnsupportedDataType(other)),
        };
        if maxdim == 0 || n_rec == 0 {
            return Err(JplephemError::InvalidFormat(format!(
                "Type {} segment has maxdim={} and {} records",
                data_type, maxdim, n_rec
            )));
        }

        let trailer = if data_type == 1 { 1 } else { 2 };
        let expected = maxdim
            .checked_mul(4)
            .and_then(|words| words.checked_add(12))
            .and_then(|words| words.checked_mul(n_rec))
            .and_then(|words| words.checked_add(n_rec / 100 + trailer));
        if expected != Some(n) {
            return Err(JplephemError::InvalidFormat(format!(
                "Inconsistent type {} segment size: {} records of maxdim {} in {} words",
                data_type, n_rec, maxdim, n
            )));
        }

        let dlsize = line_size(maxdim);

        let lines_end = n_rec * dlsize;
        Ok(Self {
            maxdim,
            lines: array[..lines_end].to_vec(),
            epochs: array[lines_end..lines_end + n_rec].to_vec(),
        })
    }

    /// Pick the difference line whose coverage ends at or after `et`
    fn line_for(&self, et: f64) -> &[f64] {
        let index = self
            .epochs
            .partition_point(|&epoch| epoch < et)
            .min(self.epochs.len() - 1);
        let dlsize = line_size(self.maxdim);
        &self.lines[index * dlsize..(index + 1) * dlsize]
    }

    /// Evaluate position and velocity at `et`
    pub fn compute_and_differentiate(&self, et: f64) -> Result<(Vector3<f64>, Vector3<f64>)> {
        evaluate_line(self.line_for(et), self.maxdim, et)
    }
}

/// Evaluate a single difference line at `et`
fn evaluate_line(line: &[f64], maxdim: usize, et: f64) -> Result<(Vector3<f64>, Vector3<f64>)> {
    let tl = line[0];
    let g = &line[1..=maxdim];
    let ref_pos = Vector3::new(line[maxdim + 1], line[maxdim + 3], line[maxdim + 5]);
    let ref_vel = Vector3::new(line[maxdim + 2], line[maxdim + 4], line[maxdim + 6]);
    let dt = &line[maxdim + 7..4 * maxdim + 7];
    let kqmax1 = line[4 * maxdim + 7] as usize;
    let kq = [
        line[4 * maxdim + 8] as usize,
        line[4 * maxdim + 9] as usize,
        line[4 * maxdim + 10] as usize,
    ];

    if kqmax1 < 2 || kqmax1 > maxdim + 1 || kq.iter().any(|&k| k > maxdim) {
        return Err(JplephemError::InvalidFormat(format!(
            "Difference line has kqmax1={} and kq={:?} for maxdim={}",
            kqmax1, kq, maxdim
        )));
    }

    let delta = et - tl;
    let mut tp = delta;
    let mq2 = kqmax1 - 2;
    let mut ks = kqmax1 - 1;

    // fc and w are 1-based in the recurrence; index 0 is unused padding
    let mut fc = vec![0.0; maxdim + 2];
    let mut wc = vec![0.0; maxdim + 2];
    fc[1] = 1.0;
    for j in 1..=mq2 {
        fc[j + 1] = tp / g[j - 1];
        wc[j] = delta / g[j - 1];
        tp = delta + g[j - 1];
    }

    let mut w = vec![0.0; maxdim + 3];
    for (j, wj) in w.iter_mut().enumerate().take(kqmax1 + 1).skip(1) {
        *wj = 1.0 / j as f64;
    }

    let mut jx = 0;
    let mut ks1 = ks - 1;
    while ks >= 2 {
        jx += 1;
        for j in 1..=jx {
            w[j + ks] = fc[j + 1] * w[j + ks1] - wc[j] * w[j + ks];
        }
        ks = ks1;
        ks1 -= 1;
    }

    let sum_component = |component: usize, w: &[f64], ks: usize| -> f64 {
        (1..=kq[component])
            .rev()
            .map(|j| dt[component * maxdim + j - 1] * w[j + ks])
            .sum::<f64>()
    };

    let mut position = Vector3::zeros();
    for i in 0..3 {
        position[i] = ref_pos[i] + delta * (ref_vel[i] + delta * sum_component(i, &w, ks));
    }

    // ks is 1 here, so ks1 is 0
    for j in 1..=jx {
        w[j + ks] = fc[j + 1] * w[j + ks1] - wc[j] * w[j + ks];
    }
    ks -= 1;

    let mut velocity = Vector3::zeros();
    for i in 0..3 {
        velocity[i] = ref_vel[i] + delta * sum_component(i, &w, ks);
    }

    Ok((position, velocity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    /// Build a difference line with the given reference state and no differences
    fn linear_line(maxdim: usize, tl: f64, pos: [f64; 3], vel: [f64; 3]) -> Vec<f64> {
        let mut line = vec![0.0; line_size(maxdim)];
        line[0] = tl;
        for g in line.iter_mut().skip(1).take(maxdim) {
            *g = 10.0;
        }
        for i in 0..3 {
            line[maxdim + 1 + 2 * i] = pos[i];
            line[maxdim + 2 + 2 * i] = vel[i];
        }
        line[4 * maxdim + 7] = 2.0;
        line
    }

    #[test]
    fn test_linear_motion() {
        let line = linear_line(15, 100.0, [1.0, 2.0, 3.0], [0.5, -1.0, 2.0]);
        let (pos, vel) = evaluate_line(&line, 15, 90.0).unwrap();
        assert_relative_eq!(pos, Vector3::new(-4.0, 12.0, -17.0), epsilon = 1e-12);
        assert_relative_eq!(vel, Vector3::new(0.5, -1.0, 2.0), epsilon = 1e-12);
    }

    #[test]
    fn test_constant_acceleration() {
        // With kqmax1 = 2 and one difference, w[1] = 1/2 so x = x0 + v t + dt t^2 / 2
        let maxdim = 15;
        let mut line = linear_line(maxdim, 0.0, [0.0; 3], [1.0, 0.0, 0.0]);
        line[maxdim + 7] = 4.0;
        line[4 * maxdim + 8] = 1.0;

        let (pos, vel) = evaluate_line(&line, maxdim, 3.0).unwrap();
        assert_relative_eq!(pos[0], 3.0 + 0.5 * 4.0 * 9.0, epsilon = 1e-12);
        assert_relative_eq!(vel[0], 1.0 + 4.0 * 3.0, epsilon = 1e-12);
    }

    #[rstest]
    #[case(2.5)]
    #[case(-7.25)]
    #[case(40.0)]
    fn test_three_differences_match_polynomial(#[case] delta: f64) {
        // a(d) = d1 + d2 d / g1 + d3 d (d + g1) / (g1 g2), integrated twice
        let maxdim = 15;
        let (g1, g2) = (3.0, 5.0);
        let (d1, d2, d3) = (0.2, 0.7, -0.4);
        let (x0, v0) = (11.0, -1.5);

        let mut line = linear_line(maxdim, 100.0, [x0, 0.0, 0.0], [v0, 0.0, 0.0]);
        line[1] = g1;
        line[2] = g2;
        line[maxdim + 7] = d1;
        line[maxdim + 8] = d2;
        line[maxdim + 9] = d3;
        line[4 * maxdim + 7] = 4.0;
        line[4 * maxdim + 8] = 3.0;

        let (pos, vel) = evaluate_line(&line, maxdim, 100.0 + delta).unwrap();

        let d = delta;
        let expected_pos = x0
            + v0 * d
            + d1 * d.powi(2) / 2.0
            + d2 * d.powi(3) / (6.0 * g1)
            + d3 * (d.powi(4) / 12.0 + g1 * d.powi(3) / 6.0) / (g1 * g2);
        let expected_vel = v0
            + d1 * d
            + d2 * d.powi(2) / (2.0 * g1)
            + d3 * (d.powi(3) / 3.0 + g1 * d.powi(2) / 2.0) / (g1 * g2);
        assert_relative_eq!(pos[0], expected_pos, max_relative = 1e-13);
        assert_relative_eq!(vel[0], expected_vel, max_relative = 1e-13);
        assert_eq!((pos[1], vel[1]), (0.0, 0.0));
    }

    #[test]
    fn test_rejects_bad_table_sizes() {
        let mut line = linear_line(15, 0.0, [0.0; 3], [0.0; 3]);
        line[4 * 15 + 7] = 17.0;
        assert!(evaluate_line(&line, 15, 1.0).is_err());
        line[4 * 15 + 7] = 4.0;
        line[4 * 15 + 9] = 16.0;
        assert!(evaluate_line(&line, 15, 1.0).is_err());
    }

    #[test]
    fn test_type21_array_layout() {
        let maxdim = 25;
        let mut array = linear_line(maxdim, 50.0, [1.0, 1.0, 1.0], [0.0, 0.0, 0.0]);
        array.extend(linear_line(maxdim, 100.0, [2.0, 2.0, 2.0], [0.0, 0.0, 0.0]));
        array.extend([50.0, 100.0]);
        array.extend([maxdim as f64, 2.0]);

        let lines = DifferenceLines::from_array(&array, 21).unwrap();
        let (early, _) = lines.compute_and_differentiate(10.0).unwrap();
        let (late, _) = lines.compute_and_differentiate(75.0).unwrap();
        assert_relative_eq!(early[0], 1.0);
        assert_relative_eq!(late[0], 2.0);
    }

    #[test]
    fn test_rejects_inconsistent_size() {
        let array = vec![0.0; 20];
        assert!(DifferenceLines::from_array(&array, 1).is_err());
        assert!(matches!(
            DifferenceLines::from_array(&array, 5),
            Err(JplephemError::UnsupportedDataType(5))
        ));
    }
}
