//! Synthetic SPK writer used by tests
//!
//! Bodies move linearly, `p(t) = p0 + v t` with `t` in TDB seconds past J2000,
//! so expected states can be computed by hand.

use std::fs;
use std::io;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};

const RECORD: usize = 1024;
const WORDS_PER_RECORD: usize = 128;
const FTPSTR: &[u8] = b"FTPSTR:\r:\n:\r\n:\r\x00:\x81:\x10\xce:ENDFTP";

/// A segment to be written into a synthetic SPK
#[derive(Debug, Clone)]
pub struct TestSegment {
    pub name: String,
    pub target: i32,
    pub center: i32,
    pub frame: i32,
    pub data_type: i32,
    pub start: f64,
    pub end: f64,
    pub data: Vec<f64>,
}

/// Linear motion segment of the given SPK type (1, 2, 3 or 21)
pub fn linear(
    target: i32,
    center: i32,
    data_type: i32,
    (start, end): (f64, f64),
    p0: [f64; 3],
    v: [f64; 3],
) -> TestSegment {
    let data = match data_type {
        2 => linear_chebyshev(start, end, p0, v, false),
        3 => linear_chebyshev(start, end, p0, v, true),
        1 | 21 => difference_line(data_type, end, p0, v, [0.0; 3], [0.0; 3]),
        other => panic!("no synthetic writer for type {}", other),
    };
    TestSegment {
        name: format!("TEST {} WRT {}", target, center),
        target,
        center,
        frame: 1,
        data_type,
        start,
        end,
        data,
    }
}

fn linear_chebyshev(start: f64, end: f64, p0: [f64; 3], v: [f64; 3], with_velocity: bool) -> Vec<f64> {
    let mid = 0.5 * (start + end);
    let radius = 0.5 * (end - start);
    let mut record = vec![mid, radius];
    for i in 0..3 {
        if with_velocity {
            record.extend([p0[i] + v[i] * mid, v[i] * radius]);
        } else {
            record.extend([p0[i] + v[i] * mid, v[i] * radius, 0.0]);
        }
    }
    if with_velocity {
        for vi in v {
            record.extend([vi, 0.0]);
        }
    }
    let rsize = record.len() as f64;
    record.extend([start, end - start, rsize, 1.0]);
    record
}

/// Cubic motion segment of type 1 or 21
///
/// `p(t) = p0 + v0 t + a0 t^2 / 2 + jerk t^3 / 6`. The difference line is
/// referenced to the end of the span and holds two divided differences, so
/// evaluation runs the full integration recurrence.
#[allow(clippy::too_many_arguments)]
pub fn cubic(
    target: i32,
    center: i32,
    data_type: i32,
    (start, end): (f64, f64),
    p0: [f64; 3],
    v0: [f64; 3],
    a0: [f64; 3],
    jerk: [f64; 3],
) -> TestSegment {
    TestSegment {
        name: format!("CUBIC {} WRT {}", target, center),
        target,
        center,
        frame: 1,
        data_type,
        start,
        end,
        data: difference_line(data_type, end, p0, v0, a0, jerk),
    }
}

/// State of cubic motion at `t`: position, velocity and acceleration
pub fn cubic_state(t: f64, p0: [f64; 3], v0: [f64; 3], a0: [f64; 3], jerk: [f64; 3]) -> [[f64; 3]; 3] {
    let mut state = [[0.0; 3]; 3];
    for i in 0..3 {
        state[0][i] = p0[i] + v0[i] * t + a0[i] * t * t / 2.0 + jerk[i] * t * t * t / 6.0;
        state[1][i] = v0[i] + a0[i] * t + jerk[i] * t * t / 2.0;
        state[2][i] = a0[i] + jerk[i] * t;
    }
    state
}

/// One-record type 1 or 21 array referenced at `tl`
fn difference_line(data_type: i32, tl: f64, p0: [f64; 3], v0: [f64; 3], a0: [f64; 3], jerk: [f64; 3]) -> Vec<f64> {
    let maxdim = match data_type {
        1 => 15,
        21 => 25,
        other => panic!("type {} has no difference lines", other),
    };
    let step = [10.0, 20.0];
    let [position, velocity, acceleration] = cubic_state(tl, p0, v0, a0, jerk);

    let mut line = vec![0.0; 4 * maxdim + 11];
    line[0] = tl;
    for (j, g) in line.iter_mut().skip(1).take(maxdim).enumerate() {
        *g = if j < step.len() { step[j] } else { 10.0 };
    }
    for i in 0..3 {
        line[maxdim + 1 + 2 * i] = position[i];
        line[maxdim + 2 + 2 * i] = velocity[i];
        // a(d) = dt1 + dt2 d / g1 with d = t - tl
        line[maxdim + 7 + i * maxdim] = acceleration[i];
        line[maxdim + 8 + i * maxdim] = jerk[i] * step[0];
    }
    line[4 * maxdim + 7] = 4.0;
    line[4 * maxdim + 8..4 * maxdim + 11].copy_from_slice(&[2.0, 2.0, 2.0]);

    line.push(tl);
    if data_type == 21 {
        line.push(maxdim as f64);
    }
    line.push(1.0);
    line
}

/// Write a little-endian DAF/SPK file holding `segments`
pub fn write_spk(path: &Path, comments: &str, segments: &[TestSegment]) -> io::Result<()> {
    assert!(segments.len() <= 25, "one summary record holds 25 summaries");

    let comment_bytes: Vec<u8> = if comments.is_empty() {
        Vec::new()
    } else {
        comments
            .bytes()
            .map(|b| if b == b'\n' { 0 } else { b })
            .chain(std::iter::once(0x04))
            .collect()
    };
    let comment_records = comment_bytes.len().div_ceil(1000);
    let summary_record = 2 + comment_records;
    let first_data_record = summary_record + 2;

    let mut data_words = Vec::new();
    let mut addresses = Vec::new();
    let mut next_address = (first_data_record - 1) * WORDS_PER_RECORD + 1;
    for segment in segments {
        let start = next_address;
        let end = start + segment.data.len() - 1;
        addresses.push((start, end));
        data_words.extend_from_slice(&segment.data);
        next_address = end + 1;
    }

    let mut file = vec![0u8; RECORD * (first_data_record - 1)];

    // File record
    file[0..8].copy_from_slice(b"DAF/SPK ");
    LittleEndian::write_i32(&mut file[8..12], 2);
    LittleEndian::write_i32(&mut file[12..16], 6);
    let ifname = format!("{:<60}", "SYNTHETIC TEST KERNEL");
    file[16..76].copy_from_slice(ifname.as_bytes());
    LittleEndian::write_i32(&mut file[76..80], summary_record as i32);
    LittleEndian::write_i32(&mut file[80..84], summary_record as i32);
    LittleEndian::write_i32(&mut file[84..88], next_address as i32);
    file[88..96].copy_from_slice(b"LTL-IEEE");
    file[699..699 + FTPSTR.len()].copy_from_slice(FTPSTR);

    // Comment area
    for (i, chunk) in comment_bytes.chunks(1000).enumerate() {
        let offset = (1 + i) * RECORD;
        file[offset..offset + chunk.len()].copy_from_slice(chunk);
    }

    // Summary and name records
    let summary_offset = (summary_record - 1) * RECORD;
    let name_offset = summary_record * RECORD;
    LittleEndian::write_f64(&mut file[summary_offset + 16..summary_offset + 24], segments.len() as f64);
    for (i, (segment, (start, end))) in segments.iter().zip(&addresses).enumerate() {
        let base = summary_offset + 24 + i * 40;
        LittleEndian::write_f64(&mut file[base..base + 8], segment.start);
        LittleEndian::write_f64(&mut file[base + 8..base + 16], segment.end);
        let ints = [
            segment.target,
            segment.center,
            segment.frame,
            segment.data_type,
            *start as i32,
            *end as i32,
        ];
        for (j, value) in ints.iter().enumerate() {
            let pos = base + 16 + j * 4;
            LittleEndian::write_i32(&mut file[pos..pos + 4], *value);
        }

        let name = format!("{:<40}", segment.name);
        let pos = name_offset + i * 40;
        file[pos..pos + 40].copy_from_slice(&name.as_bytes()[..40]);
    }

    // Arrays, padded to a whole record
    let mut data_bytes = vec![0u8; data_words.len() * 8];
    LittleEndian::write_f64_into(&data_words, &mut data_bytes);
    file.extend_from_slice(&data_bytes);
    let padded = file.len().div_ceil(RECORD) * RECORD;
    file.resize(padded, 0);

    fs::write(path, file)
}
