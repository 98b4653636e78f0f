//! Double Array File format module for reading SPICE DAF files
//!
//! This module provides functionality for reading NAIF's Double Array File (DAF)
//! format, which is the container format of binary SPK kernels.
//!
//! The file is memory mapped once on open and all reads are served from the map.

use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use log::debug;
use memmap2::Mmap;

use crate::jplephem::errors::{io_err, JplephemError, Result};

/// Size of a DAF record (bytes)
pub const RECORD_SIZE: usize = 1024;
/// Size of a double-precision value (bytes)
const DOUBLE_SIZE: usize = 8;
/// FTP corruption detection string stored in every modern DAF file record
pub const FTPSTR: &[u8] = b"FTPSTR:\r:\n:\r\n:\r\x00:\x81:\x10\xce:ENDFTP";
/// Byte offset of the FTP validation string in the file record
const FTP_OFFSET: usize = 699;
/// Upper bound on summary records we will walk before assuming a cycle
const MAX_SUMMARY_RECORDS: usize = 100_000;

/// DAF file endianness
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

impl Endian {
    fn read_f64(self, buf: &[u8]) -> f64 {
        match self {
            Endian::Big => BigEndian::read_f64(buf),
            Endian::Little => LittleEndian::read_f64(buf),
        }
    }

    fn read_i32(self, buf: &[u8]) -> i32 {
        match self {
            Endian::Big => BigEndian::read_i32(buf),
            Endian::Little => LittleEndian::read_i32(buf),
        }
    }
}

/// A single array summary from a DAF summary record
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Array name from the matching name record
    pub name: String,
    /// The ND double-precision components
    pub doubles: Vec<f64>,
    /// The NI integer components
    pub integers: Vec<i32>,
}

/// Double Array File (DAF) file reader
pub struct DAF {
    /// Path to the DAF file
    pub path: PathBuf,
    /// File identification word, e.g. "DAF/SPK"
    pub locidw: String,
    /// Number of double-precision components
    pub nd: u32,
    /// Number of integer components
    pub ni: u32,
    /// Forward pointer to first summary record
    pub fward: u32,
    /// Backward pointer to last summary record
    pub bward: u32,
    /// First free address
    pub free: u32,
    /// Internal file name
    pub ifname: String,
    /// Byte order (endianness)
    pub endian: Endian,
    map: Mmap,
}

impl DAF {
    /// Open a DAF file at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let file = File::open(&path_buf).map_err(|e| io_err(&path_buf, e))?;

        // Safety: the map is read-only and kernels are not modified while loaded
        let map = unsafe { Mmap::map(&file) }.map_err(|e| io_err(&path_buf, e))?;

        if map.len() < RECORD_SIZE {
            return Err(JplephemError::InvalidFormat(format!(
                "{} is too short to be a DAF file ({} bytes)",
                path_buf.display(),
                map.len()
            )));
        }

        let header = &map[..RECORD_SIZE];
        let locidw = String::from_utf8_lossy(&header[0..8]).trim_end().to_string();
        if !locidw.starts_with("DAF/") && locidw != "NAIF/DAF" {
            return Err(JplephemError::InvalidFormat(format!(
                "Unrecognized file ID word {:?} in {}",
                locidw,
                path_buf.display()
            )));
        }

        let endian = detect_endian(header)?;
        check_ftp_string(header)?;

        let nd = endian.read_i32(&header[8..12]);
        let ni = endian.read_i32(&header[12..16]);
        let ifname = String::from_utf8_lossy(&header[16..76]).trim_end().to_string();
        let fward = endian.read_i32(&header[76..80]);
        let bward = endian.read_i32(&header[80..84]);
        let free = endian.read_i32(&header[84..88]);

        if nd <= 0 || ni <= 0 || fward <= 0 || bward <= 0 || free <= 0 {
            return Err(JplephemError::InvalidFormat(format!(
                "Invalid DAF header: nd={}, ni={}, fward={}, bward={}, free={}",
                nd, ni, fward, bward, free
            )));
        }

        debug!(
            "DAF header for {}: locidw={}, nd={}, ni={}, fward={}, bward={}, free={}, endian={:?}",
            path_buf.display(),
            locidw,
            nd,
            ni,
            fward,
            bward,
            free,
            endian
        );

        Ok(DAF {
            path: path_buf,
            locidw,
            nd: nd as u32,
            ni: ni as u32,
            fward: fward as u32,
            bward: bward as u32,
            free: free as u32,
            ifname,
            endian,
            map,
        })
    }

    /// Number of double words occupied by one summary
    fn summary_length(&self) -> usize {
        self.nd as usize + (self.ni as usize + 1) / 2
    }

    /// Return the bytes of a record (1-indexed)
    pub fn read_record(&self, record_number: usize) -> Result<&[u8]> {
        if record_number < 1 {
            return Err(JplephemError::InvalidFormat(format!(
                "Invalid record number: {}",
                record_number
            )));
        }
        let offset = (record_number - 1) * RECORD_SIZE;
        let end = offset + RECORD_SIZE;
        if end > self.map.len() {
            return Err(JplephemError::InvalidFormat(format!(
                "Record {} lies beyond the end of {}",
                record_number,
                self.path.display()
            )));
        }
        Ok(&self.map[offset..end])
    }

    /// Read comments from the comment area of the file
    ///
    /// Lines are NUL terminated and the area ends at an EOT byte.
    pub fn comments(&self) -> Result<String> {
        let mut raw = Vec::new();
        for record_number in 2..self.fward as usize {
            let record = self.read_record(record_number)?;
            // Only the first 1000 bytes of a comment record carry text
            let text = &record[..1000];
            if let Some(eot) = text.iter().position(|&b| b == 0x04) {
                raw.extend_from_slice(&text[..eot]);
                break;
            }
            raw.extend_from_slice(text);
        }

        let text: String = raw
            .iter()
            .map(|&b| if b == 0 { '\n' } else { b as char })
            .collect();
        Ok(text.trim_end().to_string())
    }

    /// Walk the summary record list and return every array summary
    pub fn summaries(&self) -> Result<Vec<Summary>> {
        let nd = self.nd as usize;
        let ni = self.ni as usize;
        let step = self.summary_length() * DOUBLE_SIZE;

        let mut result = Vec::new();
        let mut visited = HashSet::new();
        let mut record_number = self.fward as usize;

        while record_number > 0 {
            if !visited.insert(record_number) || visited.len() > MAX_SUMMARY_RECORDS {
                return Err(JplephemError::InvalidFormat(format!(
                    "Cycle in summary records at record {}",
                    record_number
                )));
            }

            let summary_data = self.read_record(record_number)?;
            let name_data = self.read_record(record_number + 1)?;

            let next = self.endian.read_f64(&summary_data[0..8]) as usize;
            let n_summaries = self.endian.read_f64(&summary_data[16..24]) as usize;

            let used = n_summaries.checked_mul(step).and_then(|bytes| bytes.checked_add(24));
            if used.map_or(true, |bytes| bytes > RECORD_SIZE) {
                return Err(JplephemError::InvalidFormat(format!(
                    "Summary record {} claims {} summaries",
                    record_number, n_summaries
                )));
            }

            for i in 0..n_summaries {
                let start = 24 + i * step;
                let doubles = (0..nd)
                    .map(|j| {
                        let pos = start + j * DOUBLE_SIZE;
                        self.endian.read_f64(&summary_data[pos..pos + DOUBLE_SIZE])
                    })
                    .collect();

                let int_start = start + nd * DOUBLE_SIZE;
                let integers = (0..ni)
                    .map(|j| {
                        let pos = int_start + j * 4;
                        self.endian.read_i32(&summary_data[pos..pos + 4])
                    })
                    .collect();

                let name_start = i * step;
                let name = String::from_utf8_lossy(&name_data[name_start..name_start + step])
                    .trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
                    .to_string();

                result.push(Summary {
                    name,
                    doubles,
                    integers,
                });
            }

            record_number = next;
        }

        debug!(
            "Read {} summaries from {}",
            result.len(),
            self.path.display()
        );
        Ok(result)
    }

    /// Read the f64 values at 1-based word addresses `start..=end`
    pub fn read_array(&self, start: usize, end: usize) -> Result<Vec<f64>> {
        if start < 1 || end < start {
            return Err(JplephemError::InvalidFormat(format!(
                "Invalid array bounds: start={}, end={}",
                start, end
            )));
        }

        let first = (start - 1) * DOUBLE_SIZE;
        let last = end * DOUBLE_SIZE;
        if last > self.map.len() {
            return Err(JplephemError::InvalidFormat(format!(
                "Array {}..{} lies beyond the end of {}",
                start,
                end,
                self.path.display()
            )));
        }

        Ok(self.map[first..last]
            .chunks_exact(DOUBLE_SIZE)
            .map(|chunk| self.endian.read_f64(chunk))
            .collect())
    }
}

impl std::fmt::Debug for DAF {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DAF")
            .field("path", &self.path)
            .field("locidw", &self.locidw)
            .field("nd", &self.nd)
            .field("ni", &self.ni)
            .field("endian", &self.endian)
            .finish()
    }
}

/// Determine the byte order of a DAF file record
fn detect_endian(header: &[u8]) -> Result<Endian> {
    match &header[88..96] {
        b"LTL-IEEE" => return Ok(Endian::Little),
        b"BIG-IEEE" => return Ok(Endian::Big),
        _ => {}
    }

    // Pre-N0050 files have no format word; fall back to ND/NI plausibility
    let nd_little = LittleEndian::read_i32(&header[8..12]);
    let ni_little = LittleEndian::read_i32(&header[12..16]);
    if (1..=124).contains(&nd_little) && (2..=250).contains(&ni_little) {
        return Ok(Endian::Little);
    }
    let nd_big = BigEndian::read_i32(&header[8..12]);
    let ni_big = BigEndian::read_i32(&header[12..16]);
    if (1..=124).contains(&nd_big) && (2..=250).contains(&ni_big) {
        return Ok(Endian::Big);
    }

    Err(JplephemError::InvalidFormat(
        "Could not determine DAF byte order".to_string(),
    ))
}

/// Reject files whose FTP validation string was mangled by a text-mode transfer
fn check_ftp_string(header: &[u8]) -> Result<()> {
    let stored = &header[FTP_OFFSET..FTP_OFFSET + FTPSTR.len()];
    if stored.iter().all(|&b| b == 0) || stored == FTPSTR {
        Ok(())
    } else {
        Err(JplephemError::InvalidFormat(
            "DAF file was corrupted by an ASCII-mode FTP transfer".to_string(),
        ))
    }
}
