//! Standard NAIF body names and ID numbers
//!
//! This module provides mappings between celestial body names and the NAIF
//! integer codes stored in SPK segments.

use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    /// Map from ID numbers to the first (canonical) name listed for them
    static ref TARGET_NAMES: HashMap<i32, &'static str> = {
        let mut m = HashMap::new();
        for &(id, name) in TARGET_NAME_PAIRS.iter() {
            m.entry(id).or_insert(name);
        }
        m
    };

    /// Map from normalized names to ID numbers
    static ref TARGET_IDS: HashMap<String, i32> = {
        let mut m = HashMap::new();
        for &(id, name) in TARGET_NAME_PAIRS.iter() {
            m.insert(normalize(name), id);
        }
        m
    };
}

/// Collapse case and separators so "Earth Barycenter" matches "EARTH_BARYCENTER"
fn normalize(name: &str) -> String {
    name.split(|c: char| c.is_whitespace() || c == '_')
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Get the name of a target given its ID number
pub fn target_name(id: i32) -> Option<&'static str> {
    TARGET_NAMES.get(&id).copied()
}

/// Get the ID number of a target given its name
pub fn target_id(name: &str) -> Option<i32> {
    TARGET_IDS.get(&normalize(name)).copied()
}

/// Resolve a body given either a known name or an integer code such as "20003200"
pub fn body_id(name_or_id: &str) -> Option<i32> {
    let trimmed = name_or_id.trim();
    trimmed.parse::<i32>().ok().or_else(|| target_id(trimmed))
}

/// Title-case a target name, leaving designations such as "C/1995 O1" alone
pub fn titlecase(name: &str) -> String {
    if name.starts_with('1') || name.starts_with("C/") || name.starts_with("DSS-") {
        return name.to_string();
    }
    name.split(|c: char| c.is_whitespace() || c == '_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => c
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Pairs of (id, name) for celestial bodies
const TARGET_NAME_PAIRS: &[(i32, &str)] = &[
    (0, "SOLAR_SYSTEM_BARYCENTER"),
    (0, "SSB"),
    (1, "MERCURY_BARYCENTER"),
    (2, "VENUS_BARYCENTER"),
    (3, "EARTH_BARYCENTER"),
    (3, "EMB"),
    (3, "EARTH MOON BARYCENTER"),
    (3, "EARTH-MOON BARYCENTER"),
    (4, "MARS_BARYCENTER"),
    (5, "JUPITER_BARYCENTER"),
    (6, "SATURN_BARYCENTER"),
    (7, "URANUS_BARYCENTER"),
    (8, "NEPTUNE_BARYCENTER"),
    (9, "PLUTO_BARYCENTER"),
    (10, "SUN"),
    (199, "MERCURY"),
    (299, "VENUS"),
    (399, "EARTH"),
    (301, "MOON"),
    (499, "MARS"),
    (401, "PHOBOS"),
    (402, "DEIMOS"),
    (599, "JUPITER"),
    (501, "IO"),
    (502, "EUROPA"),
    (503, "GANYMEDE"),
    (504, "CALLISTO"),
    (699, "SATURN"),
    (606, "TITAN"),
    (799, "URANUS"),
    (899, "NEPTUNE"),
    (999, "PLUTO"),
    (2000001, "CERES"),
    (2000002, "PALLAS"),
    (2000004, "VESTA"),
    (20003200, "PHAETHON"),
];

/// Common target name/ID pairs used in applications
pub mod targets {
    /// Solar System Barycenter
    pub const SOLAR_SYSTEM_BARYCENTER: i32 = 0;
    /// Earth-Moon Barycenter
    pub const EARTH_MOON_BARYCENTER: i32 = 3;
    /// Sun
    pub const SUN: i32 = 10;
    /// Earth
    pub const EARTH: i32 = 399;
    /// Moon
    pub const MOON: i32 = 301;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_lookup() {
        assert_eq!(target_id("earth"), Some(399));
        assert_eq!(target_id("Earth Barycenter"), Some(3));
        assert_eq!(target_id("solar system barycenter"), Some(0));
        assert_eq!(target_name(10), Some("SUN"));
        assert_eq!(target_name(0), Some("SOLAR_SYSTEM_BARYCENTER"));
        assert_eq!(target_id("vulcan"), None);
    }

    #[test]
    fn test_body_id_accepts_codes() {
        assert_eq!(body_id("399"), Some(399));
        assert_eq!(body_id(" 20003200 "), Some(20003200));
        assert_eq!(body_id("-82"), Some(-82));
        assert_eq!(body_id("MOON"), Some(301));
    }

    #[test]
    fn test_titlecase() {
        assert_eq!(titlecase("EARTH_BARYCENTER"), "Earth Barycenter");
        assert_eq!(titlecase("MARS"), "Mars");
        assert_eq!(titlecase("CERES"), "Ceres");
        assert_eq!(titlecase("C/1995 O1"), "C/1995 O1");
        assert_eq!(titlecase("1P/HALLEY"), "1P/HALLEY");
    }
}
