//! End-to-end checks across meta-kernels, ephemerides, frames and photometry

#[path = "../src/jplephem/testdata.rs"]
#[allow(dead_code)]
mod testdata;

use std::fs;
use std::path::PathBuf;

use approx::assert_relative_eq;
use nalgebra::{Vector3, Vector6};
use rstest::rstest;
use spicetools::fastfunc::{Spkcvo, Spkgps};
use spicetools::frames::{rotate_vector, Frame};
use spicetools::kernel::MetaKernel;
use spicetools::phase::iau_hg_model;
use spicetools::query::sbdb::parse_response;
use spicetools::{Aberration, Ephemeris};
use testdata::{linear, write_spk};

const ASTEROID: i32 = 2003200;
const SPAN: (f64, f64) = (-1.0e7, 1.0e7);

const LSK: &str = r"KPL/LSK

\begindata
DELTET/DELTA_T_A = 32.184
DELTET/K         = 1.657D-3
DELTET/EB        = 1.671D-2
DELTET/M         = ( 6.239996D0 1.99096871D-7 )
DELTET/DELTA_AT  = ( 32, @1999-JAN-1
                     33, @2006-JAN-1
                     34, @2009-JAN-1
                     35, @2012-JUL-1
                     36, @2015-JUL-1
                     37, @2017-JAN-1 )
\begintext
";

/// Kernel tree with a planetary file, a small-body file and an LSK
fn kernel_tree(dir: &tempfile::TempDir) -> PathBuf {
    let spk_dir = dir.path().join("spk");
    fs::create_dir_all(&spk_dir).unwrap();
    fs::create_dir_all(dir.path().join("lsk")).unwrap();

    write_spk(
        &spk_dir.join("planets.bsp"),
        "Synthetic planets",
        &[
            linear(10, 0, 2, SPAN, [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
            linear(399, 0, 3, SPAN, [1.5e8, 0.0, 0.0], [0.0, 30.0, 0.0]),
        ],
    )
    .unwrap();
    write_spk(
        &spk_dir.join("phaethon.bsp"),
        "",
        &[linear(ASTEROID, 10, 21, SPAN, [0.0, 2.0e8, 0.0], [-20.0, 0.0, 0.0])],
    )
    .unwrap();
    fs::write(dir.path().join("lsk").join("naif.tls"), LSK).unwrap();

    let meta = dir.path().join("all.tm");
    MetaKernel::new(dir.path())
        .path_symbol("SPK", spk_dir.display().to_string())
        .kernels(["$KERNELS/lsk/naif.tls", "$SPK/planets.bsp", "$SPK/phaethon.bsp"])
        .write(&meta)
        .unwrap();
    meta
}

#[test]
fn test_meta_kernel_loads_everything() {
    let dir = tempfile::tempdir().unwrap();
    let meta = kernel_tree(&dir);

    let mut ephem = Ephemeris::new();
    ephem.furnsh(&meta).unwrap();
    assert_eq!(ephem.loaded_kernels().len(), 4);
    assert_eq!(ephem.loaded_kernels()[0], meta);
    assert_eq!(ephem.leapseconds().unwrap().delta_at.len(), 6);

    let et = ephem.str2et("2000-01-01T12:00:00").unwrap();
    assert_relative_eq!(et, 64.18392728473108, epsilon = 1e-6);

    let (position, lt) = ephem.spkgps(ASTEROID, 0.0, Frame::J2000, 399).unwrap();
    assert_relative_eq!(position, Vector3::new(-1.5e8, 2.0e8, 0.0), epsilon = 1e-3);
    assert_relative_eq!(lt, 2.5e8 / spicetools::constants::SPEED_OF_LIGHT_KM_S, epsilon = 1e-9);

    ephem.unload_all();
    assert!(ephem.spkgps(ASTEROID, 0.0, Frame::J2000, 399).is_err());
}

#[rstest]
#[case(0.0)]
#[case(86400.0)]
#[case(-3.0e6)]
fn test_prebound_calls_agree_with_ephemeris(#[case] et: f64) {
    let dir = tempfile::tempdir().unwrap();
    let mut ephem = Ephemeris::new();
    ephem.furnsh(kernel_tree(&dir)).unwrap();

    let gps = Spkgps::new(&ephem, "ECLIPJ2000", 399).unwrap();
    let ecliptic = gps.call(ASTEROID, et).unwrap();
    let (equatorial, _) = ephem.spkgps(ASTEROID, et, Frame::J2000, 399).unwrap();
    assert_relative_eq!(
        ecliptic,
        rotate_vector(&equatorial, Frame::J2000, Frame::EclipJ2000),
        epsilon = 1e-6
    );

    let cvo = Spkcvo::new(&ephem, "J2000", "OBSERVER", "NONE", "EARTH", "J2000").unwrap();
    let state = cvo.call("2003200", &Vector6::zeros(), et).unwrap();
    let (geometric, _) = ephem.spkgeo(ASTEROID, et, Frame::J2000, 399).unwrap();
    assert_relative_eq!(state, geometric, epsilon = 1e-6);
}

#[test]
fn test_light_time_corrected_range_is_shorter_for_receding_target() {
    let dir = tempfile::tempdir().unwrap();
    let mut ephem = Ephemeris::new();
    ephem.furnsh(kernel_tree(&dir)).unwrap();

    let cvo = Spkcvo::new(&ephem, "J2000", "OBSERVER", "CN", "10", "J2000").unwrap();
    assert_eq!(cvo.abcorr(), Aberration::Cn);

    // Seen from the Sun the asteroid moves perpendicular to the line of sight
    let (state, lt) = cvo.call_with_lt("2003200", &Vector6::zeros(), 1000.0).unwrap();
    let c = spicetools::constants::SPEED_OF_LIGHT_KM_S;
    assert_relative_eq!(state[0], -20.0 * (1000.0 - lt), epsilon = 1e-3);
    assert_relative_eq!(state[1], 2.0e8, epsilon = 1e-3);
    assert_relative_eq!(lt, state.fixed_rows::<3>(0).norm() / c, epsilon = 1e-9);
}

#[test]
fn test_phase_angle_to_reduced_magnitude() {
    let dir = tempfile::tempdir().unwrap();
    let mut ephem = Ephemeris::new();
    ephem.furnsh(kernel_tree(&dir)).unwrap();

    let (to_sun, _) = ephem.spkgps(10, 0.0, Frame::J2000, ASTEROID).unwrap();
    let (to_earth, _) = ephem.spkgps(399, 0.0, Frame::J2000, ASTEROID).unwrap();
    let alpha = to_sun.angle(&to_earth).to_degrees();
    assert_relative_eq!(alpha, 0.8f64.acos().to_degrees(), epsilon = 1e-9);

    let h = 14.3;
    let r_au = to_sun.norm() / spicetools::constants::AU2KM;
    let delta_au = to_earth.norm() / spicetools::constants::AU2KM;
    let mag = h + 5.0 * (r_au * delta_au).log10() - 2.5 * iau_hg_model(alpha, 0.15).log10();
    assert!(mag > h);
    assert!(iau_hg_model(alpha, 0.15) < iau_hg_model(20.0, 0.15));
}

#[test]
fn test_sbdb_response_to_csv() {
    let body = r#"{
        "signature": {"source": "NASA/JPL Small-Body Database (SBDB) Query API", "version": "1.0"},
        "count": 2,
        "fields": ["spkid", "full_name", "H"],
        "data": [
            ["2003200", "  3200 Phaethon (1983 TB)", "14.32"],
            ["20000001", "     1 Ceres (A801 AA)", null]
        ]
    }"#;
    let table = parse_response(body).unwrap();
    assert_eq!(table.len(), 2);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sbdb.csv");
    table.write_csv(fs::File::create(&path).unwrap()).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.iter().collect::<Vec<_>>(), vec!["spkid", "full_name", "H"]);
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(&rows[0][0], "2003200");
    assert_eq!(&rows[1][2], "");
}
