//! Runs the `spicetools` binary on synthetic inputs

#[path = "../src/jplephem/testdata.rs"]
#[allow(dead_code)]
mod testdata;

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use testdata::{linear, write_spk};

fn spicetools(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_spicetools"))
        .args(args)
        .env_remove("SPICETOOLS_CONFIG")
        .env_remove("SPICETOOLS_HTTP_TIMEOUT")
        .env("SPICETOOLS_KERNEL_DIR", dir)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "spicetools failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn test_info_lists_segments_and_coverage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("planets.bsp");
    write_spk(
        &path,
        "Synthetic planets for the info command",
        &[
            linear(10, 0, 2, (-1.0e7, 1.0e7), [0.0; 3], [0.0; 3]),
            linear(399, 10, 3, (0.0, 2.0e7), [1.5e8, 0.0, 0.0], [0.0, 30.0, 0.0]),
        ],
    )
    .unwrap();

    let text = stdout(&spicetools(dir.path(), &["info", path.to_str().unwrap()]));
    assert!(text.contains("Segments (2 total)"), "{}", text);
    assert!(text.contains("Overall Time Coverage"), "{}", text);
    assert!(text.contains("Sun"), "{}", text);
    assert!(text.contains("Earth"), "{}", text);
    assert!(text.contains("Bodies (3)"), "{}", text);
    assert!(text.contains("Synthetic planets for the info command"), "{}", text);

    let comments = stdout(&spicetools(dir.path(), &["info", "--comments", path.to_str().unwrap()]));
    assert!(!comments.contains("Segments"), "{}", comments);
    assert!(comments.contains("Synthetic planets for the info command"), "{}", comments);
}

#[test]
fn test_info_on_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.bsp");
    let output = spicetools(dir.path(), &["info", missing.to_str().unwrap()]);
    assert!(!output.status.success());
}

#[test]
fn test_et_and_hg_print_values() {
    let dir = tempfile::tempdir().unwrap();

    let et = stdout(&spicetools(dir.path(), &["et", "2000-01-01T12:00:00"]));
    assert_eq!(et.trim(), "2000-01-01T12:00:00\t64.183927");

    let hg = stdout(&spicetools(dir.path(), &["hg", "20"]));
    assert_eq!(hg.trim(), "20\t0.398067159767");
}

#[test]
fn test_meta_expands_kernel_dir_from_environment() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("all.tm");

    let printed = stdout(&spicetools(
        dir.path(),
        &["meta", "-o", output.to_str().unwrap(), "$KERNELS/lsk/naif0012.tls"],
    ));
    assert_eq!(printed.trim(), output.display().to_string());

    let contents = fs::read_to_string(&output).unwrap();
    assert!(contents.contains(&dir.path().display().to_string()), "{}", contents);
    assert!(contents.contains("$KERNELS/lsk/naif0012.tls"), "{}", contents);
}
