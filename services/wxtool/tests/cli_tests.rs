//! End-to-end tests running the wxtool binary.

use std::path::Path;
use std::process::{Command, Output};

use test_utils::fixtures::SAMPLE_CONFIG_YAML;
use test_utils::{offset_ensemble, regular_axis, temperature_field};
use wx_common::save_field;

fn wxtool(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_wxtool"))
        .arg("--config")
        .arg(config)
        .args(["--log-level", "warn"])
        .args(args)
        .env_remove("WX_REGRID_METHOD")
        .env_remove("WX_WEIGHTS_DIR")
        .output()
        .expect("failed to run wxtool")
}

fn write_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("wxtool.yaml");
    std::fs::write(&path, SAMPLE_CONFIG_YAML).unwrap();
    path
}

#[test]
fn test_info_lists_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let output = wxtool(&write_config(dir.path()), &["info"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("local_gfs"));
    assert!(stdout.contains("europe"));
    assert!(stdout.contains("coarse_2p0"));
}

#[test]
fn test_missing_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = wxtool(&dir.path().join("absent.yaml"), &["info"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error"));
}

#[test]
fn test_analyze_writes_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());

    let base = temperature_field(regular_axis(40.0, 1.0, 6), regular_axis(-5.0, 1.0, 8));
    let mut files = Vec::new();
    for (i, member) in offset_ensemble(&base, "t2m", &[0.0, 0.5, 1.5]).iter().enumerate() {
        let path = dir.path().join(format!("m{}.json", i));
        save_field(member, &path).unwrap();
        files.push(path.display().to_string());
    }

    let png = dir.path().join("out/spread.png");
    let json = dir.path().join("out/summary.json");
    let mut args = vec!["analyze", "--var", "t2m", "--files"];
    args.extend(files.iter().map(String::as_str));
    let png_arg = png.display().to_string();
    let json_arg = json.display().to_string();
    args.extend(["--output", png_arg.as_str(), "--json", json_arg.as_str()]);

    let output = wxtool(&config, &args);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ENSEMBLE ANALYSIS SUMMARY"));
    assert!(stdout.contains("Model_0"));
    assert!(png.is_file());
    assert!(json.is_file());
}

#[test]
fn test_analyze_label_mismatch_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());

    let base = temperature_field(regular_axis(40.0, 1.0, 3), regular_axis(0.0, 1.0, 3));
    let mut files = Vec::new();
    for (i, member) in offset_ensemble(&base, "t2m", &[0.0, 1.0]).iter().enumerate() {
        let path = dir.path().join(format!("m{}.json", i));
        save_field(member, &path).unwrap();
        files.push(path.display().to_string());
    }

    let png = dir.path().join("spread.png").display().to_string();
    let output = wxtool(
        &config,
        &["analyze", "--var", "t2m", "--files", &files[0], &files[1], "--labels", "only_one", "--output", &png],
    );
    assert!(!output.status.success());
}
