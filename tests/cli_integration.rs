//! Integration tests for the CLI surface.

#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_help_lists_commands() {
    let mut cmd = Command::new(cargo_bin("avistar"));
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_config_path_prints_toml_path() {
    let mut cmd = Command::new(cargo_bin("avistar"));
    cmd.arg("config").arg("path");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_no_inputs_fails() {
    let mut cmd = Command::new(cargo_bin("avistar"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no valid image files"));
}

#[test]
fn test_rejects_out_of_range_confidence() {
    let mut cmd = Command::new(cargo_bin("avistar"));
    cmd.arg("-c").arg("1.5").arg("photo.jpg");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("between 0.0 and 1.0"));
}

#[test]
fn test_rejects_unknown_output_layout() {
    let mut cmd = Command::new(cargo_bin("avistar"));
    cmd.arg("--output-layout").arg("diagonal").arg("photo.jpg");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown output layout"));
}

#[test]
fn test_missing_model_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let photo = dir.path().join("photo.png");
    image::DynamicImage::ImageRgb8(image::RgbImage::new(4, 4))
        .save_with_format(&photo, image::ImageFormat::Png)
        .unwrap();

    let mut cmd = Command::new(cargo_bin("avistar"));
    cmd.arg("--model")
        .arg(dir.path().join("missing.onnx"))
        .arg(&photo);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("model file does not exist"));
}
