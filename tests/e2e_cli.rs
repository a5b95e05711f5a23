//! CLI end-to-end tests
//!
//! Tests for the clipforge command-line interface. Transcode tests pass
//! `--duration` so no ffprobe is needed; the full run uses a scripted
//! stand-in for ffmpeg.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{tempdir, TempDir};

/// Get a command for the clipforge binary, isolated from any user config.
#[allow(deprecated)]
fn clipforge_cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("clipforge").unwrap();
    cmd.current_dir(home).env("HOME", home).env_remove("RUST_LOG");
    cmd
}

fn sample_input(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("clip.mov");
    fs::write(&path, vec![7u8; 2048]).unwrap();
    path
}

#[test]
fn test_cli_no_args_shows_help() {
    let dir = tempdir().unwrap();
    clipforge_cmd(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let dir = tempdir().unwrap();
    clipforge_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("clipforge"))
        .stdout(predicate::str::contains("transcode"));
}

#[test]
fn test_cli_version_command() {
    let dir = tempdir().unwrap();
    clipforge_cmd(dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("clipforge "));
}

#[test]
fn test_transcode_help_lists_flags() {
    let dir = tempdir().unwrap();
    clipforge_cmd(dir.path())
        .args(["transcode", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--target-size"))
        .stdout(predicate::str::contains("--trim-start"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_dry_run_size_mode() {
    let dir = tempdir().unwrap();
    let input = sample_input(&dir);

    clipforge_cmd(dir.path())
        .arg("transcode")
        .arg(&input)
        .args(["--duration", "300", "-s", "50", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY RUN]"))
        .stdout(predicate::str::contains("-b:v 1237k"))
        .stdout(predicate::str::contains("Video rate:   1237 kbps"))
        .stdout(predicate::str::contains("output.mp4"));
}

#[test]
fn test_dry_run_json_plan() {
    let dir = tempdir().unwrap();
    let input = sample_input(&dir);

    let output = clipforge_cmd(dir.path())
        .arg("transcode")
        .arg(&input)
        .args(["--duration", "120", "--trim-start", "10", "--trim-end", "40"])
        .args(["-f", "webm", "-r", "720p", "--dry-run", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["container"], "webm");
    assert_eq!(plan["video_codec"], "libvpx-vp9");
    assert_eq!(plan["effective_duration_secs"], 30.0);
    let args: Vec<&str> = plan["arguments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a.as_str().unwrap())
        .collect();
    assert_eq!(args[..2], ["-i", "input.mov"]);
    assert!(args.contains(&"scale=1280:720"));
    assert_eq!(args.last(), Some(&"output.webm"));
}

#[test]
fn test_inverted_trim_fails() {
    let dir = tempdir().unwrap();
    let input = sample_input(&dir);

    clipforge_cmd(dir.path())
        .arg("transcode")
        .arg(&input)
        .args(["--duration", "120", "--trim-start", "50", "--trim-end", "10", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid trim window"));
}

#[test]
fn test_avi_size_mode_fails() {
    let dir = tempdir().unwrap();
    let input = sample_input(&dir);

    clipforge_cmd(dir.path())
        .arg("transcode")
        .arg(&input)
        .args(["--duration", "60", "-f", "avi", "-s", "10", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported combination"));
}

#[test]
fn test_quality_out_of_range_rejected_by_parser() {
    let dir = tempdir().unwrap();
    let input = sample_input(&dir);

    clipforge_cmd(dir.path())
        .arg("transcode")
        .arg(&input)
        .args(["--duration", "60", "-q", "60", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("60"));
}

#[test]
fn test_missing_input_fails() {
    let dir = tempdir().unwrap();

    clipforge_cmd(dir.path())
        .args(["transcode", "/nonexistent/clip.mov", "--duration", "10", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_validate_config_file() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("custom.toml");
    fs::write(
        &config,
        "[encoding]\npreset = \"fast\"\ndefault_format = \"mkv\"\n",
    )
    .unwrap();

    clipforge_cmd(dir.path())
        .arg("validate")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("Preset: fast"))
        .stdout(predicate::str::contains("clip_processed.mkv"));
}

#[test]
fn test_validate_rejects_bad_config() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("bad.toml");
    fs::write(&config, "[engine]\ntimeout_secs = 0\n").unwrap();

    clipforge_cmd(dir.path())
        .arg("validate")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("timeout"));
}

#[test]
fn test_validate_without_config_uses_defaults() {
    let dir = tempdir().unwrap();
    clipforge_cmd(dir.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("using defaults"));
}

#[test]
fn test_check_engine_reports_missing_sources() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("clipforge.toml");
    fs::write(
        &config,
        "[[engine.sources]]\nname = \"ghost\"\npath = \"/nonexistent/ffmpeg\"\n",
    )
    .unwrap();

    clipforge_cmd(dir.path())
        .args(["--config"])
        .arg(&config)
        .arg("check-engine")
        .assert()
        .failure()
        .stdout(predicate::str::contains("✗ ghost"));
}

/// Writes a shell script that answers `-version` and otherwise copies the
/// `-i` input to the last argument while reporting progress.
#[cfg(unix)]
fn fake_ffmpeg(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("fake-ffmpeg");
    fs::write(
        &script,
        r#"#!/bin/sh
if [ "$1" = "-version" ]; then
  echo "ffmpeg version 6.1-fake"
  exit 0
fi
prev=""
for a in "$@"; do
  if [ "$prev" = "-i" ]; then input="$a"; fi
  prev="$a"
  last="$a"
done
echo "out_time_us=15000000" >&2
echo "progress=continue" >&2
echo "out_time_us=30000000" >&2
echo "progress=end" >&2
cp "$input" "$last"
"#,
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    script
}

#[cfg(unix)]
#[test]
fn test_full_transcode_with_scripted_engine() {
    let dir = tempdir().unwrap();
    let input = sample_input(&dir);
    let engine = fake_ffmpeg(dir.path());
    let out_dir = dir.path().join("out");

    let config = dir.path().join("clipforge.toml");
    fs::write(
        &config,
        format!(
            "[[engine.sources]]\nname = \"scripted\"\npath = \"{}\"\n",
            engine.display()
        ),
    )
    .unwrap();

    clipforge_cmd(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("transcode")
        .arg(&input)
        .args(["--duration", "60", "--trim-start", "0", "--trim-end", "30"])
        .arg("-o")
        .arg(&out_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Processing complete!"))
        .stderr(predicate::str::contains("100.0%"));

    let produced = out_dir.join("clip_processed.mp4");
    assert_eq!(fs::read(&produced).unwrap(), vec![7u8; 2048]);
}

#[cfg(unix)]
#[test]
fn test_check_engine_with_scripted_engine() {
    let dir = tempdir().unwrap();
    let engine = fake_ffmpeg(dir.path());
    let config = dir.path().join("clipforge.toml");
    fs::write(
        &config,
        format!(
            "[engine]\nprobe_program = \"/nonexistent/ffprobe\"\n\n[[engine.sources]]\nname = \"scripted\"\npath = \"{}\"\n",
            engine.display()
        ),
    )
    .unwrap();

    clipforge_cmd(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("check-engine")
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ scripted"))
        .stdout(predicate::str::contains("6.1-fake"))
        .stdout(predicate::str::contains("An engine is available!"));
}
