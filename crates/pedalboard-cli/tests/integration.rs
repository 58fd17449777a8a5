//! Integration tests for pedalboard-cli.
//!
//! Runs the built binary and checks its output.

use std::process::Command;

use tempfile::TempDir;

/// Helper to get the path to the `pedalboard` binary built by cargo.
fn pedalboard_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pedalboard"))
}

fn run_ok(args: &[&str]) -> String {
    let output = pedalboard_bin()
        .args(args)
        .output()
        .expect("failed to run pedalboard");
    assert!(
        output.status.success(),
        "pedalboard {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// ---------------------------------------------------------------------------
// pedals
// ---------------------------------------------------------------------------

#[test]
fn cli_pedals_lists_all_pedals() {
    let stdout = run_ok(&["pedals"]);
    assert!(stdout.contains("Available Pedals"));
    for pedal in ["overdrive", "delay", "reverb", "cabinet", "volume"] {
        assert!(stdout.contains(pedal), "listing should contain '{pedal}'");
    }
}

#[test]
fn cli_pedals_shows_pots() {
    let stdout = run_ok(&["pedals", "cabinet"]);
    for pot in ["level", "cabinet", "bass", "mid", "treble", "presence"] {
        assert!(stdout.contains(pot), "cabinet details should list '{pot}'");
    }
    assert!(stdout.contains("selector"));
}

#[test]
fn cli_pedals_json_is_parseable() {
    let stdout = run_ok(&["pedals", "--json"]);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 5);
}

#[test]
fn cli_unknown_pedal_fails() {
    let output = pedalboard_bin().args(["pedals", "wah"]).output().unwrap();
    assert!(!output.status.success());
}

// ---------------------------------------------------------------------------
// preset
// ---------------------------------------------------------------------------

#[test]
fn cli_preset_list_shows_factory_presets() {
    let stdout = run_ok(&["preset", "list"]);
    for name in ["clean", "crunch", "ambient", "british_stack"] {
        assert!(stdout.contains(name));
    }
}

#[test]
fn cli_preset_show_factory() {
    let stdout = run_ok(&["preset", "show", "crunch"]);
    assert!(stdout.contains("Preset: Crunch"));
    assert!(stdout.contains("1. overdrive"));
    assert!(stdout.contains("drive = 5"));
}

#[test]
fn cli_preset_validate_file_with_unknown_pedal() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("board.json");
    std::fs::write(
        &path,
        r#"{ "pedals": [
            { "name": "overdrive", "bypassed": false, "pots": [ { "name": "fuzz", "value": 3 } ] },
            { "name": "wah", "bypassed": true }
        ] }"#,
    )
    .unwrap();

    let stdout = run_ok(&["preset", "validate", path.to_str().unwrap()]);
    assert!(stdout.contains("unknown pedal 'wah'"));
    assert!(stdout.contains("no pot 'fuzz'"));
    assert!(stdout.contains("2 warning(s)"));
}

#[test]
fn cli_preset_validate_rejects_malformed_document() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.json");
    std::fs::write(&path, r#"{ "pedals": [ { "name": "delay" } ] }"#).unwrap();

    let output = pedalboard_bin()
        .args(["preset", "validate", path.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

// ---------------------------------------------------------------------------
// topology / play
// ---------------------------------------------------------------------------

#[test]
fn cli_topology_prints_unbroken_path() {
    let stdout = run_ok(&["topology", "clean"]);
    assert!(stdout.contains("Signal path:"));
    assert!(stdout.contains("board in -> overdrive in"));
    assert!(stdout.contains("volume out -> board out"));
    assert!(!stdout.contains("BROKEN"));
}

#[test]
fn cli_topology_all_engaged() {
    let stdout = run_ok(&["topology", "ambient", "--all", "on"]);
    assert!(!stdout.contains("bypassed"));
    assert!(!stdout.contains("BROKEN"));
}

#[test]
fn cli_play_wav_through_preset() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("riff.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 48000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for i in 0..24000 {
        writer.write_sample(((i % 100) as i16 - 50) * 100).unwrap();
    }
    writer.finalize().unwrap();

    let stdout = run_ok(&[
        "play",
        path.to_str().unwrap(),
        "--preset",
        "crunch",
        "--volume",
        "0.5",
    ]);
    assert!(stdout.contains("Length:  0.50 s"));
    assert!(stdout.contains("Volume:  0.50"));
    assert!(stdout.contains("destination ok"));
}

#[test]
fn cli_play_missing_file_fails() {
    let output = pedalboard_bin()
        .args(["play", "/nonexistent/riff_12345.wav"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}
