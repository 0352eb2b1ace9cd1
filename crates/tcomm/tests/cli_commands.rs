#![cfg(feature = "cli")]

use std::process::{Command, Output};

use serde_json::{json, Value};
use tcomm_frame::TuningHandler;

fn tcomm(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tcomm"))
        .args(["--log-level", "error"])
        .args(args)
        .env_remove("TCOMM_SERIAL")
        .env_remove("TCOMM_COOKIE")
        .output()
        .expect("tcomm should run")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be json")
}

#[test]
fn channels_lists_the_named_table() {
    let output = tcomm(&["--format", "json", "channels"]);
    assert!(output.status.success());

    let rows = stdout_json(&output);
    let rows = rows.as_array().expect("channel list");
    assert!(rows.contains(&json!({ "name": "GW_CHANNEL", "id": 866 })));
    assert!(rows.contains(&json!({ "name": "INVALID_CHANNEL_ID", "id": -1 })));
}

#[test]
fn decode_tuning_frame_from_hex() {
    let frame = TuningHandler::new()
        .encode_json(&json!({ "protocolName": "A:H", "parameters": {} }))
        .expect("tuning frame");
    let output = tcomm(&[
        "--format",
        "json",
        "decode",
        "--layer",
        "tuning",
        "--hex",
        &hex::encode(&frame),
    ]);
    assert!(output.status.success(), "{output:?}");

    let fields = stdout_json(&output);
    assert_eq!(fields["layer"], "tuning");
    assert_eq!(fields["payload"]["protocolName"], "A:H");
}

#[test]
fn decode_reports_corrupt_frames_as_invalid_data() {
    let mut frame = TuningHandler::new()
        .encode_json(&json!({ "protocolName": "A:H" }))
        .expect("tuning frame")
        .to_vec();
    frame[2] ^= 0x01;

    let output = tcomm(&["decode", "--layer", "tuning", "--hex", &hex::encode(&frame)]);
    assert_eq!(output.status.code(), Some(60));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("tuning decode failed"), "{stderr}");
}

#[test]
fn decode_rejects_bad_hex_as_usage() {
    let output = tcomm(&["decode", "--hex", "not-hex"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn listen_requires_credentials() {
    let output = tcomm(&["listen"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--serial"), "{stderr}");
}

#[test]
fn version_prints_package_version() {
    let output = tcomm(&["version"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("tcomm {}", env!("CARGO_PKG_VERSION"))
    );
}
