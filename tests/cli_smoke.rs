use std::path::PathBuf;

fn record(sec: u32, usec: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&sec.to_le_bytes());
    out.extend_from_slice(&usec.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

fn write_fixture(name: &str, bytes: &[u8]) -> PathBuf {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_ttyreel")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "ttyreel.exe"
            } else {
                "ttyreel"
            });
            p
        })
}

#[test]
fn cli_info_reports_metadata_as_json() {
    let mut bytes = record(100, 0, b"\x1b%G\x1b[8;24;80t");
    bytes.extend(record(100, 0, b"hello"));
    bytes.extend(record(101, 0, b"world"));
    let path = write_fixture("info.ttyrec", &bytes);

    let out = std::process::Command::new(exe())
        .args(["info", "--in"])
        .arg(&path)
        .arg("--json")
        .output()
        .unwrap();
    assert!(out.status.success());

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["chunks"], 2);
    assert_eq!(report["duration_sec"], 1.0);
    assert_eq!(report["dimensions"]["rows"], 24);
    assert_eq!(report["dimensions"]["cols"], 80);
}

#[test]
fn cli_dump_lists_chunks() {
    let mut bytes = record(0, 0, b"one");
    bytes.extend(record(0, 500_000, b"two"));
    let path = write_fixture("dump.ttyrec", &bytes);

    let out = std::process::Command::new(exe())
        .args(["dump", "--in"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(out.status.success());

    let text = String::from_utf8(out.stdout).unwrap();
    assert!(text.contains("one"));
    assert!(text.contains("two"));
    assert!(text.contains("0.500"));
}

#[test]
fn cli_play_replays_a_short_recording_to_completion() {
    let mut bytes = record(0, 0, b"tick");
    bytes.extend(record(0, 100_000, b"tock"));
    let path = write_fixture("play.ttyrec", &bytes);

    let out = std::process::Command::new(exe())
        .args(["play", "--rate", "4", "--in"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(out.status.success());

    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("tick"));
    assert!(text.contains("tock"));
}

#[test]
fn cli_info_rejects_garbage() {
    let path = write_fixture("bad.ttyrec", &[1, 2, 3, 4, 5]);
    let out = std::process::Command::new(exe())
        .args(["info", "--in"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(!out.status.success());
}
