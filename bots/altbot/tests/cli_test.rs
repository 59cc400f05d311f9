// SPDX-License-Identifier: PMPL-1.0-or-later
//! Exit codes of the altbot binary
//!
//! 0 compliant, 1 not compliant, 2 the check could not run.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

fn altbot(args: &[&str], work_root: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_altbot"))
        .args(args)
        .env_remove("ALTBOT_CONFIG")
        .env("ALTBOT__ARTIFACT__WORK_ROOT", work_root)
        .output()
        .expect("altbot should start")
}

fn site(files: &[(&str, &[u8])]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        std::fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

fn put_zip(store: &Path, key: &str, files: &[(&str, &str)]) {
    let path = store.join("artifacts").join(key);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut writer = zip::ZipWriter::new(std::fs::File::create(path).unwrap());
    for (name, content) in files {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

fn event_file(dir: &Path, key: Option<&str>) -> String {
    let artifacts = match key {
        Some(key) => serde_json::json!([{
            "location": {
                "type": "S3",
                "s3Location": { "bucketName": "artifacts", "objectKey": key }
            }
        }]),
        None => serde_json::json!([]),
    };
    let event = serde_json::json!({
        "CodePipeline.job": { "id": "job-cli", "data": { "inputArtifacts": artifacts } }
    });
    let path = dir.join("event.json");
    std::fs::write(&path, event.to_string()).unwrap();
    path.to_string_lossy().into_owned()
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[test]
fn test_scan_compliant_exits_zero() {
    let work = TempDir::new().unwrap();
    let dir = site(&[("index.html", b"<img src=\"a.png\" alt=\"A\">".as_slice())]);

    let output = altbot(&["scan", path_arg(dir.path()).as_str()], work.path());

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Accessible code: True"));
}

#[test]
fn test_scan_not_compliant_exits_one() {
    let work = TempDir::new().unwrap();
    let dir = site(&[("index.html", b"<img src=\"a\">".as_slice())]);

    let output = altbot(&["scan", path_arg(dir.path()).as_str()], work.path());

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_scan_unreadable_file_exits_two() {
    let work = TempDir::new().unwrap();
    let dir = site(&[("bad.html", [0xffu8, 0xfe, 0x00, 0x3c].as_slice())]);

    let output = altbot(&["scan", path_arg(dir.path()).as_str()], work.path());

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("could not run"));
}

#[test]
fn test_scan_missing_directory_exits_two() {
    let work = TempDir::new().unwrap();
    let missing = work.path().join("no-such-site");

    let output = altbot(&["scan", path_arg(&missing).as_str()], work.path());

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_check_missing_object_exits_two() {
    let work = TempDir::new().unwrap();
    let store = TempDir::new().unwrap();

    let output = altbot(
        &["check", "artifacts", "missing.zip", "--local-store", path_arg(store.path()).as_str()],
        work.path(),
    );

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_invoke_exit_codes() {
    let work = TempDir::new().unwrap();
    let store = TempDir::new().unwrap();
    let store_arg = path_arg(store.path());
    put_zip(store.path(), "good.zip", &[("index.html", "<img src=\"a\" alt=\"\">")]);
    put_zip(store.path(), "bad.zip", &[("index.html", "<img src=\"a\">")]);

    let cases = [
        (Some("good.zip"), 0, "Job job-cli succeeded"),
        (Some("bad.zip"), 1, "failed [JobFailed]"),
        (Some("missing.zip"), 2, "failed [RevisionUnavailable]"),
        (None, 2, "failed [ConfigurationError]"),
    ];

    for (key, expected, printed) in cases {
        let events = TempDir::new().unwrap();
        let event = event_file(events.path(), key);

        let args = ["invoke", event.as_str(), "--local-store", store_arg.as_str()];
        let output = altbot(&args, work.path());

        assert_eq!(output.status.code(), Some(expected), "artifact {:?}", key);
        assert!(
            String::from_utf8_lossy(&output.stdout).contains(printed),
            "artifact {:?}: {}",
            key,
            String::from_utf8_lossy(&output.stdout)
        );
    }
}
