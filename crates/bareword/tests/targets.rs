use std::fs;
use std::path::Path;
use std::process::Command;

use bareword::{analyze_target, BarewordError, Category, Mode, Outcome};

fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, contents).expect("write file");
}

fn bareword_exe() -> &'static str {
    env!("CARGO_BIN_EXE_bareword")
}

#[test]
fn recursive_target_keeps_units_separate_and_ordered() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_file(&dir.path().join("a.pl"), "sub greet { }\ngreet;\n");
    write_file(&dir.path().join("lib/b.pm"), "greet;\n");
    write_file(&dir.path().join("lib/notes.md"), "greet;\n");

    let target = format!("{}/...", dir.path().display());
    let summary = analyze_target(&target, Mode::Strict).expect("analyze");
    assert_eq!(summary.units.len(), 2);
    assert!(summary.units[0].unit.ends_with("a.pl"));
    assert!(summary.units[1].unit.ends_with("b.pm"));
    assert_eq!(summary.units[0].classifications[1].category, Category::BarewordCall);
    assert_eq!(
        summary.units[1].classifications[0].category,
        Category::UnknownIdentifierError
    );
    assert_eq!(summary.units[1].outcome, Outcome::Failed);
    assert!(summary.has_failures());
}

#[test]
fn token_documents_are_analyzed_with_their_slots() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("scenario.json");
    write_file(
        &path,
        r#"{ "unit": "scenario-c", "tokens": [
            { "kind": "identifier", "text": "Package", "line": 1, "column": 1, "slot": "member_access" },
            { "kind": "operator", "text": "->", "line": 1, "column": 8 },
            { "kind": "identifier", "text": "new", "line": 1, "column": 10 }
        ] }"#,
    );
    let summary = analyze_target(&path.display().to_string(), Mode::Permissive).expect("analyze");
    let report = &summary.units[0];
    assert_eq!(report.unit, "scenario-c");
    assert_eq!(report.classifications.len(), 1);
    assert_eq!(
        report.classifications[0].category,
        Category::AmbiguousCallableOrNamespace
    );
}

#[test]
fn malformed_document_is_a_stream_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.json");
    write_file(&path, "{ \"tokens\": 3 }");
    let err = analyze_target(&path.display().to_string(), Mode::Permissive)
        .expect_err("malformed document");
    assert!(matches!(err, BarewordError::Stream(_)));
}

#[test]
fn empty_directory_is_an_invalid_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = analyze_target(&dir.path().display().to_string(), Mode::Permissive)
        .expect_err("no units");
    assert!(matches!(err, BarewordError::InvalidPath(_)));
}

#[test]
fn cli_exit_status_follows_mode() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_file(&dir.path().join("calls.pl"), "frobnicate;\n");

    let permissive = Command::new(bareword_exe())
        .arg("analyze")
        .arg("calls.pl")
        .current_dir(dir.path())
        .output()
        .expect("run bareword analyze");
    assert!(permissive.status.success());
    let stdout = String::from_utf8_lossy(&permissive.stdout);
    assert!(stdout.contains("warning[B0501] calls.pl:1:1"), "{stdout}");

    let strict = Command::new(bareword_exe())
        .arg("analyze")
        .arg("--strict")
        .arg("calls.pl")
        .current_dir(dir.path())
        .output()
        .expect("run bareword analyze --strict");
    assert!(!strict.status.success());
    let stdout = String::from_utf8_lossy(&strict.stdout);
    assert!(stdout.contains("error[B0501] calls.pl:1:1"), "{stdout}");
}

#[test]
fn cli_reads_mode_and_format_from_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_file(&dir.path().join("calls.pl"), "frobnicate;\n");
    write_file(
        &dir.path().join("bareword.toml"),
        "[analysis]\nmode = \"strict\"\n\n[output]\nformat = \"json\"\n",
    );

    let output = Command::new(bareword_exe())
        .arg("analyze")
        .arg("calls.pl")
        .current_dir(dir.path())
        .output()
        .expect("run bareword analyze");
    assert!(!output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("json summary");
    assert_eq!(value["units"][0]["mode"], "strict");
    assert_eq!(value["units"][0]["outcome"], "failed");

    let overridden = Command::new(bareword_exe())
        .arg("analyze")
        .arg("--permissive")
        .arg("calls.pl")
        .current_dir(dir.path())
        .output()
        .expect("run bareword analyze --permissive");
    assert!(overridden.status.success());
}

#[test]
fn cli_tokens_prints_a_reloadable_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_file(&dir.path().join("keys.pl"), "my $v = $h{shift};\n");

    let output = Command::new(bareword_exe())
        .arg("tokens")
        .arg("keys.pl")
        .current_dir(dir.path())
        .output()
        .expect("run bareword tokens");
    assert!(output.status.success());
    let document: serde_json::Value = serde_json::from_slice(&output.stdout).expect("document");
    assert_eq!(document["unit"], "keys.pl");
    let key = document["tokens"]
        .as_array()
        .expect("tokens")
        .iter()
        .find(|token| token["text"] == "shift")
        .expect("shift token");
    assert_eq!(key["slot"], "container_key");

    let saved = dir.path().join("keys.json");
    fs::write(&saved, &output.stdout).expect("save document");
    let summary = analyze_target(&saved.display().to_string(), Mode::Strict).expect("reload");
    assert_eq!(summary.units[0].classifications[0].category, Category::LiteralKey);
}

#[test]
fn cli_rejects_unknown_commands() {
    let output = Command::new(bareword_exe())
        .arg("frobnicate")
        .output()
        .expect("run bareword");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid command: frobnicate"));
}
