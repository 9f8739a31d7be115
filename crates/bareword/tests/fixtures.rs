use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use bareword::{analyze_file, Mode, UnitReport};
use walkdir::WalkDir;

fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture_files() -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(fixtures_root())
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.path().extension() == Some(OsStr::new("pl")))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

/// Expectations written as leading `# key: value` comments in a fixture.
#[derive(Debug, Default)]
struct Expectations {
    mode: Option<Mode>,
    classifications: Vec<(String, String)>,
    notices: Vec<String>,
    abort: Option<String>,
    outcome: Option<String>,
}

fn read_expectations(path: &Path) -> Expectations {
    let text = fs::read_to_string(path).expect("read fixture");
    let mut expectations = Expectations::default();
    for line in text.lines() {
        let Some(directive) = line.strip_prefix("# ") else {
            continue;
        };
        let Some((key, value)) = directive.split_once(": ") else {
            continue;
        };
        let value = value.trim();
        match key {
            "mode" => expectations.mode = Some(value.parse().expect("fixture mode")),
            "expect" => {
                let (name, category) = value.split_once(' ').expect("expect: <name> <category>");
                expectations
                    .classifications
                    .push((name.to_string(), category.to_string()));
            }
            "notice" => expectations.notices.push(value.to_string()),
            "abort" => expectations.abort = Some(value.to_string()),
            "outcome" => expectations.outcome = Some(value.to_string()),
            _ => {}
        }
    }
    expectations
}

fn outcome_name(report: &UnitReport) -> String {
    serde_json::to_value(report.outcome)
        .expect("serialize outcome")
        .as_str()
        .expect("outcome string")
        .to_string()
}

#[test]
fn fixtures_match_their_expectations() {
    let files = fixture_files();
    assert!(files.len() >= 8, "fixtures missing: {files:?}");

    for path in files {
        let expected = read_expectations(&path);
        let mode = expected.mode.unwrap_or_default();
        let report = analyze_file(&path, mode).expect("analyze fixture");

        for (name, category) in &expected.classifications {
            assert!(
                report
                    .classifications
                    .iter()
                    .any(|c| &c.name == name && &c.category.to_string() == category),
                "{}: expected {name} as {category}, got {:#?}",
                path.display(),
                report.classifications
            );
        }
        for code in &expected.notices {
            assert!(
                report.notices.iter().any(|n| &n.code == code),
                "{}: expected notice {code}, got {:#?}",
                path.display(),
                report.notices
            );
        }
        assert_eq!(
            report.abort.as_ref().map(|abort| abort.code.clone()),
            expected.abort,
            "{}: abort mismatch",
            path.display()
        );
        if let Some(outcome) = &expected.outcome {
            assert_eq!(
                &outcome_name(&report),
                outcome,
                "{}: outcome mismatch\n{}",
                path.display(),
                bareword::render_report(&report, true)
            );
        }
    }
}

#[test]
fn fixtures_are_analyzed_deterministically() {
    for path in fixture_files() {
        for mode in [Mode::Strict, Mode::Permissive] {
            let first = analyze_file(&path, mode).expect("first run");
            let second = analyze_file(&path, mode).expect("second run");
            assert_eq!(first, second, "{} differs between runs", path.display());
        }
    }
}

#[test]
fn data_section_and_pod_are_not_analyzed() {
    let path = fixtures_root().join("pod_and_heredoc.pl");
    let report = analyze_file(&path, Mode::Strict).expect("analyze");
    assert!(report
        .classifications
        .iter()
        .all(|c| c.name != "frobnicate" && c.name != "unknown_word"));
}
