#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use keel::config::Config;
use keel::Checked;

pub fn keelc() -> Command {
    Command::new(env!("CARGO_BIN_EXE_keelc"))
}

/// Analyze `source` against the bundled standard library. Panics on syntax
/// errors.
pub fn check(source: &str) -> Checked {
    match keel::check_source(source, &Config::defaults()) {
        Ok(checked) => checked,
        Err(e) => panic!("check failed unexpectedly: {e}"),
    }
}

pub fn errors(source: &str) -> Vec<String> {
    check(source).findings.errors.into_iter().map(|f| f.message).collect()
}

pub fn warnings(source: &str) -> Vec<String> {
    check(source).findings.warnings.into_iter().map(|f| f.message).collect()
}

pub fn assert_clean(source: &str) {
    let checked = check(source);
    assert!(checked.findings.is_empty(), "expected no findings, got: {:?}", checked.findings);
}

/// Analyze and run `source`, returning what it printed.
pub fn run(source: &str) -> String {
    match keel::run_source(source, &Config::defaults(), Vec::new()) {
        Ok(out) => String::from_utf8_lossy(&out).to_string(),
        Err(e) => panic!("run failed unexpectedly: {e}"),
    }
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}
