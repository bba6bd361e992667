mod common;

use common::write_file;
use keel::config::Config;
use keel::diagnostics::CompileError;

#[test]
fn custom_prelude_replaces_the_bundled_one() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join(".git")).unwrap();
    write_file(dir.path(), "keel.toml", "[stdlib]\npath = \"std/mini.keel\"\n");
    write_file(dir.path(), "std/mini.keel", "const say: Function(String) -> Nothing = __print\n");
    let src = write_file(dir.path(), "main.keel", "say(\"hi\")\n");

    let (_, checked) = keel::check_file(&src, None).unwrap();
    assert!(checked.findings.is_empty(), "{:?}", checked.findings);
    let out = keel::run_checked(&checked, Vec::new()).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "hi\n");

    let (_, checked) = keel::check_file(&write_file(dir.path(), "other.keel", "print(\"x\")\n"), None).unwrap();
    assert_eq!(checked.findings.errors[0].message, "unknown symbol 'print'");
}

#[test]
fn missing_custom_prelude_is_a_config_error() {
    let config = Config { stdlib_path: Some("/nonexistent/prelude.keel".into()), ..Config::defaults() };
    let err = keel::check_source("", &config).err().unwrap();
    assert!(matches!(err, CompileError::Config { .. }));
}

#[test]
fn malformed_config_is_reported_by_check_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join(".git")).unwrap();
    write_file(dir.path(), "keel.toml", "[stdlib]\nenabled = \"yes\"\n");
    let src = write_file(dir.path(), "main.keel", "");
    let err = keel::check_file(&src, None).err().unwrap();
    assert!(err.to_string().contains("invalid syntax"));
}

#[test]
fn explicit_config_skips_discovery() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join(".git")).unwrap();
    write_file(dir.path(), "keel.toml", "[stdlib]\nenabled = false\n");
    let src = write_file(dir.path(), "main.keel", "print(\"x\")\n");
    let (_, checked) = keel::check_file(&src, Some(&Config::defaults())).unwrap();
    assert!(checked.findings.is_empty());
}
