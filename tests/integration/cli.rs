mod common;

use common::{keelc, write_file};

#[test]
fn check_accepts_valid_programs() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_file(dir.path(), "ok.keel", "structure Point { x: Number, y: Number }\nconst p = Point(1, 2)\n");
    let output = keelc().arg("check").arg(&src).output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
}

#[test]
fn check_fails_and_renders_errors() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_file(dir.path(), "bad.keel", "let x: Number = true\n");
    let output = keelc().arg("check").arg(&src).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot assign Boolean to 'x' of type Number"), "stderr: {stderr}");
}

#[test]
fn check_json_lists_findings() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_file(dir.path(), "bad.keel", "let y = z\n");
    let output = keelc().arg("check").arg("--json").arg(&src).output().unwrap();
    assert!(!output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["errors"][0]["message"], "unknown symbol 'z'");
    assert_eq!(json["warnings"].as_array().unwrap().len(), 0);
}

#[test]
fn syntax_errors_fail() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_file(dir.path(), "broken.keel", "structure {\n");
    let output = keelc().arg("check").arg(&src).output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn run_prints_program_output() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_file(dir.path(), "hello.keel", "print(\"hello\")\nprint(describe(swap(Pair(1, 2))))\n");
    let output = keelc().arg("run").arg(&src).output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "hello\nPair { first: 2, second: 1 }\n");
}

#[test]
fn run_refuses_programs_with_errors() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_file(dir.path(), "bad.keel", "print(1)\n");
    let output = keelc().arg("run").arg(&src).output().unwrap();
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn types_lists_declarations() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_file(
        dir.path(),
        "decls.keel",
        "type Named { name: String }\nfunction hello(n: Named) -> String { return n.name }\n",
    );
    let output = keelc().arg("types").arg(&src).output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "type Named { name: String }\nfunction hello: Function(Named) -> String\n"
    );
}

#[test]
fn deny_warnings_from_discovered_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join(".git")).unwrap();
    let src = write_file(dir.path(), "shadow.keel", "let print = 1\n");

    let output = keelc().arg("check").arg(&src).output().unwrap();
    assert!(output.status.success());

    write_file(dir.path(), "keel.toml", "[analysis]\ndeny_warnings = true\n");
    let output = keelc().arg("check").arg(&src).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("'print' shadows a standard library binding"), "stderr: {stderr}");
}

#[test]
fn explicit_config_can_disable_the_stdlib() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_file(dir.path(), "custom.toml", "[stdlib]\nenabled = false\n");
    let src = write_file(dir.path(), "plain.keel", "print(\"x\")\n");
    let output = keelc().arg("--config").arg(&config).arg("check").arg(&src).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown symbol 'print'"), "stderr: {stderr}");
}

#[test]
fn missing_file_fails() {
    let output = keelc().arg("check").arg("/nonexistent/missing.keel").output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read"));
}
