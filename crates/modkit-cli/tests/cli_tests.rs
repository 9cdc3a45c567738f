use assert_cmd::Command;
use modkit_test_helpers::fixtures::{bundle_path, pricing_html, template_hostile_html, write_module};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn modkit_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("modkit"))
}

/// Temp project with `modules/<id>/<id>.html` for each given module
fn project(modules: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let modules_dir = temp_dir.path().join("modules");
    fs::create_dir_all(&modules_dir).unwrap();
    for (module, html) in modules {
        write_module(&modules_dir, module, html);
    }
    temp_dir
}

// ============================================================================
// BUILD
// ============================================================================

#[test]
fn test_no_args_builds_default_module() {
    let temp_dir = project(&[("pricing", pricing_html())]);

    modkit_cmd()
        .current_dir(&temp_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("✅ pricing"))
        .stdout(predicate::str::contains("Build complete: 1 succeeded, 0 failed"));

    let bundle = fs::read_to_string(bundle_path(&temp_dir.path().join("modules"), "pricing")).unwrap();
    assert!(bundle.contains("window.ModuleContent[\"pricing\"]"));
    assert!(bundle.contains("Price Levels"));
}

#[test]
fn test_missing_module_fails_batch() {
    let temp_dir = project(&[("pricing", pricing_html())]);

    modkit_cmd()
        .current_dir(&temp_dir)
        .args(["pricing", "missing"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("✅ pricing"))
        .stdout(predicate::str::contains("❌ missing"))
        .stdout(predicate::str::contains("Build complete: 1 succeeded, 1 failed"));

    assert!(!temp_dir.path().join("modules/missing").exists());
}

#[test]
fn test_logs_stay_off_stdout() {
    let temp_dir = project(&[("pricing", pricing_html())]);

    let output = modkit_cmd().current_dir(&temp_dir).output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(!stdout.contains("INFO"));
    assert_eq!(stdout.lines().filter(|l| !l.is_empty()).count(), 2);
}

#[test]
fn test_modules_dir_option() {
    let temp_dir = TempDir::new().unwrap();
    write_module(&temp_dir.path().join("web/modules"), "bom", "<table></table>");

    modkit_cmd()
        .current_dir(&temp_dir)
        .args(["--modules-dir", "web/modules", "bom"])
        .assert()
        .success();

    assert!(bundle_path(&temp_dir.path().join("web/modules"), "bom").exists());
}

#[test]
fn test_all_discovers_modules() {
    let temp_dir = project(&[
        ("pricing", pricing_html()),
        ("stock", "<ul></ul>"),
        ("calc", template_hostile_html()),
    ]);
    // A directory without matching HTML is not a module
    fs::create_dir_all(temp_dir.path().join("modules/assets")).unwrap();

    modkit_cmd()
        .current_dir(&temp_dir)
        .arg("--all")
        .assert()
        .success()
        .stdout(predicate::str::contains("Build complete: 3 succeeded, 0 failed"));

    assert!(!temp_dir.path().join("modules/assets/assets-bundle.js").exists());
}

#[test]
fn test_rust_log_debug_enables_debug_logs() {
    let temp_dir = project(&[("pricing", pricing_html())]);

    modkit_cmd()
        .current_dir(&temp_dir)
        .env("RUST_LOG", "debug")
        .assert()
        .success()
        .stderr(predicate::str::contains("DEBUG"))
        .stderr(predicate::str::contains("Configuration"));
}

#[test]
fn test_default_log_level_is_info() {
    let temp_dir = project(&[("pricing", pricing_html())]);

    modkit_cmd()
        .current_dir(&temp_dir)
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stderr(predicate::str::contains("INFO"))
        .stderr(predicate::str::contains("DEBUG").not());
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[test]
fn test_init_creates_config_file() {
    let temp_dir = TempDir::new().unwrap();

    modkit_cmd()
        .current_dir(&temp_dir)
        .arg("--init")
        .assert()
        .success()
        .stdout(predicate::str::contains("modkit.json"));

    let config = fs::read_to_string(temp_dir.path().join("modkit.json")).unwrap();
    assert!(config.contains("modulesDir"));
    assert!(config.contains("settleDelayMs"));
}

#[test]
fn test_init_refuses_to_overwrite() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("modkit.json"), "{}").unwrap();

    modkit_cmd()
        .current_dir(&temp_dir)
        .arg("--init")
        .assert()
        .failure();

    assert_eq!(
        fs::read_to_string(temp_dir.path().join("modkit.json")).unwrap(),
        "{}"
    );
}

#[test]
fn test_config_file_module_list() {
    let temp_dir = project(&[("pricing", pricing_html()), ("stock", "<ul></ul>")]);
    fs::write(
        temp_dir.path().join("modkit.yaml"),
        "bundler:\n  modules:\n    - pricing\n    - stock\n",
    )
    .unwrap();

    modkit_cmd()
        .current_dir(&temp_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Build complete: 2 succeeded, 0 failed"));
}

#[test]
fn test_project_option() {
    let temp_dir = project(&[("bom", "<table></table>")]);
    fs::write(
        temp_dir.path().join("custom.json"),
        r#"{ "bundler": { "modules": ["bom"] } }"#,
    )
    .unwrap();

    modkit_cmd()
        .current_dir(&temp_dir)
        .args(["--project", "custom.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✅ bom"));
}

#[test]
fn test_invalid_config_file() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("modkit.json"), "{ not json").unwrap();

    modkit_cmd()
        .current_dir(&temp_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load"));
}

// ============================================================================
// CHECK
// ============================================================================

#[test]
fn test_check_reports_stale_bundle() {
    let temp_dir = project(&[("pricing", pricing_html())]);

    modkit_cmd().current_dir(&temp_dir).assert().success();
    modkit_cmd()
        .current_dir(&temp_dir)
        .arg("--check")
        .assert()
        .success()
        .stdout(predicate::str::contains("pricing: up to date"));

    write_module(&temp_dir.path().join("modules"), "pricing", "<div>edited</div>");

    modkit_cmd()
        .current_dir(&temp_dir)
        .arg("--check")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("pricing: stale"));
}

#[test]
fn test_check_missing_bundle() {
    let temp_dir = project(&[("pricing", pricing_html())]);

    modkit_cmd()
        .current_dir(&temp_dir)
        .arg("--check")
        .assert()
        .code(1);

    assert!(!bundle_path(&temp_dir.path().join("modules"), "pricing").exists());
}

// ============================================================================
// RESOLVE
// ============================================================================

#[test]
fn test_resolve_from_bundle() {
    let temp_dir = project(&[("calc", template_hostile_html())]);

    modkit_cmd().current_dir(&temp_dir).arg("calc").assert().success();

    modkit_cmd()
        .current_dir(&temp_dir)
        .args(["--resolve", "calc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("${price * qty}"))
        .stdout(predicate::str::contains(r"C:\modules\pricing"));
}

#[test]
fn test_resolve_without_bundle_fails() {
    let temp_dir = project(&[("pricing", pricing_html())]);

    modkit_cmd()
        .current_dir(&temp_dir)
        .args(["--resolve", "pricing"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Module pricing not found"));
}

#[test]
fn test_resolve_rejects_invalid_origin() {
    let temp_dir = TempDir::new().unwrap();

    modkit_cmd()
        .current_dir(&temp_dir)
        .args(["--resolve", "pricing", "--origin", "not a url"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid origin"));
}

#[test]
fn test_origin_requires_resolve() {
    modkit_cmd()
        .args(["--origin", "http://localhost:8000/"])
        .assert()
        .failure();
}
