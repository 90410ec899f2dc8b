use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

/// Helper to create a temp directory that is cleaned up on drop.
struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(name: &str) -> Self {
        let path =
            std::env::temp_dir().join(format!("metaforge_cli_test_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("failed to create temp dir");
        Self { path }
    }

    fn path(&self) -> &PathBuf {
        &self.path
    }

    fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Runs the binary with a clean site environment rooted in `home`.
///
/// `HOME` points at the temp directory so no developer profile leaks in,
/// and every `METAFORGE_*` variable is cleared before `envs` is applied.
fn run_metaforge(home: &TempDir, envs: &[(&str, &str)], args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_metaforge"));
    command
        .args(args)
        .env("HOME", home.path())
        .env_remove("METAFORGE_SITE")
        .env_remove("METAFORGE_SITE_URL")
        .env_remove("METAFORGE_API_KEY")
        .env_remove("METAFORGE_API_SECRET");
    for (key, value) in envs {
        command.env(key, value);
    }
    command.output().expect("failed to run metaforge")
}

/// Dummy credentials pointing at a port nothing listens on. Operations
/// that fail before their first backend call never notice.
const OFFLINE_SITE: &[(&str, &str)] = &[
    ("METAFORGE_SITE_URL", "http://127.0.0.1:9"),
    ("METAFORGE_API_KEY", "test-key"),
    ("METAFORGE_API_SECRET", "test-secret"),
];

// ---------------------------------------------------------------------------
// docs command
// ---------------------------------------------------------------------------

#[test]
fn docs_text_prints_reference() {
    let home = TempDir::new("docs_text");
    let out = run_metaforge(&home, &[], &["docs"]);

    assert!(out.status.success(), "docs should succeed without a site");
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Field types:"), "stdout: {stdout}");
    assert!(stdout.contains("Currency"), "stdout: {stdout}");
    assert!(stdout.contains("options=<value>"), "stdout: {stdout}");
    assert!(stdout.contains("PERMISSION_DENIED"), "stdout: {stdout}");
    assert!(stdout.contains("403"), "stdout: {stdout}");
}

#[test]
fn docs_json_is_machine_readable() {
    let home = TempDir::new("docs_json");
    let out = run_metaforge(&home, &[], &["docs", "--format", "json"]);

    assert!(out.status.success());
    let parsed: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("docs --format json should emit valid JSON");
    assert_eq!(parsed["error_codes"][0]["code"], "PERMISSION_DENIED");
    assert_eq!(parsed["error_codes"][0]["http_status"], 403);
    let types = parsed["field_syntax"]["field_types"]
        .as_array()
        .expect("field_types should be an array");
    assert!(types.iter().any(|t| t == "Data"));
}

// ---------------------------------------------------------------------------
// new-doctype command
// ---------------------------------------------------------------------------

#[test]
fn dry_run_parses_without_a_site() {
    let home = TempDir::new("dry_run");
    let out = run_metaforge(
        &home,
        &[],
        &[
            "new-doctype",
            "Library Book",
            "-f",
            "isbn:data:*:unique",
            "-f",
            "title:data",
            "--dry-run",
        ],
    );

    assert!(out.status.success(), "dry run must not need a profile");
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        stdout.contains("Dry run: DocType 'Library Book' in module 'Custom' with 2 field(s)."),
        "stdout: {stdout}"
    );
    assert!(stdout.contains("isbn (Data; required, unique)"), "stdout: {stdout}");
    assert!(stdout.contains("title (Data)"), "stdout: {stdout}");
}

#[test]
fn dry_run_rejects_bad_definition() {
    let home = TempDir::new("dry_run_bad");
    let out = run_metaforge(
        &home,
        &[],
        &["new-doctype", "Test", "-f", "title", "--dry-run"],
    );

    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("error:"), "stderr: {stderr}");
    assert!(stderr.contains("missing field type"), "stderr: {stderr}");
}

#[test]
fn no_interact_requires_fields() {
    let home = TempDir::new("no_interact");
    let out = run_metaforge(&home, &[], &["new-doctype", "Test", "--no-interact"]);

    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("No fields provided. Use -f or remove --no-interact."),
        "stderr: {stderr}"
    );
}

// ---------------------------------------------------------------------------
// site profile resolution
// ---------------------------------------------------------------------------

#[test]
fn missing_profile_names_the_missing_value() {
    let home = TempDir::new("missing_profile");
    let out = run_metaforge(&home, &[], &["add-field", "Customer", "-f", "iban:data"]);

    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("site profile is missing url"),
        "stderr: {stderr}"
    );
    assert!(stderr.contains("METAFORGE_SITE_URL"), "stderr: {stderr}");
}

#[test]
fn explicit_site_path_must_exist() {
    let home = TempDir::new("explicit_site");
    let missing = home.join("nowhere.yaml");
    let out = run_metaforge(
        &home,
        &[],
        &[
            "add-field",
            "Customer",
            "-f",
            "iban:data",
            "--site",
            missing.to_str().unwrap(),
        ],
    );

    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("site profile not found at"),
        "stderr: {stderr}"
    );
}

#[test]
fn profile_file_is_read_from_site_flag() {
    let home = TempDir::new("profile_file");
    let profile = home.join("site.yaml");
    fs::write(
        &profile,
        "url: \"http://127.0.0.1:9\"\napi_key: \"k\"\napi_secret: \"s\"\n",
    )
    .expect("failed to write profile");

    // Parse failure comes before any backend call, so the unreachable
    // URL is never contacted and the run fails on the definition alone.
    let out = run_metaforge(
        &home,
        &[],
        &[
            "add-field",
            "Customer",
            "-f",
            "iban",
            "--site",
            profile.to_str().unwrap(),
        ],
    );

    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("missing field type"), "stderr: {stderr}");
}

// ---------------------------------------------------------------------------
// dispatch validation (offline: fails before the first backend call)
// ---------------------------------------------------------------------------

#[test]
fn add_field_parse_errors_are_local() {
    let home = TempDir::new("add_field_parse");
    let out = run_metaforge(
        &home,
        OFFLINE_SITE,
        &["add-field", "Customer", "-f", "iban:Text:banana"],
    );

    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("unrecognized attribute 'banana'"),
        "stderr: {stderr}"
    );
}

#[test]
fn add_field_requires_definitions() {
    let home = TempDir::new("add_field_empty");
    let out = run_metaforge(&home, OFFLINE_SITE, &["add-field", "Customer"]);

    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("at least one field definition is required"),
        "stderr: {stderr}"
    );
}

#[test]
fn set_property_requires_a_target_field() {
    let home = TempDir::new("set_property_target");
    let out = run_metaforge(
        &home,
        OFFLINE_SITE,
        &["set-property", "Customer", "--property", "hidden", "--value", "1"],
    );

    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("field_name is required when for_doctype is false"),
        "stderr: {stderr}"
    );
}
