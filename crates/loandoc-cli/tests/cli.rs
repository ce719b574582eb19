use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `loandoc` isolated from the user's config, `.env` and credentials.
fn loandoc(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("loandoc").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("OPENAI_API_KEY")
        .env_remove("ANTHROPIC_API_KEY")
        .env_remove("COHERE_API_KEY")
        .env_remove("LOANDOC_LLM_PROVIDER")
        .env_remove("LOANDOC_UPLOAD_DIR");
    cmd
}

#[test]
fn config_show_prints_defaults() {
    let home = TempDir::new().unwrap();
    loandoc(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"min_text_length\": 50"))
        .stdout(predicate::str::contains("\"provider\": \"openai\""));
}

#[test]
fn config_show_masks_credentials() {
    let home = TempDir::new().unwrap();
    loandoc(home.path())
        .env("OPENAI_API_KEY", "sk-secret-value")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sk-secret-value").not())
        .stdout(predicate::str::contains("********"));
}

#[test]
fn config_init_refuses_to_overwrite() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("loandoc.json");
    let path_arg = path.to_str().unwrap();

    loandoc(home.path())
        .args(["config", "init", "--output", path_arg])
        .assert()
        .success();
    assert!(fs::read_to_string(&path).unwrap().contains("\"upload_dir\""));

    loandoc(home.path())
        .args(["config", "init", "--output", path_arg])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    loandoc(home.path())
        .args(["config", "init", "--output", path_arg, "--force"])
        .assert()
        .success();
}

#[test]
fn extract_missing_file_fails() {
    let home = TempDir::new().unwrap();
    loandoc(home.path())
        .args(["extract", "missing.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn extract_non_pdf_reports_failure_result() {
    let home = TempDir::new().unwrap();
    fs::write(home.path().join("notes.pdf"), "just some text").unwrap();

    loandoc(home.path())
        .args(["extract", "notes.pdf"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"status\": \"failure\""))
        .stdout(predicate::str::contains("not a PDF document"));
}

#[test]
fn process_with_unconfigured_provider_fails() {
    let home = TempDir::new().unwrap();
    fs::write(home.path().join("loan.pdf"), "%PDF-1.7\n").unwrap();

    loandoc(home.path())
        .env("LOANDOC_LLM_PROVIDER", "mistral")
        .args(["process", "loan.pdf"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"status\": \"error\""))
        .stdout(predicate::str::contains(
            "\"error_kind\": \"provider_configuration\"",
        ))
        .stdout(predicate::str::contains("\"error_message\": \"mistral\""));
}

#[test]
fn process_without_credentials_fails() {
    let home = TempDir::new().unwrap();
    fs::write(home.path().join("loan.pdf"), "%PDF-1.7\n").unwrap();

    loandoc(home.path())
        .args(["process", "--format", "text", "loan.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Loan extraction failed (provider_configuration): openai",
        ));
}

#[test]
fn process_without_any_document_text_skips_the_model() {
    let home = TempDir::new().unwrap();
    fs::write(home.path().join("broken.pdf"), "%PDF-1.7\nno objects here\n").unwrap();
    // Nothing listens on the discard port, so a model call would fail differently
    fs::write(
        home.path().join("loandoc.json"),
        r#"{"llm": {"openai": {"api_key": "test-key", "base_url": "http://127.0.0.1:9"}}}"#,
    )
    .unwrap();

    loandoc(home.path())
        .args(["--config", "loandoc.json", "process", "--skip-validation", "broken.pdf"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"status\"").not())
        .stderr(predicate::str::contains(
            "No documents found for this loan application",
        ));
}
