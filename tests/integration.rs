//! End-to-end tests of the `dq` binary. No network: every provider is
//! disabled, so only history commands and exact matching are exercised.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn dq_binary() -> &'static str {
    env!("CARGO_BIN_EXE_dq")
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/questions.sqlite"

[similarity]
threshold = 0.85
"#,
        root.display()
    );

    let config_path = config_dir.join("dq.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_dq(config: &Path, args: &[&str]) -> Output {
    Command::new(dq_binary())
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("OPENAI_API_KEY")
        .env_remove("SLACK_BOT_TOKEN")
        .output()
        .expect("failed to run dq")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_init_creates_database() {
    let (tmp, config) = setup_test_env();

    let out = run_dq(&config, &["init"]);
    assert!(out.status.success(), "init failed: {:?}", out);
    assert!(stdout(&out).contains("Database initialized successfully."));
    assert!(tmp.path().join("data/questions.sqlite").exists());

    // Idempotent
    assert!(run_dq(&config, &["init"]).status.success());
}

#[test]
fn test_seed_and_history() {
    let (_tmp, config) = setup_test_env();
    assert!(run_dq(&config, &["init"]).status.success());

    let out = run_dq(&config, &["seed"]);
    assert!(out.status.success(), "seed failed: {:?}", out);
    assert!(stdout(&out).contains("added:   10"));

    let out = run_dq(&config, &["seed"]);
    assert!(stdout(&out).contains("added:   0"));
    assert!(stdout(&out).contains("skipped: 10"));

    let out = run_dq(&config, &["history", "--limit", "3"]);
    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.contains("questions: 10"));
    assert!(text.contains("... 7 more"));
}

#[test]
fn test_check_exact_duplicate() {
    let (_tmp, config) = setup_test_env();
    assert!(run_dq(&config, &["seed"]).status.success());

    let out = run_dq(
        &config,
        &["check", "WHAT'S YOUR FAVORITE WAY TO RECHARGE AFTER A LONG WORK WEEK?"],
    );
    assert!(out.status.success());
    assert!(stdout(&out).contains("exact duplicate"));

    let out = run_dq(&config, &["check", "What did you want to be as a kid?"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("verdict:   unique"));
}

#[test]
fn test_post_requires_generation_provider() {
    let (_tmp, config) = setup_test_env();

    let out = run_dq(&config, &["post"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Generation provider is disabled"));
}

#[test]
fn test_serve_requires_generation_provider() {
    let (_tmp, config) = setup_test_env();

    let out = run_dq(&config, &["serve"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Generation provider is disabled"));
}

#[test]
fn test_duplicates_requires_embeddings() {
    let (_tmp, config) = setup_test_env();

    let out = run_dq(&config, &["duplicates"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Embedding provider is disabled"));
}

#[test]
fn test_invalid_threshold_rejected() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("dq.toml");
    fs::write(
        &config,
        "[db]\npath = \"q.sqlite\"\n[similarity]\nthreshold = 2.0\n",
    )
    .unwrap();

    let out = run_dq(&config, &["init"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("similarity.threshold"));
}
