mod common;

use common::{serve, url_template, MockRepo};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn instr_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_instr"))
}

fn setup_test_env(addr: SocketAddr) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let config_dir = tmp.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[access]
allowed_users = [42]

[repository]
url_template = "{}"
request_timeout_secs = 5

[[categories]]
label = "ЭВС «Сапсан»"
folder_ids = [1, 2]

[[categories]]
label = "Bulk"
folder_ids = ["big"]

[[categories]]
label = "Broken"
folder_ids = [1, "bad"]
"#,
        url_template(addr)
    );

    let config_path = config_dir.join("instr.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

async fn run_instr(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = instr_binary();
    let output = tokio::process::Command::new(&binary)
        .arg("--config")
        .arg(config_path)
        .args(args)
        .env_remove("INSTR_BOT_TOKEN")
        .env("RUST_LOG", "off")
        .output()
        .await
        .unwrap_or_else(|e| panic!("Failed to run instr binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn mock_repo() -> MockRepo {
    MockRepo::new()
        .folder(
            "1",
            vec![
                ("Manual 100".into(), "u1".into()),
                ("Инструкция 102".into(), "u3".into()),
            ],
        )
        .folder("2", vec![("Guide 200".into(), "u2".into())])
        .numbered("big", "Item", 120)
        .fail_at("bad", 0)
}

#[tokio::test]
async fn test_check_config() {
    let addr = serve(Arc::new(mock_repo())).await;
    let (_tmp, config_path) = setup_test_env(addr);

    let (stdout, stderr, success) = run_instr(&config_path, &["check-config"]).await;
    assert!(success, "check-config failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Configuration OK."));
    assert!(stdout.contains("categories: 3"));
    assert!(stdout.contains("bot token: NOT SET"));
}

#[tokio::test]
async fn test_categories_listed_in_config_order() {
    let addr = serve(Arc::new(mock_repo())).await;
    let (_tmp, config_path) = setup_test_env(addr);

    let (stdout, _, success) = run_instr(&config_path, &["categories"]).await;
    assert!(success);
    let sapsan = stdout.find("ЭВС «Сапсан»").unwrap();
    let bulk = stdout.find("Bulk").unwrap();
    let broken = stdout.find("Broken").unwrap();
    assert!(sapsan < bulk && bulk < broken);
    assert!(stdout.contains("1, 2"));
}

#[tokio::test]
async fn test_fetch_reads_all_pages() {
    let repo = Arc::new(mock_repo());
    let addr = serve(repo.clone()).await;
    let (_tmp, config_path) = setup_test_env(addr);

    let (stdout, stderr, success) = run_instr(&config_path, &["fetch", "Bulk"]).await;
    assert!(success, "fetch failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("items: 120"));
    assert!(stdout.contains("status: complete"));
    // 50 + 50 + 20 + empty
    assert_eq!(repo.seen().len(), 4);
}

#[tokio::test]
async fn test_fetch_concatenates_folders() {
    let addr = serve(Arc::new(mock_repo())).await;
    let (_tmp, config_path) = setup_test_env(addr);

    let (stdout, _, success) = run_instr(&config_path, &["fetch", "ЭВС «Сапсан»"]).await;
    assert!(success);
    assert!(stdout.contains("items: 3"));
}

#[tokio::test]
async fn test_fetch_reports_incomplete_listing() {
    let addr = serve(Arc::new(mock_repo())).await;
    let (_tmp, config_path) = setup_test_env(addr);

    let (stdout, _, success) = run_instr(&config_path, &["fetch", "Broken"]).await;
    assert!(success, "a failed folder must not fail the command");
    assert!(stdout.contains("items: 2"));
    assert!(stdout.contains("incomplete"));
}

#[tokio::test]
async fn test_fetch_unknown_category() {
    let addr = serve(Arc::new(mock_repo())).await;
    let (_tmp, config_path) = setup_test_env(addr);

    let (_, stderr, success) = run_instr(&config_path, &["fetch", "Nope"]).await;
    assert!(!success);
    assert!(stderr.contains("Unknown category"));
}

#[tokio::test]
async fn test_search_prints_links() {
    let addr = serve(Arc::new(mock_repo())).await;
    let (_tmp, config_path) = setup_test_env(addr);

    let (stdout, _, success) = run_instr(&config_path, &["search", "ЭВС «Сапсан»", "100"]).await;
    assert!(success);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["<a href=\"u1\">Manual 100</a>"]);
}

#[tokio::test]
async fn test_search_is_case_insensitive() {
    let addr = serve(Arc::new(mock_repo())).await;
    let (_tmp, config_path) = setup_test_env(addr);

    let (stdout, _, success) =
        run_instr(&config_path, &["search", "ЭВС «Сапсан»", "ИНСТРУКЦИЯ"]).await;
    assert!(success);
    assert_eq!(stdout.trim(), "<a href=\"u3\">Инструкция 102</a>");
}

#[tokio::test]
async fn test_search_no_results() {
    let addr = serve(Arc::new(mock_repo())).await;
    let (_tmp, config_path) = setup_test_env(addr);

    let (stdout, _, success) = run_instr(&config_path, &["search", "ЭВС «Сапсан»", "999"]).await;
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[tokio::test]
async fn test_invalid_config_fails() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("instr.toml");
    fs::write(
        &config_path,
        "[access]\nallowed_users = []\n\n[repository]\nurl_template = \"http://x/{folder_id}\"\n\n[[categories]]\nlabel = \"A\"\nfolder_ids = [1]\n",
    )
    .unwrap();

    let (_, stderr, success) = run_instr(&config_path, &["check-config"]).await;
    assert!(!success);
    assert!(stderr.contains("allowed_users"));
}

#[tokio::test]
async fn test_run_without_token_fails() {
    let addr = serve(Arc::new(mock_repo())).await;
    let (_tmp, config_path) = setup_test_env(addr);

    let (_, stderr, success) = run_instr(&config_path, &["run"]).await;
    assert!(!success);
    assert!(stderr.contains("bot token not set"));
}
