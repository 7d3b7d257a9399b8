//! CLI integration tests
//!
//! Every test here runs offline: commands either never reach the network
//! (help, listing, stats on a fresh database) or fail before a request
//! goes out (unparseable URLs, missing API key).
use predicates::prelude::*;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("nuntius")
}

/// A command wired to a fresh database in its own temp directory.
fn cmd_with_db(dir: &TempDir) -> assert_cmd::Command {
    let url = format!("sqlite://{}/nuntius-test.db", dir.path().display());
    let mut cmd = cmd();
    cmd.arg("--database").arg(url);
    cmd
}

#[test]
fn test_cli_help() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("feed"))
        .stdout(predicate::str::contains("refresh"))
        .stdout(predicate::str::contains("scrape"))
        .stdout(predicate::str::contains("summarize"))
        .stdout(predicate::str::contains("digest"))
        .stdout(predicate::str::contains("stats"));
}

#[test]
fn test_cli_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("nuntius"));
}

#[test]
fn test_cli_feed_help_lists_subcommands() {
    cmd()
        .args(["feed", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("remove"))
        .stdout(predicate::str::contains("restore"))
        .stdout(predicate::str::contains("purge"));
}

#[test]
fn test_cli_feed_list_empty_database() {
    let tmp = TempDir::new().unwrap();

    cmd_with_db(&tmp)
        .args(["feed", "list"])
        .assert()
        .success()
        .stderr(predicate::str::contains("No feeds subscribed"));
}

#[test]
fn test_cli_feed_add_rejects_bad_url() {
    let tmp = TempDir::new().unwrap();

    cmd_with_db(&tmp).args(["feed", "add", "not-a-url"]).assert().failure();
}

#[test]
fn test_cli_feed_remove_unknown_id() {
    let tmp = TempDir::new().unwrap();

    cmd_with_db(&tmp)
        .args(["feed", "remove", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_cli_articles_empty_database() {
    let tmp = TempDir::new().unwrap();

    cmd_with_db(&tmp)
        .arg("articles")
        .assert()
        .success()
        .stderr(predicate::str::contains("No articles found"));
}

#[test]
fn test_cli_articles_json_output() {
    let tmp = TempDir::new().unwrap();

    cmd_with_db(&tmp)
        .args(["articles", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("[]"));
}

#[test]
fn test_cli_articles_invalid_status() {
    let tmp = TempDir::new().unwrap();

    cmd_with_db(&tmp)
        .args(["articles", "--status", "bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown status"));
}

#[test]
fn test_cli_article_unknown_id() {
    let tmp = TempDir::new().unwrap();

    cmd_with_db(&tmp)
        .args(["article", "7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_cli_stats_empty_database() {
    let tmp = TempDir::new().unwrap();

    cmd_with_db(&tmp)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Totals"))
        .stdout(predicate::str::contains("0 feeds"));
}

#[test]
fn test_cli_refresh_empty_database() {
    let tmp = TempDir::new().unwrap();

    cmd_with_db(&tmp)
        .arg("refresh")
        .assert()
        .success()
        .stderr(predicate::str::contains("0 feeds checked"));
}

#[test]
fn test_cli_scrape_empty_queue() {
    let tmp = TempDir::new().unwrap();

    cmd_with_db(&tmp)
        .arg("scrape")
        .assert()
        .success()
        .stderr(predicate::str::contains("0 articles scraped"));
}

#[test]
fn test_cli_scrape_url_failure() {
    let tmp = TempDir::new().unwrap();

    cmd_with_db(&tmp)
        .args(["scrape", "--url", "not-a-url"])
        .assert()
        .failure();
}

#[test]
fn test_cli_digest_requires_api_key() {
    let tmp = TempDir::new().unwrap();

    let mut cmd = cmd_with_db(&tmp);
    cmd.env_remove("OPENAI_API_KEY");
    cmd.arg("digest")
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key not configured"));
}

#[test]
fn test_cli_summarize_requires_api_key() {
    let tmp = TempDir::new().unwrap();

    let mut cmd = cmd_with_db(&tmp);
    cmd.env_remove("OPENAI_API_KEY");
    cmd.arg("summarize")
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key not configured"));
}

#[test]
fn test_cli_config_file_database_url() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("config.json");
    let db_url = format!("sqlite://{}/from-config.db", tmp.path().display());

    std::fs::write(&config_path, format!(r#"{{"database": {{"url": "{db_url}"}}}}"#)).unwrap();

    cmd()
        .arg("--config")
        .arg(&config_path)
        .args(["feed", "list"])
        .assert()
        .success()
        .stderr(predicate::str::contains("No feeds subscribed"));

    assert!(tmp.path().join("from-config.db").exists());
}

#[test]
fn test_cli_invalid_config_file() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("config.json");
    std::fs::write(&config_path, "{ not json").unwrap();

    cmd()
        .arg("--config")
        .arg(&config_path)
        .args(["feed", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load config"));
}

#[test]
fn test_cli_verbose_banner() {
    let tmp = TempDir::new().unwrap();

    cmd_with_db(&tmp)
        .args(["-v", "stats"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Nuntius"));
}
