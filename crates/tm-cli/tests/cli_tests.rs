//! CLI integration tests
//!
//! Each test builds a throwaway project (migrations directory plus an
//! optional `tidemark.yml`) and drives the `tidemark` binary against a
//! DuckDB file inside the same temp directory.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Path to the compiled tidemark binary (resolved at compile time)
fn tidemark_bin() -> String {
    env!("CARGO_BIN_EXE_tidemark").to_string()
}

struct TestProject {
    dir: TempDir,
}

impl TestProject {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("migrations")).unwrap();
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn db_path(&self) -> PathBuf {
        self.root().join("app.duckdb")
    }

    fn add(&self, name: &str, body: &str) -> &Self {
        std::fs::write(self.root().join("migrations").join(name), body).unwrap();
        self
    }

    fn config(&self, yaml: &str) -> &Self {
        std::fs::write(self.root().join("tidemark.yml"), yaml).unwrap();
        self
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(tidemark_bin());
        cmd.arg("--project-dir")
            .arg(self.root())
            .env_remove("TIDEMARK_DATABASE_URL")
            .env_remove("RUST_LOG")
            .args(args);
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        let url = format!("duckdb://{}", self.db_path().display());
        self.command(args)
            .arg("--database-url")
            .arg(url)
            .output()
            .expect("Failed to run tidemark")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!("stdout is not JSON ({e}):\n{}", stdout(output));
    })
}

fn shop() -> TestProject {
    let project = TestProject::new();
    project
        .add("001_create_users.sql", "CREATE TABLE users (id INTEGER, email VARCHAR);")
        .add(
            "002_seed_users.sql",
            "INSERT INTO users VALUES (1, 'a@example.com'), (2, 'b@example.com');",
        )
        .add("README.md", "not a migration");
    project
}

// ── tidemark migrate ────────────────────────────────────────────────────

#[test]
fn test_migrate_applies_and_reports_schema() {
    let project = shop();
    let output = project.run(&["migrate"]);
    let out = stdout(&output);

    assert!(output.status.success(), "stdout: {out}\nstderr: {}", stderr(&output));
    assert!(out.contains("001_create_users (applied)"), "{out}");
    assert!(out.contains("Completed: 2 applied, 0 skipped, 0 failed"), "{out}");
    assert!(out.contains("users"), "{out}");
    assert!(!out.contains("tidemark_migrations"), "{out}");
}

#[test]
fn test_migrate_twice_skips_everything() {
    let project = shop();
    assert!(project.run(&["migrate"]).status.success());

    let output = project.run(&["migrate"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Completed: 0 applied, 2 skipped, 0 failed"));
}

#[test]
fn test_migrate_json_output() {
    let project = shop();
    let output = project.run(&["migrate", "--output", "json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let doc = json(&output);
    assert_eq!(doc["success"], true);
    assert_eq!(doc["report"]["results"][1]["name"], "002_seed_users");
    assert_eq!(doc["report"]["results"][1]["status"], "applied");
    assert_eq!(doc["snapshot"]["tables"][0]["name"], "users");
    assert_eq!(doc["snapshot"]["tables"][0]["row_count"]["rows"], 2);
}

#[test]
fn test_failed_migration_exits_one_and_stops() {
    let project = shop();
    project
        .add("003_broken.sql", "CREATE TABLE partial (id INTEGER); NOT VALID SQL;")
        .add("004_after.sql", "CREATE TABLE after_broken (id INTEGER);");

    let output = project.run(&["migrate", "--output", "json"]);
    assert_eq!(output.status.code(), Some(1));

    let doc = json(&output);
    let results = doc["report"]["results"].as_array().unwrap();
    let statuses: Vec<&str> = results
        .iter()
        .map(|r| r["status"].as_str().unwrap())
        .collect();
    assert_eq!(statuses, vec!["applied", "applied", "failed", "pending"]);

    let tables: Vec<&str> = doc["snapshot"]["tables"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(tables, vec!["users"]);
}

#[test]
fn test_continue_on_failure_flag() {
    let project = shop();
    project
        .add("003_broken.sql", "SELECT * FROM nowhere;")
        .add("004_after.sql", "CREATE TABLE after_broken (id INTEGER);");

    let output = project.run(&["migrate", "--continue-on-failure", "--output", "json"]);
    assert_eq!(output.status.code(), Some(1));
    let doc = json(&output);
    assert_eq!(doc["report"]["results"][3]["status"], "applied");
    assert_eq!(doc["report"]["policy"], "continue");
}

#[test]
fn test_failure_policy_from_config() {
    let project = shop();
    project
        .config("failure_policy: continue\n")
        .add("003_broken.sql", "SELECT * FROM nowhere;")
        .add("004_after.sql", "CREATE TABLE after_broken (id INTEGER);");

    let doc = json(&project.run(&["migrate", "--output", "json"]));
    assert_eq!(doc["report"]["results"][3]["status"], "applied");
}

#[test]
fn test_missing_database_url_is_rejected() {
    let project = shop();
    let output = project
        .command(&["migrate"])
        .output()
        .expect("Failed to run tidemark");

    assert!(!output.status.success());
    assert!(stderr(&output).contains("TIDEMARK_DATABASE_URL"), "{}", stderr(&output));
    assert!(!project.db_path().exists());
}

#[test]
fn test_database_url_env_from_config() {
    let project = shop();
    project.config("database_url_env: SHOP_DB\n");
    let output = project
        .command(&["migrate"])
        .env("SHOP_DB", project.db_path())
        .output()
        .expect("Failed to run tidemark");
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(project.db_path().exists());
}

#[test]
fn test_duplicate_ordinals_fail_before_connecting() {
    let project = shop();
    project.add("002_other.sql", "CREATE TABLE other (id INTEGER);");

    let output = project.run(&["migrate"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("TM004"), "{}", stderr(&output));
    assert!(!project.db_path().exists());
}

#[test]
fn test_embedded_commit_fails_before_connecting() {
    let project = shop();
    project.add(
        "003_split.sql",
        "CREATE TABLE b (id INT);\nCOMMIT;\nINSERT INTO nowhere VALUES (1);\n",
    );

    let output = project.run(&["migrate"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("TM009"), "{}", stderr(&output));
    assert!(!project.db_path().exists());
}

#[test]
fn test_dry_run_changes_nothing() {
    let project = shop();
    let output = project.run(&["migrate", "--dry-run"]);
    let out = stdout(&output);
    assert!(output.status.success(), "{out}");
    assert!(out.contains("Planning 2 migration(s)"), "{out}");
    assert!(out.contains("(no tables)"), "{out}");
}

#[test]
fn test_target_applies_prefix_only() {
    let project = shop();
    let doc = json(&project.run(&["migrate", "--target", "001_create_users", "--output", "json"]));
    assert_eq!(doc["report"]["results"].as_array().unwrap().len(), 1);
    assert_eq!(doc["snapshot"]["tables"][0]["row_count"]["rows"], 0);

    let output = project.run(&["migrate", "--target", "009_missing"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("TM008"));
}

// ── tidemark status ─────────────────────────────────────────────────────

#[test]
fn test_status_before_and_after() {
    let project = shop();

    let before = json(&project.run(&["status", "--output", "json"]));
    assert_eq!(before["pending_count"], 2);
    assert_eq!(before["applied_count"], 0);

    assert!(project.run(&["migrate", "--target", "001_create_users"]).status.success());

    let after = json(&project.run(&["status", "--output", "json"]));
    assert_eq!(after["applied_count"], 1);
    assert_eq!(after["units"][0]["state"], "applied");
    assert_eq!(after["units"][1]["state"], "pending");
}

#[test]
fn test_status_reports_edited_migration() {
    let project = shop();
    assert!(project.run(&["migrate"]).status.success());
    project.add(
        "001_create_users.sql",
        "CREATE TABLE users (id BIGINT, email VARCHAR);",
    );

    let output = project.run(&["status"]);
    let out = stdout(&output);
    assert!(output.status.success());
    assert!(out.contains("applied (changed)"), "{out}");
    assert!(out.contains("'001_create_users' changed after it was applied"), "{out}");
}

// ── tidemark inspect ────────────────────────────────────────────────────

#[test]
fn test_inspect_lists_tables() {
    let project = shop();
    assert!(project.run(&["migrate"]).status.success());

    let output = project.run(&["inspect"]);
    let out = stdout(&output);
    assert!(output.status.success());
    assert!(out.contains("Schema 'main': 1 table(s)"), "{out}");
    assert!(out.lines().any(|l| l.starts_with("users") && l.ends_with('2')), "{out}");
}

// ── tidemark new ────────────────────────────────────────────────────────

#[test]
fn test_new_numbers_after_highest() {
    let project = shop();
    project.add("010_indexes.sql", "CREATE INDEX idx ON users (id);");

    let output = project
        .command(&["new", "Add username auth"])
        .output()
        .expect("Failed to run tidemark");
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let created = project.root().join("migrations/011_add_username_auth.sql");
    assert!(created.exists(), "{}", stdout(&output));
}

#[test]
fn test_new_creates_missing_directory() {
    let project = TestProject::new();
    project.config("migrations_dir: db/migrations\n");

    let output = project
        .command(&["new", "init"])
        .output()
        .expect("Failed to run tidemark");
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(project.root().join("db/migrations/001_init.sql").exists());
}
