//! Tests for the `mdbfs` binary: argument handling, exit codes and the
//! inspection commands.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use rusqlite::Connection;
use tempfile::TempDir;

/// Temp dir holding an empty config file, so the user's config never leaks in.
fn sandbox() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.ron");
    std::fs::write(&config, "()").unwrap();
    (dir, config)
}

fn mdbfs(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mdbfs"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn version_lists_every_backend() {
    let (_dir, config) = sandbox();
    let output = mdbfs(&config, &["--version"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.starts_with("mdbfs version "));
    assert!(text.contains("Backend sqlite version "));
    assert!(text.contains("Backend kv version "));
    assert!(!text.contains("sqlite3"));
}

#[test]
fn backends_prints_help() {
    let (_dir, config) = sandbox();
    let output = mdbfs(&config, &["backends"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("sqlite - backend for SQLite 3 databases"));
    assert!(text.contains("kv - "));
}

#[test]
fn missing_backend_exits_1() {
    let (dir, config) = sandbox();
    let db = dir.path().join("x.db");
    let output = mdbfs(&config, &["--db", db.to_str().unwrap(), "ls", "/"]);
    assert_eq!(output.status.code(), Some(1));

    let output = mdbfs(&config, &["--type", "oracle", "--db", db.to_str().unwrap(), "ls"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn missing_database_exits_2() {
    let (_dir, config) = sandbox();
    let output = mdbfs(&config, &["--type", "kv", "ls", "/"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn inspect_relational_database() {
    let (dir, config) = sandbox();
    let db = dir.path().join("app.sqlite");
    Connection::open(&db)
        .unwrap()
        .execute_batch(
            "CREATE TABLE users (name TEXT, age INTEGER);
             INSERT INTO users VALUES ('ada', 36);",
        )
        .unwrap();
    let db = db.to_str().unwrap();

    let output = mdbfs(&config, &["-t", "sqlite", "-d", db, "ls", "/users/1"]);
    assert!(output.status.success());
    let listing = stdout(&output);
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("-rw-r--r--") && lines[0].ends_with(" 3 name"));
    assert!(lines[1].ends_with(" 2 age"));

    let output = mdbfs(&config, &["-t", "sqlite", "-d", db, "cat", "/users/1/name"]);
    assert!(output.status.success());
    assert_eq!(output.stdout, b"ada");

    let output = mdbfs(&config, &["-t", "sqlite", "-d", db, "stat", "/users"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Kind: table"));
}

#[test]
fn failing_lookup_exits_with_errno() {
    let (dir, config) = sandbox();
    let db = dir.path().join("records.db");
    let db = db.to_str().unwrap();

    let output = mdbfs(&config, &["-t", "kv", "-d", db, "cat", "/absent"]);
    assert_eq!(output.status.code(), Some(libc::ENOENT));

    let output = mdbfs(&config, &["-t", "kv", "-d", db, "cat", "/a/b"]);
    assert_eq!(output.status.code(), Some(libc::EINVAL));
}

#[test]
fn config_file_supplies_defaults() {
    let (dir, _) = sandbox();
    let db = dir.path().join("records.db");
    let config = dir.path().join("kv.ron");
    std::fs::write(
        &config,
        format!("(backend: Some(\"keyvalue\"), database: Some({:?}))", db.to_str().unwrap()),
    )
    .unwrap();

    let output = mdbfs(&config, &["ls", "/"]);
    assert!(output.status.success());
    assert!(stdout(&output).is_empty());
}

#[cfg(not(feature = "fuse"))]
#[test]
fn mount_without_fuse_feature_fails() {
    let (dir, config) = sandbox();
    let db = dir.path().join("records.db");
    let output = mdbfs(
        &config,
        &["-t", "kv", "-d", db.to_str().unwrap(), "mount", dir.path().to_str().unwrap()],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("fuse support disabled"));
}
