/// Integration tests for the mdbl shell binary.
/// Tests cover: create/list/delete, validation, conflicts, persistence across runs, exit status, corrupt registries
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// Helper to run shell commands and capture stdout and the exit status.
fn run_shell(root: &Path, extra_env: &[(&str, &str)], commands: &str) -> (String, bool) {
    use std::io::Write;
    use std::process::{Command, Stdio};

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mdbl"));
    cmd.env("MDBL_ROOT", root.to_str().unwrap())
        .env("MDBL_DATABASE", "testdb")
        .env("MDBL_SYNC", "false")
        .env("MDBL_LOG", "error")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (k, v) in extra_env {
        cmd.env(k, v);
    }

    let mut child = cmd.spawn().expect("Failed to spawn shell");
    {
        let stdin = child.stdin.as_mut().expect("Failed to open stdin");
        stdin
            .write_all(commands.as_bytes())
            .expect("Failed to write to stdin");
        stdin.write_all(b"EXIT\n").expect("Failed to write EXIT");
    }

    let output = child.wait_with_output().expect("Failed to read output");
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        output.status.success(),
    )
}

fn registry_path(root: &Path) -> std::path::PathBuf {
    root.join("testdb").join("table.info")
}

#[test]
fn test_startup_creates_database_dir() {
    let dir = tempdir().unwrap();
    let (output, ok) = run_shell(dir.path(), &[], "");

    assert!(ok);
    assert!(output.contains("MDBL started"));
    assert!(output.contains("tables=0"));
    assert!(output.contains("bye"));
    assert!(dir.path().join("testdb").join("tables").is_dir());
}

#[test]
fn test_create_and_list() {
    let dir = tempdir().unwrap();
    let (output, ok) = run_shell(dir.path(), &[], "CREATE orders id total\nLIST\n");

    assert!(ok);
    assert!(output.contains("OK orders (id, total)"));
    assert!(output.contains("(1 tables)"));

    let registry = fs::read_to_string(registry_path(dir.path())).unwrap();
    assert!(registry.starts_with("{\"name\":\"orders\",\"folder\":"));
    assert!(registry.ends_with("\"fieldnames\":[\"id\",\"total\"]}\n"));
}

#[test]
fn test_tables_persist_across_runs() {
    let dir = tempdir().unwrap();
    run_shell(dir.path(), &[], "CREATE a x\nCREATE b y\n");

    let (output, ok) = run_shell(dir.path(), &[], "LIST\n");
    assert!(ok);
    assert!(output.contains("tables=2"));
    let a = output.find("a (x)").unwrap();
    let b = output.find("b (y)").unwrap();
    assert!(a < b);
}

#[test]
fn test_interactive_field_entry() {
    let dir = tempdir().unwrap();
    let (output, ok) = run_shell(dir.path(), &[], "CREATE users\nid\nname\n:d\n");

    assert!(ok);
    assert!(output.contains("Enter ':q' to quit or ':d' to finish adding fields"));
    assert!(output.contains("OK users (id, name)"));
}

#[test]
fn test_validation_failure_sets_exit_status() {
    let dir = tempdir().unwrap();
    let (output, ok) = run_shell(dir.path(), &[], "CREATE bad!name f1\nLIST\n");

    assert!(!ok);
    assert!(output.contains("ERR"));
    assert!(output.contains("(empty)"));
    assert!(!registry_path(dir.path()).exists());
}

#[test]
fn test_duplicate_create_is_rejected() {
    let dir = tempdir().unwrap();
    let (output, ok) = run_shell(dir.path(), &[], "CREATE t a\nCREATE t b\nDESCRIBE t\n");

    assert!(!ok);
    assert!(output.contains("already exists"));
    assert!(output.contains("t (a)"));
    let registry = fs::read_to_string(registry_path(dir.path())).unwrap();
    assert_eq!(registry.lines().count(), 1);
}

#[test]
fn test_delete_table() {
    let dir = tempdir().unwrap();
    let (output, ok) = run_shell(dir.path(), &[], "CREATE a x\nCREATE b y\nCREATE c z\nDELETE b\nLIST\n");

    assert!(ok);
    assert!(output.contains("Deleting table \"b\" ..."));
    assert!(output.contains("Done"));
    assert!(output.contains("(2 tables)"));
    assert!(!dir.path().join("testdb/tables/b").exists());
    assert!(dir.path().join("testdb/tables/a").is_dir());
    assert!(dir.path().join("testdb/tables/c").is_dir());
}

#[test]
fn test_delete_missing_table() {
    let dir = tempdir().unwrap();
    let (output, ok) = run_shell(dir.path(), &[], "DELETE ghost\n");

    assert!(!ok);
    assert!(output.contains("does not exist"));
}

#[test]
fn test_zero_fields_allowed_by_config() {
    let dir = tempdir().unwrap();
    let (output, ok) = run_shell(dir.path(), &[("MDBL_REQUIRE_FIELDS", "false")], "CREATE t\n:d\n");

    assert!(ok);
    assert!(output.contains("OK t ()"));
}

#[test]
fn test_corrupt_line_survives_delete() {
    let dir = tempdir().unwrap();
    run_shell(dir.path(), &[], "CREATE a x\n");
    let path = registry_path(dir.path());
    let mut text = fs::read_to_string(&path).unwrap();
    text.push_str("%%% corrupt %%%\n");
    fs::write(&path, text).unwrap();
    run_shell(dir.path(), &[], "CREATE b y\n");

    let (output, ok) = run_shell(dir.path(), &[], "LIST\nDELETE a\n");
    assert!(ok);
    assert!(output.contains("WARN line 2"));
    assert!(output.contains("(2 tables)"));

    let after = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = after.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "%%% corrupt %%%");
    assert!(lines[1].contains("\"name\":\"b\""));
}

#[test]
fn test_setup_initializes_auth() {
    let dir = tempdir().unwrap();
    let (output, ok) = run_shell(dir.path(), &[], "SETUP admin password123 password123\n");

    assert!(ok);
    assert!(output.contains("OK database initialized"));
    let pointer = fs::read_to_string(dir.path().join("testdb/database.mdb")).unwrap();
    assert!(pointer.ends_with("auth"));
    assert!(dir.path().join("testdb/auth/password").is_file());
}

#[test]
fn test_invalid_database_name_uses_default() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("root");
    fs::create_dir(&root).unwrap();
    let (output, ok) = run_shell(&root, &[("MDBL_DATABASE", "../escape")], "CREATE t a\n");

    assert!(ok);
    assert!(output.contains("OK t (a)"));
    assert!(root.join("MDBL").join("tables").join("t").is_dir());
    assert!(!dir.path().join("escape").exists());
}
