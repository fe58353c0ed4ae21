use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn antiplag_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("antiplag");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let files_dir = root.join("files");
    fs::create_dir_all(&files_dir).unwrap();
    fs::write(files_dir.join("a.txt"), "hello\nworld\n").unwrap();
    fs::write(files_dir.join("b.txt"), "hello\nworld\n").unwrap();
    fs::write(
        files_dir.join("essay.txt"),
        "Alpha beta\n\nGamma\n\nDelta epsilon zeta\n",
    )
    .unwrap();
    fs::write(files_dir.join("notes.md"), "# not a text upload\n").unwrap();
    fs::write(files_dir.join("empty.txt"), "").unwrap();

    let config_content = format!(
        r#"[db]
path = "{root}/data/antiplag.sqlite"

[storage]
upload_dir = "{root}/data/uploads"

[analysis]
wordcloud_dir = "{root}/data/wordclouds"

[wordcloud]
provider = "disabled"

[server]
bind = "127.0.0.1:7341"
"#,
        root = root.display()
    );

    let config_path = config_dir.join("antiplag.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_antiplag(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = antiplag_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run antiplag binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn file_arg(tmp: &TempDir, name: &str) -> String {
    tmp.path().join("files").join(name).display().to_string()
}

#[test]
fn test_init_creates_database_and_directories() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_antiplag(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/antiplag.sqlite").exists());
    assert!(tmp.path().join("data/uploads").is_dir());
    assert!(tmp.path().join("data/wordclouds").is_dir());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_antiplag(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_antiplag(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_upload_dedup_and_analysis() {
    let (tmp, config_path) = setup_test_env();
    run_antiplag(&config_path, &["init"]);

    let (stdout, stderr, success) =
        run_antiplag(&config_path, &["upload", &file_arg(&tmp, "a.txt")]);
    assert!(success, "upload failed: {}", stderr);
    assert!(stdout.contains("id: 1"));
    assert!(stdout.contains("status: new"));

    let (stdout, _, success) = run_antiplag(&config_path, &["upload", &file_arg(&tmp, "b.txt")]);
    assert!(success);
    assert!(stdout.contains("id: 1"), "identical content should reuse id: {}", stdout);
    assert!(stdout.contains("status: existing"));

    // One physical copy for identical bytes.
    let blobs = fs::read_dir(tmp.path().join("data/uploads")).unwrap().count();
    assert_eq!(blobs, 1);

    let (stdout, _, success) = run_antiplag(&config_path, &["duplicate", "1"]);
    assert!(success);
    assert!(stdout.contains("duplicate: none"));

    let (stdout, stderr, success) = run_antiplag(&config_path, &["analyze", "1"]);
    assert!(success, "analyze failed: {}", stderr);
    assert!(stdout.contains("paragraphs:  1"), "{}", stdout);
    assert!(stdout.contains("words:       2"));
    assert!(stdout.contains("characters:  10"));
    assert!(stdout.contains("cached:      no"));
    assert!(stdout.contains("word_cloud:  none"));

    let (stdout, _, success) = run_antiplag(&config_path, &["analyze", "1"]);
    assert!(success);
    assert!(stdout.contains("characters:  10"));
    assert!(stdout.contains("cached:      yes"));
}

#[test]
fn test_analyze_json_shape() {
    let (tmp, config_path) = setup_test_env();

    let (_, stderr, success) =
        run_antiplag(&config_path, &["upload", &file_arg(&tmp, "essay.txt")]);
    assert!(success, "upload failed: {}", stderr);

    let (stdout, stderr, success) = run_antiplag(&config_path, &["analyze", "1", "--json"]);
    assert!(success, "analyze failed: {}", stderr);

    let record: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(record["fileId"], 1);
    assert_eq!(record["paragraphCount"], 3);
    assert_eq!(record["wordCount"], 6);
    assert_eq!(record["characterCount"], 33);
    assert!(record["plagiarismFileId"].is_null());
    assert!(record["wordCloudPath"].is_null());
}

#[test]
fn test_get_writes_raw_content() {
    let (tmp, config_path) = setup_test_env();
    run_antiplag(&config_path, &["upload", &file_arg(&tmp, "essay.txt")]);

    let (stdout, _, success) = run_antiplag(&config_path, &["get", "1"]);
    assert!(success);
    assert_eq!(stdout, "Alpha beta\n\nGamma\n\nDelta epsilon zeta\n");
}

#[test]
fn test_upload_with_name_override() {
    let (tmp, config_path) = setup_test_env();

    // A .md file may be stored under an accepted name.
    let (stdout, stderr, success) = run_antiplag(
        &config_path,
        &["upload", &file_arg(&tmp, "notes.md"), "--name", "notes.txt"],
    );
    assert!(success, "upload failed: {}", stderr);
    assert!(stdout.contains("status: new"));
}

#[test]
fn test_upload_rejects_invalid_files() {
    let (tmp, config_path) = setup_test_env();

    let (_, stderr, success) =
        run_antiplag(&config_path, &["upload", &file_arg(&tmp, "notes.md")]);
    assert!(!success, "non-.txt upload should fail");
    assert!(stderr.contains("invalid input"), "stderr: {}", stderr);

    let (_, stderr, success) =
        run_antiplag(&config_path, &["upload", &file_arg(&tmp, "empty.txt")]);
    assert!(!success, "empty upload should fail");
    assert!(stderr.contains("empty"), "stderr: {}", stderr);
}

#[test]
fn test_unknown_id_is_not_found() {
    let (_tmp, config_path) = setup_test_env();
    run_antiplag(&config_path, &["init"]);

    for command in ["get", "duplicate", "analyze"] {
        let (_, stderr, success) = run_antiplag(&config_path, &[command, "42"]);
        assert!(!success, "{} 42 should fail", command);
        assert!(
            stderr.contains("not found"),
            "{} stderr: {}",
            command,
            stderr
        );
    }
}

#[test]
fn test_stats_counts() {
    let (tmp, config_path) = setup_test_env();
    run_antiplag(&config_path, &["upload", &file_arg(&tmp, "a.txt")]);
    run_antiplag(&config_path, &["upload", &file_arg(&tmp, "b.txt")]);
    run_antiplag(&config_path, &["upload", &file_arg(&tmp, "essay.txt")]);
    run_antiplag(&config_path, &["analyze", "2"]);

    let (stdout, stderr, success) = run_antiplag(&config_path, &["stats"]);
    assert!(success, "stats failed: {}", stderr);
    assert!(stdout.contains("Documents:   2"), "{}", stdout);
    assert!(stdout.contains("Analyses:    1 / 2"));
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_antiplag(&tmp.path().join("nope.toml"), &["stats"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}
