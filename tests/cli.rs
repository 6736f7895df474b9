/*!
 * Integration tests for the backutil binary
 */

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};

use filetime::{set_file_mtime, FileTime};
use tempfile::tempdir;

fn backutil(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_backutil"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn test_first_run_creates_config_and_stops() {
    let temp_dir = tempdir().unwrap();

    let output = backutil(temp_dir.path(), &[]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("servers_directory"));
    assert!(stderr.contains("must stop"));

    let config = fs::read_to_string(temp_dir.path().join("config.toml")).unwrap();
    assert!(config.contains("enable_pruning = false"));
    assert!(config.contains("pruning_threshold = 60"));
}

#[test]
fn test_json_report_and_archive() {
    let temp_dir = tempdir().unwrap();
    let server = temp_dir.path().join("servers").join("lobby");
    fs::create_dir_all(&server).unwrap();

    let data = server.join("data.txt");
    let mut file = File::create(&data).unwrap();
    writeln!(file, "hello").unwrap();
    // 2021-01-01 00:00:00 UTC
    set_file_mtime(&data, FileTime::from_unix_time(1_609_459_200, 0)).unwrap();
    set_file_mtime(&server, FileTime::from_unix_time(1_609_459_200, 0)).unwrap();

    fs::write(
        temp_dir.path().join("config.toml"),
        "servers_directory = \"servers\"\nbackups_directory = \"backups\"\nlog_level = \"warn\"\n",
    )
    .unwrap();

    let output = backutil(temp_dir.path(), &["--format", "json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["servers"][0]["name"], "lobby");
    assert_eq!(report["servers"][0]["outcome"]["status"], "backed_up");
    assert_eq!(
        report["servers"][0]["outcome"]["archive"],
        "lobby_2021-01-01_00-00-00.zip"
    );
    assert!(temp_dir
        .path()
        .join("backups")
        .join("lobby")
        .join("lobby_2021-01-01_00-00-00.zip")
        .exists());

    let again = backutil(temp_dir.path(), &["--format", "json", "--dry-run"]);
    assert!(again.status.success());
    let report: serde_json::Value = serde_json::from_slice(&again.stdout).unwrap();
    assert_eq!(report["servers"][0]["outcome"]["status"], "up_to_date");
}
