#![allow(deprecated)] // Command::cargo_bin

use assert_cmd::Command;
use predicates::prelude::*;

fn diskflow() -> Command {
    let mut cmd = Command::cargo_bin("diskflow").unwrap();
    cmd.env_remove("DISKFLOW_CONFIG_PATH");
    cmd
}

/// CLIヘルプが正しく表示されることを確認
#[test]
fn test_cli_help() {
    diskflow()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("取り残しなく"))
        .stdout(predicate::str::contains("snapshot"))
        .stdout(predicate::str::contains("volume"))
        .stdout(predicate::str::contains("restore"))
        .stdout(predicate::str::contains("--json"));
}

/// バージョン表示は設定ファイルなしで動作する
#[test]
fn test_cli_version() {
    let temp_dir = tempfile::tempdir().unwrap();
    diskflow()
        .current_dir(temp_dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("diskflow"));
}

#[test]
fn test_restore_help() {
    diskflow()
        .args(["restore", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--snapshot"))
        .stdout(predicate::str::contains("--size"))
        .stdout(predicate::str::contains("--instance"));
}

#[test]
fn test_snapshot_create_requires_volume() {
    diskflow()
        .args(["snapshot", "create"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--volume"));
}

/// 不正なコマンドでエラーになることを確認
#[test]
fn test_invalid_command() {
    diskflow().arg("invalid-command").assert().failure();
}

/// 存在しない設定ファイルを指定するとエラーになる
#[test]
fn test_missing_config_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    diskflow()
        .current_dir(temp_dir.path())
        .args(["--config", "absent.yaml", "auth"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("IO エラー"));
}

/// 不正な待機設定はプロバイダーへの接続前に拒否される
#[test]
fn test_invalid_poll_settings() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = temp_dir.path().join("diskflow.yaml");
    std::fs::write(
        &config,
        "provider:\n  region: cn-hangzhou\npoll:\n  delay_secs: 30\n  max_secs: 10\n",
    )
    .unwrap();

    diskflow()
        .current_dir(temp_dir.path())
        .args(["snapshot", "show", "s-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("poll.delay_secs"));
}
