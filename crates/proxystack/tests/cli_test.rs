#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

const INPUT_KEYS: [&str; 7] = [
    "ACCOUNT_ID",
    "REGION",
    "TINYPROXY_USERNAME",
    "TINYPROXY_PASSWORD",
    "EC2_INSTANCE_AMI",
    "IP_LIST",
    "INSTANCE_TYPE",
];

/// 入力を環境変数から切り離したコマンドを作る
fn proxystack(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("proxystack").unwrap();
    cmd.current_dir(dir)
        .env_remove("PROXYSTACK_ENV_FILE")
        .env_remove("PROXYSTACK_STACK_NAME")
        .env_remove("PROXYSTACK_TIMEOUT");
    for key in INPUT_KEYS {
        cmd.env_remove(key);
    }
    cmd
}

fn with_inputs(cmd: &mut Command) -> &mut Command {
    cmd.env("ACCOUNT_ID", "123456789012")
        .env("REGION", "us-east-1")
        .env("TINYPROXY_USERNAME", "proxyuser")
        .env("TINYPROXY_PASSWORD", "s3cr3t")
        .env("EC2_INSTANCE_AMI", "ami-0abcd1234")
        .env("IP_LIST", "1.2.3.4,5.6.7.8")
        .env("INSTANCE_TYPE", "t3.micro")
}

/// CLIヘルプが正しく表示されることを確認
#[test]
fn test_cli_help() {
    let temp_dir = tempfile::tempdir().unwrap();
    proxystack(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Tinyproxy"))
        .stdout(predicate::str::contains("synth"))
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("outputs"))
        .stdout(predicate::str::contains("destroy"));
}

/// バージョン表示は入力なしでも動作する
#[test]
fn test_cli_version() {
    let temp_dir = tempfile::tempdir().unwrap();
    proxystack(temp_dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("proxystack"));
}

/// deployコマンドのヘルプに --yes が表示されることを確認
#[test]
fn test_deploy_help() {
    let temp_dir = tempfile::tempdir().unwrap();
    proxystack(temp_dir.path())
        .arg("deploy")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--yes"))
        .stdout(predicate::str::contains("--user-data"))
        .stdout(predicate::str::contains("--app"))
        .stdout(predicate::str::contains("--timeout"));
}

/// 入力が欠けていれば何も書き出さずに失敗する
#[test]
fn test_synth_missing_inputs() {
    let temp_dir = tempfile::tempdir().unwrap();
    proxystack(temp_dir.path())
        .arg("synth")
        .assert()
        .failure()
        .stderr(predicate::str::contains("ACCOUNT_ID"))
        .stderr(predicate::str::contains("INSTANCE_TYPE"));

    assert!(!temp_dir.path().join("cdk.out").exists());
}

/// 一部だけ欠けている場合はその名前だけが報告される
#[test]
fn test_synth_reports_only_missing_key() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut cmd = proxystack(temp_dir.path());
    with_inputs(&mut cmd)
        .env_remove("IP_LIST")
        .arg("synth")
        .assert()
        .failure()
        .stderr(predicate::str::contains("IP_LIST"))
        .stderr(predicate::str::contains("ACCOUNT_ID").not());
}

/// 入力が揃っていればテンプレートが書き出される
#[test]
fn test_synth_writes_template() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::write(temp_dir.path().join("user_data.sh"), "#!/bin/bash\necho hi\n").unwrap();

    let mut cmd = proxystack(temp_dir.path());
    with_inputs(&mut cmd).arg("synth").assert().success();

    let template_path = temp_dir
        .path()
        .join("cdk.out")
        .join("AwsProxyServerStack.template.json");
    let content = std::fs::read_to_string(template_path).unwrap();
    assert!(content.contains("AWS::EC2::Instance"));
    assert!(content.contains("ami-0abcd1234"));
    assert!(temp_dir.path().join("cdk.out").join("manifest.json").exists());
}

/// --print でテンプレートが標準出力に表示される
#[test]
fn test_synth_print() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::write(temp_dir.path().join("user_data.sh"), "#!/bin/bash\n").unwrap();

    let mut cmd = proxystack(temp_dir.path());
    with_inputs(&mut cmd)
        .arg("synth")
        .arg("--print")
        .assert()
        .success()
        .stdout(predicate::str::contains("ProxyElasticIP"))
        .stdout(predicate::str::contains("/tinyproxy/username"));
}

/// .env ファイルから入力を読み込める
#[test]
fn test_validate_with_env_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::write(temp_dir.path().join("user_data.sh"), "#!/bin/bash\n").unwrap();
    std::fs::write(
        temp_dir.path().join(".env"),
        "ACCOUNT_ID=123456789012\nREGION=us-east-1\nTINYPROXY_USERNAME=proxyuser\n\
         TINYPROXY_PASSWORD=s3cr3t\nEC2_INSTANCE_AMI=ami-0abcd1234\n\
         IP_LIST=1.2.3.4\nINSTANCE_TYPE=t3.micro\n",
    )
    .unwrap();

    proxystack(temp_dir.path())
        .arg("validate")
        .assert()
        .success();
}

/// ブートスクリプトがなければ失敗する
#[test]
fn test_validate_missing_user_data() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut cmd = proxystack(temp_dir.path());
    with_inputs(&mut cmd)
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("user_data.sh"));
}
