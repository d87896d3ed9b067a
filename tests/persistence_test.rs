use assert_cmd::cargo_bin;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_session_file_survives_runs() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("session.json");

    // 1. First run: sign in
    let mut cmd1 = Command::new(cargo_bin!("paywatch"));
    cmd1.arg("--store-path")
        .arg(&store)
        .args(["login", "--account-id", "acc-7"]);
    let output1 = cmd1.output().expect("Failed to execute command");
    assert!(output1.status.success());

    // 2. Second run: identity is read back from the same file
    let mut cmd2 = Command::new(cargo_bin!("paywatch"));
    cmd2.arg("--store-path").arg(&store).arg("status");
    let output2 = cmd2.output().expect("Failed to execute command");
    assert!(output2.status.success());
    let stdout2 = String::from_utf8_lossy(&output2.stdout);
    assert!(stdout2.contains("account: acc-7"));

    // 3. Third run: sign out, then status reports nobody
    let mut cmd3 = Command::new(cargo_bin!("paywatch"));
    cmd3.arg("--store-path").arg(&store).arg("logout");
    assert!(cmd3.output().unwrap().status.success());

    let mut cmd4 = Command::new(cargo_bin!("paywatch"));
    cmd4.arg("--store-path").arg(&store).arg("status");
    let stdout4 = String::from_utf8_lossy(&cmd4.output().unwrap().stdout).to_string();
    assert!(stdout4.contains("account: not signed in"));
}

#[test]
fn test_interrupted_payment_is_visible_in_status() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("session.json");
    std::fs::write(
        &store,
        r#"{"account.id":"42","payment.txn_ref":"TXN9","payment.started_at":"1700000000000"}"#,
    )
    .unwrap();

    let mut cmd = Command::new(cargo_bin!("paywatch"));
    cmd.arg("--store-path").arg(&store).arg("status");
    let output = cmd.output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("payment: TXN9 (started 2023-11-14T22:13:20+00:00)"));
}
