//! Integration test for the gacha simulator binary.

use std::process::Command;

fn gacha_sim() -> Command {
    Command::new(env!("CARGO_BIN_EXE_gacha_sim"))
}

#[test]
fn test_bad_config_fails_with_status() {
    let output = gacha_sim()
        .args(["--config", "/nonexistent/questpet/economy.toml"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error"), "stderr was: {stderr}");
}

#[test]
fn test_small_run_succeeds() {
    let output = gacha_sim()
        .args(["--seed", "3", "--draws", "1000", "--climbs", "10"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("legendary"));
    assert!(stdout.contains("4★ -> 5★"));
}
