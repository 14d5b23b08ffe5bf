use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn test_missing_config_file() {
    let dir = tempdir().unwrap();

    let mut cmd = Command::cargo_bin("anomaly-tracker").unwrap();
    cmd.timeout(Duration::from_secs(5));
    cmd.arg("--data-path").arg(dir.path()).arg("config");

    // Should succeed with default values
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("platform: PC"))
        .stdout(predicate::str::contains("poll_interval_secs: 60"))
        .stdout(predicate::str::contains("request_timeout_secs: 5"));
    assert!(!dir.path().join("config.toml").exists());
}

#[test]
fn test_config_set_get() {
    let dir = tempdir().unwrap();

    let mut cmd = Command::cargo_bin("anomaly-tracker").unwrap();
    cmd.timeout(Duration::from_secs(5));
    cmd.arg("--data-path")
        .arg(dir.path())
        .arg("config")
        .arg("set")
        .arg("sounds")
        .arg("false");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("sounds set to: false"));

    let mut cmd = Command::cargo_bin("anomaly-tracker").unwrap();
    cmd.timeout(Duration::from_secs(5));
    cmd.arg("--data-path")
        .arg(dir.path())
        .arg("config")
        .arg("get")
        .arg("sounds");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("sounds: false"));
}

#[test]
fn test_invalid_toml_config() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");

    let invalid_configs = vec![
        ("invalid_syntax", "platform = [invalid"),
        ("unknown_platform", "platform = \"N64\""),
        ("wrong_type", "poll_interval_secs = \"soon\""),
        ("timeout_not_below_interval", "poll_interval_secs = 5\nrequest_timeout_secs = 5"),
        ("template_without_suffix", "endpoint_template = \"https://example.com\""),
    ];

    for (test_name, invalid_content) in invalid_configs {
        fs::write(&config_path, invalid_content).unwrap();

        let mut cmd = Command::cargo_bin("anomaly-tracker").unwrap();
        cmd.timeout(Duration::from_secs(5));
        cmd.arg("--data-path").arg(dir.path()).arg("config");

        let output = cmd.output().unwrap();

        assert!(!output.status.success(), "Test '{test_name}' should fail");
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(
            stderr.contains("config"),
            "Test '{test_name}' should have config-related error message, got: {stderr}"
        );
        assert!(!stderr.contains("panic"));

        fs::remove_file(&config_path).ok();
    }
}

#[test]
fn test_config_set_rejects_invalid_values() {
    let dir = tempdir().unwrap();

    let invalid_sets = vec![
        ("platform", "switch"),
        ("messages", "sometimes"),
        ("request_timeout_secs", "120"),
        ("endpoint_template", "ftp://content{suffix}.example.com"),
        ("volume", "11"),
    ];

    for (key, value) in invalid_sets {
        let mut cmd = Command::cargo_bin("anomaly-tracker").unwrap();
        cmd.timeout(Duration::from_secs(5));
        cmd.arg("--data-path")
            .arg(dir.path())
            .arg("config")
            .arg("set")
            .arg(key)
            .arg(value);

        cmd.assert().failure();
    }

    // Nothing invalid was written
    assert!(!dir.path().join("config.toml").exists());
}

#[test]
fn test_config_directory_not_writable() {
    let dir = tempdir().unwrap();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(dir.path()).unwrap().permissions();
        perms.set_mode(0o555);
        fs::set_permissions(dir.path(), perms).unwrap();

        let mut cmd = Command::cargo_bin("anomaly-tracker").unwrap();
        cmd.timeout(Duration::from_secs(5));
        cmd.arg("--data-path")
            .arg(dir.path())
            .arg("config")
            .arg("set")
            .arg("platform")
            .arg("XB1");

        let output = cmd.output().unwrap();

        let mut perms = fs::metadata(dir.path()).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(dir.path(), perms).unwrap();

        let config_path = dir.path().join("config.toml");
        if output.status.success() {
            // Permission bits are not enforced for root
            let config = fs::read_to_string(&config_path).unwrap();
            assert!(config.contains("platform = \"XB1\""));
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            assert!(stderr.contains("Error:"), "stderr: {stderr}");
            assert!(!stderr.contains("panicked"));
            assert!(!config_path.exists());
        }
    }
}
