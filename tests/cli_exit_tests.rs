use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const FAILED_LINE: &str = "Database initialization attempt failed";

fn launcher(workdir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_pdns-admin-init"));
    cmd.current_dir(workdir)
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .env("BOOTSTRAP_LOGLEVEL", "info")
        .env("BOOTSTRAP_BCRYPT_COST", "4")
        .env("BOOTSTRAP_RETRY__DELAY_SECS", "0");
    for var in [
        "ADMIN_USERNAME",
        "ADMIN_PASSWORD",
        "ADMIN_EMAIL",
        "ADMIN_FIRSTNAME",
        "ADMIN_LASTNAME",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn combined(output: &Output) -> String {
    format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

#[test]
fn missing_app_config_exits_with_status_one_and_no_attempts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = launcher(dir.path())
        .env("BOOTSTRAP_APP_CONFIG", dir.path().join("missing.toml"))
        .output()
        .expect("failed to run launcher");

    let logs = combined(&output);
    assert_eq!(output.status.code(), Some(1), "{logs}");
    assert!(logs.contains("Database initialization failed"), "{logs}");
    assert!(!logs.contains(FAILED_LINE), "{logs}");
}

#[test]
fn unreachable_database_exits_with_status_one_after_every_attempt() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app_config = dir.path().join("production_config.toml");
    fs::write(
        &app_config,
        format!(
            "database_url = \"sqlite://{}\"\nacquire_timeout_secs = 1\n",
            dir.path().join("not-mounted").join("pda.db").display()
        ),
    )
    .expect("write app config");

    let output = launcher(dir.path())
        .env("BOOTSTRAP_APP_CONFIG", &app_config)
        .env("BOOTSTRAP_RETRY__MAX_ATTEMPTS", "3")
        .output()
        .expect("failed to run launcher");

    let logs = combined(&output);
    assert_eq!(output.status.code(), Some(1), "{logs}");
    assert_eq!(logs.matches(FAILED_LINE).count(), 3, "{logs}");
    assert!(logs.contains("Giving up after 3 attempts"), "{logs}");
}

#[test]
fn healthy_database_exits_with_status_zero() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app_config = dir.path().join("production_config.toml");
    fs::write(
        &app_config,
        format!(
            "database_url = \"sqlite://{}\"\n",
            dir.path().join("pda.db").display()
        ),
    )
    .expect("write app config");

    let output = launcher(dir.path())
        .env("BOOTSTRAP_APP_CONFIG", &app_config)
        .output()
        .expect("failed to run launcher");

    let logs = combined(&output);
    assert_eq!(output.status.code(), Some(0), "{logs}");
    assert!(logs.contains("Database initialization completed successfully"), "{logs}");
    assert!(!logs.contains(FAILED_LINE), "{logs}");
}
