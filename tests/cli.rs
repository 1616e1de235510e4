//! End-to-end scenarios driving the built binary against the scripted
//! `fixture` PUT, one process per scenario.

use std::io::Write as _;
use std::process::Command;

fn invigilate() -> Command {
    Command::new(env!("CARGO_BIN_EXE_invigilate"))
}

fn fixture_path() -> &'static str {
    env!("CARGO_BIN_EXE_fixture")
}

fn write_test_file(dir: &std::path::Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

#[test]
fn hello_passes() {
    let dir = tempfile::tempdir().unwrap();
    let test = write_test_file(
        &dir,
        "hello.test",
        "#>What is your name?\n#<Alice\n#>Hello, Alice\n",
    );

    let output = invigilate()
        .env("FIXTURE_PROMPT", "What is your name?\n")
        .arg(fixture_path())
        .arg("--")
        .arg(&test)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0), "{output:?}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("0 failed tests"), "{stderr}");
}

#[test]
fn mixed_directives_passes() {
    let dir = tempfile::tempdir().unwrap();
    let test = write_test_file(&dir, "mixed.test", "#>out1\n#!err1\n#>out2\n");

    let output = invigilate()
        .env("FIXTURE_STDOUT", "out1\nout2\n")
        .env("FIXTURE_STDERR", "err1\n")
        .env("FIXTURE_EXIT", "1")
        .arg(fixture_path())
        .arg("--")
        .arg(&test)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0), "{output:?}");
}

#[test]
fn baderror_reports_divergence() {
    let dir = tempfile::tempdir().unwrap();
    let test = write_test_file(&dir, "baderror.test", "#!Nonsense!\n");

    let output = invigilate()
        .env("FIXTURE_STDERR", "Blimey!\n")
        .env("FIXTURE_EXIT", "1")
        .arg(fixture_path())
        .arg("--")
        .arg(&test)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1), "{output:?}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("incorrect test error output\nexpected: Nonsense!\n  actual: Blimey!"),
        "{stderr}"
    );
    assert!(stderr.contains("1 failed tests"), "{stderr}");
}

#[test]
fn toolong_hits_deadline() {
    let dir = tempfile::tempdir().unwrap();
    let test = write_test_file(&dir, "toolong.test", "#>never arrives\n");

    let output = invigilate()
        .arg("-t")
        .arg("200ms")
        .env("FIXTURE_SLEEP_MS", "5000")
        .arg(fixture_path())
        .arg("--")
        .arg(&test)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1), "{output:?}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("time limit exceeded"), "{stderr}");
}

#[test]
fn extraoutput_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let test = write_test_file(&dir, "extra.test", "#>alpha\n");

    let output = invigilate()
        .env("FIXTURE_STDOUT", "alpha\nbeta\n")
        .arg(fixture_path())
        .arg("--")
        .arg(&test)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1), "{output:?}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("extra output: beta"), "{stderr}");
}

#[cfg(unix)]
#[test]
fn permission_denied_counts_as_other_error() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let test = write_test_file(&dir, "denied.test", "#>anything\n");
    std::fs::set_permissions(&test, std::fs::Permissions::from_mode(0o000)).unwrap();

    if std::fs::read(&test).is_ok() {
        // running as a user (e.g. root) that ignores permission bits
        std::fs::set_permissions(&test, std::fs::Permissions::from_mode(0o644)).unwrap();
        return;
    }

    let output = invigilate()
        .arg(fixture_path())
        .arg("--")
        .arg(&test)
        .output()
        .unwrap();

    let result = if output.status.code() == Some(1) {
        Ok(())
    } else {
        Err(())
    };
    // restore permissions so tempdir cleanup can remove the file
    std::fs::set_permissions(&test, std::fs::Permissions::from_mode(0o644)).unwrap();
    result.expect("expected exit code 1");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("1 other errors"), "{stderr}");
}

#[test]
fn help_flag_exits_zero() {
    let output = invigilate().arg("-h").output().unwrap();
    assert_eq!(output.status.code(), Some(0), "{output:?}");
}

#[test]
fn missing_separator_is_usage_error() {
    let output = invigilate().arg(fixture_path()).output().unwrap();
    assert_eq!(output.status.code(), Some(1), "{output:?}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing `--` separator"), "{stderr}");
}
