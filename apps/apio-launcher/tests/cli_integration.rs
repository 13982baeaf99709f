#![warn(clippy::pedantic)]

//! Integration tests for the apio launcher.
//!
//! These tests spawn the compiled `apio-launcher` binary and validate its
//! behavior through stdout, stderr, exit codes and the files it leaves in an
//! isolated `APIO_LAUNCHER_HOME`.
//!
//! ## Test Strategy
//!
//! 1. **Metadata**: help and version output
//! 2. **Projects**: `envs` listing and non-project errors
//! 3. **Provisioning**: `install` against a local mock release server,
//!    cache hits on the second run, HTTP and connection failures
//! 4. **Running apio**: argument forwarding, file paths, env flag and exit codes
//! 5. **Doctor**: health report on an empty home
//!
//! Provisioning tests serve a shell-script "apio" from a mock server and
//! only run on Unix hosts with a published bundle.

use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use std::process::Command;

const TAG: &str = "2025-12-07";

fn launcher(home: &std::path::Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("apio-launcher"));
    cmd.env("APIO_LAUNCHER_HOME", home)
        .env("APIO_LAUNCHER_RELEASE_REPO", "org/repo")
        .env("APIO_LAUNCHER_RELEASE_TAG", TAG)
        .env_remove("RUST_LOG");
    cmd
}

// ============================================================================
// Metadata
// ============================================================================

#[test]
fn help_shows_available_commands() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("apio-launcher"));
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("file"))
        .stdout(predicate::str::contains("envs"))
        .stdout(predicate::str::contains("doctor"))
        .stdout(predicate::str::contains("APIO_LAUNCHER_HOME"));
}

#[test]
fn version_command_shows_version() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("apio-launcher"));
    cmd.arg("version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "apio-launcher {}",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn verbose_version_shows_release() {
    let temp = assert_fs::TempDir::new().unwrap();

    launcher(temp.path())
        .args(["version", "-v"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Commit:"))
        .stdout(predicate::str::contains("Repository: org/repo"))
        .stdout(predicate::str::contains(format!("Tag:        {TAG}")));
}

#[test]
fn missing_subcommand_fails() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("apio-launcher"));

    cmd.assert().failure();
}

// ============================================================================
// Projects
// ============================================================================

#[test]
fn envs_lists_default_then_declared_envs() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("apio.ini")
        .write_str(
            "[apio]\ndefault-env = icezum\n\n[env:icezum]\nboard = icezum\n\n; [env:old]\n[env:alhambra-ii]\nboard = alhambra-ii\n",
        )
        .unwrap();

    launcher(temp.path())
        .arg("envs")
        .arg("--project-dir")
        .arg(temp.path())
        .assert()
        .success()
        .stdout("(default)\nicezum\nalhambra-ii\n");
}

#[test]
fn envs_outside_project_fails() {
    let temp = assert_fs::TempDir::new().unwrap();

    launcher(temp.path())
        .arg("envs")
        .arg("--project-dir")
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not an apio project"));
}

#[test]
fn run_with_unknown_env_fails_before_provisioning() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("apio.ini").write_str("[env:icezum]\n").unwrap();

    launcher(temp.path())
        .env("APIO_LAUNCHER_DIST_SERVER", "http://127.0.0.1:9")
        .args(["run", "--env", "nope", "--project-dir"])
        .arg(temp.path())
        .args(["--", "build"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown apio.ini env 'nope'"));

    temp.child("bin").assert(predicate::path::missing());
}

// ============================================================================
// Provisioning
// ============================================================================

#[cfg(all(unix, any(target_arch = "x86_64", target_arch = "aarch64")))]
mod provisioning {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use httpmock::prelude::*;

    const FAKE_APIO: &str = "#!/bin/sh\n\
[ \"$1\" = fail ] && exit 7\n\
echo \"apio-args: $*\"\n\
echo \"apio-cwd: $(pwd)\"\n";

    fn bundle() -> Vec<u8> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        let mut header = tar::Header::new_gnu();
        header.set_size(FAKE_APIO.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, "apio/apio", FAKE_APIO.as_bytes())
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap()
    }

    fn release_server() -> MockServer {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path_contains(format!("/org/repo/releases/download/{TAG}/apio-cli-"));
            then.status(200).body(bundle());
        });
        server
    }

    #[test]
    fn install_provisions_once() {
        let temp = assert_fs::TempDir::new().unwrap();
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path_contains(format!("/org/repo/releases/download/{TAG}/apio-cli-"));
            then.status(200).body(bundle());
        });

        launcher(temp.path())
            .env("APIO_LAUNCHER_DIST_SERVER", server.base_url())
            .arg("install")
            .assert()
            .success()
            .stdout(predicate::str::contains("Installing apio 2025-12-07"))
            .stdout(predicate::str::contains("bin/apio"));

        temp.child("bin/apio").assert(predicate::path::is_file());
        temp.child("bin/download-metadata.json")
            .assert(predicate::str::contains(format!("releases/download/{TAG}/")));
        temp.child("tmp/apio").assert(predicate::path::missing());

        launcher(temp.path())
            .env("APIO_LAUNCHER_DIST_SERVER", server.base_url())
            .arg("install")
            .assert()
            .success()
            .stdout(predicate::str::contains("apio is up to date."));

        mock.assert_hits(1);
    }

    #[test]
    fn file_passes_project_relative_path_and_env_flag() {
        let home = assert_fs::TempDir::new().unwrap();
        let project = assert_fs::TempDir::new().unwrap();
        project.child("apio.ini").write_str("[env:icezum]\n").unwrap();
        project.child("src/main_tb.v").write_str("module main_tb;\nendmodule\n").unwrap();
        let server = release_server();

        launcher(home.path())
            .env("APIO_LAUNCHER_DIST_SERVER", server.base_url())
            .args(["file", "sim", "src/main_tb.v", "--env", "icezum", "--project-dir"])
            .arg(project.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("apio-args: sim src/main_tb.v -e icezum"));
    }

    #[test]
    fn file_that_does_not_exist_fails_before_provisioning() {
        let home = assert_fs::TempDir::new().unwrap();
        let project = assert_fs::TempDir::new().unwrap();

        launcher(home.path())
            .env("APIO_LAUNCHER_DIST_SERVER", "http://127.0.0.1:9")
            .args(["file", "lint", "src/missing.v", "--project-dir"])
            .arg(project.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("File not found: src/missing.v"));

        home.child("bin").assert(predicate::path::missing());
    }

    #[test]
    fn run_forwards_args_and_env_flag() {
        let home = assert_fs::TempDir::new().unwrap();
        let project = assert_fs::TempDir::new().unwrap();
        project.child("apio.ini").write_str("[env:icezum]\n").unwrap();
        let server = release_server();

        launcher(home.path())
            .env("APIO_LAUNCHER_DIST_SERVER", server.base_url())
            .args(["run", "--env", "icezum", "--project-dir"])
            .arg(project.path())
            .args(["--", "build", "--verbose"])
            .assert()
            .success()
            .stdout(predicate::str::contains("apio-args: build --verbose -e icezum"));
    }

    #[test]
    fn run_propagates_apio_exit_code() {
        let home = assert_fs::TempDir::new().unwrap();
        let project = assert_fs::TempDir::new().unwrap();
        let server = release_server();

        launcher(home.path())
            .env("APIO_LAUNCHER_DIST_SERVER", server.base_url())
            .arg("run")
            .arg("--project-dir")
            .arg(project.path())
            .args(["--", "fail"])
            .assert()
            .code(7)
            .stderr(predicate::str::contains("Error").not());
    }

    #[test]
    fn missing_release_asset_reports_hint() {
        let temp = assert_fs::TempDir::new().unwrap();
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET);
            then.status(404);
        });

        launcher(temp.path())
            .env("APIO_LAUNCHER_DIST_SERVER", server.base_url())
            .arg("install")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No apio bundle"))
            .stderr(predicate::str::contains("apio binary installation failed"))
            .stderr(predicate::str::contains("HTTP error 404"));

        temp.child("bin").assert(predicate::path::missing());
    }

    #[test]
    fn redirected_download_is_followed() {
        let temp = assert_fs::TempDir::new().unwrap();
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path_contains(format!("/org/repo/releases/download/{TAG}/"));
            then.status(302).header("Location", "/cdn/bundle.tgz");
        });
        let cdn = server.mock(|when, then| {
            when.method(GET).path("/cdn/bundle.tgz");
            then.status(200).body(bundle());
        });

        launcher(temp.path())
            .env("APIO_LAUNCHER_DIST_SERVER", server.base_url())
            .arg("install")
            .assert()
            .success();

        cdn.assert_hits(1);
        temp.child("bin/apio").assert(predicate::path::is_file());
    }
}

#[test]
fn install_with_unreachable_server_fails_cleanly() {
    let temp = assert_fs::TempDir::new().unwrap();

    launcher(temp.path())
        .env("APIO_LAUNCHER_DIST_SERVER", "http://127.0.0.1:9")
        .arg("install")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"))
        .stderr(predicate::str::contains("panicked").not());

    temp.child("bin").assert(predicate::path::missing());
}

// ============================================================================
// Doctor
// ============================================================================

#[test]
fn doctor_runs_on_empty_home() {
    let temp = assert_fs::TempDir::new().unwrap();

    launcher(temp.path())
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("Checking apio installation"))
        .stdout(predicate::str::contains("Platform"));
}

#[cfg(all(unix, any(target_arch = "x86_64", target_arch = "aarch64")))]
#[test]
fn doctor_reports_missing_binary() {
    let temp = assert_fs::TempDir::new().unwrap();

    launcher(temp.path())
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("Apio binary: Not installed"))
        .stdout(predicate::str::contains("Install metadata: Missing"));
}
