//! Command line behaviour of the `chuckbox` binary.

#![cfg(unix)]

mod common;

use assert_cmd::Command;
use common::Format;
use predicates::prelude::*;

fn chuckbox() -> Command {
    let mut cmd = Command::cargo_bin("chuckbox").unwrap();
    cmd.env_remove("RUST_LOG").env_remove("CHUCKBOX_PYTHON");
    cmd
}

#[test]
fn help_lists_pack() {
    chuckbox()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("pack"));
}

#[test]
fn no_subcommand_prints_help() {
    chuckbox()
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag() {
    chuckbox()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn missing_version_file_fails() {
    let dir = tempfile::tempdir().unwrap();

    chuckbox()
        .args(["pack", "myproj", "--path"])
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("VERSION"));
}

#[test]
fn zero_timeout_is_rejected() {
    let dir = tempfile::tempdir().unwrap();

    chuckbox()
        .args(["pack", "myproj", "--command-timeout", "0", "--path"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("timeout"));
}

#[test]
fn packs_project_from_find_links() {
    let root = tempfile::tempdir().unwrap();
    let links = root.path().join("links");
    let out = root.path().join("out");
    std::fs::create_dir_all(&links).unwrap();
    common::sdist(&links, "pkgA", "1.0", &[], Format::TarGz);
    let project = common::project(root.path(), &["pkgA"]);
    let python = common::python_stub(root.path());
    let logfile = root.path().join("run.log");

    chuckbox()
        .current_dir(&project)
        .args(["pack", "myproj", "--no-index", "-q"])
        .arg("--find-links")
        .arg(&links)
        .arg("--python")
        .arg(&python)
        .arg("--output-dir")
        .arg(&out)
        .arg("--logfile")
        .arg(&logfile)
        .assert()
        .success()
        .stdout(predicate::str::contains("myproj_1.0.0.tar.gz"));

    let archive = out.join("myproj_1.0.0.tar.gz");
    assert!(archive.is_file());
    assert!(
        common::tarball_entries(&archive)
            .contains(&"usr/share/myproj/lib/python/pkgA-1.0/__init__.py".to_string())
    );
    assert!(logfile.is_file());
}
