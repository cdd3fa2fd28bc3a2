//! End-to-end tests for the gitbridge binary.
//!
//! Every test runs with its own HOME, config and secrets locations so the
//! user's real configuration is never read or written.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Isolated environment for one test.
struct Env {
    dir: TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn sandbox(&self) -> std::path::PathBuf {
        self.path().join("sandbox")
    }

    /// The binary with an isolated environment and no sandbox selected.
    fn bare_cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("gitbridge").unwrap();
        cmd.env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join("config"))
            .env("XDG_DATA_HOME", self.path().join("data"))
            .env("GITBRIDGE_SECRETS", self.path().join("secrets.toml"))
            .env_remove("GITBRIDGE_CONFIG")
            .env_remove("GITBRIDGE_TOKEN")
            .env_remove("GITBRIDGE_LOG");
        cmd
    }

    /// The binary against this test's persistent sandbox.
    fn cmd(&self) -> Command {
        let mut cmd = self.bare_cmd();
        cmd.arg("--sandbox").arg(self.sandbox());
        cmd
    }
}

fn json_stdout(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

mod basics {
    use super::*;

    #[test]
    fn help_lists_commands() {
        let env = Env::new();
        env.bare_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("clone"))
            .stdout(predicate::str::contains("status"))
            .stdout(predicate::str::contains("auth"));
    }

    #[test]
    fn completion_script() {
        let env = Env::new();
        env.bare_cmd()
            .args(["completion", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("gitbridge"));
    }

    #[test]
    fn status_without_repository_fails() {
        let env = Env::new();
        env.cmd()
            .arg("status")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error:"));
    }
}

mod repository {
    use super::*;

    #[test]
    fn init_then_status_and_log() {
        let env = Env::new();
        env.cmd()
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("Initialized repository at /repo on main"));

        env.cmd()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("nothing to commit, working tree clean"));

        let output = env.cmd().args(["log", "--json"]).output().unwrap();
        assert!(output.status.success());
        let log = json_stdout(&output);
        assert_eq!(log.as_array().map(Vec::len), Some(1));
        assert_eq!(log[0]["message"], "Initial commit");
        assert_eq!(log[0]["author"]["name"], "gitbridge");
    }

    #[test]
    fn commit_with_explicit_author() {
        let env = Env::new();
        env.cmd().args(["init", "--no-commit"]).assert().success();
        std::fs::write(env.sandbox().join("repo/notes.txt"), "n\n").unwrap();

        env.cmd().args(["add", "notes.txt"]).assert().success();
        env.cmd()
            .args([
                "commit",
                "-m",
                "Add notes",
                "--author-name",
                "Ada",
                "--author-email",
                "ada@example.com",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Add notes"));

        let output = env.cmd().args(["log", "-n", "1", "--json"]).output().unwrap();
        assert_eq!(json_stdout(&output)[0]["author"]["email"], "ada@example.com");
    }

    #[test]
    fn host_directory_round_trip() {
        let env = Env::new();
        let host = env.path().join("project");
        std::fs::create_dir_all(host.join("node_modules/dep")).unwrap();
        std::fs::write(host.join("guide.md"), "# guide\n").unwrap();
        std::fs::write(host.join("main.rs"), "fn main() {}\n").unwrap();
        std::fs::write(host.join("node_modules/dep/readme.md"), "noise").unwrap();

        env.bare_cmd()
            .arg("--host")
            .arg(&host)
            .arg("init")
            .assert()
            .success();
        assert!(host.join(".git/HEAD").is_file());
        assert!(host.join("README.md").is_file());

        let output = env
            .bare_cmd()
            .arg("--host")
            .arg(&host)
            .args(["files", "md", "--json"])
            .output()
            .unwrap();
        assert!(output.status.success());
        assert_eq!(
            json_stdout(&output),
            serde_json::json!(["README.md", "guide.md"])
        );

        let output = env
            .bare_cmd()
            .arg("--host")
            .arg(&host)
            .args(["log", "--json"])
            .output()
            .unwrap();
        assert_eq!(json_stdout(&output)[0]["message"], "Initial commit");
    }
}

mod auth {
    use super::*;

    #[test]
    fn store_check_and_remove() {
        let env = Env::new();
        env.bare_cmd()
            .args([
                "auth",
                "--remote",
                "github.com",
                "--username",
                "me",
                "--token",
                "ghp_supersecret",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("ghp_supersecret").not());

        let output = env
            .bare_cmd()
            .args(["auth", "--remote", "https://github.com/me/app.git", "--status", "--json"])
            .output()
            .unwrap();
        let status = json_stdout(&output);
        assert_eq!(status["authenticated"], true);
        assert_eq!(status["username"], "me");
        assert!(!String::from_utf8_lossy(&output.stdout).contains("ghp_supersecret"));

        env.bare_cmd()
            .args(["auth", "--remote", "github.com", "--logout"])
            .assert()
            .success();
        let output = env
            .bare_cmd()
            .args(["auth", "--remote", "github.com", "--status", "--json"])
            .output()
            .unwrap();
        assert_eq!(json_stdout(&output)["authenticated"], false);
    }

    #[test]
    fn missing_token_is_an_error_without_terminal() {
        let env = Env::new();
        env.bare_cmd()
            .args(["auth", "--remote", "github.com"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Token required"));
    }
}
