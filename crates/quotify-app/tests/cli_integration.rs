//! Integration tests for the quotify CLI binary.
//!
//! Each test gets its own temp directory holding the config and the file store,
//! so state carries across invocations the way it would across app restarts.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

struct Env {
    dir: tempfile::TempDir,
}

impl Env {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = format!(
            "[storage]\nmode = \"file\"\npath = \"{}\"\n\n[auth]\nlogin_delay_ms = 0\n",
            dir.path().join("store.json").display()
        );
        std::fs::write(dir.path().join("config.toml"), config).unwrap();
        Self { dir }
    }

    fn store_path(&self) -> PathBuf {
        self.dir.path().join("store.json")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_quotify"));
        cmd.arg("--config").arg(self.dir.path().join("config.toml"));
        cmd
    }

    fn login(&self, username: &str, passphrase: &str) -> String {
        run(self
            .cmd()
            .arg("login")
            .arg("--username")
            .arg(username)
            .arg("--passphrase")
            .arg(passphrase))
    }

    fn status(&self) -> String {
        run(self.cmd().arg("status"))
    }

    /// Feed `script` to the interactive console and return its stdout.
    fn console(&self, script: &str) -> String {
        let mut child = self
            .cmd()
            .arg("run")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to spawn console");
        child
            .stdin
            .take()
            .unwrap()
            .write_all(script.as_bytes())
            .unwrap();
        let output = child.wait_with_output().unwrap();
        assert!(output.status.success(), "Console exited with {:?}", output.status);
        String::from_utf8_lossy(&output.stdout).to_string()
    }
}

fn run(cmd: &mut Command) -> String {
    let output = cmd.output().expect("Failed to execute command");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    if !output.status.success() {
        panic!(
            "Command failed with status {:?}\nstdout: {stdout}\nstderr: {stderr}",
            output.status
        );
    }
    stdout
}

fn store_contains(path: &Path, needle: &str) -> bool {
    std::fs::read_to_string(path)
        .map(|s| s.contains(needle))
        .unwrap_or(false)
}

#[test]
fn test_login_logout_round_trip() {
    let env = Env::new();
    assert!(env.status().contains("Logged out"));

    let out = env.login("alice", "longenough");
    assert!(out.contains("Welcome, alice"), "Got: {out}");
    assert!(env.status().contains("Logged in as alice"));

    // The store keeps a digest, never the passphrase.
    assert!(store_contains(&env.store_path(), "alice"));
    assert!(!store_contains(&env.store_path(), "longenough"));

    run(env.cmd().arg("logout"));
    assert!(env.status().contains("Logged out"));
    // Logout keeps the account record.
    assert!(store_contains(&env.store_path(), "alice"));

    let out = env.login("alice", "longenough");
    assert!(out.contains("Welcome, alice"), "Got: {out}");
}

#[test]
fn test_wrong_passphrase_is_rejected() {
    let env = Env::new();
    env.login("bob", "bobsecret");
    run(env.cmd().arg("logout"));

    let out = env.login("bob", "wrongpw");
    assert!(out.contains("Login failed. Please try again."), "Got: {out}");
    assert!(env.status().contains("Logged out"));
}

#[test]
fn test_short_passphrase_is_a_validation_error() {
    let env = Env::new();
    let out = env.login("bob", "short");
    assert!(out.contains("passphrase min 6 characters"), "Got: {out}");
    assert!(!env.store_path().exists());
}

#[test]
fn test_duress_passphrase_wipes_and_reads_as_failure() {
    let env = Env::new();
    env.login("alice", "longenough");
    run(env.cmd().arg("logout"));
    let failure = env.login("alice", "wrongpw");

    env.login("alice", "longenough");
    let duress = env.login("alice", "panic");
    assert_eq!(duress, failure);

    assert!(env.status().contains("Logged out"));
    assert!(!env.store_path().exists());

    // A wiped device enrolls whoever signs in next.
    let out = env.login("carol", "fresh-start");
    assert!(out.contains("Welcome, carol"), "Got: {out}");
}

#[test]
fn test_panic_command_wipes_session() {
    let env = Env::new();
    env.login("alice", "longenough");
    assert!(env.status().contains("Logged in as alice"));

    let out = run(env.cmd().arg("panic"));
    assert!(out.contains("Quotify"), "Got: {out}");
    assert!(env.status().contains("Logged out"));
    assert!(!env.store_path().exists());

    // Repeating is harmless.
    run(env.cmd().arg("panic"));
    assert!(env.status().contains("Logged out"));
}

#[test]
fn test_friends_require_session() {
    let env = Env::new();
    let out = run(env.cmd().arg("friends"));
    assert!(out.contains("Sign in"), "Got: {out}");

    env.login("alice", "longenough");
    let out = run(env.cmd().arg("friends"));
    assert!(out.contains("alex"), "Got: {out}");
    assert!(out.contains("taylor"), "Got: {out}");
}

#[test]
fn test_quote_prints_something() {
    let env = Env::new();
    let out = run(env.cmd().arg("quote"));
    assert!(out.contains(" - "), "Got: {out}");
}

#[test]
fn test_panic_recovers_from_corrupt_store() {
    let env = Env::new();
    std::fs::write(
        env.store_path(),
        "{\"quotify-user\": \"{\\\"username\\\": \\\"alice",
    )
    .unwrap();

    let out = run(env.cmd().arg("panic"));
    assert!(out.contains("Quotify"), "Got: {out}");
    assert!(!env.store_path().exists());
    assert!(env.status().contains("Logged out"));
}

#[test]
fn test_console_locks_out_after_three_failures() {
    let env = Env::new();
    let out = env.console(
        "login bob bobsecret\n\
         logout\n\
         login bob wrongpw\n\
         login bob wrongpw\n\
         login bob wrongpw\n\
         login bob bobsecret\n\
         status\n\
         quit\n",
    );
    assert_eq!(out.matches("Login failed. Please try again.").count(), 3, "Got: {out}");
    assert!(out.contains("Too many failed attempts. Try again in 4s"), "Got: {out}");
    assert!(out.contains("Logged out (locked for"), "Got: {out}");
    assert_eq!(out.matches("Welcome, bob").count(), 1, "Got: {out}");
}

#[test]
fn test_console_manages_friends_and_font_size() {
    let env = Env::new();
    let out = env.console(
        "login alice longenough\n\
         add jordan\n\
         remove 1\n\
         friends\n\
         font +\n\
         font +\n\
         font +\n\
         font +\n\
         font +\n\
         quit\n",
    );
    assert!(out.contains("Added jordan [4]"), "Got: {out}");
    assert!(out.contains("Removed friend 1"), "Got: {out}");
    assert!(!out.contains("[1] alex"), "Got: {out}");
    assert!(out.contains("Font size 18px"), "Got: {out}");
    assert!(out.contains("Font size 24px"), "Got: {out}");
    assert!(!out.contains("Font size 26px"), "Got: {out}");
}
