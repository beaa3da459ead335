//! Common test utilities for CLI integration tests

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A scratch directory holding a manifest for the `gate` binary
pub struct CliTestContext {
    pub test_dir: TempDir,
    pub manifest: PathBuf,
}

impl CliTestContext {
    /// Create a context whose manifest has the given contents
    pub fn with_manifest(contents: &str) -> Result<Self> {
        let test_dir = TempDir::new()?;
        let manifest = test_dir.path().join("gate.yaml");
        std::fs::write(&manifest, contents)?;
        Ok(Self { test_dir, manifest })
    }

    /// Create a context without a manifest
    pub fn empty() -> Result<Self> {
        let test_dir = TempDir::new()?;
        let manifest = test_dir.path().join("gate.yaml");
        Ok(Self { test_dir, manifest })
    }

    /// Run `gate -c <manifest> <args>`
    pub fn run(&self, args: &[&str]) -> Result<CliOutput> {
        run_gate(&self.manifest, args)
    }
}

/// Run the gate binary against a manifest path
pub fn run_gate(manifest: &Path, args: &[&str]) -> Result<CliOutput> {
    let output = Command::new(env!("CARGO_BIN_EXE_gate"))
        .arg("-c")
        .arg(manifest)
        .args(args)
        .env_remove("RUST_LOG")
        .output()?;

    Ok(CliOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        success: output.status.success(),
        exit_code: output.status.code(),
    })
}

/// Captured output of one CLI invocation
pub struct CliOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: Option<i32>,
}

#[allow(dead_code)]
impl CliOutput {
    pub fn assert_success(&self) -> &Self {
        if !self.success {
            panic!(
                "Command failed with exit code {:?}\nSTDOUT:\n{}\nSTDERR:\n{}",
                self.exit_code, self.stdout, self.stderr
            );
        }
        self
    }

    pub fn assert_failure(&self) -> &Self {
        if self.success {
            panic!(
                "Command succeeded but was expected to fail\nSTDOUT:\n{}\nSTDERR:\n{}",
                self.stdout, self.stderr
            );
        }
        self
    }

    pub fn assert_contains(&self, text: &str) -> &Self {
        if !self.stdout.contains(text) && !self.stderr.contains(text) {
            panic!(
                "Output does not contain '{}'\nSTDOUT:\n{}\nSTDERR:\n{}",
                text, self.stdout, self.stderr
            );
        }
        self
    }

    pub fn assert_not_contains(&self, text: &str) -> &Self {
        if self.stdout.contains(text) || self.stderr.contains(text) {
            panic!(
                "Output contains '{}' but should not\nSTDOUT:\n{}\nSTDERR:\n{}",
                text, self.stdout, self.stderr
            );
        }
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        if !self.stdout.contains(text) {
            panic!(
                "STDOUT does not contain '{}'\nSTDOUT:\n{}",
                text, self.stdout
            );
        }
        self
    }

    /// Parse stdout as JSON
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout).unwrap_or_else(|e| {
            panic!("STDOUT is not JSON: {}\nSTDOUT:\n{}", e, self.stdout)
        })
    }
}
