// Shared helpers for integration tests.
//
// Provides a sandboxed dotfiles root and home backed by temporary directories,
// a fluent builder for their contents, and an executor that records every
// external command instead of running it.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use dotfiles_bootstrap::commands::Host;
use dotfiles_bootstrap::exec::{ExecResult, Executor};
use dotfiles_bootstrap::logging::Logger;
use dotfiles_bootstrap::platform::{Os, Platform};

/// Records each command as one space-joined line and answers from prefix
/// rules; the longest matching prefix wins and unmatched commands succeed
/// with empty output.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    rules: Mutex<Vec<(String, VecDeque<(bool, String)>)>>,
    programs: Vec<(String, PathBuf)>,
    calls: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands starting with `prefix`. Queued answers for the same
    /// prefix are used in order; the last one sticks.
    pub fn respond(self, prefix: &str, success: bool, stdout: &str) -> Self {
        {
            let mut rules = self.rules.lock().expect("rules lock");
            let entry = (success, stdout.to_string());
            if let Some((_, queue)) = rules.iter_mut().find(|(p, _)| p == prefix) {
                queue.push_back(entry);
            } else {
                rules.push((prefix.to_string(), VecDeque::from([entry])));
            }
        }
        self
    }

    /// Report `program` as present on `PATH`.
    pub fn with_program(self, program: &str) -> Self {
        let path = Path::new("/usr/bin").join(program);
        self.with_program_at(program, &path.display().to_string())
    }

    /// Report `program` as present at `path`.
    pub fn with_program_at(mut self, program: &str, path: &str) -> Self {
        self.programs.push((program.to_string(), PathBuf::from(path)));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().expect("calls lock").clear();
    }

    fn record(&self, program: &str, args: &[&str]) -> (bool, String) {
        let line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().expect("calls lock").push(line.clone());
        let mut rules = self.rules.lock().expect("rules lock");
        rules
            .iter_mut()
            .filter(|(prefix, _)| line.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .and_then(|(_, queue)| {
                if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                }
            })
            .unwrap_or_else(|| (true, String::new()))
    }

    fn result(success: bool, stdout: String) -> ExecResult {
        ExecResult {
            stdout,
            stderr: String::new(),
            success,
            code: Some(i32::from(!success)),
        }
    }

    fn checked(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        let (success, stdout) = self.record(program, args);
        anyhow::ensure!(success, "{program} failed (exit 1)");
        Ok(Self::result(success, stdout))
    }
}

impl Executor for RecordingExecutor {
    fn run(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        self.checked(program, args)
    }

    fn run_in(&self, _: &Path, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        self.checked(program, args)
    }

    fn run_with_env(
        &self,
        program: &str,
        args: &[&str],
        _: &[(&str, &str)],
    ) -> anyhow::Result<ExecResult> {
        self.checked(program, args)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        let (success, stdout) = self.record(program, args);
        Ok(Self::result(success, stdout))
    }

    fn run_interactive(&self, _: Option<&Path>, program: &str, args: &[&str]) -> anyhow::Result<bool> {
        Ok(self.record(program, args).0)
    }

    fn resolve(&self, program: &str) -> Option<PathBuf> {
        self.programs
            .iter()
            .find(|(name, _)| name == program)
            .map(|(_, path)| path.clone())
    }
}

/// A dotfiles root and a home directory, both temporary.
pub struct Sandbox {
    pub root: tempfile::TempDir,
    pub home: tempfile::TempDir,
}

impl Sandbox {
    /// Root with a `conf/bootstrap.toml` that turns off every interactive
    /// step, and an empty home.
    pub fn new() -> Self {
        let sandbox = Self {
            root: tempfile::tempdir().expect("create root"),
            home: tempfile::tempdir().expect("create home"),
        };
        sandbox.write(
            "conf/bootstrap.toml",
            "[shell]\nchange = \"no\"\n\n[github]\nauth = false\n",
        )
    }

    /// Write `content` to `rel` under the root, creating parents.
    pub fn write(self, rel: &str, content: &str) -> Self {
        let path = self.root.path().join(rel);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("create parent");
        std::fs::write(&path, content).expect("write file");
        self
    }

    /// Write `install.conf.yaml`.
    pub fn links(self, yaml: &str) -> Self {
        self.write("install.conf.yaml", yaml)
    }

    /// Write the apt package list.
    pub fn apt_packages(self, names: &[&str]) -> Self {
        let mut list = names.join("\n");
        list.push('\n');
        self.write("packages/apt.txt", &list)
    }

    pub fn root_path(&self) -> PathBuf {
        dunce::canonicalize(self.root.path()).expect("canonical root")
    }

    pub fn home_path(&self) -> &Path {
        self.home.path()
    }

    /// A Debian-like Linux host started from the root.
    pub fn host(&self, executor: Arc<RecordingExecutor>) -> Host {
        let vars = HashMap::from([
            ("HOME".to_string(), self.home_path().display().to_string()),
            ("SHELL".to_string(), "/bin/bash".to_string()),
            ("PATH".to_string(), "/usr/bin:/bin".to_string()),
        ]);
        Host {
            platform: Platform::new(Os::Linux, true),
            executor,
            vars,
            exe: None,
            cwd: self.root.path().to_path_buf(),
        }
    }
}

pub fn logger(command: &str) -> Arc<Logger> {
    Arc::new(Logger::new(command))
}
