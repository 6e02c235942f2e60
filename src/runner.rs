// External command execution
// Every container-engine call goes through a CommandRunner so step code can be
// exercised without docker installed.

use crate::errors::{FixtureError, Result};
use std::collections::{HashMap, VecDeque};
use std::process::Command;
use std::sync::Mutex;
use tracing::debug;

/// Captured result of one external command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    /// Failed output with the given stderr and exit code
    pub fn failed(stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs external programs synchronously
pub trait CommandRunner: Send + Sync {
    /// Spawn `argv[0]` with the remaining arguments and wait for it.
    ///
    /// `env = Some(map)` replaces the child's environment with `map`;
    /// `None` inherits the current process environment.
    fn execute(
        &self,
        argv: &[String],
        env: Option<&HashMap<String, String>>,
    ) -> Result<CommandOutput>;

    /// Execute and, if `expect_success` is set, turn a non-zero exit into
    /// `FixtureError::CommandFailed`.
    fn run(
        &self,
        argv: &[String],
        expect_success: bool,
        env: Option<&HashMap<String, String>>,
    ) -> Result<CommandOutput> {
        let output = self.execute(argv, env)?;

        if expect_success && !output.success() {
            return Err(FixtureError::CommandFailed {
                command: argv.join(" "),
                stdout: output.stdout,
                stderr: output.stderr,
                exit_code: output.exit_code,
            });
        }

        Ok(output)
    }
}

fn split_argv(argv: &[String]) -> Result<(&String, &[String])> {
    argv.split_first()
        .ok_or_else(|| FixtureError::InvalidCommand("empty argument list".to_string()))
}

/// Runs commands with `std::process::Command`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn execute(
        &self,
        argv: &[String],
        env: Option<&HashMap<String, String>>,
    ) -> Result<CommandOutput> {
        let (program, args) = split_argv(argv)?;
        debug!(command = %argv.join(" "), "running external command");

        let mut command = Command::new(program);
        command.args(args);
        if let Some(env) = env {
            command.env_clear().envs(env);
        }

        let output = command.output()?;
        // Killed by a signal: no exit code
        let exit_code = output.status.code().unwrap_or(-1);

        debug!(exit_code, "external command finished");

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code,
        })
    }
}

/// A command seen by `ScriptedRunner`
#[derive(Debug, Clone)]
pub struct Invocation {
    pub argv: Vec<String>,
    pub env: Option<HashMap<String, String>>,
}

impl Invocation {
    pub fn command_line(&self) -> String {
        self.argv.join(" ")
    }

    /// True if `pattern` appears as a contiguous run of arguments
    pub fn matches(&self, pattern: &[String]) -> bool {
        contains_tokens(&self.argv, pattern)
    }
}

fn contains_tokens(argv: &[String], pattern: &[String]) -> bool {
    if pattern.is_empty() {
        return true;
    }
    argv.windows(pattern.len()).any(|window| window == pattern)
}

fn to_tokens(pattern: &[&str]) -> Vec<String> {
    pattern.iter().map(|s| s.to_string()).collect()
}

#[derive(Default)]
struct Script {
    once: VecDeque<(Vec<String>, CommandOutput)>,
    sticky: Vec<(Vec<String>, CommandOutput)>,
    invocations: Vec<Invocation>,
}

/// In-memory runner that answers from canned responses.
///
/// Responses are keyed by argument tokens that must appear contiguously in
/// the command line. One-shot responses are consumed first-in first-out;
/// after that the most recently registered sticky response wins. Anything
/// unmatched succeeds with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    script: Mutex<Script>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every matching command with `output`
    pub fn on(&self, pattern: &[&str], output: CommandOutput) -> &Self {
        self.lock().sticky.push((to_tokens(pattern), output));
        self
    }

    /// Answer the next matching command with `output`, then forget it
    pub fn once(&self, pattern: &[&str], output: CommandOutput) -> &Self {
        self.lock().once.push_back((to_tokens(pattern), output));
        self
    }

    /// All commands executed so far, in order
    pub fn invocations(&self) -> Vec<Invocation> {
        self.lock().invocations.clone()
    }

    /// Commands whose argv contains `pattern`
    pub fn invocations_matching(&self, pattern: &[&str]) -> Vec<Invocation> {
        let pattern = to_tokens(pattern);
        self.lock()
            .invocations
            .iter()
            .filter(|inv| inv.matches(&pattern))
            .cloned()
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        // A panicking test thread must not hide the recorded calls
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CommandRunner for ScriptedRunner {
    fn execute(
        &self,
        argv: &[String],
        env: Option<&HashMap<String, String>>,
    ) -> Result<CommandOutput> {
        split_argv(argv)?;
        let mut script = self.lock();

        script.invocations.push(Invocation {
            argv: argv.to_vec(),
            env: env.cloned(),
        });

        if let Some(pos) = script
            .once
            .iter()
            .position(|(pattern, _)| contains_tokens(argv, pattern))
        {
            if let Some((_, output)) = script.once.remove(pos) {
                return Ok(output);
            }
        }

        let output = script
            .sticky
            .iter()
            .rev()
            .find(|(pattern, _)| contains_tokens(argv, pattern))
            .map(|(_, output)| output.clone())
            .unwrap_or_default();

        Ok(output)
    }
}
