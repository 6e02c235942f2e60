// Orchestration CLI selection and compose-file argument handling

use crate::config::ProgramSetting;
use crate::runner::CommandRunner;
use std::path::{Path, PathBuf};

/// File name looked up inside a directory given as a compose spec
pub const DEFAULT_COMPOSE_FILE: &str = "docker-compose.yml";

/// Docker Compose command variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeProgram {
    /// Legacy docker-compose (with hyphen)
    Hyphenated,
    /// Modern docker compose, a subcommand of the given docker binary
    Subcommand { docker: String },
}

impl ComposeProgram {
    /// Pick the variant named by config, probing the engine for `Auto`
    pub fn from_setting(setting: ProgramSetting, docker: &str, runner: &dyn CommandRunner) -> Self {
        match setting {
            ProgramSetting::DockerCompose => ComposeProgram::Hyphenated,
            ProgramSetting::DockerComposePlugin => ComposeProgram::Subcommand {
                docker: docker.to_string(),
            },
            ProgramSetting::Auto => Self::detect(runner, docker),
        }
    }

    /// Detect which docker-compose variant is available
    pub fn detect(runner: &dyn CommandRunner, docker: &str) -> Self {
        // Try modern "docker compose" first
        let argv = vec![
            docker.to_string(),
            "compose".to_string(),
            "version".to_string(),
        ];
        let modern = runner
            .run(&argv, false, None)
            .map(|output| output.success())
            .unwrap_or(false);

        if modern {
            return ComposeProgram::Subcommand {
                docker: docker.to_string(),
            };
        }

        ComposeProgram::Hyphenated
    }

    /// Program plus the leading arguments every compose call starts with
    pub fn base_argv(&self) -> Vec<String> {
        match self {
            ComposeProgram::Hyphenated => vec!["docker-compose".to_string()],
            ComposeProgram::Subcommand { docker } => vec![docker.clone(), "compose".to_string()],
        }
    }
}

/// Rewrite directory specs to `<dir>/docker-compose.yml`; files pass through
pub fn resolve_compose_files<P: AsRef<Path>>(specs: &[P]) -> Vec<PathBuf> {
    specs
        .iter()
        .map(|spec| {
            let spec = spec.as_ref();
            if spec.is_dir() {
                spec.join(DEFAULT_COMPOSE_FILE)
            } else {
                spec.to_path_buf()
            }
        })
        .collect()
}

/// Split a whitespace separated list of compose specs
pub fn split_compose_specs(specs: &str) -> Vec<PathBuf> {
    specs.split_whitespace().map(PathBuf::from).collect()
}

/// `-f <file>` for each compose file, in order
pub fn file_args(files: &[PathBuf]) -> Vec<String> {
    files
        .iter()
        .flat_map(|file| ["-f".to_string(), file.to_string_lossy().to_string()])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{CommandOutput, ScriptedRunner};
    use tempfile::TempDir;

    #[test]
    fn test_directory_spec_rewritten() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("docker-compose-peers.yml");
        std::fs::write(&file, "services: {}\n").unwrap();

        let resolved = resolve_compose_files(&[temp_dir.path().to_path_buf(), file.clone()]);
        assert_eq!(
            resolved,
            vec![temp_dir.path().join("docker-compose.yml"), file]
        );
    }

    #[test]
    fn test_missing_path_passes_through() {
        let resolved = resolve_compose_files(&["does/not/exist.yml"]);
        assert_eq!(resolved, vec![PathBuf::from("does/not/exist.yml")]);
    }

    #[test]
    fn test_split_and_file_args() {
        let files = split_compose_specs("  a.yml\tb.yml\n");
        assert_eq!(
            file_args(&files),
            vec!["-f", "a.yml", "-f", "b.yml"]
        );
    }

    #[test]
    fn test_base_argv() {
        assert_eq!(ComposeProgram::Hyphenated.base_argv(), vec!["docker-compose"]);
        let plugin = ComposeProgram::Subcommand {
            docker: "podman".to_string(),
        };
        assert_eq!(plugin.base_argv(), vec!["podman", "compose"]);
    }

    #[test]
    fn test_detect_prefers_plugin() {
        let runner = ScriptedRunner::new();
        runner.on(&["compose", "version"], CommandOutput::ok("v2.24.0"));
        assert_eq!(
            ComposeProgram::detect(&runner, "docker"),
            ComposeProgram::Subcommand {
                docker: "docker".to_string()
            }
        );
    }

    #[test]
    fn test_detect_falls_back_to_hyphenated() {
        let runner = ScriptedRunner::new();
        runner.on(
            &["compose", "version"],
            CommandOutput::failed("unknown command", 1),
        );
        assert_eq!(
            ComposeProgram::detect(&runner, "docker"),
            ComposeProgram::Hyphenated
        );
    }

    #[test]
    fn test_from_setting_does_not_probe_when_explicit() {
        let runner = ScriptedRunner::new();
        let program = ComposeProgram::from_setting(ProgramSetting::DockerCompose, "docker", &runner);
        assert_eq!(program, ComposeProgram::Hyphenated);
        assert!(runner.invocations().is_empty());
    }
}
