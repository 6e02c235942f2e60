// Saving container logs to disk after a scenario

use crate::errors::Result;
use crate::runner::CommandRunner;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Writes `docker logs` output for containers into a directory
pub struct LogCollector<'a> {
    runner: &'a dyn CommandRunner,
    docker: &'a str,
    dir: &'a Path,
    file_suffix: String,
}

impl<'a> LogCollector<'a> {
    pub fn new(runner: &'a dyn CommandRunner, docker: &'a str, dir: &'a Path, scenario: &str) -> Self {
        Self {
            runner,
            docker,
            dir,
            file_suffix: log_file_suffix(scenario),
        }
    }

    /// Save logs for each named container as `<name>_<scenario>.log`.
    /// Containers whose logs cannot be read are skipped with a warning.
    pub fn collect(&self, container_names: &[String]) -> Result<Vec<PathBuf>> {
        let entries: Vec<(String, String)> = container_names
            .iter()
            .map(|name| (name.clone(), name.clone()))
            .collect();
        self.collect_entries(&entries)
    }

    /// Save logs for containers whose names match `filter` (containers started
    /// outside the compose files). The trailing `-<suffix>` of each name is
    /// dropped from the file name.
    pub fn collect_siblings(&self, filter: &str) -> Result<Vec<PathBuf>> {
        let argv = vec![
            self.docker.to_string(),
            "ps".to_string(),
            "-f".to_string(),
            format!("name={}", filter),
            "--format".to_string(),
            "{{.Names}}".to_string(),
        ];
        let output = self.runner.run(&argv, true, None)?;

        let entries: Vec<(String, String)> = output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|name| (name.to_string(), sibling_file_stem(name).to_string()))
            .collect();

        self.collect_entries(&entries)
    }

    fn collect_entries(&self, entries: &[(String, String)]) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(self.dir)?;
        let mut written = Vec::new();

        for (container, stem) in entries {
            let argv = vec![
                self.docker.to_string(),
                "logs".to_string(),
                container.clone(),
            ];

            let output = match self.runner.run(&argv, false, None) {
                Ok(output) => output,
                Err(e) => {
                    warn!(container = %container, error = %e, "cannot get container logs");
                    continue;
                }
            };

            if !output.success() {
                warn!(
                    container = %container,
                    exit_code = output.exit_code,
                    "cannot get container logs"
                );
                continue;
            }

            let path = self.dir.join(format!("{}{}", stem, self.file_suffix));
            // docker logs splits the container's own stdout/stderr across both streams
            fs::write(&path, format!("{}{}", output.stdout, output.stderr))?;
            written.push(path);
        }

        Ok(written)
    }
}

/// `_<scenario name with spaces as underscores>.log`
pub fn log_file_suffix(scenario: &str) -> String {
    format!("_{}.log", scenario.replace(' ', "_"))
}

/// `dev-peer0-mycc-1.0-3f9a` -> `dev-peer0-mycc-1.0`
fn sibling_file_stem(name: &str) -> &str {
    match name.rsplit_once('-') {
        Some((stem, _)) => stem,
        None => name,
    }
}
