// End-of-scenario handling: save logs, then decompose unless told not to

use crate::composition::Composition;
use crate::config::{LogPolicy, LogsConfig};
use crate::context::{ScenarioContext, DO_NOT_DECOMPOSE_TAG};
use crate::docker::logs::LogCollector;
use crate::errors::Result;
use std::path::PathBuf;
use tracing::info;

/// What `after_scenario` did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TeardownReport {
    pub log_files: Vec<PathBuf>,
    pub decomposed: bool,
}

/// Run after every scenario.
///
/// Logs are saved when the policy is `force`, or `on_failure` and the
/// scenario failed. A scenario tagged `doNotDecompose` leaves its containers
/// running.
pub fn after_scenario(
    ctx: &ScenarioContext,
    composition: Option<&mut Composition>,
    logs: &LogsConfig,
) -> Result<TeardownReport> {
    let mut report = TeardownReport::default();

    let Some(composition) = composition else {
        return Ok(report);
    };

    let save_logs = match logs.policy {
        LogPolicy::Force => true,
        LogPolicy::OnFailure => ctx.failed(),
        LogPolicy::Never => false,
    };

    if save_logs {
        info!(scenario = %ctx.name(), "saving container logs");
        let collector = LogCollector::new(
            composition.runner(),
            composition.docker_program(),
            &logs.dir,
            ctx.name(),
        );
        let names: Vec<String> = composition
            .containers()
            .iter()
            .map(|container| container.name().to_string())
            .collect();
        report.log_files.extend(collector.collect(&names)?);
        report
            .log_files
            .extend(collector.collect_siblings(&logs.sibling_filter)?);
    }

    if ctx.has_tag(DO_NOT_DECOMPOSE_TAG) {
        info!(
            scenario = %ctx.name(),
            project = %composition.project_name(),
            "not decomposing after scenario"
        );
    } else {
        composition.decompose(ctx)?;
        report.decomposed = true;
    }

    Ok(report)
}
