//! Assembly of a complete job script.
//!
//! A script is made of, in order:
//! 1. shebang and scheduler directives
//! 2. a preamble printing run time information (evaluated on the node, not here)
//! 3. optional log directory setup
//! 4. module loads and the job command
//! 5. a trailer recording the generator version
//!
//! Rendering is pure: the same config always yields the same text.

use crate::{
    config::{ConfigError, JobScriptConfig},
    schedulers::Schedulers,
};
use itertools::Itertools;
use tracing::debug;

pub const SHEBANG: &str = "#!/bin/bash";

/// Validate `config` and render it into script text
pub fn render(config: &JobScriptConfig) -> Result<String, ConfigError> {
    config.validate()?;

    let scheduler = Schedulers::load(config.scheduler);
    let log_path = log_path(config, &scheduler);
    debug!(scheduler = %config.scheduler, log_path = %log_path, "Rendering job script");

    let sections = [
        directive_section(config, &scheduler, &log_path),
        preamble_section(config, &scheduler),
        logdir_section(config),
        body_section(config, &scheduler),
        trailer_section(),
    ];

    let mut text = sections
        .into_iter()
        .filter(|section| !section.is_empty())
        .map(|section| section.join("\n"))
        .join("\n\n");
    text.push('\n');

    Ok(text)
}

/// Path both stdout and stderr of the job are sent to.
///
/// Array tasks get the scheduler's task placeholder so that they never share a file.
pub fn log_path(config: &JobScriptConfig, scheduler: &Schedulers) -> String {
    let file_name = if config.is_array() {
        format!("{}.{}.txt", config.name, scheduler.log_placeholder())
    } else {
        format!("{}.txt", config.name)
    };

    if config.create_logdir {
        format!("{}/{file_name}", config.log_dir.display())
    } else {
        file_name
    }
}

fn directive_section(
    config: &JobScriptConfig,
    scheduler: &Schedulers,
    log_path: &str,
) -> Vec<String> {
    let mut lines = vec![SHEBANG.to_string()];
    lines.extend(scheduler.directive_block(config, log_path));
    lines
}

fn preamble_section(config: &JobScriptConfig, scheduler: &Schedulers) -> Vec<String> {
    let mut lines = vec![
        "set -e".to_string(),
        String::new(),
        "echo \"**** Job starts ****\"".to_string(),
        "date".to_string(),
        String::new(),
        "echo \"**** Cluster info ****\"".to_string(),
        "echo \"User: ${USER}\"".to_string(),
        format!("echo \"Job id: ${{{}}}\"", scheduler.job_id_var()),
        format!("echo \"Job name: ${{{}}}\"", scheduler.job_name_var()),
        "echo \"Node name: ${HOSTNAME}\"".to_string(),
        "echo \"Working directory: ${PWD}\"".to_string(),
    ];

    if config.is_array() {
        lines.push(format!("echo \"Task id: ${{{}}}\"", scheduler.task_id_var()));
    }

    lines
}

fn logdir_section(config: &JobScriptConfig) -> Vec<String> {
    if !config.create_logdir {
        return Vec::new();
    }

    vec![
        "## Make sure the log directory exists".to_string(),
        format!("mkdir -p {}", config.log_dir.display()),
    ]
}

fn body_section(config: &JobScriptConfig, scheduler: &Schedulers) -> Vec<String> {
    let mut lines = Vec::new();

    if !config.modules.is_empty() {
        lines.push("## Load the required modules".to_string());
        lines.extend(
            config
                .modules
                .iter()
                .map(|module| format!("module load {module}")),
        );
        lines.push(String::new());
        lines.push("## List current modules for reproducibility".to_string());
        lines.push("module list".to_string());
        lines.push(String::new());
    }

    if config.is_array() {
        lines.push(format!(
            "## Each task selects its unit of work through ${{{}}} (1-{})",
            scheduler.task_id_var(),
            config.task_count
        ));
    }

    lines.push("## Edit with your job command".to_string());
    lines.push(config.command.clone());
    lines.push(String::new());
    lines.push("echo \"**** Job ends ****\"".to_string());
    lines.push("date".to_string());

    lines
}

fn trailer_section() -> Vec<String> {
    vec![format!(
        "## This script was made using {} version {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )]
}
