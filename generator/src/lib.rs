//! Job script generation for cluster-parallel workflows.
//!
//! A [`JobScriptConfig`] describes one job: its name, memory and core request and
//! how many array tasks to spawn. [`generate`] turns it into a Slurm or SGE script,
//! prints it and optionally persists it as `<name>.sh`.

pub mod config;
pub mod schedulers;
pub mod script;
pub mod sinks;

pub use config::{ConfigError, JobScriptConfig, MailPolicy, SchedulerKind};
pub use script::render;
pub use sinks::{FsStore, MemoryStore, ScriptStore, Sinks};

use std::{io, path::PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, instrument};

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Invalid job config: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to persist job script: {0}")]
    Io(#[from] io::Error),
}

/// Outcome of a successful [`generate`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptResult {
    pub text: String,
    // set when the script was persisted
    pub path: Option<PathBuf>,
}

/// Render `config` and emit it through `sinks`.
///
/// Validation happens before anything is emitted. Printing and persisting are
/// independent: the text is printed first, so a failed persist still leaves the
/// printed script, and the store never leaves a partial file behind. The log
/// directory is created after the script was persisted, never before.
#[instrument(skip_all, fields(name = %config.name, tasks = config.task_count))]
pub fn generate(
    config: &JobScriptConfig,
    sinks: &mut Sinks<'_>,
) -> Result<ScriptResult, GenerateError> {
    let text = render(config)?;

    let printed = match sinks.console.as_mut() {
        Some(console) => console
            .write_all(text.as_bytes())
            .and_then(|()| console.flush()),
        None => Ok(()),
    };

    let path = if config.create_shell {
        Some(persist(config, &text, sinks.store)?)
    } else {
        None
    };

    // a broken console is only reported once the file side is settled
    if let Err(e) = printed {
        error!("Failed to print job script: {e}");
        return Err(e.into());
    }

    debug!(bytes = text.len(), persisted = path.is_some(), "Generated job script");

    Ok(ScriptResult { text, path })
}

fn persist(
    config: &JobScriptConfig,
    text: &str,
    store: &dyn ScriptStore,
) -> Result<PathBuf, io::Error> {
    let path = store
        .persist(&config.script_file_name(), text)
        .map_err(|e| {
            error!(file = ?config.script_file_name(), "Failed to write job script: {e}");
            e
        })?;
    info!(path = ?path, "Wrote job script");

    // only once the script exists, a failed write leaves no stray log directory
    if config.create_logdir {
        store.ensure_dir(&config.log_dir).map_err(|e| {
            error!(dir = ?config.log_dir, "Failed to create log directory: {e}");
            e
        })?;
    }

    Ok(path)
}
