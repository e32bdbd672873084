use serde::{Deserialize, Serialize};
use std::{
    fmt, fs,
    path::{Component, Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;
use tracing::{debug, error};

/// Slurm truncates job names past this length, so longer names are rejected up front
pub const MAX_NAME_LEN: usize = 64;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Job name must not be empty")]
    EmptyName,
    #[error("Job name {0:?} may only contain alphanumerics, '_' and '-'")]
    UnsafeName(String),
    #[error("Job name is {0} characters long, the limit is {}", MAX_NAME_LEN)]
    NameTooLong(usize),
    #[error("At least one core per task is required")]
    ZeroCores,
    #[error("At least one task is required")]
    ZeroTasks,
    #[error("The array task limit must be at least 1")]
    ZeroTaskLimit,
    #[error("Memory request {0:?} must be non-empty and contain no whitespace")]
    InvalidMemory(String),
    #[error("Log directory {0:?} must be a relative path of plain names ([A-Za-z0-9_.-], no leading '.')")]
    InvalidLogDir(PathBuf),
    #[error("Partition {0:?} must be non-empty and contain no whitespace")]
    InvalidPartition(String),
    #[error("Time limit {0:?} must be non-empty and contain no whitespace")]
    InvalidTimeLimit(String),
    #[error("Module {0:?} must be non-empty and contain no whitespace or shell metacharacters")]
    InvalidModule(String),
    #[error("Scheduler not supported: {0}")]
    UnsupportedScheduler(String),
    #[error("Mail policy not supported: {0}")]
    UnsupportedEmail(String),
    #[error("Failed to parse job config")]
    Load(#[from] serde_yaml::Error),
    #[error("Failed to read job config")]
    ReadFile(#[from] std::io::Error),
}

/// Directive dialect of the target cluster
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerKind {
    #[default]
    Slurm,
    Sge,
}

impl FromStr for SchedulerKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "slurm" => Ok(Self::Slurm),
            "sge" => Ok(Self::Sge),
            other => Err(ConfigError::UnsupportedScheduler(other.to_string())),
        }
    }
}

impl fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slurm => write!(f, "slurm"),
            Self::Sge => write!(f, "sge"),
        }
    }
}

/// When the scheduler should send mail about the job
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MailPolicy {
    None,
    Begin,
    End,
    Fail,
    #[default]
    All,
}

impl FromStr for MailPolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "begin" => Ok(Self::Begin),
            "end" => Ok(Self::End),
            "fail" => Ok(Self::Fail),
            "all" => Ok(Self::All),
            other => Err(ConfigError::UnsupportedEmail(other.to_string())),
        }
    }
}

/// Everything needed to render one job script.
///
/// Built once per invocation, validated by [`JobScriptConfig::validate`] and never
/// mutated afterwards. Loadable from YAML, where every field except `name` has a
/// default.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct JobScriptConfig {
    pub name: String,
    // passed verbatim to the scheduler, e.g. `20G`
    pub memory: String,
    pub cores: u32,
    #[serde(alias = "tasks")]
    pub task_count: u32,
    pub create_logdir: bool,
    pub create_shell: bool,

    pub scheduler: SchedulerKind,
    pub partition: String,
    // slurm only, SGE clusters usually enforce limits per queue
    pub time_limit: String,
    pub email: MailPolicy,
    // max concurrently running array tasks
    pub task_limit: u32,
    pub modules: Vec<String>,
    pub command: String,
    pub log_dir: PathBuf,
}

impl Default for JobScriptConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            memory: "10G".to_string(),
            cores: 1,
            task_count: 1,
            create_logdir: false,
            create_shell: false,
            scheduler: SchedulerKind::default(),
            partition: "shared".to_string(),
            time_limit: "1-00:00:00".to_string(),
            email: MailPolicy::default(),
            task_limit: 20,
            modules: vec!["conda_R".to_string()],
            command: default_command(),
            log_dir: PathBuf::from("logs"),
        }
    }
}

fn default_command() -> String {
    "Rscript -e \"options(width = 120); sessioninfo::session_info()\"".to_string()
}

impl JobScriptConfig {
    pub fn new(
        name: impl Into<String>,
        memory: impl Into<String>,
        cores: u32,
        task_count: u32,
    ) -> Self {
        Self {
            name: name.into(),
            memory: memory.into(),
            cores,
            task_count,
            ..Self::default()
        }
    }

    pub fn with_create_logdir(mut self, create_logdir: bool) -> Self {
        self.create_logdir = create_logdir;
        self
    }

    pub fn with_create_shell(mut self, create_shell: bool) -> Self {
        self.create_shell = create_shell;
        self
    }

    pub fn with_scheduler(mut self, scheduler: SchedulerKind) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// load a config from a YAML file, missing fields fall back to their defaults
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            error!(path = ?path, "Failed to read job config: {e}");
            e
        })?;
        debug!(path = ?path, "Loaded job config");

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn is_array(&self) -> bool {
        self.task_count > 1
    }

    /// file name the script is persisted under
    pub fn script_file_name(&self) -> PathBuf {
        PathBuf::from(format!("{}.sh", self.name))
    }

    /// Check all invariants, reporting the first violation.
    ///
    /// Nothing is printed or written by the generator until this passed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let result = self.check();

        if let Err(ref e) = result {
            error!(name = %self.name, "Invalid job config: {e}");
        }

        result
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::EmptyName);
        }

        if !self.name.chars().all(is_safe_name_char) {
            return Err(ConfigError::UnsafeName(self.name.clone()));
        }

        let name_len = self.name.chars().count();
        if name_len > MAX_NAME_LEN {
            return Err(ConfigError::NameTooLong(name_len));
        }

        if self.cores == 0 {
            return Err(ConfigError::ZeroCores);
        }

        if self.task_count == 0 {
            return Err(ConfigError::ZeroTasks);
        }

        if self.task_limit == 0 {
            return Err(ConfigError::ZeroTaskLimit);
        }

        if !is_directive_value(&self.memory) {
            return Err(ConfigError::InvalidMemory(self.memory.clone()));
        }

        if !is_directive_value(&self.partition) {
            return Err(ConfigError::InvalidPartition(self.partition.clone()));
        }

        if !is_directive_value(&self.time_limit) {
            return Err(ConfigError::InvalidTimeLimit(self.time_limit.clone()));
        }

        // module names end up as shell words
        if let Some(module) = self.modules.iter().find(|module| {
            !is_directive_value(module)
                || module.chars().any(|c| SHELL_METACHARACTERS.contains(&c))
        }) {
            return Err(ConfigError::InvalidModule(module.clone()));
        }

        if self.create_logdir && !is_safe_log_dir(&self.log_dir) {
            return Err(ConfigError::InvalidLogDir(self.log_dir.clone()));
        }

        Ok(())
    }
}

fn is_safe_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

const SHELL_METACHARACTERS: [char; 12] = [
    ';', '&', '|', '$', '`', '<', '>', '(', ')', '\\', '"', '\'',
];

/// values spliced into a single directive line
fn is_directive_value(value: &str) -> bool {
    !value.is_empty() && !value.chars().any(|c| c.is_whitespace() || c.is_control())
}

// the directory lands unquoted in `-o`/`-e` and in `mkdir -p`, so every component
// has to be a plain name: no scheduler patterns (`%`), no shell syntax, no dotfiles
fn is_safe_log_dir(path: &Path) -> bool {
    let mut has_name = false;

    let all_plain = path.components().all(|component| match component {
        Component::CurDir => true,
        Component::Normal(part) => {
            has_name = true;
            part.to_str().map_or(false, |part| {
                !part.starts_with('.') && part.chars().all(|c| is_safe_name_char(c) || c == '.')
            })
        }
        _ => false,
    });

    all_plain && has_name
}

#[cfg(test)]
mod config_test;
