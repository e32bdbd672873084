use clap::Parser;
use parjobs::{
    generate, ConfigError, FsStore, GenerateError, JobScriptConfig, MailPolicy, SchedulerKind,
    Sinks,
};
use std::{io, path::PathBuf, process::ExitCode};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

/// Generate Slurm or SGE job scripts for single and array jobs
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// YAML file with a base job config, flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Job name, also used for log files and `<name>.sh`
    #[arg(short, long)]
    name: Option<String>,

    /// Memory per task, passed verbatim (e.g. 20G)
    #[arg(short, long)]
    memory: Option<String>,

    /// Cores per task
    #[arg(short, long)]
    cores: Option<u32>,

    /// Number of array tasks, 1 for a plain job
    #[arg(short, long)]
    tasks: Option<u32>,

    #[arg(long, value_parser = parse_scheduler)]
    scheduler: Option<SchedulerKind>,

    #[arg(short, long)]
    partition: Option<String>,

    /// Wall clock limit (Slurm only)
    #[arg(long)]
    time: Option<String>,

    /// Mail policy: none, begin, end, fail or all
    #[arg(long, value_parser = parse_email)]
    email: Option<MailPolicy>,

    /// Maximum number of array tasks running at once
    #[arg(long)]
    task_limit: Option<u32>,

    /// Environment module to load, repeatable; replaces the configured list
    #[arg(long = "module")]
    modules: Vec<String>,

    /// Command the job runs
    #[arg(long)]
    command: Option<String>,

    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Send logs to the log directory and create it
    #[arg(long)]
    create_logdir: bool,

    /// Write the script to `<output-dir>/<name>.sh`
    #[arg(long)]
    create_shell: bool,

    /// Do not print the script
    #[arg(short, long)]
    quiet: bool,

    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

fn parse_scheduler(value: &str) -> Result<SchedulerKind, ConfigError> {
    value.parse()
}

fn parse_email(value: &str) -> Result<MailPolicy, ConfigError> {
    value.parse()
}

impl Cli {
    /// merge flags over the config file (or the defaults)
    fn job_config(&self) -> Result<JobScriptConfig, ConfigError> {
        let mut config = match self.config {
            Some(ref path) => JobScriptConfig::from_path(path)?,
            None => JobScriptConfig::default(),
        };

        if let Some(ref name) = self.name {
            config.name = name.clone();
        }
        if let Some(ref memory) = self.memory {
            config.memory = memory.clone();
        }
        if let Some(cores) = self.cores {
            config.cores = cores;
        }
        if let Some(tasks) = self.tasks {
            config.task_count = tasks;
        }
        if let Some(scheduler) = self.scheduler {
            config.scheduler = scheduler;
        }
        if let Some(ref partition) = self.partition {
            config.partition = partition.clone();
        }
        if let Some(ref time) = self.time {
            config.time_limit = time.clone();
        }
        if let Some(email) = self.email {
            config.email = email;
        }
        if let Some(task_limit) = self.task_limit {
            config.task_limit = task_limit;
        }
        if !self.modules.is_empty() {
            config.modules = self.modules.clone();
        }
        if let Some(ref command) = self.command {
            config.command = command.clone();
        }
        if let Some(ref log_dir) = self.log_dir {
            config.log_dir = log_dir.clone();
        }
        // flags can only switch these on, the file may already have them set
        config.create_logdir |= self.create_logdir;
        config.create_shell |= self.create_shell;

        Ok(config)
    }
}

fn main() -> ExitCode {
    // stdout carries the script, diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    debug!(?cli, "Parsed arguments");

    let config = match cli.job_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load job config: {e}");
            return ExitCode::from(1);
        }
    };

    let store = FsStore::new(&cli.output_dir);
    let mut stdout = io::stdout().lock();
    let mut sinks = if cli.quiet {
        Sinks::quiet(&store)
    } else {
        Sinks::new(Some(&mut stdout), &store)
    };

    match generate(&config, &mut sinks) {
        Ok(result) => {
            if let Some(path) = result.path {
                debug!(path = ?path, "Done");
            }
            ExitCode::SUCCESS
        }
        // already logged with context by the generator
        Err(GenerateError::Config(_)) => ExitCode::from(1),
        Err(GenerateError::Io(_)) => ExitCode::from(2),
    }
}
