mod sge;
mod slurm;

use crate::config::{JobScriptConfig, SchedulerKind};

/// Scheduler specific parts of a job script
pub trait Dialect {
    /// comment prefix every directive line starts with
    fn prefix(&self) -> &'static str;

    /// placeholder the scheduler replaces with the array task index in log paths
    fn log_placeholder(&self) -> &'static str;

    /// environment variable holding the array task index at run time
    fn task_id_var(&self) -> &'static str;

    fn job_id_var(&self) -> &'static str;

    fn job_name_var(&self) -> &'static str;

    /// directive values in emission order, without prefix
    fn directives(&self, config: &JobScriptConfig, log_path: &str) -> Vec<String>;
}

#[derive(Clone, Copy, Debug)]
pub enum Schedulers {
    Slurm(slurm::Slurm),
    Sge(sge::Sge),
}

impl Schedulers {
    pub fn load(kind: SchedulerKind) -> Self {
        match kind {
            SchedulerKind::Slurm => Self::Slurm(slurm::Slurm),
            SchedulerKind::Sge => Self::Sge(sge::Sge),
        }
    }

    fn dialect(&self) -> &dyn Dialect {
        match self {
            Self::Slurm(slurm) => slurm,
            Self::Sge(sge) => sge,
        }
    }

    /// rendered directive lines, prefix included
    pub fn directive_block(&self, config: &JobScriptConfig, log_path: &str) -> Vec<String> {
        let dialect = self.dialect();

        dialect
            .directives(config, log_path)
            .into_iter()
            .map(|directive| format!("{} {directive}", dialect.prefix()))
            .collect()
    }

    pub fn log_placeholder(&self) -> &'static str {
        self.dialect().log_placeholder()
    }

    pub fn task_id_var(&self) -> &'static str {
        self.dialect().task_id_var()
    }

    pub fn job_id_var(&self) -> &'static str {
        self.dialect().job_id_var()
    }

    pub fn job_name_var(&self) -> &'static str {
        self.dialect().job_name_var()
    }
}
