use super::Dialect;
use crate::config::{JobScriptConfig, MailPolicy};

/// `#SBATCH` directives as understood by sbatch
#[derive(Clone, Copy, Debug)]
pub struct Slurm;

impl Dialect for Slurm {
    fn prefix(&self) -> &'static str {
        "#SBATCH"
    }

    fn log_placeholder(&self) -> &'static str {
        "%a"
    }

    fn task_id_var(&self) -> &'static str {
        "SLURM_ARRAY_TASK_ID"
    }

    fn job_id_var(&self) -> &'static str {
        "SLURM_JOB_ID"
    }

    fn job_name_var(&self) -> &'static str {
        "SLURM_JOB_NAME"
    }

    fn directives(&self, config: &JobScriptConfig, log_path: &str) -> Vec<String> {
        let mut directives = vec![
            format!("-p {}", config.partition),
            format!("--mem={}", config.memory),
            format!("--job-name={}", config.name),
            format!("-c {}", config.cores),
            format!("-t {}", config.time_limit),
            format!("-o {log_path}"),
            format!("-e {log_path}"),
        ];

        if let Some(mail_type) = mail_type(config.email) {
            directives.push(format!("--mail-type={mail_type}"));
        }

        if config.is_array() {
            directives.push(format!(
                "--array=1-{}%{}",
                config.task_count, config.task_limit
            ));
        }

        directives
    }
}

fn mail_type(policy: MailPolicy) -> Option<&'static str> {
    match policy {
        MailPolicy::None => None,
        MailPolicy::Begin => Some("BEGIN"),
        MailPolicy::End => Some("END"),
        MailPolicy::Fail => Some("FAIL"),
        MailPolicy::All => Some("ALL"),
    }
}
