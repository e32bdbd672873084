use super::Dialect;
use crate::config::{JobScriptConfig, MailPolicy};

/// `#$` directives for (Son of) Grid Engine's qsub
#[derive(Clone, Copy, Debug)]
pub struct Sge;

impl Dialect for Sge {
    fn prefix(&self) -> &'static str {
        "#$"
    }

    fn log_placeholder(&self) -> &'static str {
        "$TASK_ID"
    }

    fn task_id_var(&self) -> &'static str {
        "SGE_TASK_ID"
    }

    fn job_id_var(&self) -> &'static str {
        "JOB_ID"
    }

    fn job_name_var(&self) -> &'static str {
        "JOB_NAME"
    }

    // time_limit is ignored, SGE queues carry their own h_rt
    fn directives(&self, config: &JobScriptConfig, log_path: &str) -> Vec<String> {
        let mut directives = vec![
            "-cwd".to_string(),
            format!("-q {}", config.partition),
            format!("-l mem_free={0},h_vmem={0}", config.memory),
            format!("-pe local {}", config.cores),
            format!("-N {}", config.name),
            format!("-o {log_path}"),
            format!("-e {log_path}"),
            format!("-m {}", mail_flags(config.email)),
        ];

        if config.is_array() {
            directives.push(format!("-t 1-{}", config.task_count));
            directives.push(format!("-tc {}", config.task_limit));
        }

        directives
    }
}

fn mail_flags(policy: MailPolicy) -> &'static str {
    match policy {
        MailPolicy::None => "n",
        MailPolicy::Begin => "b",
        MailPolicy::End => "e",
        MailPolicy::Fail => "a",
        MailPolicy::All => "bea",
    }
}
