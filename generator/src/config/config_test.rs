use super::*;

fn valid() -> JobScriptConfig {
    JobScriptConfig::new("nnSVG_array", "20G", 1, 4)
}

#[test]
pub fn accepts_valid_config() {
    assert!(valid().validate().is_ok());
    assert!(JobScriptConfig::new("a-b_C9", "4G", 8, 1).validate().is_ok());
}

#[test]
pub fn rejects_zero_cores() {
    let config = JobScriptConfig::new("job", "20G", 0, 1);

    assert!(matches!(config.validate(), Err(ConfigError::ZeroCores)));
}

#[test]
pub fn rejects_zero_tasks() {
    let config = JobScriptConfig::new("job", "20G", 1, 0);

    assert!(matches!(config.validate(), Err(ConfigError::ZeroTasks)));
}

#[test]
pub fn rejects_bad_names() {
    let empty = JobScriptConfig::new("", "20G", 1, 1);
    assert!(matches!(empty.validate(), Err(ConfigError::EmptyName)));

    for name in ["my job", "a/b", "..", "tab\tname", "semi;colon", "ünicode"] {
        let config = JobScriptConfig::new(name, "20G", 1, 1);
        assert!(
            matches!(config.validate(), Err(ConfigError::UnsafeName(_))),
            "{name:?} should be rejected"
        );
    }

    let long = JobScriptConfig::new("a".repeat(MAX_NAME_LEN + 1), "20G", 1, 1);
    assert!(matches!(long.validate(), Err(ConfigError::NameTooLong(65))));

    let limit = JobScriptConfig::new("a".repeat(MAX_NAME_LEN), "20G", 1, 1);
    assert!(limit.validate().is_ok());
}

#[test]
pub fn rejects_bad_memory() {
    for memory in ["", "20 G", " 20G"] {
        let config = JobScriptConfig::new("job", memory, 1, 1);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMemory(_))
        ));
    }
}

#[test]
pub fn rejects_bad_task_limit() {
    let mut config = valid();
    config.task_limit = 0;

    assert!(matches!(config.validate(), Err(ConfigError::ZeroTaskLimit)));
}

#[test]
pub fn log_dir_only_checked_when_used() {
    let mut config = valid();
    config.log_dir = PathBuf::from("../elsewhere");
    assert!(config.validate().is_ok());

    let config = config.with_create_logdir(true);
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidLogDir(_))
    ));

    for dir in ["/abs/logs", "", "my logs"] {
        let mut config = valid().with_create_logdir(true);
        config.log_dir = PathBuf::from(dir);
        assert!(config.validate().is_err(), "{dir:?} should be rejected");
    }

    for dir in [
        "logs%j",
        "logs;touch_pwned",
        "logs%j;touch_pwned",
        "$HOME",
        "`id`",
        "out/.hidden",
        ".logs",
    ] {
        let mut config = valid().with_create_logdir(true);
        config.log_dir = PathBuf::from(dir);
        assert!(
            matches!(config.validate(), Err(ConfigError::InvalidLogDir(_))),
            "{dir:?} should be rejected"
        );
    }

    for dir in ["out/logs", "./logs", "logs.v2", "run-1/log_files"] {
        let mut config = valid().with_create_logdir(true);
        config.log_dir = PathBuf::from(dir);
        assert!(config.validate().is_ok(), "{dir:?} should be accepted");
    }
}

#[test]
pub fn rejects_bad_partition_and_time_limit() {
    for partition in ["", "shared\n#SBATCH --exclusive", "two words"] {
        let mut config = valid();
        config.partition = partition.to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPartition(_))
        ));
    }

    for time_limit in ["", "1-00:00:00\n#SBATCH --exclusive", "1 day"] {
        let mut config = valid();
        config.time_limit = time_limit.to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTimeLimit(_))
        ));
    }
}

#[test]
pub fn rejects_bad_modules() {
    for module in ["", "conda_R; rm -rf ~", "R/4.3\nwhoami", "$(id)", "a|b"] {
        let mut config = valid();
        config.modules = vec!["samtools".to_string(), module.to_string()];
        assert!(
            matches!(config.validate(), Err(ConfigError::InvalidModule(_))),
            "{module:?} should be rejected"
        );
    }

    let mut config = valid();
    config.modules = vec!["conda_R/4.3".to_string(), "samtools-1.17".to_string()];
    assert!(config.validate().is_ok());
}

#[test]
pub fn yaml_fills_defaults() {
    let config = JobScriptConfig::from_yaml(
        "name: nnSVG_array\nmemory: 20G\ntasks: 4\nscheduler: sge\nemail: end\n",
    )
    .unwrap();

    assert_eq!(config.name, "nnSVG_array");
    assert_eq!(config.memory, "20G");
    assert_eq!(config.cores, 1);
    assert_eq!(config.task_count, 4);
    assert_eq!(config.scheduler, SchedulerKind::Sge);
    assert_eq!(config.email, MailPolicy::End);
    assert_eq!(config.task_limit, 20);
    assert_eq!(config.log_dir, PathBuf::from("logs"));
    assert!(!config.create_shell);
    assert!(!config.create_logdir);
}

#[test]
pub fn yaml_rejects_unknown_fields() {
    let result = JobScriptConfig::from_yaml("name: job\nthreads: 4\n");

    assert!(matches!(result, Err(ConfigError::Load(_))));
}

#[test]
pub fn from_path_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = JobScriptConfig::from_path(&dir.path().join("missing.yaml"));

    assert!(matches!(result, Err(ConfigError::ReadFile(_))));
}

#[test]
pub fn parses_enums_case_insensitive() {
    assert_eq!("SLURM".parse::<SchedulerKind>().unwrap(), SchedulerKind::Slurm);
    assert_eq!("sge".parse::<SchedulerKind>().unwrap(), SchedulerKind::Sge);
    assert!(matches!(
        "pbs".parse::<SchedulerKind>(),
        Err(ConfigError::UnsupportedScheduler(_))
    ));
    assert_eq!("Fail".parse::<MailPolicy>().unwrap(), MailPolicy::Fail);
    assert!(matches!(
        "weekly".parse::<MailPolicy>(),
        Err(ConfigError::UnsupportedEmail(_))
    ));
}

#[test]
pub fn script_file_name_derives_from_name() {
    assert_eq!(valid().script_file_name(), PathBuf::from("nnSVG_array.sh"));
}
