#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use cronguard::config::{LockSettings, RedisSettings, ReportSettings, Settings, TaskSettings, TraceMode};
use cronguard::supervise::{ErrorTemplate, SupervisedTask, TaskOptions, TracePattern};
use cronguard::types::LockKind;

/// Builder for `SupervisedTask` to simplify test setup.
///
/// Trace splitting is off unless a prompt is given, so tests never depend
/// on the `$PS4` of the machine running them.
pub struct TaskBuilder {
    name: String,
    cmd: String,
    args: Vec<String>,
    options: TaskOptions,
}

impl TaskBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            name: "test-job".to_string(),
            cmd: cmd.to_string(),
            args: Vec::new(),
            options: TaskOptions::default(),
        }
    }

    /// `sh -c <script>`.
    pub fn shell(script: &str) -> Self {
        Self::new("sh").arg("-c").arg(script)
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    pub fn trace_prompt(mut self, prompt: &str) -> Self {
        self.options.trace_pattern = TracePattern::from_prompt(prompt).expect("valid trace prompt");
        self
    }

    pub fn template(mut self, source: &str) -> Self {
        self.options.template = ErrorTemplate::parse(source).expect("valid template");
        self
    }

    pub fn build(self) -> SupervisedTask {
        SupervisedTask::new(self.name, self.cmd, self.args, self.options)
            .expect("failed to create task")
    }
}

/// Builder for `Settings`, defaulting to no lock, no reporting, no trace
/// splitting and a fast poll interval.
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    pub fn new(name: &str, cmd: &str) -> Self {
        Self {
            settings: Settings {
                name: name.to_string(),
                cmd: cmd.to_string(),
                args: Vec::new(),
                task: TaskSettings {
                    trace: TraceMode::Disabled,
                    poll_interval: Duration::from_millis(50),
                    ..TaskSettings::default()
                },
                lock: LockSettings {
                    kind: LockKind::None,
                    ..LockSettings::default()
                },
                redis: RedisSettings::default(),
                report: ReportSettings::default(),
            },
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.settings.args.push(arg.to_string());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.task.timeout = Some(timeout);
        self
    }

    pub fn file_lock(mut self, dir: &Path) -> Self {
        self.settings.lock.kind = LockKind::File;
        self.settings.lock.directory = Some(dir.to_path_buf());
        self
    }

    pub fn build(self) -> Settings {
        self.settings
    }
}
