//! Prefixed logger with a minimum level, emitting through `tracing`.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug = 0,
    #[default]
    Info = 1,
    Warn = 2,
    Error = 3,
    None = 4,
}

#[derive(Debug, Clone)]
pub struct Logger {
    level: LogLevel,
    prefix: String,
}

impl Logger {
    pub fn new(level: LogLevel, prefix: impl Into<String>) -> Self {
        Self {
            level,
            prefix: prefix.into(),
        }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::None && self.level <= level
    }

    pub fn debug(&self, message: &str) {
        if self.enabled(LogLevel::Debug) {
            tracing::debug!("{} {}", self.prefix, message);
        }
    }

    pub fn info(&self, message: &str) {
        if self.enabled(LogLevel::Info) {
            tracing::info!("{} {}", self.prefix, message);
        }
    }

    pub fn warn(&self, message: &str) {
        if self.enabled(LogLevel::Warn) {
            tracing::warn!("{} {}", self.prefix, message);
        }
    }

    pub fn error(&self, message: &str) {
        if self.enabled(LogLevel::Error) {
            tracing::error!("{} {}", self.prefix, message);
        }
    }
}
