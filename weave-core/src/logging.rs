//! 日志初始化
//!
//! 基于 tracing-subscriber，级别和格式可以来自代码、环境变量或 `Environment`

use std::fmt;
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::config::Environment;
use crate::constants::{LOGGING_FILTER_KEY, LOGGING_FORMAT_KEY, LOGGING_LEVEL_KEY};
use crate::error::{ContainerError, ContainerResult};

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = ContainerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(ContainerError::Config(format!("Invalid log level: {}", other))),
        }
    }
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level: Level = (*self).into();
        write!(f, "{}", level.as_str().to_lowercase())
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 紧凑格式（默认）
    Compact,
    /// 完整格式
    Full,
    /// JSON 格式
    Json,
    /// 多行美化格式（适合开发）
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ContainerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "full" => Ok(LogFormat::Full),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(ContainerError::Config(format!("Invalid log format: {}", other))),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub show_timestamp: bool,
    /// 是否显示模块路径
    pub show_target: bool,
    pub show_thread_ids: bool,
    /// 额外的过滤指令，例如 "weave_proxy=trace,weave_aop=debug"
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            show_timestamp: true,
            show_target: false,
            show_thread_ids: false,
            filter: None,
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn show_timestamp(mut self, show: bool) -> Self {
        self.show_timestamp = show;
        self
    }

    pub fn show_target(mut self, show: bool) -> Self {
        self.show_target = show;
        self
    }

    pub fn show_thread_ids(mut self, show: bool) -> Self {
        self.show_thread_ids = show;
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// 从进程环境变量读取：RUST_LOG、LOG_LEVEL、LOG_FORMAT
    ///
    /// 无法解析的值会被忽略并保留默认值
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(rust_log) = std::env::var("RUST_LOG") {
            config.filter = Some(rust_log);
        }
        if let Some(level) = std::env::var("LOG_LEVEL").ok().and_then(|s| s.parse().ok()) {
            config.level = level;
        }
        if let Some(format) = std::env::var("LOG_FORMAT").ok().and_then(|s| s.parse().ok()) {
            config.format = format;
        }
        config
    }

    /// 从 `Environment` 读取 `weave.logging.*`
    ///
    /// 与 `from_env` 不同，这里的非法值直接报错
    pub fn from_environment(environment: &Environment) -> ContainerResult<Self> {
        let mut config = Self::default();
        if let Some(level) = environment.get_string(LOGGING_LEVEL_KEY) {
            config.level = level.parse()?;
        }
        if let Some(format) = environment.get_string(LOGGING_FORMAT_KEY) {
            config.format = format.parse()?;
        }
        config.filter = environment.get_string(LOGGING_FILTER_KEY);
        Ok(config)
    }

    /// 组合级别与过滤指令
    fn env_filter(&self) -> ContainerResult<EnvFilter> {
        let directives = match &self.filter {
            Some(filter) => format!("{},{}", self.level, filter),
            None => self.level.to_string(),
        };
        EnvFilter::try_new(&directives).map_err(|e| {
            ContainerError::Config(format!("Invalid log filter '{}': {}", directives, e))
        })
    }

    /// 安装全局订阅者
    ///
    /// 重复初始化返回 `LoggingInitFailed`
    pub fn init(self) -> ContainerResult<()> {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(self.env_filter()?)
            .with_target(self.show_target)
            .with_thread_ids(self.show_thread_ids);

        let result = match (self.format, self.show_timestamp) {
            (LogFormat::Compact, true) => builder.compact().try_init(),
            (LogFormat::Compact, false) => builder.compact().without_time().try_init(),
            (LogFormat::Full, true) => builder.try_init(),
            (LogFormat::Full, false) => builder.without_time().try_init(),
            (LogFormat::Json, _) => builder.json().try_init(),
            (LogFormat::Pretty, _) => builder.pretty().try_init(),
        };

        result.map_err(|e| ContainerError::LoggingInitFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigValue, MapPropertySource};

    #[test]
    fn test_log_level_from_str() {
        assert_eq!("info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("verbose".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::Debug.to_string(), "debug");
    }

    #[test]
    fn test_filter_combines_level_and_directives() {
        let config = LoggingConfig::new()
            .level(LogLevel::Warn)
            .filter("weave_proxy=trace");
        assert!(config.env_filter().is_ok());
    }

    #[test]
    fn test_from_environment() {
        let env = Environment::new();
        env.add_property_source(Box::new(
            MapPropertySource::new("test")
                .with_property(LOGGING_LEVEL_KEY, ConfigValue::String("debug".into()))
                .with_property(LOGGING_FORMAT_KEY, ConfigValue::String("json".into())),
        ));

        let config = LoggingConfig::from_environment(&env).unwrap();
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.filter.is_none());
    }

    #[test]
    fn test_from_environment_rejects_bad_format() {
        let env = Environment::new();
        env.add_property_source(Box::new(
            MapPropertySource::new("test")
                .with_property(LOGGING_FORMAT_KEY, ConfigValue::String("xml".into())),
        ));
        assert!(LoggingConfig::from_environment(&env).is_err());
    }
}
