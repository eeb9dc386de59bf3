//! API 层配置
//!
//! 包含运行配置 RunConfig、日志配置 LogConfig 和全局单例

use once_cell::sync::OnceCell;
use patter_config::{Phase, RunnerConfig};
use patter_core::MAIN_SCENE;
use tracing::Level;

/// Per-phase log levels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub global: Level,
    pub tokenizer: Option<Level>,
    pub parser: Option<Level>,
    pub compiler: Option<Level>,
    pub runner: Option<Level>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: Level::INFO,
            tokenizer: None,
            parser: None,
            compiler: None,
            runner: None,
        }
    }
}

impl LogConfig {
    /// Log level for a phase, falling back to the global level
    pub fn level_for(&self, phase: Phase) -> Level {
        let specific = match phase {
            Phase::Tokenizer => self.tokenizer,
            Phase::Parser => self.parser,
            Phase::Compiler => self.compiler,
            Phase::Runner => self.runner,
        };
        specific.unwrap_or(self.global)
    }

    /// Set the same level for every phase and the global default
    pub fn all(level: Level) -> Self {
        Self {
            global: level,
            ..Self::default()
        }
    }
}

/// Execution configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Playback settings handed to every runner
    pub runner: RunnerConfig,
    /// Scene playback starts from
    pub start_scene: String,
    pub log: LogConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            runner: RunnerConfig::default(),
            start_scene: MAIN_SCENE.to_string(),
            log: LogConfig::default(),
        }
    }
}

impl RunConfig {
    pub fn with_runner(runner: RunnerConfig) -> Self {
        Self {
            runner,
            ..Self::default()
        }
    }
}

// 全局配置单例，供宿主程序使用
static GLOBAL_CONFIG: OnceCell<RunConfig> = OnceCell::new();

/// Initialize the global configuration.
///
/// Returns the config back if one was already installed.
pub fn init(config: RunConfig) -> Result<(), RunConfig> {
    GLOBAL_CONFIG.set(config)
}

/// Global config; installs the default on first use if `init` was never called
pub fn config() -> &'static RunConfig {
    GLOBAL_CONFIG.get_or_init(RunConfig::default)
}

/// Check if config is initialized
pub fn is_initialized() -> bool {
    GLOBAL_CONFIG.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_run_config() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.runner, RunnerConfig::default());
        assert_eq!(cfg.start_scene, "main");
        assert_eq!(cfg.log.global, Level::INFO);
    }

    #[test]
    fn test_level_for_falls_back_to_global() {
        let log = LogConfig {
            global: Level::WARN,
            runner: Some(Level::TRACE),
            ..LogConfig::default()
        };
        assert_eq!(log.level_for(Phase::Runner), Level::TRACE);
        assert_eq!(log.level_for(Phase::Parser), Level::WARN);
        assert_eq!(LogConfig::all(Level::DEBUG).level_for(Phase::Tokenizer), Level::DEBUG);
    }

    #[test]
    fn test_global_config() {
        // 全局状态：无论是否已初始化，config() 都能返回配置
        let cfg = config();
        assert!(is_initialized());
        assert!(init(RunConfig::default()).is_err());
        assert_eq!(cfg.start_scene, "main");
    }
}
