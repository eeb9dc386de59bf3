//! Patter API - pipeline orchestration layer
//!
//! Provides the unified entry points, including:
//! - Compilation (`compile`, `compile_with_config`)
//! - Runner construction with the built-in operations registered (`player`, `play`)
//! - Configuration abstraction (RunConfig) and logging setup
//! - Unified error handling (PatterError)
//!
//! For hosts that want one, this crate provides a global config singleton.
//! For library use, prefer passing a `RunConfig` explicitly.

use std::rc::Rc;

use patter_core::{builtin_registry, parse_source, Programme, Runner, Sink};
use tracing::{debug, info};

pub mod config;
pub mod error;
pub mod logging;

pub use config::{config as get_config, init as init_config, is_initialized, LogConfig, RunConfig};
pub use error::{reports_to_json, ErrorReport, PatterError};
pub use logging::LogFormat;

// Re-export core types
pub use patter_config::{PausePreset, Phase, RunnerConfig, SpeedPreset};
pub use patter_core::{BufferSink, State};
pub use patter_expr::Value;

/// Tokenize, build and compile a script
pub fn compile(source: &str) -> Result<Programme, PatterError> {
    let script = parse_source(source)?;
    let programme = patter_core::compile(&script)?;
    debug!(scenes = programme.len(), "script compiled");
    Ok(programme)
}

/// Compile and check that the configured start scene exists
pub fn compile_with_config(source: &str, config: &RunConfig) -> Result<Programme, PatterError> {
    let programme = compile(source)?;
    if !programme.contains_scene(&config.start_scene) {
        return Err(PatterError::UnknownScene(config.start_scene.clone()));
    }
    Ok(programme)
}

/// Build a runner over `programme` with every built-in registered,
/// positioned at the start of the configured start scene
pub fn player<S: Sink + 'static>(
    programme: Rc<Programme>,
    sink: S,
    config: &RunConfig,
) -> Result<Runner<S>, PatterError> {
    if !programme.contains_scene(&config.start_scene) {
        return Err(PatterError::UnknownScene(config.start_scene.clone()));
    }
    let mut runner = Runner::new(programme, Rc::new(builtin_registry()), sink, config.runner);
    if runner.scene_name() != config.start_scene {
        runner.load_scene(&config.start_scene);
    }
    info!(scene = %config.start_scene, "player ready");
    Ok(runner)
}

/// Compile `source` and hand back a ready runner
pub fn play<S: Sink + 'static>(
    source: &str,
    sink: S,
    config: &RunConfig,
) -> Result<Runner<S>, PatterError> {
    let programme = compile_with_config(source, config)?;
    player(Rc::new(programme), sink, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_ok() {
        let programme = compile("::main\nhi\n;;\nbye\n::other\nx").unwrap();
        assert_eq!(programme.scene_names(), vec!["main", "other"]);
        assert_eq!(programme.beat_count("main"), Some(2));
    }

    #[test]
    fn test_compile_errors_by_phase() {
        assert_eq!(compile("::main\n{oops").unwrap_err().phase(), Phase::Tokenizer);
        assert_eq!(compile("no scenes here").unwrap_err().phase(), Phase::Parser);
        assert_eq!(compile("::main\n{1 +}").unwrap_err().phase(), Phase::Compiler);
    }

    #[test]
    fn test_compile_with_config_checks_start_scene() {
        let config = RunConfig {
            start_scene: "epilogue".to_string(),
            ..RunConfig::default()
        };
        let err = compile_with_config("::main\nhi", &config).unwrap_err();
        assert_eq!(err, PatterError::UnknownScene("epilogue".to_string()));
    }

    #[test]
    fn test_play_from_start_scene() {
        let config = RunConfig {
            start_scene: "second".to_string(),
            ..RunConfig::default()
        };
        let mut runner = play("::main\nfirst\n::second\nlater", BufferSink::new(), &config).unwrap();
        assert_eq!(runner.scene_name(), "second");
        runner.continue_beat();
        assert_eq!(runner.sink().text, "later");
    }

    #[test]
    fn test_player_has_builtins() {
        let programme = Rc::new(compile("::main\n{speed('fast')}go").unwrap());
        let mut runner = player(programme, BufferSink::new(), &RunConfig::default()).unwrap();
        runner.advance(0.0);
        assert_eq!(runner.config().chars_per_sec, 80.0);
        assert!(runner.sink().errors.is_empty());
    }
}
