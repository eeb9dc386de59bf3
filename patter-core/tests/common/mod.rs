//! 测试辅助工具
//!
//! 提供端到端测试的辅助函数

#![allow(dead_code)]

use std::rc::Rc;

use patter_core::{
    builtin_registry, compile, parse_source, BufferSink, CompileReport, Programme, Runner,
    RunnerConfig, State,
};

/// Compile a script, panicking on structural errors
pub fn compile_script(src: &str) -> Result<Programme, CompileReport> {
    let script = parse_source(src).expect("script should parse");
    compile(&script)
}

/// Runner with built-ins and a recording sink
pub fn runner_with(src: &str, config: RunnerConfig) -> Runner<BufferSink> {
    let programme = compile_script(src).expect("script should compile");
    Runner::new(
        Rc::new(programme),
        Rc::new(builtin_registry()),
        BufferSink::new(),
        config,
    )
}

pub fn runner(src: &str) -> Runner<BufferSink> {
    runner_with(src, RunnerConfig::default())
}

pub fn config(chars_per_sec: f64, confirm_flushes: bool) -> RunnerConfig {
    RunnerConfig {
        chars_per_sec,
        confirm_flushes,
    }
}

/// Drive the runner in fixed frames until it stops emitting
pub fn run_until_waiting(runner: &mut Runner<BufferSink>, frame_ms: f64) -> State {
    for _ in 0..100_000 {
        if runner.advance(frame_ms) != State::Emitting {
            break;
        }
    }
    runner.state()
}

/// Play a whole scene: type out every beat and confirm it
pub fn play_to_end(runner: &mut Runner<BufferSink>) {
    while runner.state() != State::Done {
        run_until_waiting(runner, 16.0);
        runner.confirm();
    }
}
