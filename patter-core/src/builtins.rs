//! Built-in operations
//!
//! Registered into the same registry expressions are evaluated against, so a
//! script can steer its own playback: `{speed('fast')}`, `{pause(300)}`,
//! `%{goto('ending')}` and so on. Every operation returns `null`.

use patter_config::{PausePreset, SpeedPreset};
use patter_expr::{Registry, Value};

use crate::runner::Runner;
use crate::sink::Sink;

type BuiltinResult = Result<Value, String>;

/// Names of every built-in, in registration order
pub const BUILTIN_NAMES: [&str; 9] = [
    "instant", "flushing", "speed", "pause", "goto", "skip", "flush", "clear", "end",
];

/// Register all built-ins into `registry`
pub fn register_builtins<S: Sink + 'static>(registry: &mut Registry<Runner<S>>) {
    registry.register("instant", instant::<S>);
    registry.register("flushing", flushing::<S>);
    registry.register("speed", speed::<S>);
    registry.register("pause", pause::<S>);
    registry.register("goto", goto::<S>);
    registry.register("skip", skip::<S>);
    registry.register("flush", flush::<S>);
    registry.register("clear", clear::<S>);
    registry.register("end", end::<S>);
}

/// A fresh registry holding only the built-ins
pub fn builtin_registry<S: Sink + 'static>() -> Registry<Runner<S>> {
    let mut registry = Registry::new();
    register_builtins(&mut registry);
    registry
}

fn check_arity(args: &[Value], min: usize, max: usize) -> Result<(), String> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            format!("{min}")
        } else {
            format!("{min} to {max}")
        };
        return Err(format!(
            "expected {expected} argument{}, got {}",
            if max == 1 { "" } else { "s" },
            args.len()
        ));
    }
    Ok(())
}

/// `instant()` toggles, `instant(x)` sets by truthiness
fn instant<S: Sink>(runner: &mut Runner<S>, args: &[Value]) -> BuiltinResult {
    check_arity(args, 0, 1)?;
    let on = match args.first() {
        Some(value) => value.is_truthy(),
        None => !runner.is_instant(),
    };
    runner.set_instant(on);
    Ok(Value::Null)
}

/// `flushing()` toggles, `flushing(x)` sets by truthiness
fn flushing<S: Sink>(runner: &mut Runner<S>, args: &[Value]) -> BuiltinResult {
    check_arity(args, 0, 1)?;
    let on = match args.first() {
        Some(value) => value.is_truthy(),
        None => !runner.config().confirm_flushes,
    };
    runner.set_confirm_flushes(on);
    Ok(Value::Null)
}

/// `speed(chars_per_sec)` or `speed('slow' | 'normal' | 'fast')`
fn speed<S: Sink>(runner: &mut Runner<S>, args: &[Value]) -> BuiltinResult {
    check_arity(args, 1, 1)?;
    let chars_per_sec = match &args[0] {
        Value::Str(name) => SpeedPreset::from_name(name)
            .map(|preset| preset.chars_per_sec())
            .ok_or_else(|| {
                format!("unknown speed preset '{name}', expected one of {}", preset_list(&SpeedPreset::ALL.map(|p| p.as_str())))
            })?,
        other => other
            .as_f64()
            .ok_or_else(|| format!("expected a number or preset name, got {}", other.type_name()))?,
    };
    runner.set_speed(chars_per_sec).map_err(|e| e.to_string())?;
    Ok(Value::Null)
}

/// `pause(ms)` or `pause('short' | 'medium' | 'long')`
fn pause<S: Sink>(runner: &mut Runner<S>, args: &[Value]) -> BuiltinResult {
    check_arity(args, 1, 1)?;
    let ms = match &args[0] {
        Value::Str(name) => PausePreset::from_name(name)
            .map(|preset| preset.millis())
            .ok_or_else(|| {
                format!("unknown pause preset '{name}', expected one of {}", preset_list(&PausePreset::ALL.map(|p| p.as_str())))
            })?,
        other => other
            .as_f64()
            .ok_or_else(|| format!("expected a number or preset name, got {}", other.type_name()))?,
    };
    runner.pause(ms).map_err(|e| e.to_string())?;
    Ok(Value::Null)
}

/// `goto(scene)`
fn goto<S: Sink>(runner: &mut Runner<S>, args: &[Value]) -> BuiltinResult {
    check_arity(args, 1, 1)?;
    let name = args[0]
        .as_str()
        .ok_or_else(|| format!("expected a scene name, got {}", args[0].type_name()))?;
    if !runner.load_scene(name) {
        return Err(format!("unknown scene '{name}'"));
    }
    Ok(Value::Null)
}

/// `skip()`: flush and move to the next beat
fn skip<S: Sink>(runner: &mut Runner<S>, args: &[Value]) -> BuiltinResult {
    check_arity(args, 0, 0)?;
    runner.skip_beat();
    Ok(Value::Null)
}

/// `flush()`: render the rest of the beat without moving on
fn flush<S: Sink>(runner: &mut Runner<S>, args: &[Value]) -> BuiltinResult {
    check_arity(args, 0, 0)?;
    runner.continue_beat();
    Ok(Value::Null)
}

fn clear<S: Sink>(runner: &mut Runner<S>, args: &[Value]) -> BuiltinResult {
    check_arity(args, 0, 0)?;
    runner.clear_output();
    Ok(Value::Null)
}

fn end<S: Sink>(runner: &mut Runner<S>, args: &[Value]) -> BuiltinResult {
    check_arity(args, 0, 0)?;
    runner.end_scene();
    Ok(Value::Null)
}

fn preset_list(names: &[&str]) -> String {
    names
        .iter()
        .map(|n| format!("'{n}'"))
        .collect::<Vec<_>>()
        .join(", ")
}
