//! Runner: frame-stepped playback of a compiled programme
//!
//! The host owns the clock and drives the runner with elapsed milliseconds:
//!
//! ```text
//! emitting --(beat exhausted)--> waiting --(confirm)--> emitting (next beat)
//!                                                   \-> done (no beats left)
//! ```
//!
//! Expressions run against the runner itself, so built-in operations can
//! change pacing, mode and position while a beat is playing. Every beat entry
//! bumps an internal epoch; work started in a beat that has since been left
//! is dropped instead of rendered.

use std::mem;
use std::rc::Rc;

use patter_config::{Phase, RunnerConfig};
use patter_expr::{Context, Expr, Registry, Scope, Value};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::compiler::{Node, Programme};
use crate::sink::Sink;
use crate::syntax::MAIN_SCENE;

const TARGET: &str = Phase::Runner.target();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Emitting,
    Waiting,
    Done,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunnerError {
    #[error("speed must be a positive number of characters per second, got {0}")]
    InvalidSpeed(f64),
    #[error("pause must be a non-negative number of milliseconds, got {0}")]
    InvalidPause(f64),
}

pub struct Runner<S: Sink> {
    programme: Rc<Programme>,
    registry: Rc<Registry<Runner<S>>>,
    scope: Scope,
    sink: S,

    state: State,
    scene: usize,
    beat: usize,
    node: usize,
    /// 当前逐字输出的文本及游标（字节偏移）
    text: String,
    cursor: usize,
    accumulated_ms: f64,
    pause_ms: f64,
    instant: bool,
    deferred: Vec<Rc<Expr>>,
    epoch: u64,

    config: RunnerConfig,
    defaults: RunnerConfig,
}

impl<S: Sink> Runner<S> {
    /// Create a runner positioned at the start of the `main` scene
    pub fn new(
        programme: Rc<Programme>,
        registry: Rc<Registry<Runner<S>>>,
        sink: S,
        config: RunnerConfig,
    ) -> Self {
        let defaults = if is_valid_speed(config.chars_per_sec) {
            config
        } else {
            warn!(target: TARGET, chars_per_sec = config.chars_per_sec, "invalid speed in config, using default");
            RunnerConfig {
                chars_per_sec: RunnerConfig::default().chars_per_sec,
                ..config
            }
        };

        let mut runner = Self {
            programme,
            registry,
            scope: Scope::new(),
            sink,
            state: State::Done,
            scene: 0,
            beat: 0,
            node: 0,
            text: String::new(),
            cursor: 0,
            accumulated_ms: 0.0,
            pause_ms: 0.0,
            instant: false,
            deferred: Vec::new(),
            epoch: 0,
            config: defaults,
            defaults,
        };
        if !runner.load_scene(MAIN_SCENE) {
            warn!(target: TARGET, "programme has no main scene, runner starts done");
        }
        runner
    }

    // ==================== Host API ====================

    /// Jump to the start of `name`. Returns false, changing nothing, if there is no such scene.
    pub fn load_scene(&mut self, name: &str) -> bool {
        let Some(index) = self.programme.scene_index(name) else {
            debug!(target: TARGET, scene = name, "unknown scene");
            return false;
        };
        debug!(target: TARGET, scene = name, "loading scene");
        self.scene = index;
        self.config = self.defaults;
        self.instant = false;
        self.enter_beat(0);
        true
    }

    /// Let `delta_ms` milliseconds of playback time pass
    pub fn advance(&mut self, delta_ms: f64) -> State {
        if self.state != State::Emitting {
            return self.state;
        }
        let mut delta = if delta_ms.is_finite() && delta_ms > 0.0 {
            delta_ms
        } else {
            0.0
        };

        if self.pause_ms > 0.0 {
            if self.pause_ms > delta {
                self.pause_ms -= delta;
                return self.state;
            }
            delta -= self.pause_ms;
            self.pause_ms = 0.0;
        }
        self.accumulated_ms += delta;

        // 进入新的 beat（goto、skip）后本帧结束，新 beat 从下一帧开始
        let epoch = self.epoch;
        while self.state == State::Emitting && self.pause_ms <= 0.0 && self.epoch == epoch {
            let next = self.text[self.cursor..].chars().next();
            match next {
                Some(c) => {
                    let interval = self.config.char_interval_ms();
                    if self.accumulated_ms < interval {
                        break;
                    }
                    self.accumulated_ms -= interval;
                    self.cursor += c.len_utf8();
                    self.sink.append_char(c);
                }
                None => self.load_next_node(false),
            }
        }
        self.state
    }

    /// Player confirmation: flush while emitting (if enabled), or move past a finished beat
    pub fn confirm(&mut self) {
        match self.state {
            State::Emitting => {
                if self.config.confirm_flushes {
                    self.flush();
                }
            }
            State::Waiting => self.finish_beat(),
            State::Done => {}
        }
    }

    /// Render the rest of the current beat at once
    pub fn continue_beat(&mut self) {
        self.flush();
    }

    /// Flush the current beat and move to the next one
    pub fn skip_beat(&mut self) {
        if self.state == State::Emitting {
            self.flush();
        }
        if self.state == State::Waiting {
            self.finish_beat();
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    // ==================== Accessors ====================

    pub fn programme(&self) -> &Programme {
        &self.programme
    }

    pub fn registry(&self) -> &Registry<Runner<S>> {
        &self.registry
    }

    pub fn scene_name(&self) -> &str {
        self.programme
            .scene_at(self.scene)
            .map(|s| s.name.as_str())
            .unwrap_or_default()
    }

    pub fn beat_index(&self) -> usize {
        self.beat
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Construction-time config, restored on every scene load
    pub fn defaults(&self) -> &RunnerConfig {
        &self.defaults
    }

    pub fn is_instant(&self) -> bool {
        self.instant
    }

    pub fn pending_pause_ms(&self) -> f64 {
        self.pause_ms
    }

    /// Deferred expressions waiting for the next confirmation
    pub fn pending_deferred(&self) -> usize {
        self.deferred.len()
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    // ==================== Mutators (built-ins) ====================

    pub fn set_instant(&mut self, instant: bool) {
        self.instant = instant;
    }

    pub fn set_confirm_flushes(&mut self, flushes: bool) {
        self.config.confirm_flushes = flushes;
    }

    pub fn set_speed(&mut self, chars_per_sec: f64) -> Result<(), RunnerError> {
        if !is_valid_speed(chars_per_sec) {
            return Err(RunnerError::InvalidSpeed(chars_per_sec));
        }
        self.config.chars_per_sec = chars_per_sec;
        Ok(())
    }

    /// Hold emission for `ms` milliseconds of playback time.
    ///
    /// Time already accumulated in the current frame is kept and spent once
    /// the pause has drained.
    pub fn pause(&mut self, ms: f64) -> Result<(), RunnerError> {
        if !ms.is_finite() || ms < 0.0 {
            return Err(RunnerError::InvalidPause(ms));
        }
        self.pause_ms = ms;
        Ok(())
    }

    /// Stop the scene immediately
    pub fn end_scene(&mut self) {
        debug!(target: TARGET, scene = self.scene_name(), "scene ended");
        self.reset_beat_state();
        self.state = State::Done;
    }

    pub fn clear_output(&mut self) {
        self.sink.clear();
    }

    // ==================== Internals ====================

    fn reset_beat_state(&mut self) {
        self.node = 0;
        self.text.clear();
        self.cursor = 0;
        self.accumulated_ms = 0.0;
        self.pause_ms = 0.0;
        self.deferred.clear();
        self.epoch += 1;
    }

    fn enter_beat(&mut self, beat: usize) {
        self.reset_beat_state();
        self.beat = beat;
        let beats = self
            .programme
            .scene_at(self.scene)
            .map_or(0, |s| s.beats.len());
        self.state = if beat < beats {
            State::Emitting
        } else {
            State::Done
        };
        debug!(target: TARGET, scene = self.scene_name(), beat, state = ?self.state, "entered beat");
    }

    /// Fire deferred expressions, clear the output and move on unless an expression already did
    fn finish_beat(&mut self) {
        let queue = mem::take(&mut self.deferred);
        for expr in queue {
            self.evaluate(&expr);
        }
        self.sink.clear();
        if self.state == State::Waiting {
            self.enter_beat(self.beat + 1);
        }
    }

    fn flush(&mut self) {
        if self.state != State::Emitting {
            return;
        }
        let epoch = self.epoch;

        let rest = &self.text[self.cursor..];
        if !rest.is_empty() {
            self.sink.append_text(rest);
        }
        self.cursor = self.text.len();

        while self.state == State::Emitting && self.epoch == epoch {
            self.load_next_node(true);
        }
        if self.epoch == epoch {
            self.pause_ms = 0.0;
            self.accumulated_ms = 0.0;
        }
    }

    fn begin_text(&mut self, text: &str) {
        self.text.clear();
        self.text.push_str(text);
        self.cursor = 0;
    }

    /// Load the next node of the current beat; `flushing` renders everything in instant form
    fn load_next_node(&mut self, flushing: bool) {
        let programme = Rc::clone(&self.programme);
        let Some(node) = programme.node(self.scene, self.beat, self.node) else {
            self.state = State::Waiting;
            trace!(target: TARGET, beat = self.beat, "beat exhausted");
            return;
        };
        self.node += 1;
        let epoch = self.epoch;

        match node {
            Node::Text(text) => {
                if self.instant || flushing {
                    self.sink.append_text(text);
                } else {
                    self.begin_text(text);
                }
            }
            Node::InstantString(text) => self.sink.append_text(text),
            Node::TypewriterString(text) => {
                if flushing {
                    self.sink.append_text(text);
                } else {
                    self.begin_text(text);
                }
            }
            Node::InlineExpr(expr) => {
                self.evaluate(expr);
            }
            Node::DeferredExpr(expr) => self.deferred.push(Rc::clone(expr)),
            Node::InstantExpr(expr) => {
                if let Some(value) = self.evaluate(expr) {
                    if self.epoch == epoch {
                        self.sink.append_text(&value.to_text());
                    }
                }
            }
            Node::TypewriterExpr(expr) => {
                if let Some(value) = self.evaluate(expr) {
                    if self.epoch == epoch {
                        let text = value.to_text();
                        if flushing {
                            self.sink.append_text(&text);
                        } else {
                            self.begin_text(&text);
                        }
                    }
                }
            }
        }
    }

    /// Evaluate with this runner as context; failures go to the sink and yield `None`
    fn evaluate(&mut self, expr: &Expr) -> Option<Value> {
        let registry = Rc::clone(&self.registry);
        match expr.eval(self, &*registry) {
            Ok(value) => Some(value),
            Err(e) => {
                let message = e.to_string();
                warn!(target: TARGET, scene = self.scene_name(), beat = self.beat, error = %message, "expression failed");
                self.sink.report_error(&message);
                None
            }
        }
    }
}

impl<S: Sink> Context for Runner<S> {
    fn scope(&mut self) -> &mut Scope {
        &mut self.scope
    }
}

fn is_valid_speed(chars_per_sec: f64) -> bool {
    chars_per_sec.is_finite() && chars_per_sec > 0.0
}
