//! Per-tween lifecycle state machine.
//!
//! `TweenCore` owns the timing of one tween: elapsed time, delay, duration
//! and loop bookkeeping. It never calls user code; each tick it produces a
//! [`Step`] describing what the owning handle has to evaluate.

use serde::{Deserialize, Serialize};

use crate::curves::{Easing, Modifier};

/// Lifecycle state of a tween.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TweenState {
    /// Constructed, still configurable.
    #[default]
    Idle,
    /// Playing; configuration is frozen.
    Scheduled,
    /// Playing but not advancing.
    Paused,
    /// Reached its end (naturally or through `complete`).
    Completed,
    /// Cancelled through `stop`.
    Stopped,
    /// Terminal.
    Disposed,
}

impl TweenState {
    /// Whether the tween is live (receives ticks, even if paused).
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Scheduled | Self::Paused)
    }

    /// Completed, Stopped or Disposed.
    pub fn has_ended(&self) -> bool {
        matches!(self, Self::Completed | Self::Stopped | Self::Disposed)
    }
}

/// How a tween ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Completed,
    Stopped,
    /// Disposed without firing any callback.
    Killed,
}

/// What happens at the end of each loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LoopMode {
    /// Restart from the beginning.
    #[default]
    Restart,
    /// Reverse direction on every other iteration (ping-pong).
    Yoyo,
}

/// Static configuration of a tween. Frozen once the tween leaves `Idle`.
#[derive(Debug, Clone, PartialEq)]
pub struct TweenSettings {
    /// Duration of one iteration in seconds.
    pub duration: f32,
    /// Seconds to wait before the first evaluation.
    pub delay: f32,
    /// Number of iterations; 0 loops forever.
    pub loops: u32,
    pub loop_mode: LoopMode,
    pub easing: Easing,
    pub modifier: Modifier,
}

impl TweenSettings {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            delay: 0.0,
            loops: 1,
            loop_mode: LoopMode::Restart,
            easing: Easing::Linear,
            modifier: Modifier::None,
        }
    }

    /// Active time across all iterations, `None` when looping forever.
    pub fn active_span(&self) -> Option<f32> {
        (self.loops > 0).then(|| self.duration * self.loops as f32)
    }

    /// Delay plus all iterations, `None` when looping forever.
    pub fn total_span(&self) -> Option<f32> {
        self.active_span().map(|span| self.delay + span)
    }
}

/// Evaluation work produced by one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Step {
    /// First evaluated tick since `play`.
    pub started: bool,
    /// Eased value the first pass departs from. Only meaningful with `started`.
    pub origin: f32,
    /// Eased end value of an iteration this tick stepped past.
    pub iteration_end: Option<f32>,
    /// Eased value the following iteration departs from, set with `iteration_end`.
    pub restart: Option<f32>,
    /// Eased value for the new position.
    pub value: f32,
    /// The tween reached its end; `value` is the final value.
    pub finished: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct TweenCore {
    pub(crate) settings: TweenSettings,
    state: TweenState,
    /// Time since `play`, delay included.
    elapsed: f32,
    started: bool,
    iteration: u32,
    completed_loops: u64,
    outcome: Option<Outcome>,
    disposed: bool,
}

impl TweenCore {
    pub fn new(settings: TweenSettings) -> Self {
        Self {
            settings,
            state: TweenState::Idle,
            elapsed: 0.0,
            started: false,
            iteration: 0,
            completed_loops: 0,
            outcome: None,
            disposed: false,
        }
    }

    /// Same configuration, fresh runtime state.
    pub fn fresh(&self) -> Self {
        Self::new(self.settings.clone())
    }

    pub fn settings(&self) -> &TweenSettings {
        &self.settings
    }

    pub fn state(&self) -> TweenState {
        self.state
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn completed_loops(&self) -> u64 {
        self.completed_loops
    }

    pub fn can_be_modified(&self) -> bool {
        self.state == TweenState::Idle
    }

    /// Normalized time inside the current iteration, before modifier and easing.
    pub fn progress(&self) -> f32 {
        if self.settings.duration <= 0.0 {
            return if self.started { 1.0 } else { 0.0 };
        }
        if self.outcome == Some(Outcome::Completed) {
            return 1.0;
        }
        let active = (self.elapsed - self.settings.delay).max(0.0);
        let local = active - self.iteration as f32 * self.settings.duration;
        (local / self.settings.duration).clamp(0.0, 1.0)
    }

    /// Idle → Scheduled.
    pub fn schedule(&mut self) -> bool {
        if self.state != TweenState::Idle {
            return false;
        }
        self.state = TweenState::Scheduled;
        true
    }

    /// Scheduled → Paused.
    pub fn pause(&mut self) -> bool {
        if self.state != TweenState::Scheduled {
            return false;
        }
        self.state = TweenState::Paused;
        true
    }

    /// Paused → Scheduled.
    pub fn resume(&mut self) -> bool {
        if self.state != TweenState::Paused {
            return false;
        }
        self.state = TweenState::Scheduled;
        true
    }

    /// Enter the ended state matching `outcome`. Returns false if already ended.
    pub fn end(&mut self, outcome: Outcome) -> bool {
        if self.state.has_ended() {
            return false;
        }
        self.state = match outcome {
            Outcome::Completed => TweenState::Completed,
            Outcome::Stopped => TweenState::Stopped,
            Outcome::Killed => TweenState::Disposed,
        };
        self.outcome = Some(outcome);
        true
    }

    /// Mark disposed. Returns true only the first time.
    pub fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.disposed = true;
        self.state = TweenState::Disposed;
        true
    }

    /// Advance by an already time-scaled `dt`.
    ///
    /// Returns `None` when nothing has to be evaluated: not scheduled, or
    /// still inside the delay.
    pub(crate) fn step(&mut self, dt: f32) -> Option<Step> {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.seek(self.elapsed + dt, true)
    }

    /// Move to `elapsed` seconds since `play`, delay included.
    ///
    /// A `forward` seek behaves like a tick. Otherwise the tween is being
    /// swept backwards by its owner: it enters from its end, never reports
    /// iteration boundaries and rests on its last frame instead of finishing.
    pub(crate) fn seek(&mut self, elapsed: f32, forward: bool) -> Option<Step> {
        if self.state != TweenState::Scheduled {
            return None;
        }
        if elapsed.is_finite() {
            self.elapsed = elapsed.max(0.0);
        }
        if self.elapsed < self.settings.delay {
            return None;
        }

        let started = !self.started;
        self.started = true;
        let origin = if forward {
            self.sample(self.iteration, 0.0)
        } else {
            self.final_value()
        };
        let duration = self.settings.duration;
        let delay = self.settings.delay;
        let active = self.elapsed - delay;

        if duration <= 0.0 {
            self.elapsed = delay;
            self.completed_loops = self.settings.loops.max(1) as u64;
            return Some(Step {
                started,
                origin,
                iteration_end: None,
                restart: None,
                value: self.final_value(),
                finished: forward,
            });
        }

        if let Some(span) = self.settings.active_span() {
            if forward && active >= span {
                let last = self.settings.loops - 1;
                let iteration_end = (self.iteration < last).then(|| self.sample(self.iteration, 1.0));
                let restart = iteration_end.map(|_| self.sample(last, 0.0));
                self.iteration = last;
                self.completed_loops = self.settings.loops as u64;
                self.elapsed = delay + span;
                return Some(Step {
                    started,
                    origin,
                    iteration_end,
                    restart,
                    value: self.final_value(),
                    finished: true,
                });
            }
        }

        let whole = (active / duration).floor();
        let mut iteration = whole as u32;
        if self.settings.loops > 0 {
            iteration = iteration.min(self.settings.loops - 1);
        }
        let local = ((active - iteration as f32 * duration) / duration).clamp(0.0, 1.0);

        let crossed = forward && iteration > self.iteration;
        let iteration_end = crossed.then(|| self.sample(self.iteration, 1.0));
        let restart = crossed.then(|| self.sample(iteration, 0.0));
        if crossed {
            self.completed_loops += (iteration - self.iteration) as u64;
        }
        let value = self.sample(iteration, local);
        self.iteration = iteration;

        // Infinite loops: keep elapsed bounded, preserving yoyo parity.
        if self.settings.loops == 0 && self.iteration >= 2 {
            let rebase = self.iteration - self.iteration % 2;
            self.elapsed -= rebase as f32 * duration;
            self.iteration -= rebase;
        }

        Some(Step {
            started,
            origin,
            iteration_end,
            restart,
            value,
            finished: false,
        })
    }

    /// Jump to the terminal position. Returns the eased value the final pass
    /// departs from when this is the first evaluation, and the final value.
    pub(crate) fn force_end(&mut self) -> (Option<f32>, f32) {
        let started = !self.started;
        self.started = true;
        let delay = self.settings.delay;
        match self.settings.active_span() {
            Some(span) => {
                self.iteration = self.settings.loops - 1;
                self.completed_loops = self.settings.loops as u64;
                self.elapsed = delay + span;
            }
            None => {
                self.completed_loops += 1;
                self.elapsed = delay + self.settings.duration * (self.iteration + 1) as f32;
            }
        }
        let origin = started.then(|| self.sample(self.iteration, 0.0));
        (origin, self.final_value())
    }

    /// Eased value at normalized time 1 of the last iteration.
    fn final_value(&self) -> f32 {
        let last = if self.settings.loops == 0 {
            self.iteration
        } else {
            self.settings.loops - 1
        };
        self.sample(last, 1.0)
    }

    fn sample(&self, iteration: u32, local: f32) -> f32 {
        let raw = if self.settings.loop_mode == LoopMode::Yoyo && iteration % 2 == 1 {
            1.0 - local
        } else {
            local
        };
        self.settings.easing.apply(self.settings.modifier.apply(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduled(settings: TweenSettings) -> TweenCore {
        let mut core = TweenCore::new(settings);
        assert!(core.schedule());
        core
    }

    #[test]
    fn starts_idle_and_schedules_once() {
        let mut core = TweenCore::new(TweenSettings::new(1.0));
        assert_eq!(core.state(), TweenState::Idle);
        assert!(core.can_be_modified());
        assert!(core.schedule());
        assert!(!core.schedule());
        assert!(!core.can_be_modified());
    }

    #[test]
    fn idle_core_does_not_step() {
        let mut core = TweenCore::new(TweenSettings::new(1.0));
        assert!(core.step(0.5).is_none());
        assert_eq!(core.elapsed(), 0.0);
    }

    #[test]
    fn step_reports_start_then_progress() {
        let mut core = scheduled(TweenSettings::new(1.0));

        let first = core.step(0.25).unwrap();
        assert!(first.started);
        assert!(!first.finished);
        assert!((first.value - 0.25).abs() < 1e-6);

        let second = core.step(0.25).unwrap();
        assert!(!second.started);
        assert!((second.value - 0.5).abs() < 1e-6);
    }

    #[test]
    fn delay_suppresses_evaluation() {
        let mut settings = TweenSettings::new(1.0);
        settings.delay = 0.5;
        let mut core = scheduled(settings);

        assert!(core.step(0.3).is_none());
        let step = core.step(0.3).unwrap();
        assert!(step.started);
        assert!((step.value - 0.1).abs() < 1e-5);
    }

    #[test]
    fn finishes_at_duration() {
        let mut core = scheduled(TweenSettings::new(1.0));
        let step = core.step(1.5).unwrap();
        assert!(step.finished);
        assert_eq!(step.value, 1.0);
        assert_eq!(core.elapsed(), 1.0);
    }

    #[test]
    fn restart_loops_report_iteration_end() {
        let mut settings = TweenSettings::new(1.0);
        settings.loops = 3;
        let mut core = scheduled(settings);

        core.step(0.5).unwrap();
        let step = core.step(0.75).unwrap();
        assert_eq!(step.iteration_end, Some(1.0));
        assert_eq!(step.restart, Some(0.0));
        assert!((step.value - 0.25).abs() < 1e-5);
        assert_eq!(core.completed_loops(), 1);
        assert!(!step.finished);

        let last = core.step(2.0).unwrap();
        assert!(last.finished);
        assert_eq!(core.completed_loops(), 3);
    }

    #[test]
    fn yoyo_loop_runs_backwards_on_odd_iterations() {
        let mut settings = TweenSettings::new(1.0);
        settings.loops = 2;
        settings.loop_mode = LoopMode::Yoyo;
        let mut core = scheduled(settings);

        let step = core.step(1.25).unwrap();
        assert!((step.value - 0.75).abs() < 1e-5);

        let end = core.step(1.0).unwrap();
        assert!(end.finished);
        assert_eq!(end.value, 0.0);
    }

    #[test]
    fn infinite_loops_never_finish_and_stay_bounded() {
        let mut settings = TweenSettings::new(0.5);
        settings.loops = 0;
        let mut core = scheduled(settings);

        for _ in 0..1000 {
            let step = core.step(0.2).unwrap();
            assert!(!step.finished);
        }
        assert!(core.elapsed() < 1.5);
        assert!(core.completed_loops() >= 399);
    }

    #[test]
    fn pause_blocks_steps_until_resume() {
        let mut core = scheduled(TweenSettings::new(1.0));
        assert!(core.pause());
        assert!(core.step(0.5).is_none());
        assert!(core.resume());
        let step = core.step(0.5).unwrap();
        assert!((step.value - 0.5).abs() < 1e-6);
    }

    #[test]
    fn pause_and_resume_ignore_wrong_states() {
        let mut core = TweenCore::new(TweenSettings::new(1.0));
        assert!(!core.pause());
        assert!(!core.resume());
        core.schedule();
        assert!(!core.resume());
    }

    #[test]
    fn end_is_one_shot() {
        let mut core = scheduled(TweenSettings::new(1.0));
        assert!(core.end(Outcome::Stopped));
        assert!(!core.end(Outcome::Completed));
        assert_eq!(core.state(), TweenState::Stopped);
        assert!(core.dispose());
        assert!(!core.dispose());
        assert_eq!(core.state(), TweenState::Disposed);
        assert_eq!(core.outcome(), Some(Outcome::Stopped));
    }

    #[test]
    fn force_end_jumps_to_final_value() {
        let mut settings = TweenSettings::new(2.0);
        settings.loops = 2;
        settings.delay = 1.0;
        let mut core = scheduled(settings);
        let (origin, value) = core.force_end();
        assert_eq!(origin, Some(0.0));
        assert_eq!(value, 1.0);
        assert_eq!(core.elapsed(), 5.0);
    }

    #[test]
    fn zero_duration_finishes_immediately() {
        let mut core = scheduled(TweenSettings::new(0.0));
        let step = core.step(0.0).unwrap();
        assert!(step.finished);
        assert!(step.started);
    }

    #[test]
    fn modifier_and_easing_are_applied_in_order() {
        let mut settings = TweenSettings::new(1.0);
        settings.modifier = Modifier::Reverse;
        settings.easing = Easing::InQuad;
        let mut core = scheduled(settings);
        // Reverse(0.5) = 0.5, InQuad(0.5) = 0.25
        let step = core.step(0.5).unwrap();
        assert!((step.value - 0.25).abs() < 1e-6);
        // Reverse(0.75) = 0.25, InQuad(0.25) = 0.0625
        let step = core.step(0.25).unwrap();
        assert!((step.value - 0.0625).abs() < 1e-6);
    }

    #[test]
    fn yoyo_restart_departs_from_the_far_end() {
        let mut settings = TweenSettings::new(1.0);
        settings.loops = 2;
        settings.loop_mode = LoopMode::Yoyo;
        let mut core = scheduled(settings);

        let first = core.step(0.5).unwrap();
        assert_eq!(first.origin, 0.0);
        let turn = core.step(0.75).unwrap();
        assert_eq!(turn.iteration_end, Some(1.0));
        assert_eq!(turn.restart, Some(1.0));
    }

    #[test]
    fn reversed_pass_departs_from_one() {
        let mut settings = TweenSettings::new(1.0);
        settings.modifier = Modifier::Reverse;
        let mut core = scheduled(settings);
        let step = core.step(0.25).unwrap();
        assert!(step.started);
        assert_eq!(step.origin, 1.0);
        assert!((step.value - 0.75).abs() < 1e-6);
    }

    #[test]
    fn backward_seek_enters_from_the_end_and_never_finishes() {
        let mut settings = TweenSettings::new(1.0);
        settings.loops = 2;
        let mut core = scheduled(settings);

        let entry = core.seek(2.0, false).unwrap();
        assert!(entry.started);
        assert_eq!(entry.origin, 1.0);
        assert_eq!(entry.value, 1.0);
        assert!(!entry.finished);
        assert_eq!(entry.iteration_end, None);

        let back = core.seek(1.5, false).unwrap();
        assert!((back.value - 0.5).abs() < 1e-6);
        assert_eq!(core.completed_loops(), 0);
        assert_eq!(core.state(), TweenState::Scheduled);
    }

    #[test]
    fn spans() {
        let mut settings = TweenSettings::new(0.5);
        settings.loops = 4;
        settings.delay = 1.0;
        assert_eq!(settings.active_span(), Some(2.0));
        assert_eq!(settings.total_span(), Some(3.0));
        settings.loops = 0;
        assert_eq!(settings.total_span(), None);
    }
}
