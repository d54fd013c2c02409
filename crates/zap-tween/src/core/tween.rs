//! Shared tween handle.
//!
//! A [`Tween`] wraps one `TweenCore`, its callbacks and a driver: the
//! concrete kind (typed value, frames, shake, sequence) that turns an eased
//! value into a side effect. Handles are cheap `Rc` clones; every clone
//! refers to the same live instance.
//!
//! No `RefCell` borrow is held while user code runs. The core computes a
//! [`Step`] and releases, drivers return [`Deferred`] work that runs after
//! their own borrow is dropped, and callbacks are invoked from a snapshot of
//! the callback lists.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use super::state::{LoopMode, Outcome, Step, TweenCore, TweenSettings, TweenState};
use super::time_scale::TimeScaleProvider;
use crate::curves::{Easing, Modifier};
use crate::error::TweenError;
use crate::kinds::value::AxisMask;
use crate::systems::group::{GroupKey, Replace};
use crate::systems::scheduler::Shared;

static NEXT_TWEEN_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identity of a tween instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenId(pub u64);

impl TweenId {
    fn next() -> Self {
        TweenId(NEXT_TWEEN_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TweenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared callback. Clones of a tween share their callbacks.
pub type Callback = Rc<RefCell<dyn FnMut()>>;

pub(crate) fn callback(f: impl FnMut() + 'static) -> Callback {
    Rc::new(RefCell::new(f))
}

pub(crate) fn invoke(cb: &Callback) {
    match cb.try_borrow_mut() {
        Ok(mut f) => (&mut *f)(),
        Err(_) => log::warn!("tween callback re-entered itself; nested call skipped"),
    }
}

/// Work a driver hands back to its tween, run once the driver is released.
pub(crate) enum Deferred {
    /// Play the tween nested if still idle, then move it to `elapsed`.
    Seek { tween: Tween, elapsed: f32, forward: bool },
    Complete(Tween),
    /// End as completed where the tween currently rests.
    Finish(Tween),
    Stop(Tween),
    Kill(Tween),
    Invoke(Callback),
}

/// Run `owner`'s deferred work. Once `owner` ends part-way through (a
/// callback stopped or killed it), the remaining seeks and callbacks are
/// dropped.
fn run_deferred(owner: &Tween, actions: Vec<Deferred>) {
    let was_live = !owner.has_ended();
    for action in actions {
        let cut = was_live && owner.has_ended();
        match action {
            Deferred::Seek { tween, elapsed, forward } => {
                if cut {
                    continue;
                }
                if tween.state() == TweenState::Idle {
                    tween.start_nested();
                }
                tween.seek(elapsed, forward);
            }
            Deferred::Complete(tween) => tween.complete(),
            Deferred::Finish(tween) => tween.finish(),
            Deferred::Stop(tween) => tween.stop(),
            Deferred::Kill(tween) => tween.kill(),
            Deferred::Invoke(cb) => {
                if !cut {
                    invoke(&cb);
                }
            }
        }
    }
}

/// The closed set of capabilities every tween kind provides.
pub(crate) trait TweenDriver {
    /// Short name used in logs.
    fn kind(&self) -> &'static str;

    /// Resolve play-time values (dynamic start/end, shake origin).
    fn on_play(&mut self, _id: TweenId) -> Result<(), TweenError> {
        Ok(())
    }

    /// A pass over the tween's range starts from eased value `origin`: on
    /// the first evaluation and at every loop iteration.
    fn begin(&mut self, _origin: f32) -> Vec<Deferred> {
        Vec::new()
    }

    /// Apply eased value `v`. The only place a tween has side effects.
    fn evaluate(&mut self, value: f32) -> Vec<Deferred>;

    /// Called at the end of every iteration and at completion.
    fn finish(&mut self) -> Vec<Deferred> {
        Vec::new()
    }

    fn stop(&mut self) -> Vec<Deferred> {
        Vec::new()
    }

    fn dispose(&mut self) -> Vec<Deferred> {
        Vec::new()
    }

    /// Restrict writes to some components. False for kinds without axes.
    fn set_axes(&mut self, _mask: AxisMask) -> bool {
        false
    }

    /// Same static configuration, fresh runtime state.
    fn clone_driver(&self) -> Box<dyn TweenDriver>;

    /// Like `clone_driver`, but values resolved at play are kept, so a
    /// replayed timeline repeats the same motion.
    fn replay_driver(&self) -> Box<dyn TweenDriver> {
        self.clone_driver()
    }
}

#[derive(Default, Clone)]
struct Hooks {
    on_start: Vec<Callback>,
    on_update: Vec<Callback>,
    on_complete: Vec<Callback>,
    on_stop: Vec<Callback>,
}

#[derive(Debug, Clone, Copy)]
enum Hook {
    Start,
    Update,
    Complete,
    Stop,
}

impl Hooks {
    fn list(&self, hook: Hook) -> &Vec<Callback> {
        match hook {
            Hook::Start => &self.on_start,
            Hook::Update => &self.on_update,
            Hook::Complete => &self.on_complete,
            Hook::Stop => &self.on_stop,
        }
    }

    fn list_mut(&mut self, hook: Hook) -> &mut Vec<Callback> {
        match hook {
            Hook::Start => &mut self.on_start,
            Hook::Update => &mut self.on_update,
            Hook::Complete => &mut self.on_complete,
            Hook::Stop => &mut self.on_stop,
        }
    }
}

/// Everything about a tween that is not timing: group, channel, ownership.
#[derive(Default, Clone)]
pub(crate) struct Links {
    pub group: Option<GroupKey>,
    pub replace: Replace,
    pub time_scale: Option<Rc<dyn TimeScaleProvider>>,
    /// Driven by a sequence rather than the scheduler.
    pub nested: bool,
    /// First configuration error; the tween refuses to play while set.
    pub config_error: Option<TweenError>,
}

pub(crate) struct TweenCell {
    id: TweenId,
    core: RefCell<TweenCore>,
    links: RefCell<Links>,
    hooks: RefCell<Hooks>,
    driver: RefCell<Box<dyn TweenDriver>>,
    engine: Weak<Shared>,
}

/// Handle to a tween instance.
#[derive(Clone)]
pub struct Tween {
    inner: Rc<TweenCell>,
}

impl Tween {
    pub(crate) fn new(engine: Weak<Shared>, settings: TweenSettings, driver: Box<dyn TweenDriver>) -> Self {
        let mut links = Links::default();
        if !(settings.duration.is_finite() && settings.duration > 0.0) {
            links.config_error = Some(TweenError::InvalidDuration(settings.duration));
        }
        Self::from_parts(engine, TweenCore::new(settings), links, Hooks::default(), driver)
    }

    /// Like `new`, but zero duration is allowed (sequences).
    pub(crate) fn new_unchecked(engine: Weak<Shared>, settings: TweenSettings, driver: Box<dyn TweenDriver>) -> Self {
        Self::from_parts(engine, TweenCore::new(settings), Links::default(), Hooks::default(), driver)
    }

    fn from_parts(
        engine: Weak<Shared>,
        core: TweenCore,
        links: Links,
        hooks: Hooks,
        driver: Box<dyn TweenDriver>,
    ) -> Self {
        Self {
            inner: Rc::new(TweenCell {
                id: TweenId::next(),
                core: RefCell::new(core),
                links: RefCell::new(links),
                hooks: RefCell::new(hooks),
                driver: RefCell::new(driver),
                engine,
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<TweenCell> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn from_cell(inner: Rc<TweenCell>) -> Self {
        Self { inner }
    }

    pub(crate) fn ptr_eq_cell(&self, cell: &Weak<TweenCell>) -> bool {
        std::ptr::eq(Rc::as_ptr(&self.inner), cell.as_ptr())
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn id(&self) -> TweenId {
        self.inner.id
    }

    pub fn state(&self) -> TweenState {
        self.inner.core.borrow().state()
    }

    /// How the tween ended, once it has.
    pub fn outcome(&self) -> Option<Outcome> {
        self.inner.core.borrow().outcome()
    }

    pub fn has_ended(&self) -> bool {
        self.state().has_ended()
    }

    /// Scheduled and not paused.
    pub fn is_playing(&self) -> bool {
        self.state() == TweenState::Scheduled
    }

    pub fn is_paused(&self) -> bool {
        self.state() == TweenState::Paused
    }

    /// Only idle tweens accept configuration changes.
    pub fn can_be_modified(&self) -> bool {
        self.inner.core.borrow().can_be_modified()
    }

    /// Seconds since `play`, delay included.
    pub fn elapsed(&self) -> f32 {
        self.inner.core.borrow().elapsed()
    }

    /// Normalized time inside the current iteration (before modifier/easing).
    pub fn progress(&self) -> f32 {
        self.inner.core.borrow().progress()
    }

    pub fn completed_loops(&self) -> u64 {
        self.inner.core.borrow().completed_loops()
    }

    pub fn duration(&self) -> f32 {
        self.inner.core.borrow().settings().duration
    }

    pub fn delay(&self) -> f32 {
        self.inner.core.borrow().settings().delay
    }

    pub fn loops(&self) -> u32 {
        self.inner.core.borrow().settings().loops
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.inner.core.borrow().settings().loop_mode
    }

    pub fn easing(&self) -> Easing {
        self.inner.core.borrow().settings().easing
    }

    pub fn modifier(&self) -> Modifier {
        self.inner.core.borrow().settings().modifier
    }

    /// Delay plus every iteration; `None` for infinite loops.
    pub fn total_duration(&self) -> Option<f32> {
        self.inner.core.borrow().settings().total_span()
    }

    pub fn group(&self) -> Option<GroupKey> {
        self.inner.links.borrow().group.clone()
    }

    pub fn time_scale(&self) -> Option<Rc<dyn TimeScaleProvider>> {
        self.inner.links.borrow().time_scale.clone()
    }

    /// Owned and driven by a sequence.
    pub fn is_nested(&self) -> bool {
        self.inner.links.borrow().nested
    }

    /// First configuration error recorded on this tween.
    pub fn config_error(&self) -> Option<TweenError> {
        self.inner.links.borrow().config_error.clone()
    }

    // ── Configuration (idle only) ───────────────────────────────────────

    pub fn set_easing(&self, easing: Easing) -> &Self {
        self.configure("easing", |core, _| core.settings.easing = easing)
    }

    pub fn set_modifier(&self, modifier: Modifier) -> &Self {
        self.configure("modifier", |core, _| core.settings.modifier = modifier)
    }

    pub fn set_delay(&self, delay: f32) -> &Self {
        self.configure("delay", |core, links| {
            if delay.is_finite() && delay >= 0.0 {
                core.settings.delay = delay;
            } else {
                links.reject(TweenError::InvalidDelay(delay));
            }
        })
    }

    /// `count` iterations (0 loops forever).
    pub fn set_loops(&self, count: u32, mode: LoopMode) -> &Self {
        self.configure("loops", |core, _| {
            core.settings.loops = count;
            core.settings.loop_mode = mode;
        })
    }

    pub fn set_group(&self, key: impl Into<GroupKey>) -> &Self {
        let key = key.into();
        self.configure("group", |_, links| links.group = Some(key))
    }

    /// What happens to existing members of the group when this tween plays.
    pub fn set_group_replace(&self, replace: Replace) -> &Self {
        self.configure("group replace", |_, links| links.replace = replace)
    }

    pub fn set_time_scale(&self, channel: Rc<dyn TimeScaleProvider>) -> &Self {
        self.configure("time scale", |_, links| links.time_scale = Some(channel))
    }

    /// Only animate the components in `mask` (typed tweens only).
    pub fn set_axes(&self, mask: AxisMask) -> &Self {
        if !self.can_be_modified() {
            log::warn!("tween {} is {:?}; axes change ignored", self.inner.id, self.state());
            return self;
        }
        let accepted = match self.inner.driver.try_borrow_mut() {
            Ok(mut driver) => driver.set_axes(mask),
            Err(_) => false,
        };
        if !accepted {
            log::warn!("tween {} ({}) has no axes to mask", self.inner.id, self.kind());
        }
        self
    }

    pub(crate) fn set_duration(&self, duration: f32) {
        self.inner.core.borrow_mut().settings.duration = duration;
    }

    pub(crate) fn set_nested(&self) {
        self.inner.links.borrow_mut().nested = true;
    }

    pub(crate) fn reject(&self, err: TweenError) {
        self.inner.links.borrow_mut().reject(err);
    }

    fn configure(&self, what: &str, apply: impl FnOnce(&mut TweenCore, &mut Links)) -> &Self {
        let mut core = self.inner.core.borrow_mut();
        if !core.can_be_modified() {
            log::warn!(
                "tween {} is {:?}; {} change ignored",
                self.inner.id,
                core.state(),
                what
            );
            return self;
        }
        apply(&mut core, &mut self.inner.links.borrow_mut());
        self
    }

    // ── Callbacks ───────────────────────────────────────────────────────

    /// Fires once, on the first evaluated tick (after the delay).
    pub fn on_start(&self, f: impl FnMut() + 'static) -> &Self {
        self.add_hook(Hook::Start, callback(f))
    }

    /// Fires after every evaluation.
    pub fn on_update(&self, f: impl FnMut() + 'static) -> &Self {
        self.add_hook(Hook::Update, callback(f))
    }

    /// Fires once when the tween completes, never after `stop` or `kill`.
    pub fn on_complete(&self, f: impl FnMut() + 'static) -> &Self {
        self.add_hook(Hook::Complete, callback(f))
    }

    /// Fires once when the tween is stopped.
    pub fn on_stop(&self, f: impl FnMut() + 'static) -> &Self {
        self.add_hook(Hook::Stop, callback(f))
    }

    fn add_hook(&self, hook: Hook, cb: Callback) -> &Self {
        self.inner.hooks.borrow_mut().list_mut(hook).push(cb);
        self
    }

    fn fire(&self, hook: Hook) {
        let list = self.inner.hooks.borrow().list(hook).clone();
        for cb in &list {
            invoke(cb);
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Idle → Scheduled: freeze configuration, resolve dynamic values,
    /// register with the scheduler and the group.
    ///
    /// Playing an already playing or ended tween does nothing.
    pub fn play(&self) -> Result<Tween, TweenError> {
        {
            let links = self.inner.links.borrow();
            if let Some(err) = &links.config_error {
                log::warn!("tween {} not played: {}", self.inner.id, err);
                return Err(err.clone());
            }
            if links.nested {
                return Err(TweenError::Nested(self.inner.id));
            }
        }
        if self.state() != TweenState::Idle {
            log::debug!("tween {} play ignored in state {:?}", self.inner.id, self.state());
            return Ok(self.clone());
        }

        let engine = self.inner.engine.upgrade();
        self.replace_group_members(engine.as_deref());
        if self.state() != TweenState::Idle {
            // A replaced member's callback played or ended us in the meantime.
            return Ok(self.clone());
        }
        self.resolve()?;
        if !self.inner.core.borrow_mut().schedule() {
            return Ok(self.clone());
        }
        match engine {
            Some(engine) => {
                self.register_group(&engine);
                engine.schedule(self.clone());
            }
            None => log::warn!("tween {} played after its tweener was dropped", self.inner.id),
        }
        log::debug!("tween {} playing ({})", self.inner.id, self.kind());
        Ok(self.clone())
    }

    /// Play under a sequence: same as `play` without scheduler registration.
    pub(crate) fn start_nested(&self) {
        if self.state() != TweenState::Idle {
            return;
        }
        let config_error = self.inner.links.borrow().config_error.clone();
        if let Some(err) = config_error {
            log::warn!("nested tween {} dropped: {}", self.inner.id, err);
            self.kill();
            return;
        }
        if let Err(err) = self.resolve() {
            log::warn!("nested tween {} dropped: {}", self.inner.id, err);
            self.kill();
            return;
        }
        if !self.inner.core.borrow_mut().schedule() {
            return;
        }
        if let Some(engine) = self.inner.engine.upgrade() {
            self.register_group(&engine);
        }
    }

    /// Scheduled → Paused.
    pub fn pause(&self) {
        if !self.inner.core.borrow_mut().pause() {
            log::debug!("tween {} pause ignored", self.inner.id);
        }
    }

    /// Paused → Scheduled.
    pub fn resume(&self) {
        if !self.inner.core.borrow_mut().resume() {
            log::debug!("tween {} resume ignored", self.inner.id);
        }
    }

    /// Cancel without completing: OnStop fires, OnComplete never does.
    pub fn stop(&self) {
        if !self.inner.core.borrow_mut().end(Outcome::Stopped) {
            return;
        }
        log::debug!("tween {} stopped", self.inner.id);
        self.run_driver(|d| d.stop());
        self.fire(Hook::Stop);
        self.dispose();
    }

    /// Skip to the end: final value applied, OnComplete fires once.
    pub fn complete(&self) {
        let state = self.state();
        if state.has_ended() {
            return;
        }
        if state == TweenState::Idle {
            if let Err(err) = self.resolve() {
                log::warn!("tween {} cannot complete: {}", self.inner.id, err);
                self.kill();
                return;
            }
        }
        let (origin, value) = self.inner.core.borrow_mut().force_end();
        if let Some(origin) = origin {
            self.fire(Hook::Start);
            if self.has_ended() {
                return;
            }
            self.run_driver(|d| d.begin(origin));
        }
        self.evaluate(value);
        self.finish();
    }

    /// Dispose immediately, without any callback.
    pub fn kill(&self) {
        if !self.inner.core.borrow_mut().end(Outcome::Killed) {
            return;
        }
        log::debug!("tween {} killed", self.inner.id);
        self.dispose();
    }

    /// Independent idle copy: same configuration and callbacks, fresh
    /// runtime state, new id, not owned by any sequence.
    pub fn clone_fresh(&self) -> Tween {
        let driver = self.inner.driver.borrow().clone_driver();
        self.duplicate(driver, false)
    }

    /// Fresh copy for a sequence replaying its timeline: still nested, and
    /// values resolved at play are kept.
    pub(crate) fn clone_for_replay(&self) -> Tween {
        let driver = self.inner.driver.borrow().replay_driver();
        self.duplicate(driver, true)
    }

    fn duplicate(&self, driver: Box<dyn TweenDriver>, nested: bool) -> Tween {
        let core = self.inner.core.borrow().fresh();
        let mut links = self.inner.links.borrow().clone();
        links.nested = nested;
        let hooks = self.inner.hooks.borrow().clone();
        Self::from_parts(self.inner.engine.clone(), core, links, hooks, driver)
    }

    /// Fresh copy that plays backwards.
    pub fn reversed(&self) -> Tween {
        let tween = self.clone_fresh();
        tween.set_modifier(Modifier::Reverse);
        tween
    }

    // ── Ticking ─────────────────────────────────────────────────────────

    /// Advance by an already time-scaled delta.
    pub(crate) fn advance(&self, dt: f32) {
        let step = self.inner.core.borrow_mut().step(dt);
        if let Some(step) = step {
            self.apply(step);
        }
    }

    /// Move a nested tween to `elapsed` on its owner's clock.
    pub(crate) fn seek(&self, elapsed: f32, forward: bool) {
        let step = self.inner.core.borrow_mut().seek(elapsed, forward);
        if let Some(step) = step {
            self.apply(step);
        }
    }

    fn apply(&self, step: Step) {
        if step.started {
            self.fire(Hook::Start);
            if self.has_ended() {
                return;
            }
            self.run_driver(|d| d.begin(step.origin));
        }
        if let Some(end) = step.iteration_end {
            self.evaluate(end);
            self.run_driver(|d| d.finish());
            if self.has_ended() {
                return;
            }
            if let Some(restart) = step.restart {
                self.run_driver(|d| d.begin(restart));
            }
        }
        self.evaluate(step.value);
        if self.has_ended() {
            return;
        }
        self.fire(Hook::Update);
        if step.finished {
            self.finish();
        }
    }

    fn evaluate(&self, value: f32) {
        self.run_driver(|d| d.evaluate(value));
    }

    /// Enter Completed without moving: the driver settles, OnComplete fires.
    pub(crate) fn finish(&self) {
        if !self.inner.core.borrow_mut().end(Outcome::Completed) {
            return;
        }
        log::debug!("tween {} completed", self.inner.id);
        self.run_driver(|d| d.finish());
        self.fire(Hook::Complete);
        self.dispose();
    }

    fn dispose(&self) {
        if !self.inner.core.borrow_mut().dispose() {
            return;
        }
        self.run_driver(|d| d.dispose());
        let group = self.inner.links.borrow().group.clone();
        if let (Some(key), Some(engine)) = (group, self.inner.engine.upgrade()) {
            engine.groups.borrow_mut().unregister(&key, self);
        }
    }

    fn resolve(&self) -> Result<(), TweenError> {
        let id = self.inner.id;
        match self.inner.driver.try_borrow_mut() {
            Ok(mut driver) => driver.on_play(id),
            Err(_) => Ok(()),
        }
    }

    fn run_driver(&self, f: impl FnOnce(&mut Box<dyn TweenDriver>) -> Vec<Deferred>) {
        let actions = match self.inner.driver.try_borrow_mut() {
            Ok(mut driver) => f(&mut driver),
            Err(_) => {
                log::warn!("tween {} re-entered its own evaluation; skipped", self.inner.id);
                return;
            }
        };
        run_deferred(self, actions);
    }

    fn kind(&self) -> &'static str {
        self.inner
            .driver
            .try_borrow()
            .map(|d| d.kind())
            .unwrap_or("busy")
    }

    fn register_group(&self, engine: &Shared) {
        let group = self.inner.links.borrow().group.clone();
        if let Some(key) = group {
            engine.groups.borrow_mut().register(&key, self);
        }
    }

    fn replace_group_members(&self, engine: Option<&Shared>) {
        let (group, replace) = {
            let links = self.inner.links.borrow();
            (links.group.clone(), links.replace)
        };
        if let (Some(key), Some(engine)) = (group, engine) {
            if replace != Replace::Keep {
                engine.apply_to_group(&key, replace);
            }
        }
    }
}

impl Links {
    fn reject(&mut self, err: TweenError) {
        log::warn!("tween configuration rejected: {}", err);
        if self.config_error.is_none() {
            self.config_error = Some(err);
        }
    }
}

impl PartialEq for Tween {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Tween {}

impl fmt::Debug for Tween {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.inner.core.borrow();
        f.debug_struct("Tween")
            .field("id", &self.inner.id)
            .field("kind", &self.kind())
            .field("state", &core.state())
            .field("elapsed", &core.elapsed())
            .field("settings", core.settings())
            .finish()
    }
}
