// systems/scheduler.rs
//
// Tween scheduler: advances every live tween once per host tick.
// Completely decoupled from what the tweens animate.
//
// Usage:
//   let tweener = Tweener::new();
//   tweener.to(Binding::cell(&alpha), 1.0, 0.3).set_easing(Easing::OutQuad).play()?;
//   tweener.tick(dt);  // once per frame

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::group::{GroupKey, GroupRegistry, Replace};
use crate::config::TweenerConfig;
use crate::core::state::TweenSettings;
use crate::core::time_scale::{sanitize, FixedTimeScale, TimeScaleProvider};
use crate::core::tween::Tween;

/// State shared between the tweener and the tweens it created.
pub(crate) struct Shared {
    pub(crate) config: TweenerConfig,
    live: RefCell<Vec<Tween>>,
    pub(crate) groups: RefCell<GroupRegistry>,
    time_scale: Rc<FixedTimeScale>,
}

impl Shared {
    pub(crate) fn schedule(&self, tween: Tween) {
        self.live.borrow_mut().push(tween);
    }

    /// Apply a replace policy to a snapshot of the group's members.
    pub(crate) fn apply_to_group(&self, key: &GroupKey, replace: Replace) -> usize {
        let members = self.groups.borrow_mut().snapshot(key);
        let count = members.len();
        for tween in members {
            match replace {
                Replace::Keep => {}
                Replace::Stop => tween.stop(),
                Replace::Complete => tween.complete(),
                Replace::Kill => tween.kill(),
            }
        }
        count
    }
}

/// Scheduler and factory for tweens.
///
/// Cheap to clone; clones drive the same set of tweens. Callbacks may hold
/// a clone to start new tweens or cancel groups while a tick is running:
/// tweens started from a callback advance from the next tick on.
#[derive(Clone)]
pub struct Tweener {
    shared: Rc<Shared>,
}

impl Default for Tweener {
    fn default() -> Self {
        Self::new()
    }
}

impl Tweener {
    pub fn new() -> Self {
        Self::with_config(TweenerConfig::default())
    }

    pub fn with_config(config: TweenerConfig) -> Self {
        let shared = Shared {
            live: RefCell::new(Vec::with_capacity(config.capacity)),
            groups: RefCell::new(GroupRegistry::default()),
            time_scale: FixedTimeScale::shared(config.time_scale),
            config,
        };
        Self {
            shared: Rc::new(shared),
        }
    }

    pub fn config(&self) -> &TweenerConfig {
        &self.shared.config
    }

    /// Global channel used by tweens without their own.
    pub fn time_scale(&self) -> Rc<FixedTimeScale> {
        self.shared.time_scale.clone()
    }

    pub fn set_time_scale(&self, scale: f32) {
        self.shared.time_scale.set(scale);
    }

    pub(crate) fn weak(&self) -> Weak<Shared> {
        Rc::downgrade(&self.shared)
    }

    /// Settings for a new tween, seeded with the configured defaults.
    pub(crate) fn settings(&self, duration: f32) -> TweenSettings {
        let config = &self.shared.config;
        let mut settings = TweenSettings::new(duration);
        settings.easing = config.default_easing;
        settings.modifier = config.default_modifier;
        settings.loop_mode = config.default_loop_mode;
        settings
    }

    /// Advance all live tweens by `dt` seconds.
    ///
    /// Iterates a snapshot of the live set; ended tweens are pruned after
    /// the pass.
    pub fn tick(&self, dt: f32) {
        let dt = self.shared.config.clamp_delta(dt);
        let global = sanitize(self.shared.time_scale.value());
        let snapshot: Vec<Tween> = self.shared.live.borrow().clone();

        for tween in &snapshot {
            if !tween.is_playing() {
                continue;
            }
            let scale = match tween.time_scale() {
                Some(channel) => sanitize(channel.value()),
                None => global,
            };
            tween.advance(dt * scale);
        }

        self.prune();
    }

    fn prune(&self) {
        self.shared.live.borrow_mut().retain(|t| !t.has_ended());
    }

    /// Number of live (scheduled or paused) tweens.
    pub fn active_count(&self) -> usize {
        self.shared.live.borrow().iter().filter(|t| !t.has_ended()).count()
    }

    /// Snapshot of the live tweens.
    pub fn tweens(&self) -> Vec<Tween> {
        self.shared
            .live
            .borrow()
            .iter()
            .filter(|t| !t.has_ended())
            .cloned()
            .collect()
    }

    // ── Group control ───────────────────────────────────────────────────

    /// Stop every member of the group. Returns how many were targeted.
    pub fn stop_group(&self, key: impl Into<GroupKey>) -> usize {
        let key = key.into();
        let count = self.shared.apply_to_group(&key, Replace::Stop);
        log::debug!("stop_group {:?}: {} tweens", key, count);
        count
    }

    /// Complete every member of the group.
    pub fn complete_group(&self, key: impl Into<GroupKey>) -> usize {
        let key = key.into();
        let count = self.shared.apply_to_group(&key, Replace::Complete);
        log::debug!("complete_group {:?}: {} tweens", key, count);
        count
    }

    /// Dispose every member of the group without callbacks.
    pub fn kill_group(&self, key: impl Into<GroupKey>) -> usize {
        let key = key.into();
        let count = self.shared.apply_to_group(&key, Replace::Kill);
        log::debug!("kill_group {:?}: {} tweens", key, count);
        count
    }

    pub fn pause_group(&self, key: impl Into<GroupKey>) -> usize {
        let members = self.shared.groups.borrow_mut().snapshot(&key.into());
        members.iter().for_each(Tween::pause);
        members.len()
    }

    pub fn resume_group(&self, key: impl Into<GroupKey>) -> usize {
        let members = self.shared.groups.borrow_mut().snapshot(&key.into());
        members.iter().for_each(Tween::resume);
        members.len()
    }

    /// Live members of the group.
    pub fn group_len(&self, key: impl Into<GroupKey>) -> usize {
        self.shared.groups.borrow().len(&key.into())
    }

    // ── Global control ──────────────────────────────────────────────────

    pub fn stop_all(&self) {
        for tween in self.tweens() {
            tween.stop();
        }
        self.prune();
    }

    pub fn complete_all(&self) {
        for tween in self.tweens() {
            tween.complete();
        }
        self.prune();
    }

    pub fn kill_all(&self) {
        for tween in self.tweens() {
            tween.kill();
        }
        self.prune();
        self.shared.groups.borrow_mut().clear();
    }

    pub fn pause_all(&self) {
        self.tweens().iter().for_each(Tween::pause);
    }

    pub fn resume_all(&self) {
        self.tweens().iter().for_each(Tween::resume);
    }
}

impl fmt::Debug for Tweener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tweener")
            .field("live", &self.active_count())
            .field("groups", &self.shared.groups.borrow().group_count())
            .field("time_scale", &self.shared.time_scale.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::{Outcome, TweenState};
    use crate::core::time_scale::ProxyTimeScale;
    use crate::kinds::binding::Binding;
    use std::cell::Cell;

    fn cell(value: f32) -> Rc<RefCell<f32>> {
        Rc::new(RefCell::new(value))
    }

    fn counter() -> (Rc<Cell<u32>>, impl FnMut() + 'static) {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        (count, move || c.set(c.get() + 1))
    }

    #[test]
    fn tick_drives_tween_to_completion() {
        let tweener = Tweener::new();
        let alpha = cell(0.0);
        let (completed, on_complete) = counter();
        tweener.to(Binding::cell(&alpha), 100.0, 1.0).on_complete(on_complete).play().unwrap();

        tweener.tick(0.5);
        assert!((*alpha.borrow() - 50.0).abs() < 0.01);
        assert_eq!(tweener.active_count(), 1);

        tweener.tick(0.5);
        assert_eq!(*alpha.borrow(), 100.0);
        assert_eq!(tweener.active_count(), 0);

        tweener.tick(0.5);
        assert_eq!(completed.get(), 1);
    }

    #[test]
    fn global_time_scale_slows_everything() {
        let tweener = Tweener::new();
        let value = cell(0.0);
        tweener.to(Binding::cell(&value), 1.0, 1.0).play().unwrap();

        tweener.set_time_scale(0.5);
        tweener.tick(0.5);
        assert!((*value.borrow() - 0.25).abs() < 1e-5);

        tweener.set_time_scale(0.0);
        tweener.tick(10.0);
        assert!((*value.borrow() - 0.25).abs() < 1e-5);
    }

    #[test]
    fn own_channel_runs_while_gameplay_is_frozen() {
        let tweener = Tweener::new();
        let ui = cell(0.0);
        let gameplay = cell(0.0);

        let ui_scale = FixedTimeScale::shared(1.0);
        let gameplay_scale = Rc::new(ProxyTimeScale::new(tweener.time_scale()));

        tweener.to(Binding::cell(&ui), 1.0, 1.0).set_time_scale(ui_scale).play().unwrap();
        tweener
            .to(Binding::cell(&gameplay), 1.0, 1.0)
            .set_time_scale(gameplay_scale.clone())
            .play()
            .unwrap();

        gameplay_scale.set_factor(0.0);
        tweener.tick(0.5);
        assert!((*ui.borrow() - 0.5).abs() < 1e-5);
        assert_eq!(*gameplay.borrow(), 0.0);

        gameplay_scale.set_factor(1.0);
        tweener.set_time_scale(2.0);
        tweener.tick(0.25);
        assert!((*gameplay.borrow() - 0.5).abs() < 1e-5);
        assert!((*ui.borrow() - 0.75).abs() < 1e-5);
    }

    #[test]
    fn stop_group_ends_members_without_completing() {
        let tweener = Tweener::new();
        let a = cell(0.0);
        let b = cell(0.0);
        let (completed, on_complete_a) = counter();
        let completed_b = completed.clone();

        let first = tweener
            .to(Binding::cell(&a), 1.0, 1.0)
            .set_group("panel")
            .on_complete(on_complete_a)
            .play()
            .unwrap();
        let second = tweener
            .to(Binding::cell(&b), 1.0, 2.0)
            .set_group("panel")
            .on_complete(move || completed_b.set(completed_b.get() + 1))
            .play()
            .unwrap();

        tweener.tick(0.25);
        assert_eq!(tweener.group_len("panel"), 2);
        assert_eq!(tweener.stop_group("panel"), 2);

        assert!(first.has_ended());
        assert!(second.has_ended());
        assert_eq!(first.outcome(), Some(Outcome::Stopped));
        assert_eq!(completed.get(), 0);
        assert_eq!(tweener.group_len("panel"), 0);

        tweener.tick(1.0);
        assert_eq!(completed.get(), 0);
        assert_eq!(tweener.active_count(), 0);
    }

    #[test]
    fn complete_group_snaps_values() {
        let tweener = Tweener::new();
        let a = cell(0.0);
        let (completed, on_complete) = counter();
        tweener
            .to(Binding::cell(&a), 5.0, 3.0)
            .set_group(9u64)
            .on_complete(on_complete)
            .play()
            .unwrap();

        tweener.tick(0.1);
        tweener.complete_group(9u64);
        assert_eq!(*a.borrow(), 5.0);
        assert_eq!(completed.get(), 1);
        assert_eq!(tweener.group_len(9u64), 0);
    }

    #[test]
    fn group_callbacks_may_start_new_members() {
        let tweener = Tweener::new();
        let a = cell(0.0);
        let restarted = Rc::new(RefCell::new(None));

        let spawner = tweener.clone();
        let target = a.clone();
        let slot = restarted.clone();
        tweener
            .to(Binding::cell(&a), 1.0, 1.0)
            .set_group("fx")
            .on_stop(move || {
                let tween = spawner.to(Binding::cell(&target), 0.0, 1.0).set_group("fx").play().unwrap();
                *slot.borrow_mut() = Some(tween);
            })
            .play()
            .unwrap();

        assert_eq!(tweener.stop_group("fx"), 1);
        let replacement = restarted.borrow().clone().unwrap();
        assert_eq!(replacement.state(), TweenState::Scheduled);
        assert_eq!(tweener.group_len("fx"), 1);
    }

    #[test]
    fn replace_policy_cancels_stale_writer() {
        let tweener = Tweener::new();
        let alpha = cell(1.0);
        let (stopped, on_stop) = counter();

        let fade_out = tweener
            .to(Binding::cell(&alpha), 0.0, 1.0)
            .set_group("panel")
            .on_stop(on_stop)
            .play()
            .unwrap();
        tweener.tick(0.5);

        let fade_in = tweener
            .to(Binding::cell(&alpha), 1.0, 1.0)
            .set_group("panel")
            .set_group_replace(Replace::Stop)
            .play()
            .unwrap();

        assert!(fade_out.has_ended());
        assert_eq!(stopped.get(), 1);
        assert_eq!(tweener.group_len("panel"), 1);

        tweener.tick(1.0);
        assert_eq!(*alpha.borrow(), 1.0);
        assert!(fade_in.has_ended());
    }

    #[test]
    fn tweens_played_from_callbacks_start_next_tick() {
        let tweener = Tweener::new();
        let a = cell(0.0);
        let b = cell(0.0);

        let spawner = tweener.clone();
        let follow_up = b.clone();
        tweener
            .to(Binding::cell(&a), 1.0, 0.5)
            .on_complete(move || {
                spawner.to(Binding::cell(&follow_up), 1.0, 1.0).play().unwrap();
            })
            .play()
            .unwrap();

        tweener.tick(0.5);
        assert_eq!(*a.borrow(), 1.0);
        assert_eq!(*b.borrow(), 0.0);
        assert_eq!(tweener.active_count(), 1);

        tweener.tick(0.5);
        assert!((*b.borrow() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn pause_and_resume_group() {
        let tweener = Tweener::new();
        let a = cell(0.0);
        let tween = tweener.to(Binding::cell(&a), 1.0, 1.0).set_group("hud").play().unwrap();

        assert_eq!(tweener.pause_group("hud"), 1);
        tweener.tick(0.5);
        assert_eq!(*a.borrow(), 0.0);
        assert!(tween.is_paused());

        tweener.resume_group("hud");
        tweener.tick(0.5);
        assert!((*a.borrow() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn stop_all_clears_live_set() {
        let tweener = Tweener::new();
        let a = cell(0.0);
        tweener.to(Binding::cell(&a), 1.0, 1.0).play().unwrap();
        tweener.to(Binding::cell(&a), 2.0, 1.0).set_loops(0, Default::default()).play().unwrap();
        assert_eq!(tweener.active_count(), 2);
        tweener.stop_all();
        assert_eq!(tweener.active_count(), 0);
    }

    #[test]
    fn config_defaults_seed_new_tweens() {
        let config = TweenerConfig {
            default_easing: crate::curves::Easing::OutBack,
            ..TweenerConfig::default()
        };
        let tweener = Tweener::with_config(config);
        let a = cell(0.0);
        let tween = tweener.to(Binding::cell(&a), 1.0, 1.0);
        assert_eq!(tween.easing(), crate::curves::Easing::OutBack);
    }

    #[test]
    fn max_delta_caps_frame_spikes() {
        let tweener = Tweener::with_config(TweenerConfig {
            max_delta: 0.1,
            ..TweenerConfig::default()
        });
        let a = cell(0.0);
        tweener.to(Binding::cell(&a), 1.0, 1.0).play().unwrap();
        tweener.tick(5.0);
        assert!((*a.borrow() - 0.1).abs() < 1e-5);
    }

    #[test]
    fn complete_all_snaps_every_live_tween() {
        let tweener = Tweener::new();
        let a = cell(0.0);
        let b = cell(0.0);
        let (completed, on_complete) = counter();
        tweener.to(Binding::cell(&a), 1.0, 1.0).on_complete(on_complete).play().unwrap();
        tweener.to(Binding::cell(&b), 3.0, 2.0).play().unwrap();
        tweener.tick(0.25);

        tweener.complete_all();
        assert_eq!(*a.borrow(), 1.0);
        assert_eq!(*b.borrow(), 3.0);
        assert_eq!(completed.get(), 1);
        assert_eq!(tweener.active_count(), 0);
    }

    #[test]
    fn kill_all_ends_silently_and_forgets_groups() {
        let tweener = Tweener::new();
        let a = cell(0.0);
        let (completed, on_complete) = counter();
        let (stopped, on_stop) = counter();
        let tween = tweener
            .to(Binding::cell(&a), 1.0, 1.0)
            .set_group("hud")
            .on_complete(on_complete)
            .on_stop(on_stop)
            .play()
            .unwrap();
        tweener.tick(0.5);

        tweener.kill_all();
        assert_eq!(tween.outcome(), Some(Outcome::Killed));
        assert_eq!(completed.get() + stopped.get(), 0);
        assert_eq!(tweener.active_count(), 0);
        assert_eq!(tweener.group_len("hud"), 0);

        tweener.tick(1.0);
        assert!((*a.borrow() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn pause_all_holds_until_resume_all() {
        let tweener = Tweener::new();
        let a = cell(0.0);
        let b = cell(0.0);
        tweener.to(Binding::cell(&a), 1.0, 1.0).play().unwrap();
        tweener.to(Binding::cell(&b), 1.0, 1.0).set_group("fx").play().unwrap();

        tweener.pause_all();
        tweener.tick(0.5);
        assert_eq!(*a.borrow(), 0.0);
        assert_eq!(*b.borrow(), 0.0);
        assert_eq!(tweener.active_count(), 2);

        tweener.resume_all();
        tweener.tick(0.5);
        assert!((*a.borrow() - 0.5).abs() < 1e-5);
        assert!((*b.borrow() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn kill_group_leaves_other_groups_running() {
        let tweener = Tweener::new();
        let a = cell(0.0);
        let b = cell(0.0);
        let (stopped, on_stop) = counter();
        let doomed = tweener
            .to(Binding::cell(&a), 1.0, 1.0)
            .set_group("enemy")
            .on_stop(on_stop)
            .play()
            .unwrap();
        let kept = tweener.to(Binding::cell(&b), 1.0, 1.0).set_group("hud").play().unwrap();

        assert_eq!(tweener.kill_group("enemy"), 1);
        assert_eq!(doomed.outcome(), Some(Outcome::Killed));
        assert_eq!(stopped.get(), 0);
        assert_eq!(tweener.group_len("enemy"), 0);

        tweener.tick(1.0);
        assert_eq!(*a.borrow(), 0.0);
        assert_eq!(kept.outcome(), Some(Outcome::Completed));
    }

    #[test]
    fn replace_complete_snaps_previous_member() {
        let tweener = Tweener::new();
        let x = cell(0.0);
        let (completed, on_complete) = counter();
        let slide = tweener
            .to(Binding::cell(&x), 10.0, 1.0)
            .set_group("slide")
            .on_complete(on_complete)
            .play()
            .unwrap();
        tweener.tick(0.5);

        let back = tweener
            .to(Binding::cell(&x), 0.0, 1.0)
            .set_group("slide")
            .set_group_replace(Replace::Complete)
            .play()
            .unwrap();
        assert_eq!(slide.outcome(), Some(Outcome::Completed));
        assert_eq!(completed.get(), 1);
        assert_eq!(*x.borrow(), 10.0);

        // The newcomer resolved its start after the snap.
        tweener.tick(0.5);
        assert!((*x.borrow() - 5.0).abs() < 1e-4);
        assert_eq!(tweener.group_len("slide"), 1);
        assert!(back.is_playing());
    }

    #[test]
    fn replace_kill_drops_previous_member_silently() {
        let tweener = Tweener::new();
        let x = cell(0.0);
        let (completed, on_complete) = counter();
        let (stopped, on_stop) = counter();
        let first = tweener
            .to(Binding::cell(&x), 10.0, 1.0)
            .set_group("slide")
            .on_complete(on_complete)
            .on_stop(on_stop)
            .play()
            .unwrap();
        tweener.tick(0.5);

        tweener
            .to(Binding::cell(&x), 0.0, 1.0)
            .set_group("slide")
            .set_group_replace(Replace::Kill)
            .play()
            .unwrap();
        assert_eq!(first.outcome(), Some(Outcome::Killed));
        assert_eq!(completed.get() + stopped.get(), 0);
        assert!((*x.borrow() - 5.0).abs() < 1e-4);
        assert_eq!(tweener.group_len("slide"), 1);
    }
}
