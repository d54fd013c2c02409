//! Sequences: tweens and callbacks composed on one virtual clock.
//!
//! A [`Sequence`] is itself a tween (it derefs to [`Tween`]), so it can be
//! grouped, time-scaled, looped and nested in other sequences. It owns its
//! children: an added tween is marked nested and is only ever moved by the
//! sequence, on the sequence's clock.
//!
//! Each evaluation moves the clock to `v * duration` and walks the entries in
//! offset order. The clock may run either way (yoyo loops, reversed
//! playback, overshooting easings). Callback entries fire once per pass when
//! the clock crosses them, all of them even when a single tick crosses
//! several. Children are pure functions of the clock: each one is sought to
//! its local time, entered from its end when the clock comes from above.
//! Every new loop iteration replays the timeline from fresh copies of its
//! children.

use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use crate::core::state::{TweenSettings, TweenState};
use crate::core::tween::{callback, Callback, Deferred, Tween, TweenDriver};
use crate::error::TweenError;
use crate::systems::scheduler::Shared;

enum Entry {
    Child { offset: f32, span: f32, tween: Tween },
    Call { offset: f32, callback: Callback, fired: bool },
}

impl Entry {
    fn offset(&self) -> f32 {
        match self {
            Entry::Child { offset, .. } | Entry::Call { offset, .. } => *offset,
        }
    }

    fn span(&self) -> f32 {
        match self {
            Entry::Child { span, .. } => *span,
            Entry::Call { .. } => 0.0,
        }
    }

    /// Played or fired since the last replay.
    fn is_spent(&self) -> bool {
        match self {
            Entry::Child { tween, .. } => tween.state() != TweenState::Idle,
            Entry::Call { fired, .. } => *fired,
        }
    }
}

#[derive(Default)]
struct Timeline {
    /// Sorted by offset; equal offsets keep insertion order.
    entries: Vec<Entry>,
    duration: f32,
    /// Offset of the last added entry, where `join` places the next one.
    last_start: f32,
    clock: f32,
}

impl Timeline {
    fn add(&mut self, entry: Entry) {
        let offset = entry.offset();
        let span = entry.span();
        let at = self.entries.partition_point(|e| e.offset() <= offset);
        self.entries.insert(at, entry);
        self.last_start = offset;
        self.duration = self.duration.max(offset + span);
    }

    /// Start a pass at eased value `origin`. After the first pass, played
    /// children are swapped for fresh copies and callbacks are re-armed.
    fn begin(&mut self, origin: f32) -> Vec<Deferred> {
        let mut actions = Vec::new();
        if self.entries.iter().any(Entry::is_spent) {
            for entry in &mut self.entries {
                match entry {
                    Entry::Call { fired, .. } => *fired = false,
                    Entry::Child { tween, .. } => {
                        if tween.state() != TweenState::Idle {
                            let fresh = tween.clone_for_replay();
                            actions.push(Deferred::Kill(std::mem::replace(tween, fresh)));
                        }
                    }
                }
            }
        }
        self.clock = origin * self.duration;
        actions
    }

    fn advance_to(&mut self, target: f32) -> Vec<Deferred> {
        let from = self.clock;
        let forward = target >= from;
        let (low, high) = if forward { (from, target) } else { (target, from) };
        let mut actions = Vec::new();
        for entry in &mut self.entries {
            match entry {
                Entry::Call { offset, callback, fired } => {
                    if !*fired && low <= *offset && *offset <= high {
                        *fired = true;
                        actions.push(Deferred::Invoke(callback.clone()));
                    }
                }
                Entry::Child { offset, span, tween } => {
                    if tween.has_ended() {
                        continue;
                    }
                    // Idle children join once the clock is inside their
                    // window; coming from above, strictly inside.
                    let reached = if forward { *offset <= high } else { *offset < high };
                    let idle = tween.state() == TweenState::Idle;
                    if idle && !(reached && *offset + *span >= low) {
                        continue;
                    }
                    let mut elapsed = (target - *offset).max(0.0);
                    if !forward {
                        elapsed = elapsed.max(tween.delay());
                    }
                    actions.push(Deferred::Seek {
                        tween: tween.clone(),
                        elapsed,
                        forward,
                    });
                }
            }
        }
        self.clock = target;
        actions
    }

    /// End of a pass: unfired callbacks fire, untouched children run to
    /// their end and children left mid-way complete where they rest.
    fn finish(&mut self) -> Vec<Deferred> {
        let mut actions = Vec::new();
        for entry in &mut self.entries {
            match entry {
                Entry::Call { callback, fired, .. } => {
                    if !*fired {
                        *fired = true;
                        actions.push(Deferred::Invoke(callback.clone()));
                    }
                }
                Entry::Child { tween, .. } => match tween.state() {
                    TweenState::Idle => actions.push(Deferred::Complete(tween.clone())),
                    state if !state.has_ended() => actions.push(Deferred::Finish(tween.clone())),
                    _ => {}
                },
            }
        }
        actions
    }

    fn stop(&mut self) -> Vec<Deferred> {
        self.children()
            .filter(|t| !t.has_ended())
            .map(|t| {
                if t.state() == TweenState::Idle {
                    Deferred::Kill(t.clone())
                } else {
                    Deferred::Stop(t.clone())
                }
            })
            .collect()
    }

    fn dispose(&mut self) -> Vec<Deferred> {
        self.children()
            .filter(|t| !t.has_ended())
            .map(|t| Deferred::Kill(t.clone()))
            .collect()
    }

    fn children(&self) -> impl Iterator<Item = &Tween> {
        self.entries.iter().filter_map(|e| match e {
            Entry::Child { tween, .. } => Some(tween),
            Entry::Call { .. } => None,
        })
    }

    /// Copy with fresh children and re-armed callbacks.
    fn copy(&self, replay: bool) -> Timeline {
        let entries = self
            .entries
            .iter()
            .map(|entry| match entry {
                Entry::Child { offset, span, tween } => {
                    let fresh = if replay {
                        tween.clone_for_replay()
                    } else {
                        let fresh = tween.clone_fresh();
                        fresh.set_nested();
                        fresh
                    };
                    Entry::Child {
                        offset: *offset,
                        span: *span,
                        tween: fresh,
                    }
                }
                Entry::Call { offset, callback, .. } => Entry::Call {
                    offset: *offset,
                    callback: callback.clone(),
                    fired: false,
                },
            })
            .collect();
        Timeline {
            entries,
            duration: self.duration,
            last_start: self.last_start,
            clock: 0.0,
        }
    }
}

struct SequenceDriver {
    timeline: Rc<RefCell<Timeline>>,
}

impl SequenceDriver {
    fn with_timeline(&self, f: impl FnOnce(&mut Timeline) -> Vec<Deferred>) -> Vec<Deferred> {
        match self.timeline.try_borrow_mut() {
            Ok(mut timeline) => f(&mut timeline),
            Err(_) => {
                log::warn!("sequence timeline re-entered; skipped");
                Vec::new()
            }
        }
    }

    fn copy(&self, replay: bool) -> Box<dyn TweenDriver> {
        let timeline = self.timeline.borrow().copy(replay);
        Box::new(SequenceDriver {
            timeline: Rc::new(RefCell::new(timeline)),
        })
    }
}

impl TweenDriver for SequenceDriver {
    fn kind(&self) -> &'static str {
        "sequence"
    }

    fn begin(&mut self, origin: f32) -> Vec<Deferred> {
        self.with_timeline(|timeline| timeline.begin(origin))
    }

    fn evaluate(&mut self, v: f32) -> Vec<Deferred> {
        self.with_timeline(|timeline| {
            let target = v * timeline.duration;
            timeline.advance_to(target)
        })
    }

    fn finish(&mut self) -> Vec<Deferred> {
        self.with_timeline(Timeline::finish)
    }

    fn stop(&mut self) -> Vec<Deferred> {
        self.with_timeline(Timeline::stop)
    }

    fn dispose(&mut self) -> Vec<Deferred> {
        self.with_timeline(Timeline::dispose)
    }

    fn clone_driver(&self) -> Box<dyn TweenDriver> {
        self.copy(false)
    }

    fn replay_driver(&self) -> Box<dyn TweenDriver> {
        self.copy(true)
    }
}

/// A tween that drives a timeline of child tweens and callbacks.
///
/// ```ignore
/// let intro = tweener.sequence();
/// intro
///     .append(&tweener.to(Binding::cell(&alpha), 1.0, 0.3))?
///     .join(&tweener.by(Binding::cell(&y), -20.0, 0.3))?
///     .append_interval(0.5)?
///     .append_callback(|| log::info!("intro done"))?;
/// intro.set_group("hud").play()?;
/// ```
pub struct Sequence {
    tween: Tween,
    timeline: Rc<RefCell<Timeline>>,
}

impl Sequence {
    pub(crate) fn new(engine: Weak<Shared>) -> Self {
        let timeline = Rc::new(RefCell::new(Timeline::default()));
        let driver = SequenceDriver {
            timeline: timeline.clone(),
        };
        let tween = Tween::new_unchecked(engine, TweenSettings::new(0.0), Box::new(driver));
        Self { tween, timeline }
    }

    pub fn tween(&self) -> &Tween {
        &self.tween
    }

    pub fn into_tween(self) -> Tween {
        self.tween
    }

    /// Number of entries, callbacks included.
    pub fn len(&self) -> usize {
        self.timeline.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeline.borrow().entries.is_empty()
    }

    /// Place `child` at the current end of the sequence.
    pub fn append(&self, child: &Tween) -> Result<&Self, TweenError> {
        let at = self.timeline.borrow().duration;
        self.add_child(at, child)
    }

    /// Place `child` at the start of the previously added entry.
    pub fn join(&self, child: &Tween) -> Result<&Self, TweenError> {
        let at = self.timeline.borrow().last_start;
        self.add_child(at, child)
    }

    /// Place `child` at an absolute offset in seconds.
    pub fn insert(&self, at: f32, child: &Tween) -> Result<&Self, TweenError> {
        check_offset(at)?;
        self.add_child(at, child)
    }

    /// Extend the sequence by `secs` of nothing.
    pub fn append_interval(&self, secs: f32) -> Result<&Self, TweenError> {
        self.check_open()?;
        check_offset(secs)?;
        let duration = {
            let mut timeline = self.timeline.borrow_mut();
            timeline.duration += secs;
            timeline.duration
        };
        self.tween.set_duration(duration);
        Ok(self)
    }

    /// Fire `f` when the clock reaches the current end of the sequence.
    pub fn append_callback(&self, f: impl FnMut() + 'static) -> Result<&Self, TweenError> {
        let at = self.timeline.borrow().duration;
        self.add_callback(at, f)
    }

    /// Fire `f` when the clock reaches `at` seconds.
    pub fn insert_callback(&self, at: f32, f: impl FnMut() + 'static) -> Result<&Self, TweenError> {
        check_offset(at)?;
        self.add_callback(at, f)
    }

    fn add_child(&self, offset: f32, child: &Tween) -> Result<&Self, TweenError> {
        self.check_open()?;
        let span = self.adopt(child)?;
        child.set_nested();
        let duration = {
            let mut timeline = self.timeline.borrow_mut();
            timeline.add(Entry::Child {
                offset,
                span,
                tween: child.clone(),
            });
            timeline.duration
        };
        self.tween.set_duration(duration);
        log::trace!("sequence {} adopted {} at {:.3}s", self.tween.id(), child.id(), offset);
        Ok(self)
    }

    fn add_callback(&self, offset: f32, f: impl FnMut() + 'static) -> Result<&Self, TweenError> {
        self.check_open()?;
        let entry = Entry::Call {
            offset,
            callback: callback(f),
            fired: false,
        };
        let duration = {
            let mut timeline = self.timeline.borrow_mut();
            timeline.add(entry);
            timeline.duration
        };
        self.tween.set_duration(duration);
        Ok(self)
    }

    fn check_open(&self) -> Result<(), TweenError> {
        let id = self.tween.id();
        let state = self.tween.state();
        if state != TweenState::Idle {
            return Err(TweenError::Locked { id, state });
        }
        if self.tween.is_nested() {
            return Err(TweenError::Nested(id));
        }
        Ok(())
    }

    /// Validate a prospective child and return its span.
    fn adopt(&self, child: &Tween) -> Result<f32, TweenError> {
        let id = child.id();
        if child == &self.tween || child.is_nested() {
            return Err(TweenError::Nested(id));
        }
        if child.state() != TweenState::Idle {
            return Err(TweenError::ChildNotIdle(id));
        }
        if let Some(err) = child.config_error() {
            return Err(err);
        }
        child.total_duration().ok_or(TweenError::InfiniteChild(id))
    }
}

fn check_offset(at: f32) -> Result<(), TweenError> {
    if at.is_finite() && at >= 0.0 {
        Ok(())
    } else {
        Err(TweenError::InvalidOffset(at))
    }
}

impl Deref for Sequence {
    type Target = Tween;

    fn deref(&self) -> &Tween {
        &self.tween
    }
}

impl AsRef<Tween> for Sequence {
    fn as_ref(&self) -> &Tween {
        &self.tween
    }
}

impl From<Sequence> for Tween {
    fn from(sequence: Sequence) -> Tween {
        sequence.tween
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("tween", &self.tween)
            .field("entries", &self.len())
            .finish()
    }
}
