// systems/group.rs
//
// Group registry: arbitrary key → set of live tweens, held weakly.
// Bulk operations iterate a snapshot so callbacks may dispose members or
// register new ones mid-iteration.

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::core::tween::{Tween, TweenCell};

/// Key of a cancellation / bulk-control domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Id(u64),
    Name(String),
    /// Identity of an owning object, see [`GroupKey::of`].
    Ptr(usize),
}

impl GroupKey {
    /// Key derived from the identity of a shared owner (e.g. a UI panel).
    pub fn of<T: ?Sized>(owner: &Rc<T>) -> Self {
        GroupKey::Ptr(Rc::as_ptr(owner).cast::<()>() as usize)
    }
}

impl From<u64> for GroupKey {
    fn from(id: u64) -> Self {
        GroupKey::Id(id)
    }
}

impl From<&str> for GroupKey {
    fn from(name: &str) -> Self {
        GroupKey::Name(name.to_string())
    }
}

impl From<String> for GroupKey {
    fn from(name: String) -> Self {
        GroupKey::Name(name)
    }
}

/// What a newly played tween does to the members already in its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Replace {
    /// Leave them running.
    #[default]
    Keep,
    /// Stop them (OnStop, no OnComplete).
    Stop,
    /// Skip them to their end (OnComplete).
    Complete,
    /// Dispose them silently.
    Kill,
}

#[derive(Default)]
pub(crate) struct GroupRegistry {
    members: HashMap<GroupKey, Vec<Weak<TweenCell>>>,
}

impl GroupRegistry {
    /// Idempotent. Returns true if the tween was added.
    pub fn register(&mut self, key: &GroupKey, tween: &Tween) -> bool {
        let members = self.members.entry(key.clone()).or_default();
        if members.iter().any(|m| tween.ptr_eq_cell(m)) {
            return false;
        }
        members.push(tween.downgrade());
        true
    }

    /// Idempotent. Returns true if the tween was a member.
    pub fn unregister(&mut self, key: &GroupKey, tween: &Tween) -> bool {
        let Some(members) = self.members.get_mut(key) else {
            return false;
        };
        let before = members.len();
        members.retain(|m| !tween.ptr_eq_cell(m) && m.strong_count() > 0);
        let removed = members.len() < before;
        if members.is_empty() {
            self.members.remove(key);
        }
        removed
    }

    /// Strong handles to the current members, dead entries pruned.
    pub fn snapshot(&mut self, key: &GroupKey) -> Vec<Tween> {
        let Some(members) = self.members.get_mut(key) else {
            return Vec::new();
        };
        members.retain(|m| m.strong_count() > 0);
        let live: Vec<Tween> = members.iter().filter_map(|m| m.upgrade()).map(Tween::from_cell).collect();
        if members.is_empty() {
            self.members.remove(key);
        }
        live
    }

    pub fn len(&self, key: &GroupKey) -> usize {
        self.members
            .get(key)
            .map(|m| m.iter().filter(|w| w.strong_count() > 0).count())
            .unwrap_or(0)
    }

    pub fn group_count(&self) -> usize {
        self.members.len()
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tweener;

    #[test]
    fn keys_from_values() {
        assert_eq!(GroupKey::from(7u64), GroupKey::Id(7));
        assert_eq!(GroupKey::from("panel"), GroupKey::Name("panel".into()));

        let a = Rc::new(1);
        let b = Rc::new(1);
        assert_eq!(GroupKey::of(&a), GroupKey::of(&a.clone()));
        assert_ne!(GroupKey::of(&a), GroupKey::of(&b));
    }

    #[test]
    fn register_is_idempotent() {
        let tweener = Tweener::new();
        let tween = tweener.value(0.0, 1.0, 1.0, |_| {});
        let key = GroupKey::from("fade");
        let mut registry = GroupRegistry::default();

        assert!(registry.register(&key, &tween));
        assert!(!registry.register(&key, &tween));
        assert_eq!(registry.len(&key), 1);

        assert!(registry.unregister(&key, &tween));
        assert!(!registry.unregister(&key, &tween));
        assert_eq!(registry.len(&key), 0);
        assert_eq!(registry.group_count(), 0);
    }

    #[test]
    fn dropped_tweens_leave_the_snapshot() {
        let tweener = Tweener::new();
        let key = GroupKey::from(1u64);
        let mut registry = GroupRegistry::default();
        {
            let tween = tweener.value(0.0, 1.0, 1.0, |_| {});
            registry.register(&key, &tween);
        }
        assert!(registry.snapshot(&key).is_empty());
        assert_eq!(registry.group_count(), 0);
    }
}
