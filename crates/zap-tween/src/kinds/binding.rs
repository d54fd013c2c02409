// kinds/binding.rs
//
// Target contract: how a tween reads and writes the value it animates.
// The engine knows nothing about game objects; a binding is a getter/setter
// pair. `get` returning None or `set` returning false means the target is
// gone, and the tween treats the write as a no-op.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Getter/setter pair over some external value.
pub struct Binding<T> {
    getter: Rc<dyn Fn() -> Option<T>>,
    setter: Rc<dyn Fn(T) -> bool>,
}

impl<T: Clone + 'static> Binding<T> {
    pub fn new(get: impl Fn() -> Option<T> + 'static, set: impl Fn(T) -> bool + 'static) -> Self {
        Self {
            getter: Rc::new(get),
            setter: Rc::new(set),
        }
    }

    /// Bind to a shared cell. Held weakly: dropping the cell makes the
    /// binding stale rather than keeping the value alive.
    pub fn cell(cell: &Rc<RefCell<T>>) -> Self {
        let read = Rc::downgrade(cell);
        let write = read.clone();
        Self::new(
            move || {
                let cell = read.upgrade()?;
                let value = cell.try_borrow().ok()?.clone();
                Some(value)
            },
            move |value| write_cell(&write, |slot| *slot = value),
        )
    }

    /// Bind to one field of a shared owner, e.g. `|panel| &mut panel.alpha`.
    pub fn field<S: 'static>(owner: &Rc<RefCell<S>>, project: fn(&mut S) -> &mut T) -> Self {
        let read = Rc::downgrade(owner);
        let write = read.clone();
        Self::new(
            move || {
                let owner = read.upgrade()?;
                let mut guard = owner.try_borrow_mut().ok()?;
                let value = project(&mut *guard).clone();
                Some(value)
            },
            move |value| write_cell(&write, |owner| *project(owner) = value),
        )
    }

    /// Write-only binding into a closure. Reads always come back empty, so
    /// sinks only suit tweens with fixed start and end values.
    pub fn sink(f: impl FnMut(T) + 'static) -> Self {
        let f = RefCell::new(f);
        Self::new(
            || None,
            move |value| match f.try_borrow_mut() {
                Ok(mut f) => {
                    (&mut *f)(value);
                    true
                }
                Err(_) => false,
            },
        )
    }

    pub fn get(&self) -> Option<T> {
        (self.getter)()
    }

    /// Returns false when the target is gone (or busy).
    pub fn set(&self, value: T) -> bool {
        (self.setter)(value)
    }
}

fn write_cell<S>(cell: &Weak<RefCell<S>>, write: impl FnOnce(&mut S)) -> bool {
    let Some(cell) = cell.upgrade() else {
        return false;
    };
    let Ok(mut guard) = cell.try_borrow_mut() else {
        return false;
    };
    write(&mut *guard);
    true
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            getter: self.getter.clone(),
            setter: self.setter.clone(),
        }
    }
}

impl<T> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Binding")
    }
}
