//! Exclusive ownership of the map's ambient drag/zoom gestures.
//!
//! A tool that needs the pointer to itself acquires a [`GestureGuard`].
//! Dropping the guard releases ownership, whatever path the tool leaves by.
//! The surface flag itself is written by [`GestureLock::reconcile`], which
//! the controller runs after every event, so the flag always matches the
//! current owner.

use std::cell::Cell;
use std::rc::Rc;

use crate::error::TrailError;
use crate::message::Tool;
use crate::surface::MapSurface;

/// Shared record of which tool currently owns the gestures.
#[derive(Debug, Default)]
pub struct GestureLock {
    holder: Rc<Cell<Option<Tool>>>,
    /// Last value written to the surface; `None` until the first reconcile.
    applied: Option<bool>,
}

impl GestureLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership for `tool`. Fails if another tool already owns it.
    pub fn try_acquire(&self, tool: Tool) -> Result<GestureGuard, TrailError> {
        match self.holder.get() {
            Some(current) => {
                log::warn!("Gestures already held by {current:?}, {tool:?} refused");
                Err(TrailError::ToolBusy(current))
            }
            None => {
                self.holder.set(Some(tool));
                log::debug!("🔒 Gestures acquired by {tool:?}");
                Ok(GestureGuard {
                    holder: Rc::clone(&self.holder),
                    tool,
                })
            }
        }
    }

    pub fn holder(&self) -> Option<Tool> {
        self.holder.get()
    }

    /// Whether ambient gestures should currently be enabled.
    pub fn gestures_enabled(&self) -> bool {
        self.holder.get().is_none()
    }

    /// Push the current state to the surface if it changed.
    pub fn reconcile(&mut self, surface: &mut dyn MapSurface) {
        let enabled = self.gestures_enabled();
        if self.applied != Some(enabled) {
            surface.set_gestures_enabled(enabled);
            self.applied = Some(enabled);
        }
    }
}

/// Proof of gesture ownership. Released on drop.
#[derive(Debug)]
pub struct GestureGuard {
    holder: Rc<Cell<Option<Tool>>>,
    tool: Tool,
}

impl GestureGuard {
    pub fn tool(&self) -> Tool {
        self.tool
    }
}

impl Drop for GestureGuard {
    fn drop(&mut self) {
        if self.holder.get() == Some(self.tool) {
            self.holder.set(None);
            log::debug!("🔓 Gestures released by {:?}", self.tool);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_releases_on_drop() {
        let lock = GestureLock::new();
        {
            let guard = lock.try_acquire(Tool::Freehand).expect("free");
            assert_eq!(guard.tool(), Tool::Freehand);
            assert!(!lock.gestures_enabled());
        }
        assert!(lock.gestures_enabled());
        assert_eq!(lock.holder(), None);
    }

    #[test]
    fn test_second_acquire_is_refused() {
        let lock = GestureLock::new();
        let _guard = lock.try_acquire(Tool::Freehand).expect("free");
        assert!(matches!(
            lock.try_acquire(Tool::Measure),
            Err(TrailError::ToolBusy(Tool::Freehand))
        ));
        assert_eq!(lock.holder(), Some(Tool::Freehand));
    }
}
