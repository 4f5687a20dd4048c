//! Undo/redo of feature mutations.
//!
//! Commands record confirmed mutations. Undoing or redoing one is itself a
//! backend request, so a command leaves its stack when the request starts
//! and is pushed onto the opposite stack only once the request succeeds
//! (or put back where it came from if it fails).

use crate::model::{Feature, FeatureId, FeatureRef};

/// A confirmed mutation that can be reversed.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// A feature was created
    Create {
        /// The feature as the backend returned it
        feature: Feature,
    },
    /// A feature was deleted
    Delete {
        /// The feature as it was before deletion (stored for undo)
        feature: Feature,
    },
    /// A feature was edited
    Update {
        /// State before the edit
        before: Feature,
        /// State after the edit
        after: Feature,
    },
}

impl Command {
    /// Menu text, e.g. `Delete route 'Ridge loop'`.
    pub fn description(&self) -> String {
        match self {
            Command::Create { feature } => format!("Add {} '{}'", feature.kind(), feature.name()),
            Command::Delete { feature } => {
                format!("Delete {} '{}'", feature.kind(), feature.name())
            }
            Command::Update { after, .. } => format!("Edit {} '{}'", after.kind(), after.name()),
        }
    }

    /// The feature this command is about.
    pub fn target(&self) -> FeatureRef {
        match self {
            Command::Create { feature } | Command::Delete { feature } => feature.feature_ref(),
            Command::Update { after, .. } => after.feature_ref(),
        }
    }

    /// Point the command at a feature's new id after it was recreated.
    fn remap(&mut self, from: &FeatureId, to: &FeatureId) {
        let features: Vec<&mut Feature> = match self {
            Command::Create { feature } | Command::Delete { feature } => vec![feature],
            Command::Update { before, after } => vec![before, after],
        };
        for feature in features {
            let id = match feature {
                Feature::Marker(m) => &mut m.id,
                Feature::Route(r) => &mut r.id,
            };
            if *id == *from {
                *id = to.clone();
            }
        }
    }
}

/// Bounded undo and redo stacks of feature commands.
///
/// Recording a new user mutation empties the redo side.
#[derive(Debug, Clone)]
pub struct UndoStack {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    /// Oldest undo entries are dropped beyond this
    max_history: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::with_max_history(crate::constants::DEFAULT_MAX_HISTORY)
    }
}

impl UndoStack {
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_history,
        }
    }

    /// Record a new user mutation.
    pub fn push(&mut self, command: Command) {
        log::debug!("📝 History: recorded '{}'", command.description());
        self.redo_stack.clear();
        self.push_undo(command);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Take the next command to undo.
    pub fn pop_undo(&mut self) -> Option<Command> {
        let cmd = self.undo_stack.pop()?;
        log::debug!("⏪ Undoing '{}'", cmd.description());
        Some(cmd)
    }

    /// Take the next command to redo.
    pub fn pop_redo(&mut self) -> Option<Command> {
        let cmd = self.redo_stack.pop()?;
        log::debug!("⏩ Redoing '{}'", cmd.description());
        Some(cmd)
    }

    /// An undo went through; the command can now be redone.
    pub fn undone(&mut self, command: Command) {
        self.redo_stack.push(command);
    }

    /// A redo went through; the command can be undone again.
    pub fn redone(&mut self, command: Command) {
        self.push_undo(command);
    }

    /// An undo failed; put the command back.
    pub fn restore_undo(&mut self, command: Command) {
        self.push_undo(command);
    }

    /// A redo failed; put the command back.
    pub fn restore_redo(&mut self, command: Command) {
        self.redo_stack.push(command);
    }

    /// Rewrite references to a feature that came back under a new id.
    pub fn remap(&mut self, from: &FeatureId, to: &FeatureId) {
        for cmd in self.undo_stack.iter_mut().chain(self.redo_stack.iter_mut()) {
            cmd.remap(from, to);
        }
    }

    /// Label for an "Undo ..." menu entry.
    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.last().map(|c| c.description())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.last().map(|c| c.description())
    }

    pub fn clear(&mut self) {
        let (undo, redo) = (self.undo_stack.len(), self.redo_stack.len());
        self.undo_stack.clear();
        self.redo_stack.clear();
        log::debug!("🗑️ History cleared ({undo} undo, {redo} redo)");
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    fn push_undo(&mut self, command: Command) {
        self.undo_stack.push(command);
        if self.undo_stack.len() > self.max_history {
            let excess = self.undo_stack.len() - self.max_history;
            self.undo_stack.drain(..excess);
        }
    }
}
