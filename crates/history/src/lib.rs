//! Undoable command stack guarding all structural edits to the domain model.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use thiserror::Error;
use tracing::debug;

use shared::domain::Project;

mod commands;

pub use commands::{
    command_for_edit, AddHotspotCommand, ClearSlideMappingCommand, MapSlideCommand,
    MoveHotspotCommand, MoveSheetCommand, RemoveHotspotCommand, RemoveSheetCommand,
    RenameHotspotCommand,
};

const DEFAULT_MAX_ENTRIES: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("sheet {0} not found")]
    SheetMissing(String),
    #[error("hotspot {0} not found")]
    HotspotMissing(String),
    #[error("command has not been applied yet")]
    NotApplied,
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("broadcast is live; structural edits are rejected")]
    BroadcastLocked,
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Shared flag raised while broadcast output is live. The controller engages
/// it on confirm and releases it on clear; the stack checks it at every
/// mutation entry point so no caller can slip an edit past the guard.
#[derive(Debug, Clone, Default)]
pub struct BroadcastLock {
    live: Arc<AtomicBool>,
}

impl BroadcastLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn engage(&self) {
        self.live.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.live.store(false, Ordering::SeqCst);
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

/// A reversible structural edit. `apply` captures whatever state `revert`
/// needs, so a command can round-trip through undo/redo without re-reading
/// the caller's intent.
pub trait EditCommand: Send {
    fn label(&self) -> &str;
    fn apply(&mut self, project: &mut Project) -> Result<(), CommandError>;
    fn revert(&mut self, project: &mut Project) -> Result<(), CommandError>;
}

/// Two-stack undo/redo manager. A new push discards the redo tail; depth is
/// bounded with oldest-entry eviction.
pub struct CommandStack {
    lock: BroadcastLock,
    undo_stack: Vec<Box<dyn EditCommand>>,
    redo_stack: Vec<Box<dyn EditCommand>>,
    max_entries: usize,
}

impl CommandStack {
    pub fn new(lock: BroadcastLock) -> Self {
        Self::with_max_entries(lock, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_max_entries(lock: BroadcastLock, max_entries: usize) -> Self {
        Self {
            lock,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Applies `command` and records it for undo.
    pub fn push(
        &mut self,
        project: &mut Project,
        mut command: Box<dyn EditCommand>,
    ) -> Result<(), HistoryError> {
        self.ensure_unlocked()?;
        command.apply(project)?;
        self.redo_stack.clear();
        self.undo_stack.push(command);
        while self.undo_stack.len() > self.max_entries {
            self.undo_stack.remove(0);
        }
        debug!(
            label = self.undo_stack.last().map(|c| c.label()).unwrap_or(""),
            depth = self.undo_stack.len(),
            "edit applied"
        );
        Ok(())
    }

    /// Reverts the most recent edit. `Ok(false)` when there is nothing to
    /// undo.
    pub fn undo(&mut self, project: &mut Project) -> Result<bool, HistoryError> {
        self.ensure_unlocked()?;
        let Some(mut command) = self.undo_stack.pop() else {
            return Ok(false);
        };
        if let Err(err) = command.revert(project) {
            self.undo_stack.push(command);
            return Err(err.into());
        }
        debug!(label = command.label(), remaining = self.undo_stack.len(), "undo");
        self.redo_stack.push(command);
        Ok(true)
    }

    /// Re-applies the most recently undone edit. `Ok(false)` when there is
    /// nothing to redo.
    pub fn redo(&mut self, project: &mut Project) -> Result<bool, HistoryError> {
        self.ensure_unlocked()?;
        let Some(mut command) = self.redo_stack.pop() else {
            return Ok(false);
        };
        if let Err(err) = command.apply(project) {
            self.redo_stack.push(command);
            return Err(err.into());
        }
        debug!(label = command.label(), remaining = self.redo_stack.len(), "redo");
        self.undo_stack.push(command);
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.undo_stack.last().map(|c| c.label())
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.redo_stack.last().map(|c| c.label())
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn ensure_unlocked(&self) -> Result<(), HistoryError> {
        if self.lock.is_live() {
            Err(HistoryError::BroadcastLocked)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "tests/stack_tests.rs"]
mod tests;
