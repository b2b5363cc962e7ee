//! Live broadcast controller: the Preview → Live two-stage state machine.
//!
//! The controller owns the domain model and the command stack, consumes
//! operator events, and fans out notifications to subscribed surfaces. Only
//! `confirm` and `change_verse` may touch live output; structural edits are
//! rejected at the command-stack boundary while broadcast is live.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use history::{command_for_edit, BroadcastLock, CommandStack, HistoryError};
use pipeline::{canonical_path, ConversionPipeline, PipelineEvent};
use shared::{
    domain::{HotspotId, Project, VerseIndex},
    error::ControlFault,
    events::{
        BroadcastFrame, ControlNotification, EditRequest, OperatorEvent, SheetDirection,
        StagedTarget,
    },
};

pub use shared::error::BroadcastError;

const NOTIFICATION_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Idle,
    Previewing,
    Live,
}

pub struct LiveController {
    project: Project,
    history: CommandStack,
    lock: BroadcastLock,
    pipeline: Arc<ConversionPipeline>,
    preview: Option<StagedTarget>,
    live: Option<StagedTarget>,
    notifications: broadcast::Sender<ControlNotification>,
}

impl LiveController {
    pub fn new(project: Project, pipeline: Arc<ConversionPipeline>) -> Self {
        let lock = BroadcastLock::new();
        let (notifications, _) = broadcast::channel(NOTIFICATION_CHANNEL_CAPACITY);
        Self {
            project,
            history: CommandStack::new(lock.clone()),
            lock,
            pipeline,
            preview: None,
            live: None,
            notifications,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ControlNotification> {
        self.notifications.subscribe()
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn history(&self) -> &CommandStack {
        &self.history
    }

    pub fn preview_target(&self) -> Option<StagedTarget> {
        self.preview
    }

    pub fn live_target(&self) -> Option<StagedTarget> {
        self.live
    }

    pub fn state(&self) -> ControlState {
        if self.live.is_some() {
            ControlState::Live
        } else if self.preview.is_some() {
            ControlState::Previewing
        } else {
            ControlState::Idle
        }
    }

    /// Kicks off conversion for every sheet document so imagery is warm by
    /// the time the operator confirms. Non-blocking.
    pub fn prefetch_documents(&self) {
        for sheet in self.project.sheets() {
            if let Some(path) = sheet.slides_path.as_deref() {
                self.pipeline.request(path);
            }
        }
    }

    /// Single entry point for the operator event vocabulary.
    pub fn handle_event(&mut self, event: OperatorEvent) -> Result<(), BroadcastError> {
        match event {
            OperatorEvent::Up => {
                self.select_previous_hotspot();
                Ok(())
            }
            OperatorEvent::Down => {
                self.select_next_hotspot();
                Ok(())
            }
            OperatorEvent::Left => {
                self.switch_sheet(SheetDirection::Previous);
                Ok(())
            }
            OperatorEvent::Right => {
                self.switch_sheet(SheetDirection::Next);
                Ok(())
            }
            OperatorEvent::Enter => self.confirm(),
            OperatorEvent::Verse { number } => {
                let verse = VerseIndex::from_key_number(number)
                    .ok_or(BroadcastError::InvalidTransition("verse key out of range"))?;
                self.change_verse(verse);
                Ok(())
            }
            OperatorEvent::ConfirmEdit { edit } => self.apply_edit(edit),
            OperatorEvent::Undo => self.undo().map(|_| ()),
            OperatorEvent::Redo => self.redo().map(|_| ()),
            OperatorEvent::ClearLive => {
                self.clear_live();
                Ok(())
            }
        }
    }

    /// Stages a specific hotspot (e.g. a click on the score sheet) as
    /// preview at the current verse. Legal from any state; never touches
    /// live output.
    pub fn select_hotspot(&mut self, hotspot: HotspotId) -> Result<StagedTarget, BroadcastError> {
        if self.project.find_hotspot(hotspot).is_none() {
            return Err(BroadcastError::InvalidTransition("unknown hotspot selected"));
        }
        let target = StagedTarget {
            hotspot,
            verse: self.project.current_verse(),
        };
        self.stage_preview(Some(target));
        Ok(target)
    }

    /// Stages the next hotspot in display order as preview. Never touches
    /// live output.
    pub fn select_next_hotspot(&mut self) -> Option<StagedTarget> {
        let verse = self.project.current_verse();
        let sheet = self.project.current_score_sheet()?;
        let next = match self.preview {
            Some(target) if sheet.hotspot(target.hotspot).is_some() => {
                sheet.next_hotspot(target.hotspot)?
            }
            _ => sheet.first_hotspot()?,
        };
        let target = StagedTarget {
            hotspot: next.id,
            verse,
        };
        self.stage_preview(Some(target));
        Some(target)
    }

    /// Stages the previous hotspot in display order as preview.
    pub fn select_previous_hotspot(&mut self) -> Option<StagedTarget> {
        let verse = self.project.current_verse();
        let sheet = self.project.current_score_sheet()?;
        let current = self.preview?;
        let previous = sheet.previous_hotspot(current.hotspot)?;
        let target = StagedTarget {
            hotspot: previous.id,
            verse,
        };
        self.stage_preview(Some(target));
        Some(target)
    }

    /// Copies the staged preview to live and emits exactly one `LiveChanged`.
    pub fn confirm(&mut self) -> Result<(), BroadcastError> {
        let target = self
            .preview
            .ok_or(BroadcastError::InvalidTransition("no preview staged to confirm"))?;
        self.live = Some(target);
        self.lock.engage();
        let frame = self.frame_for(target);
        info!(hotspot = %target.hotspot, verse = %target.verse, "confirmed to live");
        let _ = self
            .notifications
            .send(ControlNotification::LiveChanged { live: target, frame });
        Ok(())
    }

    /// Updates the current verse and immediately resynchronizes live output
    /// for the live hotspot, applying the Chorus fallback rule.
    pub fn change_verse(&mut self, verse: VerseIndex) {
        self.project.set_current_verse(verse);
        if let Some(live) = self.live {
            let retargeted = StagedTarget {
                hotspot: live.hotspot,
                verse,
            };
            self.live = Some(retargeted);
            let frame = self.frame_for(retargeted);
            debug!(verse = %verse, "verse changed while live; resyncing output");
            let _ = self.notifications.send(ControlNotification::LiveChanged {
                live: retargeted,
                frame,
            });
            self.stage_preview(Some(retargeted));
        } else if let Some(preview) = self.preview {
            self.stage_preview(Some(StagedTarget {
                hotspot: preview.hotspot,
                verse,
            }));
        }
    }

    /// Selects the neighbor sheet and stages its first hotspot as preview.
    /// Never auto-confirms; live output is untouched.
    pub fn switch_sheet(&mut self, direction: SheetDirection) -> bool {
        let moved = match direction {
            SheetDirection::Previous => self.project.select_previous_sheet(),
            SheetDirection::Next => self.project.select_next_sheet(),
        };
        if !moved {
            return false;
        }
        if let Some(path) = self
            .project
            .current_score_sheet()
            .and_then(|s| s.slides_path.clone())
        {
            self.pipeline.request(&path);
        }
        let verse = self.project.current_verse();
        let first = self
            .project
            .current_score_sheet()
            .and_then(|s| s.first_hotspot())
            .map(|h| StagedTarget {
                hotspot: h.id,
                verse,
            });
        self.stage_preview(first);
        true
    }

    /// Blanks broadcast output and releases the edit lock.
    pub fn clear_live(&mut self) {
        if self.live.take().is_some() {
            info!("live output cleared");
        }
        self.lock.release();
        let _ = self.notifications.send(ControlNotification::LiveCleared);
    }

    /// Routes a structural edit through the guarded command stack.
    pub fn apply_edit(&mut self, edit: EditRequest) -> Result<(), BroadcastError> {
        let command = command_for_edit(edit);
        match self.history.push(&mut self.project, command) {
            Ok(()) => {
                self.reconcile_after_mutation();
                Ok(())
            }
            Err(err) => Err(self.report_history_error(err)),
        }
    }

    pub fn undo(&mut self) -> Result<bool, BroadcastError> {
        match self.history.undo(&mut self.project) {
            Ok(applied) => {
                if applied {
                    self.reconcile_after_mutation();
                }
                Ok(applied)
            }
            Err(err) => Err(self.report_history_error(err)),
        }
    }

    pub fn redo(&mut self) -> Result<bool, BroadcastError> {
        match self.history.redo(&mut self.project) {
            Ok(applied) => {
                if applied {
                    self.reconcile_after_mutation();
                }
                Ok(applied)
            }
            Err(err) => Err(self.report_history_error(err)),
        }
    }

    /// Accepts a worker-side completion notification. Imagery for the live
    /// (or previewed) document triggers an immediate resync; anything else
    /// has already warmed the cache and needs no reaction.
    pub fn absorb_pipeline_event(&mut self, event: PipelineEvent) {
        let key = match &event {
            PipelineEvent::SlidesReady { key, .. } => key.clone(),
            PipelineEvent::ConversionFailed { key, reason } => {
                warn!(path = key.path(), reason = %reason, "slide conversion failed");
                key.clone()
            }
        };

        if let Some(live) = self.live {
            if self.document_path_for(live) == Some(key.path().to_string()) {
                let frame = self.frame_for(live);
                let _ = self
                    .notifications
                    .send(ControlNotification::LiveChanged { live, frame });
            }
        }
        if let Some(preview) = self.preview {
            if self.document_path_for(preview) == Some(key.path().to_string()) {
                let frame = self.frame_for(preview);
                let _ = self.notifications.send(ControlNotification::PreviewChanged {
                    preview: Some(preview),
                    frame,
                });
            }
        }
    }

    fn stage_preview(&mut self, target: Option<StagedTarget>) {
        self.preview = target;
        let frame = target.map(|t| self.frame_for(t)).unwrap_or_default();
        let _ = self
            .notifications
            .send(ControlNotification::PreviewChanged {
                preview: target,
                frame,
            });
    }

    /// Resolves the output frame for a staged target: hotspot lookup, verse
    /// mapping with Chorus fallback, then cached imagery. Missing pieces
    /// degrade to a placeholder frame, never stale content.
    fn frame_for(&self, target: StagedTarget) -> BroadcastFrame {
        let Some((sheet, hotspot)) = self.project.find_hotspot(target.hotspot) else {
            warn!(hotspot = %target.hotspot, "staged hotspot no longer exists");
            return BroadcastFrame::default();
        };
        let overlay = (!hotspot.label.is_empty()).then(|| hotspot.label.clone());

        let Some(slide) = hotspot.resolve_slide(target.verse) else {
            let err = BroadcastError::UnmappedVerse {
                verse: target.verse.get(),
            };
            debug!(hotspot = %target.hotspot, %err, "placeholder output");
            return BroadcastFrame {
                image: None,
                overlay,
            };
        };

        let image = sheet
            .slides_path
            .as_deref()
            .and_then(|path| self.pipeline.slide(path, slide));
        if image.is_none() {
            debug!(hotspot = %target.hotspot, slide = slide.0, "slide imagery not cached yet");
        }
        BroadcastFrame { image, overlay }
    }

    fn document_path_for(&self, target: StagedTarget) -> Option<String> {
        self.project
            .find_hotspot(target.hotspot)
            .and_then(|(sheet, _)| sheet.slides_path.as_deref().map(canonical_path))
    }

    /// A structural edit may have removed the previewed hotspot; live cannot
    /// dangle because edits are blocked while live. Falls back to the current
    /// sheet's first hotspot.
    fn reconcile_after_mutation(&mut self) {
        let Some(preview) = self.preview else {
            return;
        };
        if self.project.find_hotspot(preview.hotspot).is_some() {
            return;
        }
        let verse = self.project.current_verse();
        let first = self
            .project
            .current_score_sheet()
            .and_then(|s| s.first_hotspot())
            .map(|h| StagedTarget {
                hotspot: h.id,
                verse,
            });
        self.stage_preview(first);
    }

    fn report_history_error(&self, err: HistoryError) -> BroadcastError {
        match err {
            HistoryError::BroadcastLocked => {
                warn!("structural edit rejected while live");
                let fault = ControlFault::from(BroadcastError::BroadcastLocked);
                let _ = self
                    .notifications
                    .send(ControlNotification::EditRejected { fault });
                BroadcastError::BroadcastLocked
            }
            HistoryError::Command(err) => {
                warn!(%err, "edit could not be applied");
                BroadcastError::InvalidTransition("edit target no longer exists")
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
