//! Operator input vocabulary and controller notifications.

use serde::{Deserialize, Serialize};

use crate::{
    domain::{HotspotId, SheetId, SlideIndex, VerseIndex},
    error::ControlFault,
    media::SlideImage,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetDirection {
    Previous,
    Next,
}

/// Discrete operator actions. Key bindings and input devices are the
/// embedding surface's concern; the core only defines the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum OperatorEvent {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Verse { number: u8 },
    ConfirmEdit { edit: EditRequest },
    Undo,
    Redo,
    ClearLive,
}

/// Structural mutations an operator can commit. Every variant routes through
/// the command stack, the single point where the broadcast lock is checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum EditRequest {
    AddHotspot {
        sheet: SheetId,
        x: i32,
        y: i32,
        label: String,
        at: Option<usize>,
    },
    RemoveHotspot {
        sheet: SheetId,
        hotspot: HotspotId,
    },
    MoveHotspot {
        sheet: SheetId,
        hotspot: HotspotId,
        x: i32,
        y: i32,
    },
    RenameHotspot {
        sheet: SheetId,
        hotspot: HotspotId,
        label: String,
    },
    MapSlide {
        sheet: SheetId,
        hotspot: HotspotId,
        verse: VerseIndex,
        slide: SlideIndex,
    },
    ClearSlideMapping {
        sheet: SheetId,
        hotspot: HotspotId,
        verse: VerseIndex,
    },
    MoveSheet {
        sheet: SheetId,
        new_index: usize,
    },
    RemoveSheet {
        sheet: SheetId,
    },
}

/// A staged (hotspot, verse) pair. Back-reference into the domain model,
/// resolved by lookup; never an owning pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagedTarget {
    pub hotspot: HotspotId,
    pub verse: VerseIndex,
}

/// What the broadcast surface renders. `image: None` means placeholder or
/// blank output, never stale content.
#[derive(Debug, Clone, Default)]
pub struct BroadcastFrame {
    pub image: Option<SlideImage>,
    pub overlay: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ControlNotification {
    PreviewChanged {
        preview: Option<StagedTarget>,
        frame: BroadcastFrame,
    },
    LiveChanged {
        live: StagedTarget,
        frame: BroadcastFrame,
    },
    LiveCleared,
    EditRejected {
        fault: ControlFault,
    },
}
