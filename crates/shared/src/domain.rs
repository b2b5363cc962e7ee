use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_newtype!(ProjectId);
id_newtype!(SheetId);
id_newtype!(HotspotId);

/// Verse slot on a hotspot: 0..=4 are verses 1-5, 5 is the reserved Chorus
/// slot used as the universal lookup fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct VerseIndex(u8);

impl VerseIndex {
    pub const CHORUS: Self = Self(5);
    pub const MAX: u8 = 5;

    pub fn new(raw: u8) -> Option<Self> {
        (raw <= Self::MAX).then_some(Self(raw))
    }

    /// Maps the operator's 1..=6 number keys onto verse slots.
    pub fn from_key_number(number: u8) -> Option<Self> {
        (1..=6).contains(&number).then(|| Self(number - 1))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn is_chorus(self) -> bool {
        self == Self::CHORUS
    }
}

impl TryFrom<u8> for VerseIndex {
    type Error = String;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or_else(|| format!("verse index {raw} out of range 0..={}", Self::MAX))
    }
}

impl From<VerseIndex> for u8 {
    fn from(verse: VerseIndex) -> Self {
        verse.0
    }
}

impl fmt::Display for VerseIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_chorus() {
            write!(f, "chorus")
        } else {
            write!(f, "verse {}", self.0 + 1)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlideIndex(pub u32);

/// A clickable region on a score sheet, mapping verse slots to slides of the
/// sheet's converted deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hotspot {
    pub id: HotspotId,
    pub x: i32,
    pub y: i32,
    pub order: usize,
    pub label: String,
    slide_mappings: BTreeMap<VerseIndex, SlideIndex>,
}

impl Hotspot {
    pub fn new(x: i32, y: i32, label: impl Into<String>) -> Self {
        Self {
            id: HotspotId::new(),
            x,
            y,
            order: 0,
            label: label.into(),
            slide_mappings: BTreeMap::new(),
        }
    }

    /// Reassembles a hotspot from persisted parts. Mapping keys are already
    /// range-checked by the `VerseIndex` type.
    pub fn from_parts(
        id: HotspotId,
        x: i32,
        y: i32,
        order: usize,
        label: String,
        slide_mappings: BTreeMap<VerseIndex, SlideIndex>,
    ) -> Self {
        Self {
            id,
            x,
            y,
            order,
            label,
            slide_mappings,
        }
    }

    pub fn map_slide(&mut self, verse: VerseIndex, slide: SlideIndex) -> Option<SlideIndex> {
        self.slide_mappings.insert(verse, slide)
    }

    pub fn clear_mapping(&mut self, verse: VerseIndex) -> Option<SlideIndex> {
        self.slide_mappings.remove(&verse)
    }

    /// Exact mapping for `verse`, without the Chorus fallback.
    pub fn slide_for_verse(&self, verse: VerseIndex) -> Option<SlideIndex> {
        self.slide_mappings.get(&verse).copied()
    }

    /// Lookup rule for broadcast: the exact mapping if present, otherwise the
    /// Chorus mapping, otherwise none. Never substitutes slide 0.
    pub fn resolve_slide(&self, verse: VerseIndex) -> Option<SlideIndex> {
        self.slide_for_verse(verse)
            .or_else(|| self.slide_for_verse(VerseIndex::CHORUS))
    }

    pub fn mappings(&self) -> impl Iterator<Item = (VerseIndex, SlideIndex)> + '_ {
        self.slide_mappings.iter().map(|(v, s)| (*v, *s))
    }
}

/// One song: a score-sheet image plus the ordered hotspots placed on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreSheet {
    pub id: SheetId,
    pub name: String,
    pub image_path: Option<String>,
    pub slides_path: Option<String>,
    hotspots: Vec<Hotspot>,
}

impl ScoreSheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SheetId::new(),
            name: name.into(),
            image_path: None,
            slides_path: None,
            hotspots: Vec::new(),
        }
    }

    pub fn from_parts(
        id: SheetId,
        name: String,
        image_path: Option<String>,
        slides_path: Option<String>,
        mut hotspots: Vec<Hotspot>,
    ) -> Self {
        hotspots.sort_by_key(|h| h.order);
        Self {
            id,
            name,
            image_path,
            slides_path,
            hotspots,
        }
    }

    /// Inserts a hotspot at `at` (display order), shifting later hotspots
    /// back, or appends when `at` is `None`. The backing vec is kept in
    /// display order.
    pub fn add_hotspot(&mut self, mut hotspot: Hotspot, at: Option<usize>) {
        match at {
            None => {
                hotspot.order = self.hotspots.len();
                self.hotspots.push(hotspot);
            }
            Some(index) => {
                let index = index.min(self.hotspots.len());
                for existing in &mut self.hotspots {
                    if existing.order >= index {
                        existing.order += 1;
                    }
                }
                hotspot.order = index;
                self.hotspots.push(hotspot);
                self.hotspots.sort_by_key(|h| h.order);
            }
        }
    }

    /// Removes a hotspot and compacts the remaining display orders. The
    /// removed hotspot keeps its old `order` so an undo can reinsert it.
    pub fn remove_hotspot(&mut self, hotspot_id: HotspotId) -> Option<Hotspot> {
        let position = self.hotspots.iter().position(|h| h.id == hotspot_id)?;
        let removed = self.hotspots.remove(position);
        for h in &mut self.hotspots {
            if h.order > removed.order {
                h.order -= 1;
            }
        }
        Some(removed)
    }

    pub fn hotspot(&self, hotspot_id: HotspotId) -> Option<&Hotspot> {
        self.hotspots.iter().find(|h| h.id == hotspot_id)
    }

    pub fn hotspot_mut(&mut self, hotspot_id: HotspotId) -> Option<&mut Hotspot> {
        self.hotspots.iter_mut().find(|h| h.id == hotspot_id)
    }

    pub fn hotspots(&self) -> &[Hotspot] {
        &self.hotspots
    }

    pub fn ordered_hotspots(&self) -> Vec<&Hotspot> {
        let mut ordered: Vec<&Hotspot> = self.hotspots.iter().collect();
        ordered.sort_by_key(|h| h.order);
        ordered
    }

    pub fn first_hotspot(&self) -> Option<&Hotspot> {
        self.hotspots.iter().min_by_key(|h| h.order)
    }

    pub fn next_hotspot(&self, current: HotspotId) -> Option<&Hotspot> {
        let ordered = self.ordered_hotspots();
        let position = ordered.iter().position(|h| h.id == current)?;
        ordered.get(position + 1).copied()
    }

    pub fn previous_hotspot(&self, current: HotspotId) -> Option<&Hotspot> {
        let ordered = self.ordered_hotspots();
        let position = ordered.iter().position(|h| h.id == current)?;
        position.checked_sub(1).and_then(|p| ordered.get(p)).copied()
    }
}

/// Root entity: the ordered sheet list plus persisted navigation state
/// (selected sheet, current verse).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    score_sheets: Vec<ScoreSheet>,
    current_sheet_index: usize,
    current_verse_index: VerseIndex,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ProjectId::new(),
            name: name.into(),
            score_sheets: Vec::new(),
            current_sheet_index: 0,
            current_verse_index: VerseIndex(0),
        }
    }

    pub fn from_parts(
        id: ProjectId,
        name: String,
        score_sheets: Vec<ScoreSheet>,
        current_sheet_index: usize,
        current_verse_index: VerseIndex,
    ) -> Self {
        let current_sheet_index = if score_sheets.is_empty() {
            0
        } else {
            current_sheet_index.min(score_sheets.len() - 1)
        };
        Self {
            id,
            name,
            score_sheets,
            current_sheet_index,
            current_verse_index,
        }
    }

    pub fn add_score_sheet(&mut self, sheet: ScoreSheet) {
        self.score_sheets.push(sheet);
    }

    /// Removes a sheet and clamps the selection. Returns the old position and
    /// the sheet itself so an undo can restore both.
    pub fn remove_score_sheet(&mut self, sheet_id: SheetId) -> Option<(usize, ScoreSheet)> {
        let position = self.score_sheets.iter().position(|s| s.id == sheet_id)?;
        let removed = self.score_sheets.remove(position);
        if self.current_sheet_index >= self.score_sheets.len() {
            self.current_sheet_index = self.score_sheets.len().saturating_sub(1);
        }
        Some((position, removed))
    }

    pub fn insert_score_sheet(&mut self, index: usize, sheet: ScoreSheet) {
        let index = index.min(self.score_sheets.len());
        self.score_sheets.insert(index, sheet);
    }

    /// Moves a sheet to `new_index` (clamped). Returns the old position.
    pub fn move_score_sheet(&mut self, sheet_id: SheetId, new_index: usize) -> Option<usize> {
        let position = self.score_sheets.iter().position(|s| s.id == sheet_id)?;
        let sheet = self.score_sheets.remove(position);
        let new_index = new_index.min(self.score_sheets.len());
        self.score_sheets.insert(new_index, sheet);
        Some(position)
    }

    pub fn sheet(&self, sheet_id: SheetId) -> Option<&ScoreSheet> {
        self.score_sheets.iter().find(|s| s.id == sheet_id)
    }

    pub fn sheet_mut(&mut self, sheet_id: SheetId) -> Option<&mut ScoreSheet> {
        self.score_sheets.iter_mut().find(|s| s.id == sheet_id)
    }

    pub fn sheets(&self) -> &[ScoreSheet] {
        &self.score_sheets
    }

    pub fn current_sheet_index(&self) -> usize {
        self.current_sheet_index
    }

    pub fn current_score_sheet(&self) -> Option<&ScoreSheet> {
        self.score_sheets.get(self.current_sheet_index)
    }

    pub fn select_next_sheet(&mut self) -> bool {
        if self.current_sheet_index + 1 < self.score_sheets.len() {
            self.current_sheet_index += 1;
            true
        } else {
            false
        }
    }

    pub fn select_previous_sheet(&mut self) -> bool {
        if self.current_sheet_index > 0 {
            self.current_sheet_index -= 1;
            true
        } else {
            false
        }
    }

    pub fn current_verse(&self) -> VerseIndex {
        self.current_verse_index
    }

    pub fn set_current_verse(&mut self, verse: VerseIndex) {
        self.current_verse_index = verse;
    }

    /// Resolves a hotspot back-reference across all sheets.
    pub fn find_hotspot(&self, hotspot_id: HotspotId) -> Option<(&ScoreSheet, &Hotspot)> {
        self.score_sheets
            .iter()
            .find_map(|sheet| sheet.hotspot(hotspot_id).map(|h| (sheet, h)))
    }
}
