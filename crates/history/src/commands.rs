//! Concrete reversible commands, one per structural edit request.

use shared::{
    domain::{Hotspot, HotspotId, Project, ScoreSheet, SheetId, SlideIndex, VerseIndex},
    events::EditRequest,
};

use crate::{CommandError, EditCommand};

fn hotspot_mut<'a>(
    project: &'a mut Project,
    sheet: SheetId,
    hotspot: HotspotId,
) -> Result<&'a mut Hotspot, CommandError> {
    project
        .sheet_mut(sheet)
        .ok_or_else(|| CommandError::SheetMissing(sheet.to_string()))?
        .hotspot_mut(hotspot)
        .ok_or_else(|| CommandError::HotspotMissing(hotspot.to_string()))
}

/// Builds the command for an operator edit request.
pub fn command_for_edit(edit: EditRequest) -> Box<dyn EditCommand> {
    match edit {
        EditRequest::AddHotspot {
            sheet,
            x,
            y,
            label,
            at,
        } => Box::new(AddHotspotCommand::new(sheet, x, y, label, at)),
        EditRequest::RemoveHotspot { sheet, hotspot } => {
            Box::new(RemoveHotspotCommand::new(sheet, hotspot))
        }
        EditRequest::MoveHotspot {
            sheet,
            hotspot,
            x,
            y,
        } => Box::new(MoveHotspotCommand::new(sheet, hotspot, x, y)),
        EditRequest::RenameHotspot {
            sheet,
            hotspot,
            label,
        } => Box::new(RenameHotspotCommand::new(sheet, hotspot, label)),
        EditRequest::MapSlide {
            sheet,
            hotspot,
            verse,
            slide,
        } => Box::new(MapSlideCommand::new(sheet, hotspot, verse, slide)),
        EditRequest::ClearSlideMapping {
            sheet,
            hotspot,
            verse,
        } => Box::new(ClearSlideMappingCommand::new(sheet, hotspot, verse)),
        EditRequest::MoveSheet { sheet, new_index } => {
            Box::new(MoveSheetCommand::new(sheet, new_index))
        }
        EditRequest::RemoveSheet { sheet } => Box::new(RemoveSheetCommand::new(sheet)),
    }
}

pub struct AddHotspotCommand {
    sheet: SheetId,
    x: i32,
    y: i32,
    label: String,
    at: Option<usize>,
    // Kept after the first apply so redo reinserts the same identity.
    created: Option<Hotspot>,
}

impl AddHotspotCommand {
    pub fn new(sheet: SheetId, x: i32, y: i32, label: impl Into<String>, at: Option<usize>) -> Self {
        Self {
            sheet,
            x,
            y,
            label: label.into(),
            at,
            created: None,
        }
    }

    pub fn created_id(&self) -> Option<HotspotId> {
        self.created.as_ref().map(|h| h.id)
    }
}

impl EditCommand for AddHotspotCommand {
    fn label(&self) -> &str {
        "add hotspot"
    }

    fn apply(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let hotspot = match &self.created {
            Some(existing) => existing.clone(),
            None => {
                let fresh = Hotspot::new(self.x, self.y, self.label.clone());
                self.created = Some(fresh.clone());
                fresh
            }
        };
        project
            .sheet_mut(self.sheet)
            .ok_or_else(|| CommandError::SheetMissing(self.sheet.to_string()))?
            .add_hotspot(hotspot, self.at);
        Ok(())
    }

    fn revert(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let created = self.created.as_ref().ok_or(CommandError::NotApplied)?;
        project
            .sheet_mut(self.sheet)
            .ok_or_else(|| CommandError::SheetMissing(self.sheet.to_string()))?
            .remove_hotspot(created.id)
            .ok_or_else(|| CommandError::HotspotMissing(created.id.to_string()))?;
        Ok(())
    }
}

pub struct RemoveHotspotCommand {
    sheet: SheetId,
    hotspot: HotspotId,
    removed: Option<Hotspot>,
}

impl RemoveHotspotCommand {
    pub fn new(sheet: SheetId, hotspot: HotspotId) -> Self {
        Self {
            sheet,
            hotspot,
            removed: None,
        }
    }
}

impl EditCommand for RemoveHotspotCommand {
    fn label(&self) -> &str {
        "remove hotspot"
    }

    fn apply(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let removed = project
            .sheet_mut(self.sheet)
            .ok_or_else(|| CommandError::SheetMissing(self.sheet.to_string()))?
            .remove_hotspot(self.hotspot)
            .ok_or_else(|| CommandError::HotspotMissing(self.hotspot.to_string()))?;
        self.removed = Some(removed);
        Ok(())
    }

    fn revert(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let removed = self.removed.take().ok_or(CommandError::NotApplied)?;
        let at = removed.order;
        project
            .sheet_mut(self.sheet)
            .ok_or_else(|| CommandError::SheetMissing(self.sheet.to_string()))?
            .add_hotspot(removed, Some(at));
        Ok(())
    }
}

pub struct MoveHotspotCommand {
    sheet: SheetId,
    hotspot: HotspotId,
    new_position: (i32, i32),
    old_position: Option<(i32, i32)>,
}

impl MoveHotspotCommand {
    pub fn new(sheet: SheetId, hotspot: HotspotId, x: i32, y: i32) -> Self {
        Self {
            sheet,
            hotspot,
            new_position: (x, y),
            old_position: None,
        }
    }
}

impl EditCommand for MoveHotspotCommand {
    fn label(&self) -> &str {
        "move hotspot"
    }

    fn apply(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let hotspot = hotspot_mut(project, self.sheet, self.hotspot)?;
        self.old_position = Some((hotspot.x, hotspot.y));
        (hotspot.x, hotspot.y) = self.new_position;
        Ok(())
    }

    fn revert(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let old = self.old_position.ok_or(CommandError::NotApplied)?;
        let hotspot = hotspot_mut(project, self.sheet, self.hotspot)?;
        (hotspot.x, hotspot.y) = old;
        Ok(())
    }
}

pub struct RenameHotspotCommand {
    sheet: SheetId,
    hotspot: HotspotId,
    new_label: String,
    old_label: Option<String>,
}

impl RenameHotspotCommand {
    pub fn new(sheet: SheetId, hotspot: HotspotId, label: impl Into<String>) -> Self {
        Self {
            sheet,
            hotspot,
            new_label: label.into(),
            old_label: None,
        }
    }
}

impl EditCommand for RenameHotspotCommand {
    fn label(&self) -> &str {
        "rename hotspot"
    }

    fn apply(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let hotspot = hotspot_mut(project, self.sheet, self.hotspot)?;
        self.old_label = Some(std::mem::replace(&mut hotspot.label, self.new_label.clone()));
        Ok(())
    }

    fn revert(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let old = self.old_label.take().ok_or(CommandError::NotApplied)?;
        let hotspot = hotspot_mut(project, self.sheet, self.hotspot)?;
        hotspot.label = old;
        Ok(())
    }
}

pub struct MapSlideCommand {
    sheet: SheetId,
    hotspot: HotspotId,
    verse: VerseIndex,
    slide: SlideIndex,
    previous: Option<Option<SlideIndex>>,
}

impl MapSlideCommand {
    pub fn new(sheet: SheetId, hotspot: HotspotId, verse: VerseIndex, slide: SlideIndex) -> Self {
        Self {
            sheet,
            hotspot,
            verse,
            slide,
            previous: None,
        }
    }
}

impl EditCommand for MapSlideCommand {
    fn label(&self) -> &str {
        "map slide"
    }

    fn apply(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let hotspot = hotspot_mut(project, self.sheet, self.hotspot)?;
        self.previous = Some(hotspot.map_slide(self.verse, self.slide));
        Ok(())
    }

    fn revert(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let previous = self.previous.take().ok_or(CommandError::NotApplied)?;
        let hotspot = hotspot_mut(project, self.sheet, self.hotspot)?;
        match previous {
            Some(slide) => {
                hotspot.map_slide(self.verse, slide);
            }
            None => {
                hotspot.clear_mapping(self.verse);
            }
        }
        Ok(())
    }
}

pub struct ClearSlideMappingCommand {
    sheet: SheetId,
    hotspot: HotspotId,
    verse: VerseIndex,
    previous: Option<Option<SlideIndex>>,
}

impl ClearSlideMappingCommand {
    pub fn new(sheet: SheetId, hotspot: HotspotId, verse: VerseIndex) -> Self {
        Self {
            sheet,
            hotspot,
            verse,
            previous: None,
        }
    }
}

impl EditCommand for ClearSlideMappingCommand {
    fn label(&self) -> &str {
        "clear slide mapping"
    }

    fn apply(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let hotspot = hotspot_mut(project, self.sheet, self.hotspot)?;
        self.previous = Some(hotspot.clear_mapping(self.verse));
        Ok(())
    }

    fn revert(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let previous = self.previous.take().ok_or(CommandError::NotApplied)?;
        if let Some(slide) = previous {
            let hotspot = hotspot_mut(project, self.sheet, self.hotspot)?;
            hotspot.map_slide(self.verse, slide);
        }
        Ok(())
    }
}

pub struct MoveSheetCommand {
    sheet: SheetId,
    new_index: usize,
    old_index: Option<usize>,
}

impl MoveSheetCommand {
    pub fn new(sheet: SheetId, new_index: usize) -> Self {
        Self {
            sheet,
            new_index,
            old_index: None,
        }
    }
}

impl EditCommand for MoveSheetCommand {
    fn label(&self) -> &str {
        "move sheet"
    }

    fn apply(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let old = project
            .move_score_sheet(self.sheet, self.new_index)
            .ok_or_else(|| CommandError::SheetMissing(self.sheet.to_string()))?;
        self.old_index = Some(old);
        Ok(())
    }

    fn revert(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let old = self.old_index.take().ok_or(CommandError::NotApplied)?;
        project
            .move_score_sheet(self.sheet, old)
            .ok_or_else(|| CommandError::SheetMissing(self.sheet.to_string()))?;
        Ok(())
    }
}

pub struct RemoveSheetCommand {
    sheet: SheetId,
    removed: Option<(usize, ScoreSheet)>,
}

impl RemoveSheetCommand {
    pub fn new(sheet: SheetId) -> Self {
        Self {
            sheet,
            removed: None,
        }
    }
}

impl EditCommand for RemoveSheetCommand {
    fn label(&self) -> &str {
        "remove sheet"
    }

    fn apply(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let removed = project
            .remove_score_sheet(self.sheet)
            .ok_or_else(|| CommandError::SheetMissing(self.sheet.to_string()))?;
        self.removed = Some(removed);
        Ok(())
    }

    fn revert(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let (index, sheet) = self.removed.take().ok_or(CommandError::NotApplied)?;
        project.insert_score_sheet(index, sheet);
        Ok(())
    }
}
