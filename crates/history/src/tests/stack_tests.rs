use shared::{
    domain::{Hotspot, Project, ScoreSheet, SheetId, SlideIndex, VerseIndex},
    events::EditRequest,
};

use crate::{command_for_edit, BroadcastLock, CommandStack, HistoryError};

fn verse(raw: u8) -> VerseIndex {
    VerseIndex::new(raw).expect("verse in range")
}

fn project_with_sheets(hotspots_per_sheet: &[usize]) -> Project {
    let mut project = Project::new("Service");
    for (i, count) in hotspots_per_sheet.iter().enumerate() {
        let mut sheet = ScoreSheet::new(format!("sheet {i}"));
        for n in 0..*count {
            sheet.add_hotspot(Hotspot::new(n as i32, n as i32, format!("h{n}")), None);
        }
        project.add_score_sheet(sheet);
    }
    project
}

fn sheet_id(project: &Project, index: usize) -> SheetId {
    project.sheets()[index].id
}

fn edits_for_every_command(project: &Project) -> Vec<EditRequest> {
    let sheet = sheet_id(project, 0);
    let hotspot = project.sheets()[0].ordered_hotspots()[0].id;
    vec![
        EditRequest::AddHotspot {
            sheet,
            x: 50,
            y: 60,
            label: "new".into(),
            at: Some(1),
        },
        EditRequest::RemoveHotspot { sheet, hotspot },
        EditRequest::MoveHotspot {
            sheet,
            hotspot,
            x: 99,
            y: 98,
        },
        EditRequest::RenameHotspot {
            sheet,
            hotspot,
            label: "renamed".into(),
        },
        EditRequest::MapSlide {
            sheet,
            hotspot,
            verse: verse(2),
            slide: SlideIndex(4),
        },
        EditRequest::ClearSlideMapping {
            sheet,
            hotspot,
            verse: verse(0),
        },
        EditRequest::MoveSheet {
            sheet,
            new_index: 1,
        },
        EditRequest::RemoveSheet { sheet },
    ]
}

#[test]
fn push_applies_the_edit() {
    let mut project = project_with_sheets(&[1]);
    let mut stack = CommandStack::new(BroadcastLock::new());
    let sheet = sheet_id(&project, 0);

    stack
        .push(
            &mut project,
            command_for_edit(EditRequest::AddHotspot {
                sheet,
                x: 5,
                y: 6,
                label: "added".into(),
                at: None,
            }),
        )
        .expect("push succeeds");

    assert_eq!(project.sheets()[0].hotspots().len(), 2);
    assert!(stack.can_undo());
    assert_eq!(stack.undo_label(), Some("add hotspot"));
}

#[test]
fn every_command_round_trips_push_undo_redo() {
    let pristine = project_with_sheets(&[2, 1]);
    // Seed a mapping so ClearSlideMapping has something to restore.
    let mut pristine = pristine;
    let sheet = sheet_id(&pristine, 0);
    let hotspot = pristine.sheets()[0].ordered_hotspots()[0].id;
    pristine
        .sheet_mut(sheet)
        .and_then(|s| s.hotspot_mut(hotspot))
        .expect("hotspot exists")
        .map_slide(verse(0), SlideIndex(9));

    for edit in edits_for_every_command(&pristine) {
        let mut project = pristine.clone();
        let mut stack = CommandStack::new(BroadcastLock::new());

        stack
            .push(&mut project, command_for_edit(edit.clone()))
            .unwrap_or_else(|e| panic!("push failed for {edit:?}: {e}"));
        let after_push = project.clone();
        assert_ne!(after_push, pristine, "{edit:?} must mutate the project");

        assert!(stack.undo(&mut project).expect("undo succeeds"));
        assert_eq!(project, pristine, "undo must restore pristine for {edit:?}");

        assert!(stack.redo(&mut project).expect("redo succeeds"));
        assert_eq!(project, after_push, "redo must re-apply for {edit:?}");
    }
}

#[test]
fn push_discards_redo_tail() {
    let mut project = project_with_sheets(&[1]);
    let mut stack = CommandStack::new(BroadcastLock::new());
    let sheet = sheet_id(&project, 0);
    let hotspot = project.sheets()[0].ordered_hotspots()[0].id;

    stack
        .push(
            &mut project,
            command_for_edit(EditRequest::MoveHotspot {
                sheet,
                hotspot,
                x: 1,
                y: 1,
            }),
        )
        .expect("push");
    stack.undo(&mut project).expect("undo");
    assert!(stack.can_redo());

    stack
        .push(
            &mut project,
            command_for_edit(EditRequest::MoveHotspot {
                sheet,
                hotspot,
                x: 2,
                y: 2,
            }),
        )
        .expect("push");

    assert!(!stack.can_redo());
}

#[test]
fn depth_bound_evicts_oldest_entry() {
    let mut project = project_with_sheets(&[1]);
    let mut stack = CommandStack::with_max_entries(BroadcastLock::new(), 2);
    let sheet = sheet_id(&project, 0);
    let hotspot = project.sheets()[0].ordered_hotspots()[0].id;

    for step in 0..3 {
        stack
            .push(
                &mut project,
                command_for_edit(EditRequest::MoveHotspot {
                    sheet,
                    hotspot,
                    x: step,
                    y: step,
                }),
            )
            .expect("push");
    }

    assert!(stack.undo(&mut project).expect("undo"));
    assert!(stack.undo(&mut project).expect("undo"));
    assert!(!stack.undo(&mut project).expect("undo exhausted"));
    // Two undos walked back to the end of step 0, not to the origin.
    let h = project.sheets()[0].ordered_hotspots()[0];
    assert_eq!((h.x, h.y), (0, 0));
}

#[test]
fn undo_and_redo_on_empty_stack_report_false() {
    let mut project = project_with_sheets(&[1]);
    let mut stack = CommandStack::new(BroadcastLock::new());

    assert!(!stack.undo(&mut project).expect("undo"));
    assert!(!stack.redo(&mut project).expect("redo"));
}

#[test]
fn engaged_lock_rejects_every_entry_point() {
    let mut project = project_with_sheets(&[1]);
    let lock = BroadcastLock::new();
    let mut stack = CommandStack::new(lock.clone());
    let sheet = sheet_id(&project, 0);
    let hotspot = project.sheets()[0].ordered_hotspots()[0].id;

    stack
        .push(
            &mut project,
            command_for_edit(EditRequest::MoveHotspot {
                sheet,
                hotspot,
                x: 7,
                y: 7,
            }),
        )
        .expect("push before lock");
    let before = project.clone();

    lock.engage();

    let push_result = stack.push(
        &mut project,
        command_for_edit(EditRequest::RemoveHotspot { sheet, hotspot }),
    );
    assert!(matches!(push_result, Err(HistoryError::BroadcastLocked)));
    assert!(matches!(
        stack.undo(&mut project),
        Err(HistoryError::BroadcastLocked)
    ));
    assert!(matches!(
        stack.redo(&mut project),
        Err(HistoryError::BroadcastLocked)
    ));
    assert_eq!(project, before, "rejected edits must leave no partial effect");

    lock.release();

    stack
        .push(
            &mut project,
            command_for_edit(EditRequest::RemoveHotspot { sheet, hotspot }),
        )
        .expect("same edit succeeds after release");
    assert!(project.sheets()[0].hotspots().is_empty());
}
