use crate::domain::{Hotspot, Project, ScoreSheet, SlideIndex, VerseIndex};

fn verse(raw: u8) -> VerseIndex {
    VerseIndex::new(raw).expect("verse in range")
}

fn sheet_with_hotspots(labels: &[&str]) -> ScoreSheet {
    let mut sheet = ScoreSheet::new("Sheet 1");
    for label in labels {
        sheet.add_hotspot(Hotspot::new(0, 0, *label), None);
    }
    sheet
}

#[test]
fn hotspots_get_distinct_ids() {
    let a = Hotspot::new(10, 20, "a");
    let b = Hotspot::new(10, 20, "b");
    assert_ne!(a.id, b.id);
}

#[test]
fn verse_index_rejects_out_of_range() {
    assert!(VerseIndex::new(5).is_some());
    assert!(VerseIndex::new(6).is_none());
    assert_eq!(VerseIndex::from_key_number(1), Some(verse(0)));
    assert_eq!(VerseIndex::from_key_number(6), Some(VerseIndex::CHORUS));
    assert_eq!(VerseIndex::from_key_number(0), None);
    assert_eq!(VerseIndex::from_key_number(7), None);
}

#[test]
fn verse_index_serde_round_trip_enforces_range() {
    let chorus: VerseIndex = serde_json::from_str("5").expect("valid verse");
    assert!(chorus.is_chorus());
    assert!(serde_json::from_str::<VerseIndex>("9").is_err());
}

#[test]
fn resolve_slide_prefers_exact_mapping() {
    let mut hotspot = Hotspot::new(0, 0, "v1");
    hotspot.map_slide(verse(0), SlideIndex(2));
    hotspot.map_slide(VerseIndex::CHORUS, SlideIndex(7));

    assert_eq!(hotspot.resolve_slide(verse(0)), Some(SlideIndex(2)));
}

#[test]
fn resolve_slide_falls_back_to_chorus() {
    let mut hotspot = Hotspot::new(0, 0, "v1");
    hotspot.map_slide(verse(0), SlideIndex(2));
    hotspot.map_slide(VerseIndex::CHORUS, SlideIndex(7));

    assert_eq!(hotspot.resolve_slide(verse(2)), Some(SlideIndex(7)));
}

#[test]
fn resolve_slide_without_mapping_is_none_not_zero() {
    let hotspot = Hotspot::new(0, 0, "empty");
    assert_eq!(hotspot.resolve_slide(verse(3)), None);
}

#[test]
fn add_hotspot_appends_in_display_order() {
    let sheet = sheet_with_hotspots(&["a", "b", "c"]);
    let orders: Vec<usize> = sheet.ordered_hotspots().iter().map(|h| h.order).collect();
    assert_eq!(orders, vec![0, 1, 2]);
}

#[test]
fn add_hotspot_at_index_shifts_later_orders() {
    let mut sheet = sheet_with_hotspots(&["a", "b", "c"]);
    sheet.add_hotspot(Hotspot::new(5, 5, "inserted"), Some(1));

    let labels: Vec<&str> = sheet
        .ordered_hotspots()
        .iter()
        .map(|h| h.label.as_str())
        .collect();
    assert_eq!(labels, vec!["a", "inserted", "b", "c"]);
    let orders: Vec<usize> = sheet.ordered_hotspots().iter().map(|h| h.order).collect();
    assert_eq!(orders, vec![0, 1, 2, 3]);
}

#[test]
fn remove_hotspot_compacts_orders() {
    let mut sheet = sheet_with_hotspots(&["a", "b", "c"]);
    let middle = sheet.ordered_hotspots()[1].id;

    let removed = sheet.remove_hotspot(middle).expect("hotspot exists");
    assert_eq!(removed.order, 1);

    let orders: Vec<usize> = sheet.ordered_hotspots().iter().map(|h| h.order).collect();
    assert_eq!(orders, vec![0, 1]);
    let labels: Vec<&str> = sheet
        .ordered_hotspots()
        .iter()
        .map(|h| h.label.as_str())
        .collect();
    assert_eq!(labels, vec!["a", "c"]);
}

#[test]
fn next_and_previous_walk_display_order() {
    let sheet = sheet_with_hotspots(&["a", "b", "c"]);
    let ids: Vec<_> = sheet.ordered_hotspots().iter().map(|h| h.id).collect();

    assert_eq!(sheet.next_hotspot(ids[0]).map(|h| h.id), Some(ids[1]));
    assert_eq!(sheet.previous_hotspot(ids[2]).map(|h| h.id), Some(ids[1]));
    assert!(sheet.next_hotspot(ids[2]).is_none());
    assert!(sheet.previous_hotspot(ids[0]).is_none());
}

#[test]
fn removing_selected_sheet_clamps_selection() {
    let mut project = Project::new("Service");
    project.add_score_sheet(ScoreSheet::new("one"));
    project.add_score_sheet(ScoreSheet::new("two"));
    assert!(project.select_next_sheet());
    assert_eq!(project.current_sheet_index(), 1);

    let last = project.sheets()[1].id;
    project.remove_score_sheet(last).expect("sheet exists");

    assert_eq!(project.current_sheet_index(), 0);
    assert_eq!(project.current_score_sheet().map(|s| s.name.as_str()), Some("one"));
}

#[test]
fn sheet_selection_stops_at_bounds() {
    let mut project = Project::new("Service");
    project.add_score_sheet(ScoreSheet::new("only"));

    assert!(!project.select_previous_sheet());
    assert!(!project.select_next_sheet());
    assert_eq!(project.current_sheet_index(), 0);
}

#[test]
fn move_score_sheet_reorders_and_reports_old_index() {
    let mut project = Project::new("Service");
    project.add_score_sheet(ScoreSheet::new("a"));
    project.add_score_sheet(ScoreSheet::new("b"));
    project.add_score_sheet(ScoreSheet::new("c"));
    let first = project.sheets()[0].id;

    let old = project.move_score_sheet(first, 2).expect("sheet exists");

    assert_eq!(old, 0);
    let names: Vec<&str> = project.sheets().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["b", "c", "a"]);
}

#[test]
fn find_hotspot_resolves_across_sheets() {
    let mut project = Project::new("Service");
    project.add_score_sheet(sheet_with_hotspots(&["a"]));
    project.add_score_sheet(sheet_with_hotspots(&["b", "target"]));

    let target = project.sheets()[1].ordered_hotspots()[1].id;
    let (sheet, hotspot) = project.find_hotspot(target).expect("hotspot exists");

    assert_eq!(sheet.id, project.sheets()[1].id);
    assert_eq!(hotspot.label, "target");
}
