// Integration tests for the selection state machine
// These drive AppState through actions without touching any PDF bytes

mod common;

use common::stub_file;
use pdfstudio::model::{sorted_selection, FileId, SelectionEntry};
use pdfstudio::state::{neighbor_index, validate_search, Action, AppState, UserMessage};
use pdfstudio::{EmptyInput, StudioError};

fn id(raw: &str) -> FileId {
    FileId::new(raw)
}

/// Two files: f0001 with 5 pages, f0002 with 3 pages
fn loaded_state() -> AppState {
    AppState::new().apply(Action::FilesAdded(vec![
        stub_file("f0001", "report.pdf", 5),
        stub_file("f0002", "annex.pdf", 3),
    ]))
}

fn pages(state: &AppState) -> Vec<(String, usize)> {
    state
        .sorted_selection()
        .iter()
        .map(|e| (e.file_id.to_string(), e.page_index))
        .collect()
}

fn toggle(state: AppState, file: &str, page_index: usize) -> AppState {
    state.apply(Action::TogglePage {
        file_id: id(file),
        page_index,
    })
}

fn neighbor(state: AppState, file: &str, page_index: usize, offset: isize) -> AppState {
    state.apply(Action::AddNeighbor {
        file_id: id(file),
        page_index,
        offset,
    })
}

fn matched(file: &str, name: &str, page_index: usize, keyword: &str) -> SelectionEntry {
    SelectionEntry {
        file_id: id(file),
        file_name: name.to_string(),
        page_index,
        matched_keywords: Some(vec![keyword.to_string()]),
        is_manual: false,
    }
}

fn merged(state: AppState) -> AppState {
    state
        .apply(Action::MergeStarted)
        .apply(Action::MergeFinished(Ok(b"%PDF-merged".to_vec())))
}

#[test]
fn test_toggle_adds_then_removes() {
    let state = toggle(loaded_state(), "f0001", 2);
    assert!(state.is_selected(&id("f0001"), 2));
    let entry = &state.selection()[0];
    assert!(entry.is_manual);
    assert_eq!(entry.matched_keywords, None);
    assert_eq!(entry.file_name, "report.pdf");

    let state = toggle(state, "f0001", 2);
    assert!(state.selection().is_empty());
}

#[test]
fn test_toggle_twice_restores_selection() {
    let before = toggle(loaded_state(), "f0002", 0);
    let after = toggle(toggle(before.clone(), "f0001", 4), "f0001", 4);
    assert_eq!(before.selection(), after.selection());
}

#[test]
fn test_toggle_out_of_range_is_ignored() {
    let state = toggle(loaded_state(), "f0002", 3);
    assert!(state.selection().is_empty());

    let state = toggle(state, "f9999", 0);
    assert!(state.selection().is_empty());
}

#[test]
fn test_selection_never_holds_duplicates() {
    let mut state = loaded_state();
    for page in [1, 2, 1, 3, 2, 1] {
        state = toggle(state, "f0001", page);
    }
    state = neighbor(state, "f0001", 2, 1);
    state = neighbor(state, "f0001", 2, -1);

    let mut seen = pages(&state);
    let total = seen.len();
    seen.dedup();
    assert_eq!(seen.len(), total);
}

#[test]
fn test_neighbor_adds_adjacent_page() {
    let state = toggle(loaded_state(), "f0001", 2);
    let state = neighbor(state, "f0001", 2, 1);
    let state = neighbor(state, "f0001", 2, -1);

    assert_eq!(
        pages(&state),
        vec![
            ("f0001".to_string(), 1),
            ("f0001".to_string(), 2),
            ("f0001".to_string(), 3)
        ]
    );
    assert!(state.selection().iter().all(|e| e.is_manual));
}

#[test]
fn test_neighbor_out_of_bounds_is_noop() {
    let state = toggle(loaded_state(), "f0002", 0);
    let state = neighbor(state, "f0002", 0, -1);
    let state = toggle(state, "f0002", 2);
    let state = neighbor(state, "f0002", 2, 1);

    assert_eq!(
        pages(&state),
        vec![("f0002".to_string(), 0), ("f0002".to_string(), 2)]
    );
}

#[test]
fn test_neighbor_of_selected_page_keeps_it() {
    let state = toggle(toggle(loaded_state(), "f0001", 0), "f0001", 1);
    let state = merged(state);
    let state = neighbor(state, "f0001", 0, 1);

    assert_eq!(
        pages(&state),
        vec![("f0001".to_string(), 0), ("f0001".to_string(), 1)]
    );
    // Nothing changed, so the merged document is still current
    assert!(state.artifact().is_some());
}

#[test]
fn test_neighbor_keeps_search_entry_as_is() {
    let state = loaded_state().apply(Action::SearchFinished(Ok(vec![
        matched("f0001", "report.pdf", 1, "k"),
        matched("f0001", "report.pdf", 2, "k"),
    ])));
    let state = neighbor(state, "f0001", 1, 1);

    let entry = state
        .selection()
        .iter()
        .find(|e| e.page_index == 2)
        .unwrap();
    assert!(!entry.is_manual);
    assert_eq!(state.selection().len(), 2);
}

#[test]
fn test_neighbor_index_bounds() {
    assert_eq!(neighbor_index(0, -1, 5), None);
    assert_eq!(neighbor_index(4, 1, 5), None);
    assert_eq!(neighbor_index(2, -1, 5), Some(1));
    assert_eq!(neighbor_index(2, 1, 5), Some(3));
    assert_eq!(neighbor_index(0, 1, 0), None);
}

#[test]
fn test_sorted_selection_orders_by_file_then_page() {
    let state = loaded_state();
    let state = toggle(state, "f0002", 1);
    let state = toggle(state, "f0001", 4);
    let state = toggle(state, "f0002", 0);
    let state = toggle(state, "f0001", 0);

    assert_eq!(
        pages(&state),
        vec![
            ("f0001".to_string(), 0),
            ("f0001".to_string(), 4),
            ("f0002".to_string(), 0),
            ("f0002".to_string(), 1)
        ]
    );
    // Insertion order is kept underneath
    assert_eq!(state.selection()[0].file_id, id("f0002"));
}

#[test]
fn test_sorted_selection_is_stable_input_order_independent() {
    let a = matched("f0001", "a.pdf", 3, "x");
    let b = matched("f0001", "a.pdf", 1, "x");
    let c = matched("f0002", "b.pdf", 0, "x");

    let one = sorted_selection(&[a.clone(), b.clone(), c.clone()]);
    let two = sorted_selection(&[c, a, b]);
    assert_eq!(one, two);
}

#[test]
fn test_remove_file_drops_its_entries() {
    let state = toggle(toggle(loaded_state(), "f0001", 0), "f0002", 1);
    let state = state.apply(Action::RemoveFile(id("f0001")));

    assert!(state.file(&id("f0001")).is_none());
    assert_eq!(state.files().len(), 1);
    assert_eq!(pages(&state), vec![("f0002".to_string(), 1)]);
}

#[test]
fn test_clear_selection_keeps_files() {
    let state = toggle(toggle(loaded_state(), "f0001", 0), "f0002", 1);
    let state = state.apply(Action::ClearSelection);

    assert!(state.selection().is_empty());
    assert_eq!(state.files().len(), 2);
}

#[test]
fn test_search_finished_replaces_selection() {
    let state = toggle(loaded_state(), "f0001", 4);
    let state = state.apply(Action::SearchStarted);
    assert!(state.is_busy());

    let state = state.apply(Action::SearchFinished(Ok(vec![
        matched("f0002", "annex.pdf", 2, "fattura"),
        matched("f0001", "report.pdf", 1, "fattura"),
    ])));

    assert!(!state.is_busy());
    assert_eq!(state.message(), None);
    assert_eq!(
        pages(&state),
        vec![("f0001".to_string(), 1), ("f0002".to_string(), 2)]
    );
    assert!(!state.is_selected(&id("f0001"), 4));
}

#[test]
fn test_search_without_matches_keeps_selection() {
    let state = toggle(loaded_state(), "f0001", 4);
    let state = state
        .apply(Action::SearchStarted)
        .apply(Action::SearchFinished(Ok(Vec::new())));

    assert_eq!(state.message(), Some(&UserMessage::NoMatches));
    assert!(state.is_selected(&id("f0001"), 4));
}

#[test]
fn test_search_failure_sets_message() {
    let state = loaded_state()
        .apply(Action::SearchStarted)
        .apply(Action::SearchFinished(Err(StudioError::Merge("boom".into()))));

    assert!(!state.is_busy());
    assert_eq!(state.message(), Some(&UserMessage::SearchFailed));
}

#[test]
fn test_search_results_for_removed_file_are_dropped() {
    let state = loaded_state()
        .apply(Action::SearchStarted)
        .apply(Action::RemoveFile(id("f0002")))
        .apply(Action::SearchFinished(Ok(vec![
            matched("f0001", "report.pdf", 0, "k"),
            matched("f0002", "annex.pdf", 0, "k"),
        ])));

    assert_eq!(pages(&state), vec![("f0001".to_string(), 0)]);
}

#[test]
fn test_search_matching_only_removed_files_reports_no_matches() {
    let state = toggle(loaded_state(), "f0001", 4)
        .apply(Action::SearchStarted)
        .apply(Action::RemoveFile(id("f0002")))
        .apply(Action::SearchFinished(Ok(vec![matched("f0002", "annex.pdf", 0, "k")])));

    assert_eq!(state.message(), Some(&UserMessage::NoMatches));
    assert_eq!(pages(&state), vec![("f0001".to_string(), 4)]);
}

#[test]
fn test_validate_search_checks_files_first() {
    let no_files = validate_search(&[], &[]);
    assert_eq!(no_files, Err(EmptyInput::NoFiles));

    let files = vec![stub_file("f0001", "a.pdf", 1)];
    assert_eq!(validate_search(&files, &[]), Err(EmptyInput::NoKeywords));
    assert_eq!(
        validate_search(&files, &["  ".to_string()]),
        Err(EmptyInput::NoKeywords)
    );
    assert_eq!(validate_search(&files, &["x".to_string()]), Ok(()));
}

#[test]
fn test_rejected_search_messages_are_italian() {
    let state = AppState::new().apply(Action::SearchRejected(EmptyInput::NoFiles));
    assert_eq!(
        state.message().map(ToString::to_string).as_deref(),
        Some("Carica almeno un file PDF.")
    );

    let state = state.apply(Action::SearchRejected(EmptyInput::NoKeywords));
    assert_eq!(
        state.message().map(ToString::to_string).as_deref(),
        Some("Inserisci almeno una parola chiave.")
    );
}

#[test]
fn test_message_texts() {
    assert_eq!(UserMessage::NoMatches.to_string(), "Nessuna pagina trovata.");
    assert_eq!(UserMessage::SearchFailed.to_string(), "Errore durante la ricerca.");
    assert_eq!(UserMessage::MergeFailed.to_string(), "Errore nella creazione del PDF.");
    assert!(UserMessage::UnreadableFile("x.pdf".into())
        .to_string()
        .contains("x.pdf"));
}

#[test]
fn test_dismiss_and_new_files_clear_message() {
    let state = AppState::new().apply(Action::SearchRejected(EmptyInput::NoFiles));
    assert!(state.apply(Action::DismissMessage).message().is_none());

    let state = AppState::new()
        .apply(Action::SearchRejected(EmptyInput::NoFiles))
        .apply(Action::FilesAdded(vec![stub_file("f0001", "a.pdf", 1)]));
    assert!(state.message().is_none());
}

#[test]
fn test_page_count_failure_removes_file() {
    let state = AppState::new()
        .apply(Action::FilesAdded(vec![stub_file("f0001", "broken.pdf", 0)]))
        .apply(Action::PageCountFailed {
            file_id: id("f0001"),
            error: StudioError::Render("unreadable".into()),
        });

    assert!(state.files().is_empty());
    assert_eq!(
        state.message(),
        Some(&UserMessage::UnreadableFile("broken.pdf".to_string()))
    );
}

#[test]
fn test_page_count_resolved_enables_toggles() {
    let state = AppState::new()
        .apply(Action::FilesAdded(vec![stub_file("f0001", "late.pdf", 0)]));
    let state = toggle(state, "f0001", 0);
    assert!(state.selection().is_empty());

    let state = state.apply(Action::PageCountResolved {
        file_id: id("f0001"),
        total_pages: 2,
    });
    let state = toggle(state, "f0001", 1);
    assert!(state.is_selected(&id("f0001"), 1));
}

#[test]
fn test_merge_produces_artifact() {
    let state = merged(toggle(loaded_state(), "f0001", 0));

    assert!(!state.is_busy());
    let reference = state.artifact_ref().unwrap();
    assert_eq!(state.artifact_bytes(reference), Some(&b"%PDF-merged"[..]));
}

#[test]
fn test_selection_change_revokes_artifact() {
    let state = merged(toggle(loaded_state(), "f0001", 0));
    let reference = state.artifact_ref().unwrap();

    let state = toggle(state, "f0001", 1);
    assert!(state.artifact().is_none());
    assert_eq!(state.artifact_bytes(reference), None);
}

#[test]
fn test_remerge_revokes_previous_reference() {
    let state = merged(toggle(loaded_state(), "f0001", 0));
    let first = state.artifact_ref().unwrap();

    let state = merged(state);
    let second = state.artifact_ref().unwrap();

    assert_ne!(first, second);
    assert_eq!(state.artifact_bytes(first), None);
    assert!(state.artifact_bytes(second).is_some());
}

#[test]
fn test_merge_output_discarded_when_selection_changed_meanwhile() {
    let state = toggle(loaded_state(), "f0001", 0)
        .apply(Action::MergeStarted)
        .apply(Action::TogglePage {
            file_id: id("f0001"),
            page_index: 1,
        })
        .apply(Action::MergeFinished(Ok(b"%PDF-stale".to_vec())));

    assert!(!state.is_busy());
    assert!(state.artifact().is_none());
}

#[test]
fn test_merge_failure_sets_message() {
    let state = toggle(loaded_state(), "f0001", 0)
        .apply(Action::MergeStarted)
        .apply(Action::MergeFinished(Err(StudioError::Merge("boom".into()))));

    assert_eq!(state.message(), Some(&UserMessage::MergeFailed));
    assert!(state.artifact().is_none());
}

#[test]
fn test_new_search_drops_artifact() {
    let state = merged(toggle(loaded_state(), "f0001", 0)).apply(Action::SearchStarted);
    assert!(state.artifact().is_none());
}

#[test]
fn test_dispatch_matches_apply() {
    let mut state = loaded_state();
    state.dispatch(Action::TogglePage {
        file_id: id("f0002"),
        page_index: 2,
    });
    assert_eq!(pages(&state), vec![("f0002".to_string(), 2)]);
}
