//! Tests for Presentation: frame insertion, selection and event dispatch

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rstest::{fixture, rstest};

use sozi::application::svg::parse_document;
use sozi::domain::{
    DomainError, FrameEvent, FrameEventKind, IdGenerator, InvalidReference, Observable,
    Presentation, PresentationEvent, PresentationEventKind, PresentationOptions, ViewState,
    DEFAULT_FRAME_TITLE,
};
use sozi::util::testing;

const ALL_KINDS: [PresentationEventKind; 6] = [
    PresentationEventKind::SelectLayer,
    PresentationEventKind::DeselectLayer,
    PresentationEventKind::SelectFrame,
    PresentationEventKind::DeselectFrame,
    PresentationEventKind::AddFrame,
    PresentationEventKind::RemoveFrame,
];

#[fixture]
fn presentation() -> Presentation {
    testing::init_test_setup();
    let document = parse_document(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 800 600">
            <rect/><g id="A"/><circle/><g id="B"/>
        </svg>"#,
    )
    .expect("parse svg");
    Presentation::new(
        document,
        Rc::new(IdGenerator::new()),
        &PresentationOptions::default(),
    )
    .expect("build presentation")
}

/// Subscribe to every event kind and record a compact trace of what fired.
fn record(p: &Presentation) -> Rc<RefCell<Vec<String>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    for kind in ALL_KINDS {
        let log = Rc::clone(&log);
        p.on(kind, move |event: &PresentationEvent| {
            let entry = match event {
                PresentationEvent::SelectLayer { id } => format!("selectLayer {id}"),
                PresentationEvent::DeselectLayer { id } => format!("deselectLayer {id}"),
                PresentationEvent::SelectFrame { index } => format!("selectFrame {index}"),
                PresentationEvent::DeselectFrame { index } => format!("deselectFrame {index}"),
                PresentationEvent::AddFrame { index, .. } => format!("addFrame {index}"),
                PresentationEvent::RemoveFrame { index, .. } => format!("removeFrame {index}"),
            };
            log.borrow_mut().push(entry);
        });
    }
    log
}

fn titles(p: &Presentation) -> Vec<String> {
    p.frames().iter().map(|f| f.title()).collect()
}

// ------------------------------------------------------------
// Frames
// ------------------------------------------------------------

#[rstest]
fn given_no_frames_when_adding_then_frame_at_zero_and_selected(presentation: Presentation) {
    let log = record(&presentation);

    let frame = presentation.add_frame(ViewState::default()).unwrap();

    assert_eq!(presentation.frame_count(), 1);
    assert_eq!(presentation.frame_index(frame.id()), Some(0));
    assert_eq!(frame.title(), DEFAULT_FRAME_TITLE);
    assert_eq!(frame.presentation(), presentation.id());
    assert_eq!(presentation.selected_frame_indices(), vec![0]);
    assert_eq!(
        *log.borrow(),
        vec!["addFrame 0", "deselectFrame 0", "selectFrame 0"]
    );
}

#[rstest]
#[case::first(0, 1)]
#[case::middle(1, 2)]
#[case::last(2, 3)]
fn given_selected_frame_when_adding_then_inserted_after_it(
    presentation: Presentation,
    #[case] selected: usize,
    #[case] expected_index: usize,
) {
    // Arrange
    for title in ["one", "two", "three"] {
        presentation
            .add_frame(ViewState::default())
            .unwrap()
            .set_title(title);
    }
    presentation.deselect_all_frames().unwrap();
    presentation.select_frame(selected).unwrap();

    // Act
    let frame = presentation.add_frame(ViewState::default()).unwrap();

    // Assert
    assert_eq!(presentation.frame_index(frame.id()), Some(expected_index));
    assert_eq!(presentation.selected_frame_indices(), vec![expected_index]);
    assert_eq!(presentation.frame_count(), 4);
}

#[rstest]
fn given_several_selected_frames_when_adding_then_inserted_after_last_selected(
    presentation: Presentation,
) {
    for title in ["one", "two", "three"] {
        presentation
            .add_frame(ViewState::default())
            .unwrap()
            .set_title(title);
    }
    presentation.deselect_all_frames().unwrap();
    presentation.select_frame(0).unwrap();
    presentation.select_frame(1).unwrap();

    presentation
        .add_frame(ViewState::default())
        .unwrap()
        .set_title("new");

    assert_eq!(titles(&presentation), vec!["one", "two", "new", "three"]);
    assert_eq!(presentation.selected_frame_indices(), vec![2]);
}

#[rstest]
fn given_no_selected_frame_when_adding_then_appended(presentation: Presentation) {
    presentation.add_frame(ViewState::default()).unwrap();
    presentation.add_frame(ViewState::default()).unwrap();
    presentation.deselect_all_frames().unwrap();

    let frame = presentation.add_frame(ViewState::default()).unwrap();

    assert_eq!(presentation.frame_index(frame.id()), Some(2));
}

#[rstest]
fn given_three_frames_when_adding_then_event_order_is_add_deselect_select(
    presentation: Presentation,
) {
    for _ in 0..3 {
        presentation.add_frame(ViewState::default()).unwrap();
    }
    presentation.deselect_all_frames().unwrap();
    presentation.select_frame(0).unwrap();
    let log = record(&presentation);

    presentation.add_frame(ViewState::default()).unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            "addFrame 1",
            "deselectFrame 0",
            "deselectFrame 1",
            "deselectFrame 2",
            "deselectFrame 3",
            "selectFrame 1",
        ]
    );
}

#[rstest]
fn given_frames_when_adding_then_ids_are_unique_and_increasing(presentation: Presentation) {
    let ids: Vec<_> = (0..4)
        .map(|_| presentation.add_frame(ViewState::default()).unwrap().id())
        .collect();

    assert!(ids.windows(2).all(|w| w[0] < w[1]));
    assert!(ids.iter().all(|&id| id != presentation.id()));
}

#[rstest]
fn given_frames_when_removing_then_event_carries_frame(presentation: Presentation) {
    let first = presentation.add_frame(ViewState::default()).unwrap();
    let second = presentation.add_frame(ViewState::default()).unwrap();
    let removed = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&removed);
    presentation.on(PresentationEventKind::RemoveFrame, move |event| {
        if let PresentationEvent::RemoveFrame { frame, index } = event {
            *sink.borrow_mut() = Some((frame.id(), *index));
        }
    });

    let frame = presentation.remove_frame(0).unwrap();

    assert_eq!(frame.id(), first.id());
    assert_eq!(*removed.borrow(), Some((first.id(), 0)));
    assert_eq!(presentation.frame_count(), 1);
    assert_eq!(presentation.frame_index(second.id()), Some(0));
}

#[rstest]
fn given_frame_when_setting_title_then_change_fires(presentation: Presentation) {
    let frame = presentation.add_frame(ViewState::default()).unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    frame.on(FrameEventKind::Change, move |event| {
        let FrameEvent::Change { title } = event;
        sink.borrow_mut().push(title.clone());
    });

    frame.set_title("Overview");

    assert_eq!(*seen.borrow(), vec!["Overview"]);
    assert_eq!(presentation.frame(0).unwrap().title(), "Overview");
}

// ------------------------------------------------------------
// Layers
// ------------------------------------------------------------

#[rstest]
fn given_layers_when_selecting_all_then_one_event_per_layer(presentation: Presentation) {
    let log = record(&presentation);

    presentation.select_all_layers().unwrap();

    assert_eq!(presentation.layer_count(), 4);
    assert_eq!(log.borrow().len(), 4);
    assert!(log.borrow().iter().all(|e| e.starts_with("selectLayer")));
}

#[rstest]
fn given_selected_layer_when_selecting_again_then_event_still_fires(presentation: Presentation) {
    assert!(presentation.layer("A").unwrap().selected);
    let log = record(&presentation);

    presentation.select_layer("A").unwrap();

    assert_eq!(*log.borrow(), vec!["selectLayer A"]);
    assert!(presentation.layer("A").unwrap().selected);
}

#[rstest]
fn given_layers_when_deselecting_all_then_none_selected(presentation: Presentation) {
    presentation.deselect_all_layers().unwrap();
    assert!(presentation.selected_layer_ids().is_empty());

    presentation.select_layer("B").unwrap();
    assert_eq!(presentation.selected_layer_ids(), vec!["B"]);
}

// ------------------------------------------------------------
// Invalid references
// ------------------------------------------------------------

#[rstest]
fn given_unknown_layer_when_selecting_then_invalid_reference(presentation: Presentation) {
    let log = record(&presentation);

    let result = presentation.select_layer("missing");

    assert_eq!(
        result,
        Err(DomainError::InvalidReference(InvalidReference::Layer(
            "missing".into()
        )))
    );
    assert!(log.borrow().is_empty());
}

#[rstest]
#[case::select(true)]
#[case::deselect(false)]
fn given_out_of_range_index_when_changing_frame_selection_then_invalid_reference(
    presentation: Presentation,
    #[case] select: bool,
) {
    presentation.add_frame(ViewState::default()).unwrap();

    let result = if select {
        presentation.select_frame(5)
    } else {
        presentation.deselect_frame(5)
    };

    assert_eq!(
        result,
        Err(DomainError::InvalidReference(InvalidReference::Frame {
            index: 5,
            len: 1
        }))
    );
}

#[rstest]
fn given_empty_presentation_when_removing_frame_then_invalid_reference(
    presentation: Presentation,
) {
    let result = presentation.remove_frame(0);

    assert!(matches!(result, Err(e) if e.is_invalid_reference()));
}

// ------------------------------------------------------------
// Re-entrancy and snapshot
// ------------------------------------------------------------

#[test]
fn given_handler_calling_back_when_frame_added_then_no_borrow_conflict() {
    testing::init_test_setup();
    let document = parse_document(&testing::svg_fixture("<rect/>")).expect("parse svg");
    let presentation = Rc::new(
        Presentation::new(
            document,
            Rc::new(IdGenerator::new()),
            &PresentationOptions::default(),
        )
        .unwrap(),
    );
    let weak: Weak<Presentation> = Rc::downgrade(&presentation);
    let observed = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&observed);
    presentation.on(PresentationEventKind::SelectFrame, move |_| {
        if let Some(p) = weak.upgrade() {
            sink.borrow_mut()
                .push((p.frame_count(), p.selected_frame_indices()));
            p.deselect_layer("sozi-wrapper-0-0").unwrap();
        }
    });

    presentation.add_frame(ViewState::default()).unwrap();
    presentation.add_frame(ViewState::default()).unwrap();

    assert_eq!(*observed.borrow(), vec![(1, vec![0]), (2, vec![1])]);
    assert!(presentation.selected_layer_ids().is_empty());
}

#[rstest]
fn given_frames_and_layers_when_snapshotting_then_reflects_state(presentation: Presentation) {
    let state = ViewState::from_view_box("0 0 800 600").unwrap();
    presentation.add_frame(state.clone()).unwrap().set_title("Intro");
    presentation.deselect_layer("A").unwrap();

    let snapshot = presentation.snapshot();

    assert_eq!(snapshot.layers.len(), 4);
    assert!(!snapshot.layers["A"].selected);
    assert!(snapshot.layers["sozi-wrapper-0-0"].auto);
    assert_eq!(snapshot.frames.len(), 1);
    assert_eq!(snapshot.frames[0].title, "Intro");
    assert!(snapshot.frames[0].selected);
    assert_eq!(snapshot.frames[0].state, state);
}
