use std::{cell::RefCell, rc::Rc};

use storyplayer_core::{
    Composition, CursorChange, ElementCard, LoadOutcome, PlayState, PlayerObserver,
    PlayerSession, Project, SessionError, fixtures::demo_project, persistence::parse_project,
};

#[derive(Debug, Clone, PartialEq)]
enum Note {
    Built { units: usize, total_length: f64 },
    Cursor {
        time: f64,
        unit: Option<String>,
        element: Option<String>,
    },
    Playing(bool),
}

struct Recorder(Rc<RefCell<Vec<Note>>>);

impl PlayerObserver for Recorder {
    fn on_timeline_built(&mut self, composition: &Composition) {
        self.0.borrow_mut().push(Note::Built {
            units: composition.units.len(),
            total_length: composition.total_length,
        });
    }

    fn on_cursor_changed(&mut self, change: &CursorChange<'_>) {
        self.0.borrow_mut().push(Note::Cursor {
            time: change.time,
            unit: change.unit().map(|unit| unit.label.clone()),
            element: change.event().map(|event| event.element_id.clone()),
        });
    }

    fn on_play_state_changed(&mut self, is_playing: bool) {
        self.0.borrow_mut().push(Note::Playing(is_playing));
    }
}

fn recorded_session() -> (PlayerSession, Rc<RefCell<Vec<Note>>>) {
    let notes = Rc::new(RefCell::new(Vec::new()));
    let mut session = PlayerSession::new();
    session.add_observer(Box::new(Recorder(Rc::clone(&notes))));
    (session, notes)
}

fn loaded_session() -> (PlayerSession, Rc<RefCell<Vec<Note>>>) {
    let (mut session, notes) = recorded_session();
    session
        .load_project("nightshift", demo_project())
        .expect("demo project should load");
    notes.borrow_mut().clear();
    (session, notes)
}

fn cursor(time: f64, unit: &str, element: &str) -> Note {
    Note::Cursor {
        time,
        unit: Some(unit.to_string()),
        element: Some(element.to_string()),
    }
}

fn harbor_project() -> Project {
    parse_project(include_bytes!("fixtures/harbor.project.json")).expect("fixture should parse")
}

#[test]
fn loading_builds_first_composition_and_publishes_start() {
    let (mut session, notes) = recorded_session();
    let outcome = session
        .load_project("nightshift", demo_project())
        .expect("demo project should load");

    assert_eq!(
        outcome,
        LoadOutcome::Applied {
            units: 4,
            events: 8,
            total_length: 55.0
        }
    );
    assert_eq!(session.project_key(), Some("nightshift"));
    assert_eq!(session.composition_index(), Some(0));
    assert_eq!(session.elements().map(|elements| elements.len()), Some(10));
    assert_eq!(
        *notes.borrow(),
        vec![
            Note::Built {
                units: 4,
                total_length: 55.0
            },
            cursor(0.0, "Cold Open", "tr-fade-in"),
        ]
    );
    assert_eq!(session.details().card.to_string(), "Transition\nFADE IN:");
}

#[test]
fn every_seek_publishes_exactly_once() {
    let (mut session, notes) = loaded_session();

    assert!(session.seek(20.0));
    assert!(session.seek(100.0));
    assert!(session.seek(-1.0));

    assert_eq!(
        *notes.borrow(),
        vec![
            cursor(20.0, "The Call", "dlg-vik-1"),
            Note::Cursor {
                time: 100.0,
                unit: None,
                element: None
            },
            Note::Cursor {
                time: -1.0,
                unit: None,
                element: None
            },
        ]
    );
    assert!(session.details().is_idle());
}

#[test]
fn details_follow_the_cursor() {
    let (mut session, _notes) = loaded_session();
    session.seek(31.0);

    let details = session.details();
    assert_eq!(details.caption, "Unit: The Call, Event: dialogue at 31.00s");
    assert_eq!(details.unit_index, Some(2));
    assert_eq!(details.timecode, "00:00:31:000");
    assert_eq!(
        details.card,
        ElementCard::Dialogue {
            character: "Mara".to_string(),
            lines: vec!["Then tell me who's on the line.".to_string()],
        }
    );

    let resolved = session.resolve_cursor().expect("cursor is inside the timeline");
    assert_eq!(resolved.event_index, Some(1));
}

#[test]
fn playback_publishes_frames_and_stops_at_end() {
    let (mut session, notes) = loaded_session();
    session.seek(50.0);
    notes.borrow_mut().clear();

    assert!(session.play());
    assert!(!session.play());
    assert_eq!(session.advance(9.0), Some(50.0));
    assert_eq!(session.advance(3.0), Some(53.0));
    assert_eq!(session.advance(3.0), Some(56.0));
    assert_eq!(session.play_state(), PlayState::Stopped);
    assert_eq!(session.advance(1.0), None);

    assert_eq!(
        *notes.borrow(),
        vec![
            Note::Playing(true),
            cursor(50.0, "Exit", "act-leave"),
            cursor(53.0, "Exit", "tr-cut"),
            Note::Cursor {
                time: 56.0,
                unit: None,
                element: None
            },
            Note::Playing(false),
        ]
    );
}

#[test]
fn pause_then_play_does_not_skip() {
    let (mut session, _notes) = loaded_session();
    session.play();
    session.tick(1.0);
    session.tick(3.0);
    assert_eq!(session.cursor(), 2.0);

    assert!(session.pause());
    session.play();
    assert_eq!(session.tick(40.0), Some(2.0));
    assert_eq!(session.tick(41.0), Some(3.0));
}

#[test]
fn toggle_playback_publishes_both_transitions() {
    let (mut session, notes) = loaded_session();

    assert_eq!(session.toggle_playback(), PlayState::Playing);
    assert!(session.is_playing());
    assert_eq!(session.toggle_playback(), PlayState::Stopped);
    assert!(!session.is_playing());

    assert_eq!(
        *notes.borrow(),
        vec![Note::Playing(true), Note::Playing(false)]
    );
    assert_eq!(session.cursor(), 0.0);
}

#[test]
fn toggle_on_empty_session_stays_stopped() {
    let (mut session, notes) = recorded_session();

    assert_eq!(session.toggle_playback(), PlayState::Stopped);
    assert!(notes.borrow().is_empty());
}

#[test]
fn superseded_loads_are_discarded() {
    let (mut session, notes) = recorded_session();

    let first = session.begin_load("harbor");
    let second = session.begin_load("nightshift");

    let applied = session
        .finish_load(second, Ok(demo_project()))
        .expect("latest load applies");
    assert!(matches!(applied, LoadOutcome::Applied { .. }));

    let stale = session
        .finish_load(first, Ok(harbor_project()))
        .expect("stale load is not an error");
    assert_eq!(stale, LoadOutcome::Superseded);
    assert_eq!(session.project_key(), Some("nightshift"));
    assert_eq!(session.composition().map(|c| c.total_length), Some(55.0));
    assert_eq!(notes.borrow().len(), 2);
}

#[test]
fn stale_result_arriving_first_is_discarded_too() {
    let (mut session, _notes) = recorded_session();

    let first = session.begin_load("harbor");
    let second = session.begin_load("nightshift");

    assert_eq!(
        session
            .finish_load(first, Ok(harbor_project()))
            .expect("stale load is not an error"),
        LoadOutcome::Superseded
    );
    assert!(session.project().is_none());

    session
        .finish_load(second, Ok(demo_project()))
        .expect("latest load applies");
    assert_eq!(session.project_key(), Some("nightshift"));
}

#[test]
fn failed_load_keeps_previous_state() {
    let (mut session, notes) = loaded_session();
    session.seek(20.0);
    notes.borrow_mut().clear();

    let ticket = session.begin_load("broken");
    let error = session
        .finish_load(ticket, Err(anyhow::anyhow!("connection reset")))
        .expect_err("failed fetch is reported");
    assert!(matches!(error, SessionError::Load { ref key, .. } if key == "broken"));
    assert!(error.to_string().contains("connection reset"));

    assert_eq!(session.project_key(), Some("nightshift"));
    assert_eq!(session.cursor(), 20.0);
    assert_eq!(session.composition().map(|c| c.total_length), Some(55.0));
    assert!(notes.borrow().is_empty());
}

#[test]
fn project_without_compositions_is_rejected() {
    let (mut session, notes) = loaded_session();

    let error = session
        .load_project("blank", Project::new("Blank"))
        .expect_err("nothing to play");
    assert!(matches!(error, SessionError::EmptyProject { .. }));
    assert_eq!(session.project_key(), Some("nightshift"));
    assert!(notes.borrow().is_empty());
}

#[test]
fn reloading_while_playing_stops_playback() {
    let (mut session, notes) = loaded_session();
    session.play();
    session.advance(0.0);
    session.advance(5.0);
    notes.borrow_mut().clear();

    session
        .load_project("harbor", harbor_project())
        .expect("harbor loads");

    assert!(!session.is_playing());
    assert_eq!(
        *notes.borrow(),
        vec![
            Note::Built {
                units: 1,
                total_length: 25.0
            },
            Note::Playing(false),
            cursor(0.0, "Dawn", "h-open"),
        ]
    );
}

#[test]
fn unit_and_event_jumps_seek_to_absolute_starts() {
    let (mut session, _notes) = loaded_session();

    assert_eq!(session.jump_to_unit(2).expect("unit exists"), 18.0);
    assert_eq!(session.cursor(), 18.0);

    // Interlude has no events; its start is shared with The Call.
    assert_eq!(session.jump_to_unit(1).expect("unit exists"), 18.0);
    assert_eq!(session.details().unit_index, Some(2));

    assert_eq!(session.jump_to_event(3, 1).expect("event exists"), 52.0);
    assert_eq!(
        session.resolve_cursor().and_then(|found| found.event).map(|e| e.element_id.as_str()),
        Some("tr-cut")
    );

    assert!(matches!(
        session.jump_to_unit(9),
        Err(SessionError::UnitNotFound(9))
    ));
    assert!(matches!(
        session.jump_to_event(1, 0),
        Err(SessionError::EventNotFound { unit: 1, event: 0 })
    ));
    assert_eq!(session.cursor(), 52.0);
}

#[test]
fn next_and_previous_event_navigation() {
    let (mut session, notes) = loaded_session();

    assert_eq!(session.next_event(), Some(4.0));
    assert_eq!(session.next_event(), Some(10.0));
    assert_eq!(session.next_event(), Some(18.0));
    assert_eq!(session.previous_event(), Some(10.0));

    session.seek(52.0);
    notes.borrow_mut().clear();
    assert_eq!(session.next_event(), None);
    assert!(notes.borrow().is_empty(), "no boundary means no seek");
    assert_eq!(session.previous_event(), Some(45.0));

    session.seek(0.0);
    assert_eq!(session.previous_event(), None);
    assert_eq!(session.cursor(), 0.0);
}

#[test]
fn missing_elements_surface_as_missing_card() {
    let (mut session, _notes) = recorded_session();
    session
        .load_project("harbor", harbor_project())
        .expect("harbor loads");

    session.seek(24.5);
    assert_eq!(
        session.details().card,
        ElementCard::Missing {
            element_id: "h-missing".to_string()
        }
    );

    session.seek(13.0);
    assert_eq!(
        session.details().card.to_string(),
        "Dialogue by Ines\nIt came back empty again."
    );

    session.seek(21.0);
    assert!(matches!(
        &session.details().card,
        ElementCard::Other { element_type, data } if element_type == "prop" && data.contains("Tide chart")
    ));
}

#[test]
fn activating_another_composition_rebuilds_and_restarts() {
    let (mut session, notes) = loaded_session();
    session.seek(30.0);
    notes.borrow_mut().clear();

    session.activate_composition(1).expect("second composition exists");
    assert_eq!(session.composition_index(), Some(1));
    assert_eq!(
        *notes.borrow(),
        vec![
            Note::Built {
                units: 1,
                total_length: 10.0
            },
            cursor(0.0, "Exit (alt)", "act-phone"),
        ]
    );

    assert!(matches!(
        session.activate_composition(5),
        Err(SessionError::CompositionNotFound(5))
    ));
    assert_eq!(session.composition_index(), Some(1));
}

#[test]
fn empty_session_is_inert() {
    let (mut session, notes) = recorded_session();

    assert!(!session.play());
    assert_eq!(session.advance(1.0), None);
    assert_eq!(session.next_event(), None);
    assert!(matches!(
        session.jump_to_unit(0),
        Err(SessionError::NoActiveComposition)
    ));
    assert!(matches!(
        session.activate_composition(0),
        Err(SessionError::NoActiveComposition)
    ));

    assert!(session.seek(3.0));
    assert!(session.details().is_idle());
    assert_eq!(notes.borrow().len(), 1);
}

#[test]
fn sessions_are_independent() {
    let (mut left, _) = loaded_session();
    let (mut right, _) = loaded_session();

    left.seek(12.0);
    right.seek(47.0);
    assert_ne!(left.id(), right.id());
    assert_eq!(left.cursor(), 12.0);
    assert_eq!(right.cursor(), 47.0);
}
