use storyplayer_core::{
    Composition, CompositionUnit, EventKind, TimelineEvent, TimelineIndex, build_timeline,
    fixtures::demo_project, resolve,
};

fn ten_and_five() -> Composition {
    let mut composition = Composition::new(vec![
        CompositionUnit::new(
            "First",
            vec![
                TimelineEvent::new("a", EventKind::Dialogue, Some("4")),
                TimelineEvent::new("b", EventKind::Action, Some("6")),
            ],
        ),
        CompositionUnit::new(
            "Second",
            vec![
                TimelineEvent::new("c", EventKind::Action, Some("1")),
                TimelineEvent::new("d", EventKind::Dialogue, Some("3")),
                TimelineEvent::new("e", EventKind::Transition, Some("1")),
            ],
        ),
    ]);
    build_timeline(&mut composition);
    composition
}

fn built_demo() -> Composition {
    let mut composition = demo_project().compositions[0].clone();
    build_timeline(&mut composition);
    composition
}

#[test]
fn resolves_second_unit_and_containing_event() {
    let composition = ten_and_five();
    assert_eq!(composition.units[1].start_time, 10.0);

    let found = resolve(&composition, 12.0).expect("t=12 is inside the second unit");
    assert_eq!(found.unit_index, 1);
    assert_eq!(found.unit.label, "Second");
    assert_eq!(found.event_index, Some(1));
    let event = found.event.expect("offset 2 is covered by an event");
    assert!(event.computed_start <= 2.0 && 2.0 < event.computed_end());
    assert_eq!(event.element_id, "d");
}

#[test]
fn end_of_timeline_and_negative_times_resolve_to_nothing() {
    let composition = ten_and_five();
    assert!(resolve(&composition, 15.0).is_none());
    assert!(resolve(&composition, -1.0).is_none());
    assert!(resolve(&composition, f64::NAN).is_none());
}

#[test]
fn unit_and_event_ranges_are_half_open() {
    let composition = ten_and_five();

    let at_start = resolve(&composition, 0.0).expect("t=0 is inside the first unit");
    assert_eq!((at_start.unit_index, at_start.event_index), (0, Some(0)));

    let at_event_boundary = resolve(&composition, 4.0).expect("t=4 is inside the first unit");
    assert_eq!(at_event_boundary.event_index, Some(1));

    let at_unit_boundary = resolve(&composition, 10.0).expect("t=10 starts the second unit");
    assert_eq!((at_unit_boundary.unit_index, at_unit_boundary.event_index), (1, Some(0)));

    let just_before_end = resolve(&composition, 14.999).expect("still inside");
    assert_eq!(just_before_end.event_index, Some(2));
}

#[test]
fn zero_length_units_are_never_selected() {
    let composition = built_demo();
    // "Interlude" starts at 18 with no events; "The Call" also starts at 18.
    let found = resolve(&composition, 18.0).expect("t=18 is inside The Call");
    assert_eq!(found.unit.label, "The Call");
    assert_eq!(found.unit_index, 2);
}

#[test]
fn uncovered_offset_falls_back_to_first_event() {
    let mut composition = ten_and_five();
    // Corrupt the partition: leave a gap at the start of the second unit.
    composition.units[1].events[0].computed_start = 0.5;

    let found = resolve(&composition, 10.25).expect("unit still contains the time");
    assert_eq!(found.unit_index, 1);
    assert_eq!(found.event_index, Some(0));
    assert_eq!(found.event.map(|event| event.element_id.as_str()), Some("c"));

    let index = TimelineIndex::new(&composition);
    let indexed = index
        .resolve(&composition, 10.25)
        .expect("unit still contains the time");
    assert_eq!(indexed.event_index, Some(0));
}

#[test]
fn unit_without_events_resolves_with_no_event() {
    let mut composition = Composition::new(vec![CompositionUnit::new("Hand-timed", Vec::new())]);
    composition.units[0].length = 5.0;
    composition.total_length = 5.0;

    let found = resolve(&composition, 2.0).expect("unit covers t=2");
    assert_eq!(found.unit_index, 0);
    assert!(found.event.is_none());
    assert!(found.event_index.is_none());
}

#[test]
fn index_agrees_with_linear_scan_on_demo() {
    let composition = built_demo();
    let index = TimelineIndex::new(&composition);

    let mut time = -2.0;
    while time < composition.total_length + 2.0 {
        let linear = resolve(&composition, time).map(|found| (found.unit_index, found.event_index));
        let indexed = index
            .resolve(&composition, time)
            .map(|found| (found.unit_index, found.event_index));
        assert_eq!(linear, indexed, "disagreement at t={time}");
        time += 0.25;
    }
}

#[test]
fn empty_composition_never_resolves() {
    let mut composition = Composition::default();
    build_timeline(&mut composition);
    let index = TimelineIndex::new(&composition);

    assert!(resolve(&composition, 0.0).is_none());
    assert!(index.resolve(&composition, 0.0).is_none());
}
