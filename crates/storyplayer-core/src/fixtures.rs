use indexmap::IndexMap;

use crate::model::{
    Composition, CompositionUnit, ElementCollection, EventKind, Project, StoryElement,
    TimelineEvent,
};

/// Small two-composition project used by the CLI demo and tests.
///
/// Built layout of the first composition (seconds):
/// `Cold Open` 0..18, `Interlude` empty at 18, `The Call` 18..45, `Exit` 45..55.
#[must_use]
pub fn demo_project() -> Project {
    let mut elements = IndexMap::new();
    elements.insert(
        "characters".to_string(),
        vec![
            StoryElement::character("char-mara", "Mara"),
            StoryElement::character("char-vik", "Vik"),
        ],
    );
    elements.insert(
        "dialogue".to_string(),
        vec![
            StoryElement::dialogue(
                "dlg-mara-1",
                "char-mara",
                ["Third night this week.", "Somebody keeps calling the booth."],
            ),
            StoryElement::dialogue("dlg-vik-1", "char-vik", ["You picked up. That was the mistake."]),
            StoryElement::dialogue("dlg-mara-2", "char-mara", ["Then tell me who's on the line."]),
        ],
    );
    elements.insert(
        "actions".to_string(),
        vec![
            StoryElement::action("act-rain", "Rain sheets across the empty tram depot."),
            StoryElement::action("act-phone", "The payphone rings. Mara doesn't move."),
            StoryElement::action("act-leave", "Vik leaves the receiver swinging."),
        ],
    );
    elements.insert(
        "transitions".to_string(),
        vec![
            StoryElement::transition("tr-fade-in", "FADE IN:"),
            StoryElement::transition("tr-cut", "CUT TO BLACK."),
        ],
    );

    let cut_a = Composition {
        name: Some("Night Shift (Cut A)".to_string()),
        units: vec![
            CompositionUnit::new(
                "Cold Open",
                vec![
                    event("tr-fade-in", EventKind::Transition, Some("00:04")),
                    event("act-rain", EventKind::Action, Some("00:06")),
                    event("dlg-mara-1", EventKind::Dialogue, Some("00:08")),
                ],
            ),
            CompositionUnit::new("Interlude", Vec::new()),
            CompositionUnit::new(
                "The Call",
                vec![
                    event("dlg-vik-1", EventKind::Dialogue, Some("12")),
                    event("dlg-mara-2", EventKind::Dialogue, None),
                    event("act-phone", EventKind::Action, Some("0:05")),
                ],
            ),
            CompositionUnit::new(
                "Exit",
                vec![
                    event("act-leave", EventKind::Action, Some("00:00:07")),
                    event("tr-cut", EventKind::Transition, Some("3")),
                ],
            ),
        ],
        total_length: 0.0,
    };

    let alternate = Composition {
        name: Some("Night Shift (Alternate Ending)".to_string()),
        units: vec![CompositionUnit::new(
            "Exit (alt)",
            vec![
                event("act-phone", EventKind::Action, Some("00:05")),
                event("dlg-mara-2", EventKind::Dialogue, Some("00:05")),
            ],
        )],
        total_length: 0.0,
    };

    Project {
        title: Some("Night Shift".to_string()),
        elements: ElementCollection::Grouped(elements),
        compositions: vec![cut_a, alternate],
    }
}

fn event(element_id: &str, kind: EventKind, duration: Option<&str>) -> TimelineEvent {
    TimelineEvent::new(element_id, kind, duration)
}
