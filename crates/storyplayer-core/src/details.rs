use std::fmt;

use serde::Serialize;

use crate::{
    model::{ElementBody, ElementIndex},
    time::format_timecode,
    timeline::Resolution,
};

/// What the player shows for the element under the cursor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementCard {
    Dialogue { character: String, lines: Vec<String> },
    Action { text: String },
    Transition { text: String },
    Other { element_type: String, data: String },
    /// The event references an id the project does not define.
    Missing { element_id: String },
    /// The cursor is inside a unit that has no events.
    EmptyUnit,
    /// The cursor is outside every unit.
    Idle,
}

impl fmt::Display for ElementCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dialogue { character, lines } => {
                write!(f, "Dialogue by {character}")?;
                for line in lines {
                    write!(f, "\n{line}")?;
                }
                Ok(())
            }
            Self::Action { text } => write!(f, "Action\n{text}"),
            Self::Transition { text } => write!(f, "Transition\n{text}"),
            Self::Other { element_type, data } => write!(f, "{element_type}\n{data}"),
            Self::Missing { element_id } => write!(f, "No element found for id {element_id}"),
            Self::EmptyUnit => f.write_str("No event in this unit."),
            Self::Idle => f.write_str("No event found."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveDetails {
    pub time: f64,
    pub timecode: String,
    /// Index of the unit to highlight in a unit list.
    pub unit_index: Option<usize>,
    pub caption: String,
    pub card: ElementCard,
    /// The resolved event as pretty JSON, empty when there is none.
    pub event_json: String,
}

impl ActiveDetails {
    #[must_use]
    pub fn idle(time: f64) -> Self {
        Self {
            time,
            timecode: format_timecode(time),
            unit_index: None,
            caption: String::new(),
            card: ElementCard::Idle,
            event_json: String::new(),
        }
    }

    #[must_use]
    pub fn describe(time: f64, resolution: Option<&Resolution<'_>>, elements: &ElementIndex) -> Self {
        let Some(resolution) = resolution else {
            return Self::idle(time);
        };

        let Some(event) = resolution.event else {
            return Self {
                unit_index: Some(resolution.unit_index),
                caption: format!("Unit: {}, no event at {time:.2}s", resolution.unit.label),
                card: ElementCard::EmptyUnit,
                ..Self::idle(time)
            };
        };

        let card = match elements.get(&event.element_id) {
            Some(element) => match &element.body {
                ElementBody::Dialogue(dialogue) => ElementCard::Dialogue {
                    character: character_name(dialogue.character_id.as_deref(), elements),
                    lines: dialogue.lines.clone(),
                },
                ElementBody::Action { text } => ElementCard::Action { text: text.clone() },
                ElementBody::Transition { text } => ElementCard::Transition { text: text.clone() },
                ElementBody::Other { kind, data } => ElementCard::Other {
                    element_type: kind.clone(),
                    data: serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string()),
                },
            },
            None => ElementCard::Missing {
                element_id: event.element_id.clone(),
            },
        };

        Self {
            time,
            timecode: format_timecode(time),
            unit_index: Some(resolution.unit_index),
            caption: format!(
                "Unit: {}, Event: {} at {time:.2}s",
                resolution.unit.label, event.element_type
            ),
            card,
            event_json: serde_json::to_string_pretty(event).unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.card == ElementCard::Idle
    }
}

impl Default for ActiveDetails {
    fn default() -> Self {
        Self::idle(0.0)
    }
}

fn character_name(character_id: Option<&str>, elements: &ElementIndex) -> String {
    let Some(character_id) = character_id else {
        return "Unknown".to_string();
    };

    elements
        .get(character_id)
        .and_then(|character| character.name.clone())
        .unwrap_or_else(|| character_id.to_string())
}
