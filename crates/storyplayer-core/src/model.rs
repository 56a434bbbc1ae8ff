use std::{collections::HashMap, fmt};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub elements: ElementCollection,
    #[serde(default, deserialize_with = "null_as_default")]
    pub compositions: Vec<Composition>,
}

impl Project {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn element_index(&self) -> ElementIndex {
        ElementIndex::from_collection(&self.elements)
    }

    #[must_use]
    pub fn event_count(&self) -> usize {
        self.compositions.iter().map(Composition::event_count).sum()
    }
}

/// Story elements as they appear in project JSON: either one flat list or named group buckets.
///
/// Buckets keep document order, so a duplicate id in a later bucket overrides an earlier one.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ElementCollection {
    Flat(Vec<StoryElement>),
    Grouped(IndexMap<String, Vec<StoryElement>>),
}

impl Default for ElementCollection {
    fn default() -> Self {
        Self::Flat(Vec::new())
    }
}

impl ElementCollection {
    pub fn iter(&self) -> impl Iterator<Item = &StoryElement> {
        let (flat, grouped): (&[StoryElement], Option<&IndexMap<String, Vec<StoryElement>>>) =
            match self {
                Self::Flat(elements) => (elements.as_slice(), None),
                Self::Grouped(groups) => (&[], Some(groups)),
            };

        flat.iter()
            .chain(grouped.into_iter().flat_map(|groups| groups.values().flatten()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    fn from_json(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::Flat(parse_elements(items)),
            Value::Object(groups) => Self::Grouped(
                groups
                    .into_iter()
                    .filter_map(|(group, bucket)| match bucket {
                        Value::Array(items) => Some((group, parse_elements(items))),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => Self::default(),
        }
    }
}

impl<'de> Deserialize<'de> for ElementCollection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Self::from_json)
    }
}

fn parse_elements(items: Vec<Value>) -> Vec<StoryElement> {
    items
        .into_iter()
        .filter_map(|item| match StoryElement::try_from(item) {
            Ok(element) => Some(element),
            Err(error) => {
                warn!(%error, "skipping story element");
                None
            }
        })
        .collect()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ElementShapeError {
    #[error("story element must be a JSON object")]
    NotAnObject,
    #[error("story element has no usable id")]
    MissingId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "Value", into = "Value")]
pub struct StoryElement {
    pub id: String,
    pub name: Option<String>,
    pub body: ElementBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementBody {
    Dialogue(Dialogue),
    Action { text: String },
    Transition { text: String },
    /// Any other element type, kept verbatim for display.
    Other { kind: String, data: Value },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dialogue {
    pub character_id: Option<String>,
    pub lines: Vec<String>,
}

impl StoryElement {
    #[must_use]
    pub fn dialogue(
        id: impl Into<String>,
        character_id: impl Into<String>,
        lines: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: id.into(),
            name: None,
            body: ElementBody::Dialogue(Dialogue {
                character_id: Some(character_id.into()),
                lines: lines.into_iter().map(Into::into).collect(),
            }),
        }
    }

    #[must_use]
    pub fn action(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            body: ElementBody::Action { text: text.into() },
        }
    }

    #[must_use]
    pub fn transition(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            body: ElementBody::Transition { text: text.into() },
        }
    }

    #[must_use]
    pub fn character(id: impl Into<String>, name: impl Into<String>) -> Self {
        let id = id.into();
        let name = name.into();
        Self {
            body: ElementBody::Other {
                kind: "character".to_string(),
                data: json!({ "id": id, "type": "character", "name": name }),
            },
            id,
            name: Some(name),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        match &self.body {
            ElementBody::Dialogue(_) => "dialogue",
            ElementBody::Action { .. } => "action",
            ElementBody::Transition { .. } => "transition",
            ElementBody::Other { kind, .. } => kind,
        }
    }
}

impl TryFrom<Value> for StoryElement {
    type Error = ElementShapeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(object) = value else {
            return Err(ElementShapeError::NotAnObject);
        };

        let id = object
            .get("id")
            .and_then(id_from_json)
            .ok_or(ElementShapeError::MissingId)?;
        let name = string_field(&object, "name");
        let kind = string_field(&object, "type").unwrap_or_else(|| "unknown".to_string());

        let body = match kind.as_str() {
            "dialogue" => ElementBody::Dialogue(Dialogue {
                character_id: object.get("characterId").and_then(id_from_json),
                lines: object
                    .get("lines")
                    .and_then(Value::as_array)
                    .map(|lines| lines.iter().filter_map(line_text).collect())
                    .unwrap_or_default(),
            }),
            "action" => ElementBody::Action {
                text: string_field(&object, "text").unwrap_or_default(),
            },
            "transition" => ElementBody::Transition {
                text: string_field(&object, "text").unwrap_or_default(),
            },
            _ => ElementBody::Other {
                kind,
                data: Value::Object(object),
            },
        };

        Ok(Self { id, name, body })
    }
}

impl From<StoryElement> for Value {
    fn from(element: StoryElement) -> Self {
        let mut object = match element.body {
            ElementBody::Other { data, .. } => {
                return data;
            }
            ElementBody::Dialogue(dialogue) => {
                let mut object = Map::new();
                object.insert("type".into(), "dialogue".into());
                if let Some(character_id) = dialogue.character_id {
                    object.insert("characterId".into(), character_id.into());
                }
                let lines = dialogue
                    .lines
                    .into_iter()
                    .map(|text| json!({ "text": text }))
                    .collect();
                object.insert("lines".into(), Value::Array(lines));
                object
            }
            ElementBody::Action { text } => {
                let mut object = Map::new();
                object.insert("type".into(), "action".into());
                object.insert("text".into(), text.into());
                object
            }
            ElementBody::Transition { text } => {
                let mut object = Map::new();
                object.insert("type".into(), "transition".into());
                object.insert("text".into(), text.into());
                object
            }
        };

        object.insert("id".into(), element.id.into());
        if let Some(name) = element.name {
            object.insert("name".into(), name.into());
        }
        Value::Object(object)
    }
}

/// Story elements flattened into one id-keyed lookup. Later duplicates win.
#[derive(Debug, Clone, Default)]
pub struct ElementIndex {
    elements: HashMap<String, StoryElement>,
}

impl ElementIndex {
    #[must_use]
    pub fn from_collection(collection: &ElementCollection) -> Self {
        let elements = collection
            .iter()
            .map(|element| (element.id.clone(), element.clone()))
            .collect();
        Self { elements }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&StoryElement> {
        self.elements.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Composition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub units: Vec<CompositionUnit>,
    #[serde(default)]
    pub total_length: f64,
}

impl Composition {
    #[must_use]
    pub fn new(units: Vec<CompositionUnit>) -> Self {
        Self {
            name: None,
            units,
            total_length: 0.0,
        }
    }

    #[must_use]
    pub fn event_count(&self) -> usize {
        self.units.iter().map(|unit| unit.events.len()).sum()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompositionUnit {
    #[serde(default, deserialize_with = "deserialize_label")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub events: Vec<TimelineEvent>,
    #[serde(default)]
    pub start_time: f64,
    #[serde(default)]
    pub length: f64,
}

impl CompositionUnit {
    #[must_use]
    pub fn new(label: impl Into<String>, events: Vec<TimelineEvent>) -> Self {
        Self {
            label: label.into(),
            events,
            start_time: 0.0,
            length: 0.0,
        }
    }

    #[must_use]
    pub fn end_time(&self) -> f64 {
        self.start_time + self.length
    }

    #[must_use]
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start_time && time < self.end_time()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    #[serde(default, deserialize_with = "deserialize_element_id")]
    pub element_id: String,
    #[serde(default, deserialize_with = "deserialize_event_kind")]
    pub element_type: EventKind,
    #[serde(
        default,
        deserialize_with = "deserialize_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<String>,
    #[serde(default)]
    pub computed_start: f64,
    #[serde(default)]
    pub computed_duration: f64,
}

impl TimelineEvent {
    #[must_use]
    pub fn new(element_id: impl Into<String>, element_type: EventKind, duration: Option<&str>) -> Self {
        Self {
            element_id: element_id.into(),
            element_type,
            duration: duration.map(str::to_string),
            computed_start: 0.0,
            computed_duration: 0.0,
        }
    }

    #[must_use]
    pub fn computed_end(&self) -> f64 {
        self.computed_start + self.computed_duration
    }

    #[must_use]
    pub fn contains_offset(&self, offset: f64) -> bool {
        offset >= self.computed_start && offset < self.computed_end()
    }
}

/// Styling/categorisation tag of an event. Independent of the referenced element's own type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Dialogue,
    Action,
    Transition,
    Other(String),
}

impl Default for EventKind {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl EventKind {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Dialogue => "dialogue",
            Self::Action => "action",
            Self::Transition => "transition",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for EventKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "dialogue" => Self::Dialogue,
            "action" => Self::Action,
            "transition" => Self::Transition,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for EventKind {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<EventKind> for String {
    fn from(value: EventKind) -> Self {
        match value {
            EventKind::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn id_from_json(value: &Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_string)
}

fn line_text(line: &Value) -> Option<String> {
    match line {
        Value::String(text) => Some(text.clone()),
        Value::Object(object) => string_field(object, "text"),
        _ => None,
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_element_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(id_from_json(&value).unwrap_or_default())
}

fn deserialize_label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(label) => label,
        Value::Number(label) => label.to_string(),
        _ => String::new(),
    })
}

// Anything but a string is an untagged event.
fn deserialize_event_kind<'de, D>(deserializer: D) -> Result<EventKind, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(tag) => EventKind::from(tag),
        _ => EventKind::default(),
    })
}

// Durations are usually strings, but bare numbers are read as seconds.
fn deserialize_duration<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(raw) => Some(raw),
        Value::Number(seconds) => Some(seconds.to_string()),
        _ => None,
    })
}
