use std::fmt;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    details::ActiveDetails,
    model::{Composition, CompositionUnit, ElementIndex, Project, TimelineEvent},
    playback::{PlayState, PlaybackClock},
    source::ProjectSource,
    timeline::{Resolution, TimelineIndex, build_timeline},
};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no project loaded")]
    NoActiveComposition,
    #[error("composition not found: {0}")]
    CompositionNotFound(usize),
    #[error("unit not found: {0}")]
    UnitNotFound(usize),
    #[error("event {event} not found in unit {unit}")]
    EventNotFound { unit: usize, event: usize },
    #[error("project '{key}' has no compositions")]
    EmptyProject { key: String },
    #[error("failed to load project '{key}': {message}")]
    Load { key: String, message: String },
}

/// Render-side callbacks. Every method defaults to a no-op.
pub trait PlayerObserver {
    fn on_timeline_built(&mut self, _composition: &Composition) {}

    fn on_cursor_changed(&mut self, _change: &CursorChange<'_>) {}

    fn on_play_state_changed(&mut self, _is_playing: bool) {}
}

/// Published once for every cursor movement.
#[derive(Debug, Clone, Copy)]
pub struct CursorChange<'a> {
    pub time: f64,
    pub resolution: Option<Resolution<'a>>,
    pub details: &'a ActiveDetails,
}

impl<'a> CursorChange<'a> {
    #[must_use]
    pub fn unit(&self) -> Option<&'a CompositionUnit> {
        self.resolution.map(|resolution| resolution.unit)
    }

    #[must_use]
    pub fn event(&self) -> Option<&'a TimelineEvent> {
        self.resolution.and_then(|resolution| resolution.event)
    }
}

/// Identifies one requested project load. Only the most recently issued ticket is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    key: String,
    generation: u64,
}

impl LoadTicket {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Applied {
        units: usize,
        events: usize,
        total_length: f64,
    },
    /// A newer load was requested after this one; its result was dropped.
    Superseded,
}

#[derive(Debug, Clone)]
struct ActiveProject {
    key: String,
    project: Project,
    composition_index: usize,
    elements: ElementIndex,
    index: TimelineIndex,
}

impl ActiveProject {
    fn composition(&self) -> &Composition {
        &self.project.compositions[self.composition_index]
    }

    fn resolve(&self, time: f64) -> Option<Resolution<'_>> {
        self.index.resolve(self.composition(), time)
    }
}

/// One player: the loaded project, its active composition, element lookup and playhead.
///
/// All operations run synchronously and notify observers before they return.
pub struct PlayerSession {
    id: Uuid,
    active: Option<ActiveProject>,
    clock: PlaybackClock,
    details: ActiveDetails,
    observers: Vec<Box<dyn PlayerObserver>>,
    load_generation: u64,
}

impl fmt::Debug for PlayerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerSession")
            .field("id", &self.id)
            .field("project_key", &self.project_key())
            .field("clock", &self.clock)
            .field("observers", &self.observers.len())
            .field("load_generation", &self.load_generation)
            .finish_non_exhaustive()
    }
}

impl Default for PlayerSession {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            active: None,
            clock: PlaybackClock::default(),
            details: ActiveDetails::default(),
            observers: Vec::new(),
            load_generation: 0,
        }
    }
}

impl PlayerSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn add_observer(&mut self, observer: Box<dyn PlayerObserver>) {
        self.observers.push(observer);
    }

    #[must_use]
    pub fn project_key(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.key.as_str())
    }

    #[must_use]
    pub fn project(&self) -> Option<&Project> {
        self.active.as_ref().map(|active| &active.project)
    }

    #[must_use]
    pub fn composition(&self) -> Option<&Composition> {
        self.active.as_ref().map(ActiveProject::composition)
    }

    #[must_use]
    pub fn composition_index(&self) -> Option<usize> {
        self.active.as_ref().map(|active| active.composition_index)
    }

    #[must_use]
    pub fn elements(&self) -> Option<&ElementIndex> {
        self.active.as_ref().map(|active| &active.elements)
    }

    #[must_use]
    pub fn timeline_index(&self) -> Option<&TimelineIndex> {
        self.active.as_ref().map(|active| &active.index)
    }

    #[must_use]
    pub fn cursor(&self) -> f64 {
        self.clock.cursor()
    }

    #[must_use]
    pub fn play_state(&self) -> PlayState {
        self.clock.state()
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.clock.is_playing()
    }

    /// Details for the current cursor, as last published.
    #[must_use]
    pub fn details(&self) -> &ActiveDetails {
        &self.details
    }

    #[must_use]
    pub fn resolve_cursor(&self) -> Option<Resolution<'_>> {
        self.active
            .as_ref()
            .and_then(|active| active.resolve(self.clock.cursor()))
    }

    /// Registers a new load request, superseding any earlier one still in flight.
    pub fn begin_load(&mut self, key: impl Into<String>) -> LoadTicket {
        self.load_generation += 1;
        let ticket = LoadTicket {
            key: key.into(),
            generation: self.load_generation,
        };
        debug!(key = %ticket.key, generation = ticket.generation, "project load requested");
        ticket
    }

    /// Applies the result of a load started with [`Self::begin_load`].
    ///
    /// Stale tickets are dropped silently. A failed fetch or a project without compositions
    /// leaves the current project, timeline and cursor exactly as they were.
    #[instrument(skip(self, result), fields(session_id = %self.id, key = %ticket.key, generation = ticket.generation))]
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: anyhow::Result<Project>,
    ) -> Result<LoadOutcome, SessionError> {
        if ticket.generation != self.load_generation {
            debug!(
                latest = self.load_generation,
                "discarding result of superseded project load"
            );
            return Ok(LoadOutcome::Superseded);
        }

        match result {
            Ok(project) => self.install(ticket.key, project),
            Err(error) => {
                let message = format!("{error:#}");
                warn!(%message, "project load failed; keeping previous project");
                Err(SessionError::Load {
                    key: ticket.key,
                    message,
                })
            }
        }
    }

    pub fn load_from(
        &mut self,
        source: &impl ProjectSource,
        key: &str,
    ) -> Result<LoadOutcome, SessionError> {
        let ticket = self.begin_load(key);
        let result = source.fetch(key);
        self.finish_load(ticket, result)
    }

    /// Loads an in-memory project as if it had just been fetched under `key`.
    pub fn load_project(
        &mut self,
        key: impl Into<String>,
        project: Project,
    ) -> Result<LoadOutcome, SessionError> {
        let ticket = self.begin_load(key);
        self.finish_load(ticket, Ok(project))
    }

    fn install(&mut self, key: String, mut project: Project) -> Result<LoadOutcome, SessionError> {
        let Some(composition) = project.compositions.first_mut() else {
            warn!(%key, "project has no compositions; keeping previous project");
            return Err(SessionError::EmptyProject { key });
        };
        build_timeline(composition);

        let active = ActiveProject {
            index: TimelineIndex::new(composition),
            elements: project.element_index(),
            composition_index: 0,
            key,
            project,
        };
        let composition = active.composition();
        let outcome = LoadOutcome::Applied {
            units: composition.units.len(),
            events: composition.event_count(),
            total_length: composition.total_length,
        };
        info!(
            key = %active.key,
            elements = active.elements.len(),
            ?outcome,
            "project applied"
        );

        self.active = Some(active);
        self.restart_on_active_composition();
        Ok(outcome)
    }

    /// Builds and activates another composition of the loaded project.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn activate_composition(&mut self, index: usize) -> Result<(), SessionError> {
        let active = self
            .active
            .as_mut()
            .ok_or(SessionError::NoActiveComposition)?;
        let composition = active
            .project
            .compositions
            .get_mut(index)
            .ok_or(SessionError::CompositionNotFound(index))?;

        build_timeline(composition);
        active.index = TimelineIndex::new(composition);
        active.composition_index = index;
        info!("composition activated");

        self.restart_on_active_composition();
        Ok(())
    }

    fn restart_on_active_composition(&mut self) {
        let Some(active) = &self.active else {
            return;
        };
        let composition = active.composition();
        let start = composition
            .units
            .first()
            .map_or(0.0, |unit| unit.start_time);

        let was_playing = self.clock.pause();
        self.clock.set_total_length(composition.total_length);
        for observer in &mut self.observers {
            observer.on_timeline_built(composition);
        }
        if was_playing {
            self.publish_play_state();
        }
        self.seek(start);
    }

    /// Returns `false` if already playing or nothing is loaded.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn play(&mut self) -> bool {
        if self.active.is_none() || !self.clock.play() {
            return false;
        }
        info!(cursor = self.clock.cursor(), "playback started");
        self.publish_play_state();
        true
    }

    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn pause(&mut self) -> bool {
        if !self.clock.pause() {
            return false;
        }
        info!(cursor = self.clock.cursor(), "playback paused");
        self.publish_play_state();
        true
    }

    pub fn toggle_playback(&mut self) -> PlayState {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
        self.play_state()
    }

    /// Advances the playhead by elapsed seconds. No-op while stopped.
    pub fn advance(&mut self, delta_seconds: f64) -> Option<f64> {
        let update = self.clock.advance(delta_seconds)?;
        self.after_clock_update(update.reached_end);
        Some(update.cursor)
    }

    /// Advances the playhead from a host frame timestamp in seconds. No-op while stopped.
    pub fn tick(&mut self, timestamp_seconds: f64) -> Option<f64> {
        let update = self.clock.tick(timestamp_seconds)?;
        self.after_clock_update(update.reached_end);
        Some(update.cursor)
    }

    fn after_clock_update(&mut self, reached_end: bool) {
        self.publish_cursor();
        if reached_end {
            info!(cursor = self.clock.cursor(), "playback reached end of timeline");
            self.publish_play_state();
        }
    }

    /// Moves the playhead in either play state. Times outside the timeline are allowed.
    pub fn seek(&mut self, time: f64) -> bool {
        if !self.clock.seek(time) {
            warn!("ignored seek to NaN");
            return false;
        }
        self.publish_cursor();
        true
    }

    /// Seeks to the unit's first event, or to the unit start when it has none.
    pub fn jump_to_unit(&mut self, unit_index: usize) -> Result<f64, SessionError> {
        let composition = self.composition().ok_or(SessionError::NoActiveComposition)?;
        let unit = composition
            .units
            .get(unit_index)
            .ok_or(SessionError::UnitNotFound(unit_index))?;
        let target = unit.start_time + unit.events.first().map_or(0.0, |event| event.computed_start);
        self.seek(target);
        Ok(target)
    }

    pub fn jump_to_event(
        &mut self,
        unit_index: usize,
        event_index: usize,
    ) -> Result<f64, SessionError> {
        let composition = self.composition().ok_or(SessionError::NoActiveComposition)?;
        let unit = composition
            .units
            .get(unit_index)
            .ok_or(SessionError::UnitNotFound(unit_index))?;
        let event = unit
            .events
            .get(event_index)
            .ok_or(SessionError::EventNotFound {
                unit: unit_index,
                event: event_index,
            })?;
        let target = unit.start_time + event.computed_start;
        self.seek(target);
        Ok(target)
    }

    /// Seeks to the next event start after the cursor, if there is one.
    pub fn next_event(&mut self) -> Option<f64> {
        let target = self
            .timeline_index()?
            .next_boundary(self.clock.cursor())?;
        self.seek(target);
        Some(target)
    }

    /// Seeks to the closest event start before the cursor, if there is one.
    pub fn previous_event(&mut self) -> Option<f64> {
        let target = self
            .timeline_index()?
            .prev_boundary(self.clock.cursor())?;
        self.seek(target);
        Some(target)
    }

    fn publish_cursor(&mut self) {
        let time = self.clock.cursor();
        let (resolution, details) = match &self.active {
            Some(active) => {
                let resolution = active.resolve(time);
                let details = ActiveDetails::describe(time, resolution.as_ref(), &active.elements);
                (resolution, details)
            }
            None => (None, ActiveDetails::idle(time)),
        };
        self.details = details;

        let change = CursorChange {
            time,
            resolution,
            details: &self.details,
        };
        for observer in &mut self.observers {
            observer.on_cursor_changed(&change);
        }
    }

    fn publish_play_state(&mut self) {
        let is_playing = self.clock.is_playing();
        for observer in &mut self.observers {
            observer.on_play_state_changed(is_playing);
        }
    }
}
