use tracing::{debug, instrument, warn};

use crate::{
    model::{Composition, CompositionUnit, TimelineEvent},
    time::event_duration_seconds,
};

/// Recomputes every derived field of `composition` from the raw unit/event list.
///
/// Units are laid end to end from zero; events are laid end to end inside their unit. The pass
/// only assigns, so running it again over unchanged input gives identical values.
#[instrument(skip(composition), fields(units = composition.units.len()))]
pub fn build_timeline(composition: &mut Composition) {
    let mut total_time = 0.0;

    for unit in &mut composition.units {
        unit.start_time = total_time;

        let mut unit_length = 0.0;
        for event in &mut unit.events {
            let duration = event_duration_seconds(event.duration.as_deref());
            event.computed_start = unit_length;
            event.computed_duration = duration;
            unit_length += duration;
        }

        unit.length = unit_length;
        total_time += unit_length;
    }

    composition.total_length = total_time;
    debug!(
        total_length = total_time,
        events = composition.event_count(),
        "timeline built"
    );
}

/// The unit (and event, if any) under a playhead position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution<'a> {
    pub unit_index: usize,
    pub unit: &'a CompositionUnit,
    pub event_index: Option<usize>,
    pub event: Option<&'a TimelineEvent>,
}

/// Resolves `time` by scanning units and events in order.
///
/// Returns `None` when no unit contains `time`. A matched unit whose events miss the offset
/// reports its first event; a matched unit without events reports no event.
#[must_use]
pub fn resolve(composition: &Composition, time: f64) -> Option<Resolution<'_>> {
    let (unit_index, unit) = composition
        .units
        .iter()
        .enumerate()
        .find(|(_, unit)| unit.contains(time))?;

    let offset = time - unit.start_time;
    let event_index = unit
        .events
        .iter()
        .position(|event| event.contains_offset(offset));

    Some(resolution_with_fallback(unit_index, unit, event_index, offset))
}

fn resolution_with_fallback(
    unit_index: usize,
    unit: &CompositionUnit,
    event_index: Option<usize>,
    offset: f64,
) -> Resolution<'_> {
    let event_index = event_index.or_else(|| {
        if unit.events.is_empty() {
            return None;
        }
        warn!(
            unit_index,
            offset, "no event covers offset inside unit; falling back to first event"
        );
        Some(0)
    });

    Resolution {
        unit_index,
        unit,
        event_index,
        event: event_index.and_then(|index| unit.events.get(index)),
    }
}

/// Sorted lookup tables over a built composition.
///
/// Answers the same questions as [`resolve`] and the navigator scans in logarithmic time. It
/// relies on the ordering [`build_timeline`] establishes, so it has to be rebuilt whenever the
/// composition is rebuilt and must be queried with that same composition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimelineIndex {
    unit_indices: Vec<usize>,
    unit_starts: Vec<f64>,
    boundaries: Vec<f64>,
}

impl TimelineIndex {
    #[must_use]
    pub fn new(composition: &Composition) -> Self {
        let mut unit_indices = Vec::new();
        let mut unit_starts = Vec::new();
        let mut boundaries = Vec::with_capacity(composition.event_count());

        for (index, unit) in composition.units.iter().enumerate() {
            // zero-length units can never contain a time
            if unit.length > 0.0 {
                unit_indices.push(index);
                unit_starts.push(unit.start_time);
            }
            boundaries.extend(
                unit.events
                    .iter()
                    .map(|event| unit.start_time + event.computed_start),
            );
        }
        boundaries.sort_by(f64::total_cmp);

        Self {
            unit_indices,
            unit_starts,
            boundaries,
        }
    }

    #[must_use]
    pub fn resolve<'a>(&self, composition: &'a Composition, time: f64) -> Option<Resolution<'a>> {
        if time.is_nan() {
            return None;
        }

        let position = self.unit_starts.partition_point(|start| *start <= time);
        let unit_index = *self.unit_indices.get(position.checked_sub(1)?)?;
        let unit = composition.units.get(unit_index)?;
        if !unit.contains(time) {
            return None;
        }

        let offset = time - unit.start_time;
        let candidate = unit
            .events
            .partition_point(|event| event.computed_start <= offset)
            .checked_sub(1)
            .filter(|index| unit.events[*index].contains_offset(offset));

        Some(resolution_with_fallback(unit_index, unit, candidate, offset))
    }

    /// Earliest event start strictly after `time`.
    #[must_use]
    pub fn next_boundary(&self, time: f64) -> Option<f64> {
        if time.is_nan() {
            return None;
        }
        let position = self.boundaries.partition_point(|start| *start <= time);
        self.boundaries.get(position).copied()
    }

    /// Latest event start strictly before `time`.
    #[must_use]
    pub fn prev_boundary(&self, time: f64) -> Option<f64> {
        if time.is_nan() {
            return None;
        }
        let position = self.boundaries.partition_point(|start| *start < time);
        self.boundaries.get(position.checked_sub(1)?).copied()
    }

    #[must_use]
    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }
}
