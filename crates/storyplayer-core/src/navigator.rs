use crate::model::Composition;

/// Absolute start times of every event, in unit/event order.
pub fn event_starts(composition: &Composition) -> impl Iterator<Item = f64> + '_ {
    composition.units.iter().flat_map(|unit| {
        unit.events
            .iter()
            .map(move |event| unit.start_time + event.computed_start)
    })
}

/// Minimum event start strictly greater than `time`.
#[must_use]
pub fn next_boundary(composition: &Composition, time: f64) -> Option<f64> {
    let mut next: Option<f64> = None;
    for start in event_starts(composition) {
        if start > time && next.is_none_or(|best| start < best) {
            next = Some(start);
        }
    }
    next
}

/// Maximum event start strictly less than `time`.
#[must_use]
pub fn prev_boundary(composition: &Composition, time: f64) -> Option<f64> {
    let mut previous: Option<f64> = None;
    for start in event_starts(composition) {
        if start < time && previous.is_none_or(|best| start > best) {
            previous = Some(start);
        }
    }
    previous
}
