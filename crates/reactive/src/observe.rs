//! Index-pair reporting for per-record observers.

use crate::event::{position, ChangeEvent, EventType};

/// Maps a change event to the `(removed_from, inserted_into)` pair an
/// observer sees, using -1 for "not in the sequence".
///
/// Returns `None` when the observer should not be called: for refresh
/// events, and for in-place updates unless `include_object_updates` is set.
pub fn observed_indices(event: &ChangeEvent, include_object_updates: bool) -> Option<(isize, isize)> {
    match event.event_type()? {
        EventType::Add => Some((-1, position(event.index))),
        EventType::Remove => Some((position(event.previous_index), -1)),
        EventType::Update => {
            let moved = event.previous_index != event.index || event.index.is_none();
            if include_object_updates || moved {
                Some((position(event.previous_index), position(event.index)))
            } else {
                None
            }
        }
        EventType::Refresh => None,
    }
}
