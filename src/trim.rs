//! Trimming a slot to a bounding window.
//!
//! A fragment entirely outside the window is dropped, one partly outside is
//! clipped. Where the window cuts the fragment the window's inclusion flag
//! governs; every edge the window does not cut keeps the fragment's own flag.
//! A non-empty fragment is never clipped down to an empty one. Trimming never
//! merges, run the consolidator afterwards for that.

use std::cmp::Ordering;

use tracing::trace;

use crate::bound::Bound;
use crate::effect::EffectiveTime;
use crate::error::Result;
use crate::fragment::{Fragment, Slot};

pub fn trim(slot: &[Fragment], window: &EffectiveTime) -> Slot {
    slot.iter()
        .filter_map(|fragment| {
            let clipped = clip(fragment.interval(), window);
            if clipped.is_none() {
                trace!(%fragment, %window, "dropping fragment outside window");
            }
            clipped.map(|interval| fragment.with_interval(interval))
        })
        .collect()
}

/// Trims to the half-open window `[from, to)`, the shape a resolved
/// validity request takes.
pub fn trim_between(slot: &[Fragment], from: Bound, to: Bound) -> Result<Slot> {
    let window = EffectiveTime::half_open(from, to)?;
    Ok(trim(slot, &window))
}

/// The part of `interval` inside `window`, or `None` when it lies wholly
/// outside.
pub fn clip(interval: &EffectiveTime, window: &EffectiveTime) -> Option<EffectiveTime> {
    let ends_before = match interval.to().cmp(&window.from()) {
        Ordering::Less => true,
        Ordering::Equal => touches_at_excluded(interval.to(), interval.to_included(), window.from_included()),
        Ordering::Greater => false,
    };
    let starts_after = match interval.from().cmp(&window.to()) {
        Ordering::Greater => true,
        Ordering::Equal => touches_at_excluded(interval.from(), interval.from_included(), window.to_included()),
        Ordering::Less => false,
    };
    if ends_before || starts_after {
        return None;
    }
    let (from, from_included) = if window.from() > interval.from() {
        (window.from(), window.from_included())
    } else {
        (interval.from(), interval.from_included())
    };
    let (to, to_included) = if window.to() < interval.to() {
        (window.to(), window.to_included())
    } else {
        (interval.to(), interval.to_included())
    };
    // both tests above passed, so from <= to
    let clipped = EffectiveTime::normalized(from, from_included, to, to_included);
    if clipped.is_empty() && !interval.is_empty() {
        trace!(%interval, %window, "clipped to nothing");
        return None;
    }
    Some(clipped)
}

// flags carry nothing at an infinity, so meeting there is never a gap
fn touches_at_excluded(point: Bound, own: bool, other: bool) -> bool {
    !point.is_infinite() && !(own && other)
}
