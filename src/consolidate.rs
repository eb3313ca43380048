//! Consolidation of a slot into its minimal equivalent form.
//!
//! Fragments are partitioned by payload (structural equality, see
//! [`Payload::canonical_key`](crate::fragment::Payload::canonical_key)) and
//! each class is swept in start order, merging neighbours the
//! [`MergePolicy`] allows. Fragments whose payloads differ are never merged,
//! even when they overlap in time.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::BuildHasherDefault;
use std::str::FromStr;

use seahash::SeaHasher;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::VirkningError;
use crate::fragment::{Fragment, Slot};

pub type PayloadHasher = BuildHasherDefault<SeaHasher>;

#[derive(Eq, PartialEq, Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// Merge neighbours that touch or overlap.
    #[default]
    Coalesce,
    /// Merge only neighbours that touch; overlapping fragments with the same
    /// payload stay separate instances (zero-to-many relations).
    Abutting,
}

impl FromStr for MergePolicy {
    type Err = VirkningError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "coalesce" => Ok(MergePolicy::Coalesce),
            "abutting" => Ok(MergePolicy::Abutting),
            other => Err(VirkningError::Config(format!("unknown merge policy '{}'", other))),
        }
    }
}

pub fn consolidate(slot: &[Fragment]) -> Slot {
    consolidate_with(slot, MergePolicy::Coalesce)
}

/// Collapses `slot` so that every instant carries the same payloads as
/// before in as few fragments as `policy` allows. Empty periods cover no
/// instant and are left out. Classes come out in the order their payload
/// first appears, each class sorted by start. A merged fragment keeps the
/// annotations of the earliest fragment it absorbed.
pub fn consolidate_with(slot: &[Fragment], policy: MergePolicy) -> Slot {
    let mut classes: Vec<Vec<&Fragment>> = Vec::new();
    let mut index: HashMap<String, usize, PayloadHasher> = HashMap::default();
    for fragment in slot {
        if fragment.interval().is_empty() {
            trace!(%fragment, "dropping empty fragment");
            continue;
        }
        match index.entry(fragment.payload().canonical_key()) {
            Entry::Occupied(e) => classes[*e.get()].push(fragment),
            Entry::Vacant(e) => {
                e.insert(classes.len());
                classes.push(vec![fragment]);
            }
        }
    }
    let mut consolidated = Slot::with_capacity(slot.len());
    for mut class in classes {
        class.sort_by(|a, b| a.interval().sweep_order(b.interval()));
        let mut fragments = class.into_iter();
        let Some(first) = fragments.next() else {
            continue;
        };
        let mut merged = Slot::new();
        let mut current = first.clone();
        for next in fragments {
            let mergeable = match policy {
                MergePolicy::Coalesce => current.interval().reaches(next.interval()),
                MergePolicy::Abutting => current.interval().abuts(next.interval()),
            };
            if mergeable {
                trace!(into = %current, from = %next, "merging fragments");
                current.interval_mut().extend_to(next.interval());
            } else {
                merged.push(current);
                current = next.clone();
            }
        }
        merged.push(current);
        // an extended fragment can overtake a later one sharing its start
        merged.sort_by(|a, b| a.interval().sweep_order(b.interval()));
        consolidated.append(&mut merged);
    }
    consolidated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bound::{Bound, parse_timestamp};
    use crate::effect::EffectiveTime;
    use crate::fragment::Payload;
    use serde_json::json;

    fn fragment(payload: &str, from: &str, to: &str) -> Fragment {
        let at = |s: &str| Bound::Timestamp(parse_timestamp(s).unwrap());
        Fragment::new(
            Payload::from(json!({ "whatever": payload })),
            EffectiveTime::half_open(at(from), at(to)).unwrap(),
        )
    }

    #[test]
    fn classes_keep_first_appearance_order() {
        let slot = vec![
            fragment("b", "1950-01-01", "2000-01-01"),
            fragment("a", "1900-01-01", "1950-01-01"),
            fragment("b", "1900-01-01", "1950-01-01"),
        ];
        let result = consolidate(&slot);
        assert_eq!(result, vec![
            fragment("b", "1900-01-01", "2000-01-01"),
            fragment("a", "1900-01-01", "1950-01-01"),
        ]);
    }

    #[test]
    fn empty_periods_are_left_out() {
        let at = |s: &str| Bound::Timestamp(parse_timestamp(s).unwrap());
        let empty = Fragment::new(
            Payload::from(json!({ "whatever": "garbage" })),
            EffectiveTime::new(at("1950-01-01"), false, at("1950-01-01"), false).unwrap(),
        );
        let slot = vec![fragment("garbage", "1900-01-01", "1920-01-01"), empty.clone()];
        assert_eq!(consolidate(&slot), vec![fragment("garbage", "1900-01-01", "1920-01-01")]);
        assert!(consolidate_with(&[empty], MergePolicy::Abutting).is_empty());
    }

    #[test]
    fn empty_slot() {
        assert!(consolidate(&[]).is_empty());
    }

    #[test]
    fn policy_names() {
        assert_eq!("Abutting".parse::<MergePolicy>().unwrap(), MergePolicy::Abutting);
        assert!("sideways".parse::<MergePolicy>().is_err());
    }
}
