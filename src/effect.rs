//! Effect periods ("virkning").
//!
//! An [`EffectiveTime`] is an interval over [`Bound`] with an inclusion flag
//! per endpoint. Construction rejects reversed bounds; an interval whose
//! endpoints coincide is empty unless both are included. Flags on an infinite
//! endpoint mean nothing and are stored as `false`, so an interval pinned at
//! one infinity is always empty.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bound::{Bound, Timestamp};
use crate::error::{Result, VirkningError};
use crate::literal::{self, VirkningObject};

#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(try_from = "VirkningObject", into = "VirkningObject")]
pub struct EffectiveTime {
    from: Bound,
    from_included: bool,
    to: Bound,
    to_included: bool,
}

impl EffectiveTime {
    pub fn new(from: Bound, from_included: bool, to: Bound, to_included: bool) -> Result<Self> {
        if from > to {
            return Err(VirkningError::InvalidRange {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        Ok(Self::normalized(from, from_included, to, to_included))
    }
    /// The half-open interval `[from, to)` used for stored effect periods.
    pub fn half_open(from: Bound, to: Bound) -> Result<Self> {
        Self::new(from, true, to, false)
    }
    pub fn closed(from: Bound, to: Bound) -> Result<Self> {
        Self::new(from, true, to, true)
    }
    pub fn unbounded() -> Self {
        Self::normalized(Bound::NegativeInfinity, false, Bound::PositiveInfinity, false)
    }
    pub fn instant(t: Timestamp) -> Self {
        Self::normalized(Bound::Timestamp(t), true, Bound::Timestamp(t), true)
    }
    // callers guarantee from <= to
    pub(crate) fn normalized(from: Bound, from_included: bool, to: Bound, to_included: bool) -> Self {
        Self {
            from,
            from_included: from_included && !from.is_infinite(),
            to,
            to_included: to_included && !to.is_infinite(),
        }
    }
    pub fn from(&self) -> Bound {
        self.from
    }
    pub fn from_included(&self) -> bool {
        self.from_included
    }
    pub fn to(&self) -> Bound {
        self.to
    }
    pub fn to_included(&self) -> bool {
        self.to_included
    }
    pub fn is_empty(&self) -> bool {
        self.from == self.to && !(self.from_included && self.to_included)
    }
    pub fn is_unbounded(&self) -> bool {
        self.from == Bound::NegativeInfinity && self.to == Bound::PositiveInfinity
    }
    pub fn contains(&self, t: &Bound) -> bool {
        let after_from = match self.from.cmp(t) {
            Ordering::Less => true,
            Ordering::Equal => self.from_included,
            Ordering::Greater => false,
        };
        let before_to = match t.cmp(&self.to) {
            Ordering::Less => true,
            Ordering::Equal => self.to_included,
            Ordering::Greater => false,
        };
        after_from && before_to
    }
    /// True when `self` ends where `other` starts, or later, without leaving
    /// a zero-width gap between them.
    pub fn reaches(&self, other: &EffectiveTime) -> bool {
        match self.to.cmp(&other.from) {
            Ordering::Greater => true,
            Ordering::Equal => self.to_included || other.from_included,
            Ordering::Less => false,
        }
    }
    /// True when `self` ends exactly where `other` starts and the shared
    /// point is covered by at least one side.
    pub fn abuts(&self, other: &EffectiveTime) -> bool {
        self.to == other.from && (self.to_included || other.from_included)
    }
    /// Widens `self` to also cover `other`, which must start no earlier.
    pub(crate) fn extend_to(&mut self, other: &EffectiveTime) {
        match self.to.cmp(&other.to) {
            Ordering::Less => {
                self.to = other.to;
                self.to_included = other.to_included;
            }
            Ordering::Equal => self.to_included |= other.to_included,
            Ordering::Greater => (),
        }
    }
    /// Sort key for sweeps: by start, an included start before an excluded
    /// one at the same bound, then by end.
    pub(crate) fn sweep_order(&self, other: &EffectiveTime) -> Ordering {
        self.from
            .cmp(&other.from)
            .then_with(|| other.from_included.cmp(&self.from_included))
            .then_with(|| self.to.cmp(&other.to))
            .then_with(|| self.to_included.cmp(&other.to_included))
    }
}

impl fmt::Display for EffectiveTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", literal::format_literal(self))
    }
}

impl TryFrom<VirkningObject> for EffectiveTime {
    type Error = VirkningError;
    fn try_from(object: VirkningObject) -> Result<Self> {
        literal::parse_object(&object)
    }
}
impl From<EffectiveTime> for VirkningObject {
    fn from(effect: EffectiveTime) -> Self {
        literal::format_object(&effect)
    }
}
