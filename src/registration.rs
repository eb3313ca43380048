//! Registration documents as a typed tree.
//!
//! A registration holds sections (attributes, states, relations), each
//! mapping category names to a [`Slot`]. Recognition is purely structural
//! and made per category: a category is a slot when it is a list of
//! fragment-shaped objects (objects carrying a `virkning` object). A
//! top-level object is a section when it holds at least one fragment; its
//! other keys are kept verbatim beside the slots. Everything else at the top
//! level is metadata and passes through untouched.
//!
//! Pruning trims every slot to a window, then drops the categories and
//! sections the trim emptied.

use std::collections::BTreeMap;

use chrono::FixedOffset;
use serde_json::{Map, Value};
use tracing::debug;

use crate::bound::utc;
use crate::consolidate::{MergePolicy, consolidate_with};
use crate::effect::EffectiveTime;
use crate::error::{Result, VirkningError};
use crate::fragment::{Fragment, Slot};
use crate::trim::trim;

#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct Section {
    slots: BTreeMap<String, Slot>,
    other: Map<String, Value>,
}

impl Section {
    pub fn new(slots: BTreeMap<String, Slot>, other: Map<String, Value>) -> Self {
        Self { slots, other }
    }
    pub fn slots(&self) -> &BTreeMap<String, Slot> {
        &self.slots
    }
    pub fn slot(&self, category: &str) -> Option<&Slot> {
        self.slots.get(category)
    }
    /// Keys of the section that are not slots.
    pub fn other(&self) -> &Map<String, Value> {
        &self.other
    }
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty() && self.other.is_empty()
    }
    fn from_json_in(categories: &Map<String, Value>, offset: FixedOffset) -> Result<Section> {
        let mut section = Section::default();
        for (category, value) in categories {
            if is_slot(value) {
                let slot = value
                    .as_array()
                    .into_iter()
                    .flatten()
                    .map(|fragment| Fragment::from_json_in(fragment, offset))
                    .collect::<Result<Slot>>()?;
                section.slots.insert(category.clone(), slot);
            } else {
                section.other.insert(category.clone(), value.clone());
            }
        }
        Ok(section)
    }
    fn to_json(&self) -> Value {
        let mut fields = self.other.clone();
        for (category, slot) in &self.slots {
            fields.insert(category.clone(), Value::Array(slot.iter().map(Fragment::to_json).collect()));
        }
        Value::Object(fields)
    }
}

#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct Registration {
    sections: BTreeMap<String, Section>,
    metadata: Map<String, Value>,
}

impl Registration {
    pub fn new(sections: BTreeMap<String, Section>, metadata: Map<String, Value>) -> Self {
        Self { sections, metadata }
    }
    pub fn sections(&self) -> &BTreeMap<String, Section> {
        &self.sections
    }
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }
    pub fn slot(&self, section: &str, category: &str) -> Option<&Slot> {
        self.sections.get(section).and_then(|s| s.slot(category))
    }
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }
    pub fn fragment_count(&self) -> usize {
        self.sections.values().flat_map(|s| s.slots.values()).map(Vec::len).sum()
    }

    /// Rebuilds the tree with `f` applied to every slot, leaving out slots
    /// that come back empty and sections left with nothing in them.
    pub fn map_slots<F>(&self, mut f: F) -> Registration
    where
        F: FnMut(&[Fragment]) -> Slot,
    {
        let mut sections = BTreeMap::new();
        for (name, section) in &self.sections {
            let kept = Section {
                slots: section
                    .slots
                    .iter()
                    .map(|(category, slot)| (category.clone(), f(slot.as_slice())))
                    .filter(|(_, slot)| !slot.is_empty())
                    .collect(),
                other: section.other.clone(),
            };
            if kept.is_empty() {
                debug!(section = %name, "dropping emptied section");
            } else {
                sections.insert(name.clone(), kept);
            }
        }
        Registration {
            sections,
            metadata: self.metadata.clone(),
        }
    }

    pub fn prune(&self, window: &EffectiveTime) -> Registration {
        self.map_slots(|slot| trim(slot, window))
    }

    pub fn consolidate(&self, policy: MergePolicy) -> Registration {
        self.map_slots(|slot| consolidate_with(slot, policy))
    }

    pub fn from_json(value: &Value) -> Result<Registration> {
        Self::from_json_in(value, utc())
    }

    pub fn from_json_in(value: &Value, offset: FixedOffset) -> Result<Registration> {
        let fields = value
            .as_object()
            .ok_or_else(|| VirkningError::MalformedDocument(format!("registration is not an object: {}", value)))?;
        let mut registration = Registration::default();
        for (key, value) in fields {
            match value.as_object() {
                Some(categories) if is_section(categories) => {
                    let section = Section::from_json_in(categories, offset)?;
                    registration.sections.insert(key.clone(), section);
                }
                _ => {
                    registration.metadata.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(registration)
    }

    pub fn to_json(&self) -> Value {
        let mut fields = self.metadata.clone();
        for (name, section) in &self.sections {
            fields.insert(name.clone(), section.to_json());
        }
        Value::Object(fields)
    }
}

fn is_slot(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|items| items.iter().all(Fragment::is_fragment_shaped))
}

fn is_section(categories: &Map<String, Value>) -> bool {
    categories
        .values()
        .filter(|value| is_slot(value))
        .filter_map(Value::as_array)
        .any(|items| !items.is_empty())
}

fn is_registration(fields: &Map<String, Value>) -> bool {
    fields
        .values()
        .any(|value| value.as_object().is_some_and(is_section))
}

/// Prunes every registration found anywhere in `value`, e.g. a read result
/// nesting registrations in lists of objects. Values that are not, and do
/// not contain, registrations are returned unchanged.
pub fn prune_value(value: &Value, window: &EffectiveTime, offset: FixedOffset) -> Result<Value> {
    rewrite_registrations(value, &mut |registration: &Registration| registration.prune(window), offset)
}

/// Walks `value` and replaces each registration document with `f` applied to
/// it.
pub fn rewrite_registrations<F>(value: &Value, f: &mut F, offset: FixedOffset) -> Result<Value>
where
    F: FnMut(&Registration) -> Registration,
{
    match value {
        Value::Object(fields) if is_registration(fields) => {
            let registration = Registration::from_json_in(value, offset)?;
            Ok(f(&registration).to_json())
        }
        Value::Object(fields) => {
            let mut rewritten = Map::new();
            for (key, child) in fields {
                rewritten.insert(key.clone(), rewrite_registrations(child, f, offset)?);
            }
            Ok(Value::Object(rewritten))
        }
        Value::Array(items) => {
            let mut rewritten = Vec::with_capacity(items.len());
            for item in items {
                rewritten.push(rewrite_registrations(item, f, offset)?);
            }
            Ok(Value::Array(rewritten))
        }
        scalar => Ok(scalar.clone()),
    }
}
