//! Fragments: an opaque payload tagged with the period it is in effect.
//!
//! The engine never looks inside a payload. Two payloads are the same when
//! they are structurally equal as JSON objects, whatever order their keys
//! were written in; [`Payload::canonical_key`] gives that equality a
//! hashable form.

use std::fmt;

use chrono::FixedOffset;
use serde_json::{Map, Value, json};

use crate::bound::utc;
use crate::effect::EffectiveTime;
use crate::error::{Result, VirkningError};
use crate::literal::{self, VirkningObject};

/// The key holding the effect period inside a stored fragment.
pub const VIRKNING: &str = "virkning";

#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct Payload(Map<String, Value>);

impl Payload {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
    /// A string that is equal for two payloads exactly when the payloads
    /// are structurally equal. Object keys are written sorted at every level.
    pub fn canonical_key(&self) -> String {
        let mut key = String::new();
        write_canonical_object(&self.0, &mut key);
        key
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self(fields),
            other => {
                let mut fields = Map::new();
                fields.insert("value".to_string(), other);
                Self(fields)
            }
        }
    }
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(fields) => write_canonical_object(fields, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        // scalars serialize the same way regardless of map ordering
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn write_canonical_object(fields: &Map<String, Value>, out: &mut String) {
    let mut keys: Vec<&String> = fields.keys().collect();
    keys.sort_unstable();
    out.push('{');
    for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&Value::String(key.clone()).to_string());
        out.push(':');
        write_canonical(&fields[key.as_str()], out);
    }
    out.push('}');
}

/// The keys of a `virkning` object that make up the period itself.
const PERIOD_KEYS: [&str; 4] = ["from", "from_included", "to", "to_included"];

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Fragment {
    payload: Payload,
    interval: EffectiveTime,
    // the rest of the virkning object: aktoerref, aktoertypekode, notetekst
    annotations: Map<String, Value>,
}

impl Fragment {
    pub fn new(payload: Payload, interval: EffectiveTime) -> Self {
        Self {
            payload,
            interval,
            annotations: Map::new(),
        }
    }
    pub fn with_annotations(mut self, annotations: Map<String, Value>) -> Self {
        self.annotations = annotations;
        self
    }
    pub fn payload(&self) -> &Payload {
        &self.payload
    }
    pub fn interval(&self) -> &EffectiveTime {
        &self.interval
    }
    /// Keys stored next to the period in the `virkning` object. They take
    /// no part in trimming or in payload equality and are written back as
    /// read.
    pub fn annotations(&self) -> &Map<String, Value> {
        &self.annotations
    }
    pub(crate) fn interval_mut(&mut self) -> &mut EffectiveTime {
        &mut self.interval
    }
    pub fn with_interval(&self, interval: EffectiveTime) -> Self {
        Self {
            payload: self.payload.clone(),
            interval,
            annotations: self.annotations.clone(),
        }
    }
    /// True for a JSON object carrying a `virkning` object, the only shape
    /// the pruner treats as a fragment.
    pub fn is_fragment_shaped(value: &Value) -> bool {
        value
            .as_object()
            .and_then(|fields| fields.get(VIRKNING))
            .is_some_and(Value::is_object)
    }
    pub fn from_json(value: &Value) -> Result<Self> {
        Self::from_json_in(value, utc())
    }
    /// Splits a stored fragment into its payload and its effect period.
    pub fn from_json_in(value: &Value, offset: FixedOffset) -> Result<Self> {
        let fields = value
            .as_object()
            .ok_or_else(|| VirkningError::MalformedDocument(format!("fragment is not an object: {}", value)))?;
        let mut payload = fields.clone();
        let virkning = payload
            .remove(VIRKNING)
            .ok_or_else(|| VirkningError::MalformedDocument(format!("fragment has no {}: {}", VIRKNING, value)))?;
        let Value::Object(mut annotations) = virkning else {
            return Err(VirkningError::MalformedDocument(format!("{} is not an object: {}", VIRKNING, value)));
        };
        let mut period = Map::new();
        for key in PERIOD_KEYS {
            if let Some(v) = annotations.remove(key) {
                period.insert(key.to_string(), v);
            }
        }
        let object: VirkningObject = serde_json::from_value(Value::Object(period))?;
        let interval = literal::parse_object_in(&object, offset)?;
        Ok(Self::new(Payload(payload), interval).with_annotations(annotations))
    }
    pub fn to_json(&self) -> Value {
        let object = literal::format_object(&self.interval);
        let mut virkning = self.annotations.clone();
        virkning.insert("from".to_string(), json!(object.from));
        virkning.insert("from_included".to_string(), json!(object.from_included));
        virkning.insert("to".to_string(), json!(object.to));
        virkning.insert("to_included".to_string(), json!(object.to_included));
        let mut fields = self.payload.0.clone();
        fields.insert(VIRKNING.to_string(), Value::Object(virkning));
        Value::Object(fields)
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.payload.canonical_key(), self.interval)
    }
}

/// All fragments of one attribute or relation category.
pub type Slot = Vec<Fragment>;
