//! Virkning – the effective-time engine of the LoRa registry.
//!
//! LoRa stores organisational entities (units, persons, functions, classes,
//! facets) as *bitemporal registrations*. Every fact in a registration is a
//! *fragment*: an opaque payload tagged with its *virkning*, the period in
//! which the fact holds in the modelled world. This crate covers that
//! effective-time axis:
//! * A [`bound::Bound`] is `-infinity`, a timezone aware instant or `infinity`,
//!   totally ordered in that order.
//! * An [`effect::EffectiveTime`] is an interval over bounds with an
//!   inclusion flag per endpoint.
//! * A [`fragment::Fragment`] couples a [`fragment::Payload`] with an
//!   effective time; all fragments of one category form a [`fragment::Slot`].
//! * A [`registration::Registration`] groups slots into sections.
//!
//! ## Modules
//! * [`bound`] – bounds, their ordering and the timestamp spellings we accept.
//! * [`effect`] – effect periods.
//! * [`literal`] – the range literal (`["2015-01-01 00:00:00+01",infinity)`)
//!   and object (`{"from", "from_included", "to", "to_included"}`) wire forms.
//! * [`validity`] – `past`/`present`/`future`/explicit requests resolved
//!   against a caller supplied `now`.
//! * [`consolidate`] – collapsing a slot into maximal intervals per payload.
//! * [`trim`] – restricting a slot to a window.
//! * [`registration`] – the document tree and pruning over it.
//! * [`engine`] – the read pipeline tying the above together.
//! * [`settings`] – configuration and tracing setup.
//!
//! ## Quick Start
//! ```
//! use chrono::DateTime;
//! use serde_json::json;
//! use virkning::{engine::Engine, validity::ValidityRequest};
//!
//! let engine = Engine::default();
//! let registration = engine.parse_registration(&json!({
//!     "tilstande": {"organisationgyldighed": [
//!         {"gyldighed": "Aktiv", "virkning": {"from": "1900-01-01", "to": "1950-01-01"}},
//!         {"gyldighed": "Aktiv", "virkning": {"from": "1950-01-01", "to": "infinity"}},
//!     ]}
//! })).unwrap();
//! let now = DateTime::parse_from_rfc3339("2017-01-01T00:00:00+01:00").unwrap();
//! let present = engine.restrict(&registration, ValidityRequest::Present, now).unwrap();
//! let slot = present.slot("tilstande", "organisationgyldighed").unwrap();
//! assert_eq!(slot.len(), 1);
//! ```
//!
//! ## Concurrency
//! Nothing here holds state between calls, reads a clock or does I/O. Callers
//! pass `now` explicitly and keep it stable for one logical request.

pub mod bound;
pub mod consolidate;
pub mod effect;
pub mod engine;
pub mod error;
pub mod fragment;
pub mod literal;
pub mod registration;
pub mod settings;
pub mod trim;
pub mod validity;

pub use error::{Result, VirkningError};
