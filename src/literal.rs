//! Wire formats for effect periods.
//!
//! Two forms cross the storage and API boundaries:
//! * the range literal read back from the store, `[from,to)` with each side
//!   bare (`infinity`, `-infinity`, empty) or quoted (`"2015-01-01 00:00:00+01"`);
//! * the object form `{"from", "from_included", "to", "to_included"}`.
//!
//! On input the object form accepts both `null` and the strings
//! `"-infinity"`/`"infinity"` for an unbounded side. On output it always
//! writes the strings and never `null`.

use chrono::FixedOffset;
use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;
use serde::{Deserialize, Serialize};

use crate::bound::{Bound, utc};
use crate::effect::EffectiveTime;
use crate::error::{Result, VirkningError};

#[derive(Parser)]
#[grammar = "literal.pest"]
struct RangeLiteralParser;

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct VirkningObject {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default = "included_by_default")]
    pub from_included: bool,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub to_included: bool,
}

// stored periods are [from, to) unless told otherwise
fn included_by_default() -> bool {
    true
}

enum Side {
    Lower,
    Upper,
}

/// Parses a range literal, reading naive timestamps as UTC.
pub fn parse(s: &str) -> Result<EffectiveTime> {
    parse_in(s, utc())
}

pub fn parse_in(s: &str, offset: FixedOffset) -> Result<EffectiveTime> {
    let malformed = |message: String| VirkningError::MalformedRangeLiteral {
        literal: s.to_string(),
        message,
    };
    let literal = RangeLiteralParser::parse(Rule::literal, s.trim())?
        .next()
        .ok_or_else(|| malformed("empty literal".into()))?;
    let mut from_included = false;
    let mut to_included = false;
    let mut bounds = Vec::with_capacity(2);
    for pair in literal.into_inner() {
        match pair.as_rule() {
            Rule::opening => from_included = pair.as_str() == "[",
            Rule::closing => to_included = pair.as_str() == "]",
            Rule::token => {
                let side = if bounds.is_empty() { Side::Lower } else { Side::Upper };
                let bound = parse_token(pair, side, offset).map_err(|e| malformed(e.to_string()))?;
                bounds.push(bound);
            }
            _ => (),
        }
    }
    match bounds[..] {
        [from, to] => EffectiveTime::new(from, from_included, to, to_included),
        _ => Err(malformed(format!("expected 2 bounds, found {}", bounds.len()))),
    }
}

fn parse_token(token: Pair<Rule>, side: Side, offset: FixedOffset) -> Result<Bound> {
    let Some(inner) = token.into_inner().next() else {
        return Ok(unbounded(side));
    };
    match inner.as_rule() {
        Rule::quoted => {
            let text = inner.as_str();
            Bound::parse_in(&text[1..text.len() - 1], offset)
        }
        _ => {
            let text = inner.as_str().trim();
            if text.is_empty() {
                Ok(unbounded(side))
            } else {
                Bound::parse_in(text, offset)
            }
        }
    }
}

fn unbounded(side: Side) -> Bound {
    match side {
        Side::Lower => Bound::NegativeInfinity,
        Side::Upper => Bound::PositiveInfinity,
    }
}

/// Writes the literal form; finite bounds are quoted, infinities are bare.
pub fn format_literal(effect: &EffectiveTime) -> String {
    let token = |bound: Bound| match bound {
        Bound::Timestamp(_) => format!("\"{}\"", bound),
        _ => bound.to_string(),
    };
    format!(
        "{}{},{}{}",
        if effect.from_included() { '[' } else { '(' },
        token(effect.from()),
        token(effect.to()),
        if effect.to_included() { ']' } else { ')' },
    )
}

/// Writes the object form. Unbounded sides are always spelled
/// `"-infinity"`/`"infinity"`.
pub fn format_object(effect: &EffectiveTime) -> VirkningObject {
    VirkningObject {
        from: Some(effect.from().to_string()),
        from_included: effect.from_included(),
        to: Some(effect.to().to_string()),
        to_included: effect.to_included(),
    }
}

pub fn parse_object(object: &VirkningObject) -> Result<EffectiveTime> {
    parse_object_in(object, utc())
}

pub fn parse_object_in(object: &VirkningObject, offset: FixedOffset) -> Result<EffectiveTime> {
    let from = match &object.from {
        Some(token) => Bound::parse_in(token, offset)?,
        None => Bound::NegativeInfinity,
    };
    let to = match &object.to {
        Some(token) => Bound::parse_in(token, offset)?,
        None => Bound::PositiveInfinity,
    };
    EffectiveTime::new(from, object.from_included, to, object.to_included)
}
