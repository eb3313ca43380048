//! Validity windows.
//!
//! A caller asks for `past`, `present`, `future`, a point in time or an
//! explicit pair of bounds; [`resolve`] turns that into the bound pair every
//! later step restricts to. `now` is always supplied by the caller, so one
//! request resolves the same way however many times it is resolved.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, FixedOffset};
use tracing::debug;

use crate::bound::{Bound, Timestamp, parse_timestamp_in, utc};
use crate::effect::EffectiveTime;
use crate::error::{Result, VirkningError};

/// One tick of the store's timestamp resolution.
pub const MINIMAL_INTERVAL: Duration = Duration::microseconds(1);

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ValidityRequest {
    Past,
    Present,
    Future,
    /// A single instant, `virkningstid`.
    At(Timestamp),
    Explicit(Bound, Bound),
}

impl ValidityRequest {
    pub fn from_params(
        validity: Option<&str>,
        virkningfra: Option<&str>,
        virkningtil: Option<&str>,
        virkningstid: Option<&str>,
    ) -> Result<Self> {
        Self::from_params_in(validity, virkningfra, virkningtil, virkningstid, utc())
    }

    /// Reads the query parameters of a read request. Naive timestamps are
    /// taken to be in `offset`.
    pub fn from_params_in(
        validity: Option<&str>,
        virkningfra: Option<&str>,
        virkningtil: Option<&str>,
        virkningstid: Option<&str>,
        offset: FixedOffset,
    ) -> Result<Self> {
        let explicit = virkningfra.is_some() || virkningtil.is_some();
        if let Some(token) = validity {
            if explicit || virkningstid.is_some() {
                return Err(VirkningError::ConflictingParameters(
                    "'validity' cannot be combined with 'virkningfra', 'virkningtil' or 'virkningstid'".into(),
                ));
            }
            return token.parse();
        }
        if let Some(token) = virkningstid {
            if explicit {
                return Err(VirkningError::ConflictingParameters(
                    "'virkningstid' cannot be combined with 'virkningfra' or 'virkningtil'".into(),
                ));
            }
            let t = parse_timestamp_in(token, offset)
                .map_err(|_| VirkningError::UnknownValidityToken(token.to_string()))?;
            return Ok(ValidityRequest::At(t));
        }
        if !explicit {
            return Ok(ValidityRequest::Present);
        }
        let bound = |token: Option<&str>, missing: Bound| match token {
            Some(token) => Bound::parse_in(token, offset)
                .map_err(|_| VirkningError::UnknownValidityToken(token.to_string())),
            None => Ok(missing),
        };
        Ok(ValidityRequest::Explicit(
            bound(virkningfra, Bound::NegativeInfinity)?,
            bound(virkningtil, Bound::PositiveInfinity)?,
        ))
    }
}

impl FromStr for ValidityRequest {
    type Err = VirkningError;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "past" => Ok(ValidityRequest::Past),
            "present" => Ok(ValidityRequest::Present),
            "future" => Ok(ValidityRequest::Future),
            _ => Err(VirkningError::UnknownValidityToken(s.to_string())),
        }
    }
}

impl fmt::Display for ValidityRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValidityRequest::Past => write!(f, "past"),
            ValidityRequest::Present => write!(f, "present"),
            ValidityRequest::Future => write!(f, "future"),
            ValidityRequest::At(t) => write!(f, "at {}", Bound::Timestamp(*t)),
            ValidityRequest::Explicit(from, to) => write!(f, "{} to {}", from, to),
        }
    }
}

pub fn resolve(request: ValidityRequest, now: Timestamp) -> Result<(Bound, Bound)> {
    let now_bound = Bound::Timestamp(now);
    let bounds = match request {
        ValidityRequest::Past => (Bound::NegativeInfinity, now_bound),
        ValidityRequest::Present => (now_bound, now_bound.checked_add(MINIMAL_INTERVAL)?),
        ValidityRequest::Future => (now_bound, Bound::PositiveInfinity),
        ValidityRequest::At(t) => {
            let at = Bound::Timestamp(t);
            (at, at.checked_add(MINIMAL_INTERVAL)?)
        }
        ValidityRequest::Explicit(from, to) => {
            if from > to {
                return Err(VirkningError::InvalidRange {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
            (from, to)
        }
    };
    debug!(%request, from = %bounds.0, to = %bounds.1, "resolved validity window");
    Ok(bounds)
}

/// Resolves `request` into the half-open window `[from, to)`.
pub fn resolve_window(request: ValidityRequest, now: Timestamp) -> Result<EffectiveTime> {
    let (from, to) = resolve(request, now)?;
    EffectiveTime::half_open(from, to)
}
