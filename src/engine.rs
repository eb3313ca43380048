//! The read pipeline: resolve a validity request, restrict registrations to
//! the resulting window, consolidate what is left.
//!
//! The engine holds nothing but its [`Settings`]; every call is a pure
//! function of its arguments, so one engine can serve any number of
//! concurrent requests.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::bound::Timestamp;
use crate::effect::EffectiveTime;
use crate::error::Result;
use crate::literal;
use crate::registration::{Registration, rewrite_registrations};
use crate::settings::Settings;
use crate::validity::{self, ValidityRequest};

#[derive(Clone, Debug, Default)]
pub struct Engine {
    settings: Settings,
}

impl Engine {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Reads the validity parameters of a request, see
    /// [`ValidityRequest::from_params`].
    pub fn request(
        &self,
        validity: Option<&str>,
        virkningfra: Option<&str>,
        virkningtil: Option<&str>,
        virkningstid: Option<&str>,
    ) -> Result<ValidityRequest> {
        ValidityRequest::from_params_in(
            validity,
            virkningfra,
            virkningtil,
            virkningstid,
            self.settings.default_offset(),
        )
        .inspect_err(|e| warn!(error = %e, "rejected validity parameters"))
    }

    pub fn window(&self, request: ValidityRequest, now: Timestamp) -> Result<EffectiveTime> {
        validity::resolve_window(request, now)
    }

    /// Parses a range literal as read from the store.
    pub fn parse_literal(&self, s: &str) -> Result<EffectiveTime> {
        literal::parse_in(s, self.settings.default_offset())
            .inspect_err(|e| warn!(error = %e, "rejected range literal"))
    }

    pub fn parse_registration(&self, value: &Value) -> Result<Registration> {
        Registration::from_json_in(value, self.settings.default_offset())
    }

    /// Trims `registration` to the window `request` resolves to and
    /// consolidates every remaining slot.
    pub fn restrict(&self, registration: &Registration, request: ValidityRequest, now: Timestamp) -> Result<Registration> {
        let window = self.window(request, now)?;
        let restricted = self.restrict_to(registration, &window);
        debug!(
            %window,
            before = registration.fragment_count(),
            after = restricted.fragment_count(),
            "restricted registration"
        );
        Ok(restricted)
    }

    pub fn restrict_to(&self, registration: &Registration, window: &EffectiveTime) -> Registration {
        registration
            .prune(window)
            .consolidate(self.settings.merge_policy())
    }

    /// Restricts every registration found in a read result.
    pub fn restrict_value(&self, value: &Value, request: ValidityRequest, now: Timestamp) -> Result<Value> {
        let window = self.window(request, now)?;
        let mut restricted = 0usize;
        let value = rewrite_registrations(
            value,
            &mut |registration: &Registration| {
                restricted += 1;
                self.restrict_to(registration, &window)
            },
            self.settings.default_offset(),
        )?;
        info!(%request, %window, registrations = restricted, "restricted read result");
        Ok(value)
    }
}
