//! Engine settings.
//!
//! Settings are layered with the `config` crate: built-in defaults, then an
//! optional `virkning.toml` (or any format `config` understands) in the
//! working directory, then environment variables prefixed `VIRKNING_`
//! (`VIRKNING_DEFAULT_OFFSET`, `VIRKNING_MERGE_POLICY`, `VIRKNING_LOG_FILTER`).

use std::path::Path;
use std::str::FromStr;

use chrono::FixedOffset;
use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use crate::bound::utc;
use crate::consolidate::MergePolicy;
use crate::error::{Result, VirkningError};

pub const DEFAULT_FILE: &str = "virkning";
pub const ENV_PREFIX: &str = "VIRKNING";
pub const DEFAULT_LOG_FILTER: &str = "virkning=info";

#[derive(Deserialize)]
struct RawSettings {
    default_offset: String,
    merge_policy: String,
    log_filter: String,
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Settings {
    default_offset: FixedOffset,
    merge_policy: MergePolicy,
    log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_offset: utc(),
            merge_policy: MergePolicy::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Settings {
    pub fn new(default_offset: FixedOffset, merge_policy: MergePolicy) -> Self {
        Self {
            default_offset,
            merge_policy,
            ..Self::default()
        }
    }
    /// Defaults, then `virkning.*` if present, then the environment.
    pub fn load() -> Result<Self> {
        let builder = defaults()?
            .add_source(File::with_name(DEFAULT_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX));
        Self::build(builder)
    }
    /// Defaults overridden by the given file, which must exist.
    pub fn from_file(path: &Path) -> Result<Self> {
        let builder = defaults()?.add_source(File::from(path));
        Self::build(builder)
    }
    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let raw: RawSettings = builder.build()?.try_deserialize()?;
        let default_offset = FixedOffset::from_str(raw.default_offset.trim())
            .map_err(|e| VirkningError::Config(format!("default_offset '{}': {}", raw.default_offset, e)))?;
        Ok(Self {
            default_offset,
            merge_policy: raw.merge_policy.parse()?,
            log_filter: raw.log_filter,
        })
    }
    /// Offset given to timestamps written without one.
    pub fn default_offset(&self) -> FixedOffset {
        self.default_offset
    }
    pub fn merge_policy(&self) -> MergePolicy {
        self.merge_policy
    }
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>> {
    Ok(Config::builder()
        .set_default("default_offset", "+00:00")?
        .set_default("merge_policy", "coalesce")?
        .set_default("log_filter", DEFAULT_LOG_FILTER)?)
}

/// Installs a fmt subscriber for host binaries, benches and tests. `RUST_LOG`
/// wins over the configured filter. Fails if a global subscriber is already
/// set.
pub fn init_tracing(settings: &Settings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(settings.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| VirkningError::Config(format!("tracing: {}", e)))
}
