//! Rich diagnostic error types for lifegraph.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text. Most of the core never fails: missing
//! endpoints, empty queries and empty inputs degrade to smaller output. Errors
//! surface only at the edges (configuration loading and the durable backend).

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for lifegraph.
#[derive(Debug, Error, Diagnostic)]
pub enum LifeGraphError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("I/O error: {source}")]
    #[diagnostic(
        code(lifegraph::store::io),
        help(
            "A filesystem operation failed. Check that the data directory exists, \
             has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("redb error: {message}")]
    #[diagnostic(
        code(lifegraph::store::redb),
        help(
            "The embedded database reported an error. The graph keeps working \
             in memory; try a fresh data directory if the problem persists."
        )
    )]
    Redb { message: String },

    #[error("serialization error: {message}")]
    #[diagnostic(
        code(lifegraph::store::serde),
        help(
            "A stored record could not be encoded or decoded. \
             The on-disk format may come from an incompatible version."
        )
    )]
    Serialization { message: String },
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(lifegraph::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {message}")]
    #[diagnostic(
        code(lifegraph::config::parse),
        help("Check the TOML syntax. Unknown keys are ignored, missing keys use defaults.")
    )]
    Parse { message: String },

    #[error("invalid value for `{field}`: {message}")]
    #[diagnostic(
        code(lifegraph::config::invalid),
        help("Heuristic thresholds must be finite and non-negative, day windows must be ordered and offsets must be 0 to 36500 days.")
    )]
    Invalid { field: &'static str, message: String },
}

/// Convenience alias for functions returning lifegraph results.
pub type LifeGraphResult<T> = std::result::Result<T, LifeGraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_converts_to_top_level() {
        let err = StoreError::Redb {
            message: "boom".into(),
        };
        let top: LifeGraphError = err.into();
        assert!(matches!(top, LifeGraphError::Store(StoreError::Redb { .. })));
    }

    #[test]
    fn invalid_config_message_names_field() {
        let err = ConfigError::Invalid {
            field: "cluster_gap_days",
            message: "must be >= 0".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("cluster_gap_days"));
        assert!(msg.contains(">= 0"));
    }
}
