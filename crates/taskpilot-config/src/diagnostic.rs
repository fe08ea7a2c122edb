// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Diagnostic rendering for configuration errors.

use miette::Diagnostic;
use thiserror::Error;

/// A single configuration problem, renderable as a miette diagnostic.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// The config file parsed but a value is unusable.
    #[error("invalid value for `{key}`: {reason}")]
    #[diagnostic(code(taskpilot::config::invalid_value))]
    InvalidValue { key: String, reason: String },

    /// Figment failed to parse or merge the configuration sources.
    #[error("{message}")]
    #[diagnostic(code(taskpilot::config::parse), help("{help}"))]
    Parse { message: String, help: String },
}

impl ConfigError {
    /// Builds an invalid-value diagnostic for a dotted config key.
    pub fn invalid_value(key: &str, reason: &str) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Converts a figment extraction error into diagnostics, one per failure.
pub fn figment_to_config_errors(err: figment::Error) -> Vec<ConfigError> {
    err.into_iter()
        .map(|e| ConfigError::Parse {
            message: e.to_string(),
            help: "check taskpilot.toml against the documented sections: \
                   [agent], [anthropic], [storage], [tool_server], [turn], [gateway]"
                .to_string(),
        })
        .collect()
}

/// Renders all config errors to stderr via miette's fancy reporter.
pub fn render_errors(errors: &[ConfigError]) {
    for error in errors {
        eprintln!("{:?}", miette::Report::msg(error.to_string()));
    }
    eprintln!(
        "taskpilot: {} configuration error(s), refusing to start",
        errors.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_formats_key_and_reason() {
        let err = ConfigError::invalid_value("gateway.port", "must be non-zero");
        assert_eq!(
            err.to_string(),
            "invalid value for `gateway.port`: must be non-zero"
        );
    }

    #[test]
    fn figment_errors_become_parse_diagnostics() {
        let result = crate::loader::load_config_from_str("[agent]\nname = 42\n");
        let errors = figment_to_config_errors(result.unwrap_err());
        assert!(!errors.is_empty());
        assert!(matches!(errors[0], ConfigError::Parse { .. }));
    }
}
