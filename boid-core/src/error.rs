use thiserror::Error;

use crate::agent::AgentId;

/// Errors raised by the flocking engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// A setting that cannot describe a runnable model; raised before any
    /// part of the model is built.
    #[error("invalid configuration: {field} {reason}")]
    InvalidConfiguration {
        field: &'static str,
        reason: &'static str,
    },

    /// A velocity with no direction reached normalization. Boids recover from
    /// this locally, so it never escapes a tick.
    #[error("agent {agent} has a degenerate velocity")]
    DegenerateVelocity { agent: AgentId },

    /// Only raised by spaces with wrapping disabled.
    #[error("position ({x}, {y}) is outside the space")]
    OutOfBounds { x: f64, y: f64 },

    #[error("agent {id} is not placed in the space")]
    UnknownAgent { id: AgentId },
}

impl SimError {
    pub(crate) fn invalid(field: &'static str, reason: &'static str) -> Self {
        Self::InvalidConfiguration { field, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SimError::invalid("vision", "must be positive");
        assert_eq!(err.to_string(), "invalid configuration: vision must be positive");

        let err = SimError::UnknownAgent { id: AgentId(4) };
        assert_eq!(err.to_string(), "agent #4 is not placed in the space");
    }
}
