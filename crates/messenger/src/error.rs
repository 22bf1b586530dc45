use crate::message::MessageDirection;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouteError {
    /// Only L2→L1 messages are finalized on L1
    #[error("Cannot finalize an {0} message on L1")]
    WrongDirection(MessageDirection),

    /// A single lookup failed
    #[error("Route lookup failed: {0}")]
    Lookup(eyre::Report),

    /// Both concurrent lookups failed
    #[error("{} route lookups failed: {}", .0.len(), render_all(.0))]
    Aggregate(Vec<eyre::Report>),

    #[error("Failed to decode relayed message: {0}")]
    Decode(#[from] alloy_sol_types::Error),
}

impl RouteError {
    /// Underlying lookup failures, in the order the lookups were issued.
    pub fn reasons(&self) -> Vec<String> {
        match self {
            Self::Lookup(e) => vec![e.to_string()],
            Self::Aggregate(errors) => errors.iter().map(ToString::to_string).collect(),
            other => vec![other.to_string()],
        }
    }
}

fn render_all(errors: &[eyre::Report]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
