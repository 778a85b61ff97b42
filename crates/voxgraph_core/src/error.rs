use thiserror::Error;

use crate::patch::Endpoint;

/// Fatal build failures. Anything recoverable is reported as a
/// [`Diagnostic`](crate::diagnostics::Diagnostic) instead.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("patch is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("module '{id}' has unknown type '{type_tag}'")]
    UnknownType { id: String, type_tag: String },

    #[error("cannot connect {src} -> {dst}: {reason}")]
    Connectivity {
        src: Endpoint,
        dst: Endpoint,
        reason: String,
    },

    #[error(
        "sample rate must be a positive number up to {max} Hz, got {0}",
        max = crate::builder::MAX_SAMPLE_RATE
    )]
    InvalidSampleRate(f32),

    #[error("patch needs exactly one terminal node, found {}", describe_candidates(.candidates))]
    NoTerminal { candidates: Vec<String> },
}

fn describe_candidates(candidates: &[String]) -> String {
    if candidates.is_empty() {
        "none".to_string()
    } else {
        format!("{} ({})", candidates.len(), candidates.join(", "))
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_terminal_message_lists_candidates() {
        let err = BuildError::NoTerminal {
            candidates: vec!["a".into(), "b".into()],
        };
        assert_eq!(
            err.to_string(),
            "patch needs exactly one terminal node, found 2 (a, b)"
        );

        let err = BuildError::NoTerminal { candidates: vec![] };
        assert_eq!(err.to_string(), "patch needs exactly one terminal node, found none");
    }

    #[test]
    fn connectivity_message_names_endpoints() {
        let err = BuildError::Connectivity {
            src: Endpoint::new("osc", 0),
            dst: Endpoint::new("out", 3),
            reason: "node 'out' has 1 input port(s)".into(),
        };
        assert_eq!(
            err.to_string(),
            "cannot connect osc:0 -> out:3: node 'out' has 1 input port(s)"
        );
    }
}
