//! Fatal emission errors.
//!
//! An [`EmitError`] means the code generator cannot produce correct output
//! for a program the binder accepted: a node kind the target does not
//! implement, a dangling label, or a runtime environment that lacks a
//! required primitive. Emission aborts and nothing is written.
//!
//! User-facing problems go through [`Diagnostics`](crate::Diagnostics) instead.

use std::fmt;
use thiserror::Error;

use crate::label::Label;

/// Which code generator raised an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Bytecode,
    Source,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Bytecode => write!(f, "bytecode"),
            Target::Source => write!(f, "source"),
        }
    }
}

/// Errors that abort an emission.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmitError {
    /// The target has no lowering for this bound node.
    #[error("{target} emitter: unhandled {kind} node: {detail}")]
    UnhandledNode {
        target: Target,
        kind: &'static str,
        detail: String,
    },

    /// A jump whose label was never placed in the method body.
    #[error("label {label} in '{method}' was never defined")]
    UnresolvedLabel { method: String, label: Label },

    /// A runtime primitive did not resolve to exactly one candidate.
    #[error("runtime primitive '{name}' resolved to {candidates} candidates, expected exactly one")]
    PrimitiveResolution { name: String, candidates: usize },

    /// A call to a method that was never declared.
    #[error("call to undeclared method '{name}'")]
    UnknownMethod { name: String },

    /// A use of a variable with no local slot or parameter index.
    #[error("use of unknown variable '{name}'")]
    UnknownVariable { name: String },

    /// A built-in function the target cannot expand.
    #[error("{target} emitter: built-in '{name}' is not supported")]
    UnsupportedBuiltin { target: Target, name: String },

    /// The bound tree breaks a structural rule the binder guarantees.
    #[error("invalid program: {message}")]
    InvalidProgram { message: String },
}

impl EmitError {
    pub fn unhandled(target: Target, kind: &'static str, detail: impl Into<String>) -> Self {
        EmitError::UnhandledNode {
            target,
            kind,
            detail: detail.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        EmitError::InvalidProgram {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        let err = EmitError::unhandled(Target::Bytecode, "Index", "items[0] in main");
        assert_eq!(
            err.to_string(),
            "bytecode emitter: unhandled Index node: items[0] in main"
        );

        let err = EmitError::UnresolvedLabel {
            method: "main".into(),
            label: Label(3),
        };
        assert_eq!(err.to_string(), "label Label3 in 'main' was never defined");
    }
}
