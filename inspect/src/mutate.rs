//! The remote mutation engine: `set` and `call` against the live graph.
//!
//! Both operations resolve their path with [`crate::path::resolve_mut`]
//! and mutate exactly one location, or report a typed rejection. Nothing
//! here panics on malformed input from the wire.

use crate::path;
use crate::{DynValue, Field, Inspect, InvokeError};

/// Why a `set` or `call` was rejected.
///
/// Rejections are logged on the debuggee side and never sent back over the
/// wire; the protocol has no negative acknowledgement channel.
#[derive(Debug, thiserror::Error)]
pub enum MutateError {
    /// A zero-length path identifies nothing.
    #[error("no path specified")]
    EmptyPath,

    /// Navigation failed at the named step.
    #[error("incorrect path specified: no {key:?} at step {depth}")]
    PathNotFound { key: String, depth: usize },

    /// The resolved field refused the write or does not exist.
    #[error("field {key:?} cannot be set")]
    NotSettable { key: String },

    /// The resolved member cannot be called.
    #[error("unable to call {key:?}")]
    NotInvokable { key: String },

    /// The member was called but reported a failure.
    #[error("call to {key:?} failed: {reason}")]
    InvokeFailed { key: String, reason: String },
}

/// Assign a new value at `path`, coercing it to the type currently held.
///
/// The coercion is asymmetric on purpose: a numeric field parses the
/// incoming value as a float so a text-typed remote edit cannot turn an
/// engine-internal number into unparseable text, and a textual field
/// stringifies the incoming value. Anything else takes the value as-is.
///
/// Known edge case: a non-numeric string written to a numeric field parses
/// to NaN, and NaN is still written. Guard against it upstream.
pub fn apply_set(
    root: &mut dyn Inspect,
    path: &[String],
    raw: &serde_json::Value,
) -> Result<(), MutateError> {
    if path.is_empty() {
        return Err(MutateError::EmptyPath);
    }

    let (container, key) = path::resolve_mut(root, path)?;

    let new_value = match container.field(key) {
        Some(Field::Scalar(DynValue::Number(_))) => DynValue::Number(coerce_number(raw)),
        Some(Field::Scalar(DynValue::Text(_))) => DynValue::Text(coerce_text(raw)),
        _ => DynValue::from_json(raw),
    };

    tracing::debug!(?path, ?new_value, "updating field");
    if container.set(key, new_value) {
        Ok(())
    } else {
        Err(MutateError::NotSettable {
            key: key.to_string(),
        })
    }
}

/// Invoke the member at `path` with positional arguments.
///
/// Arguments are passed through in order and unconverted. Fire-and-forget:
/// no return value is observable except through a later snapshot.
pub fn apply_call(
    root: &mut dyn Inspect,
    path: &[String],
    args: &[serde_json::Value],
) -> Result<(), MutateError> {
    if path.is_empty() {
        return Err(MutateError::EmptyPath);
    }

    let (container, key) = path::resolve_mut(root, path)?;

    tracing::debug!(?path, ?args, "calling member");
    container.invoke(key, args).map_err(|e| match e {
        InvokeError::UnknownMember { name } => MutateError::NotInvokable { key: name },
        InvokeError::Failed { name, reason } => MutateError::InvokeFailed { key: name, reason },
    })
}

/// Numeric coercion: numbers pass through, strings are parsed, everything
/// else is NaN (matching a float parse of its text form).
fn coerce_number(raw: &serde_json::Value) -> f64 {
    match raw {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Textual coercion: strings pass through, everything else renders as its
/// JSON text.
fn coerce_text(raw: &serde_json::Value) -> String {
    match raw {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
