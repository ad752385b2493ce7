//! Debugger message types.
//!
//! Every message is a JSON object tagged by its `"command"` field. The
//! field names (`path`, `newValue`, `args`, `payload`) are part of the wire
//! contract and must not change.

use serde::{Deserialize, Serialize};

/// A debugger protocol message.
///
/// `play`, `pause`, `refresh`, `set` and `call` travel host to debuggee;
/// `dump` travels debuggee to host. A tag this crate does not know decodes
/// to [`Command::Unknown`], which receivers log and ignore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum Command {
    /// Resume execution of the debuggee.
    Play,
    /// Suspend execution of the debuggee. The agent replies with a dump.
    Pause,
    /// Request a fresh dump without changing the run state.
    Refresh,
    /// Assign a new value to the field identified by `path`.
    Set {
        path: Vec<String>,
        #[serde(rename = "newValue")]
        new_value: serde_json::Value,
    },
    /// Invoke the member identified by `path` with positional arguments.
    Call {
        path: Vec<String>,
        args: Vec<serde_json::Value>,
    },
    /// A point-in-time snapshot of the debuggee's root state object.
    Dump { payload: serde_json::Value },
    /// Any tag not listed above.
    #[serde(other)]
    Unknown,
}

/// One decoded frame off the wire.
///
/// Frames that fail to parse are reported as data, not as stream errors:
/// the protocol requires the connection to survive a bad message.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// A well-formed message.
    Command(Command),
    /// A frame that was not valid JSON or had no usable `command` tag.
    Malformed { error: String },
}
