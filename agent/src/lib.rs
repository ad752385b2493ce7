//! The in-process debug agent.
//!
//! The agent lives inside the debuggee, owns the live root state object,
//! and holds the single connection to the debugger host. It interprets
//! incoming commands (run control, snapshot requests, remote mutation)
//! and is the only thing that ever touches the live graph, so no locking
//! is needed anywhere in the protocol.

mod agent;

pub use agent::{Agent, ConnectionState};

use inspect::Inspect;

/// A debuggee root object: inspectable state plus run control.
///
/// `set_running` is the agent's hook into the owning process's main loop;
/// the agent calls it on `play` and `pause` commands and never otherwise
/// interferes with execution.
pub trait Debuggee: Inspect {
    fn set_running(&mut self, running: bool);
}

// Wire the shared fixture up as a debuggee so the integration tests can
// drive a full agent.
impl Debuggee for inspect::testing::TestGame {
    fn set_running(&mut self, running: bool) {
        inspect::testing::TestGame::set_running(self, running);
    }
}
