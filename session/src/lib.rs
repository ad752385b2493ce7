//! Controller-side session state.
//!
//! The controller derives its view of the world from [`ServerEvent`]s: the
//! set of live debuggee identifiers, the most recent dump per identifier,
//! and which identifier is currently selected. Nothing here is
//! authoritative: the live graphs stay on the debuggees, the connection
//! records stay in the multiplexer. Nothing is persisted.
//!
//! Invariant: the selected identifier, when present, is always a member of
//! the live set. [`SessionState::handle_event`] repairs it on every close.

use std::collections::HashMap;

use server::{DebuggerId, ServerEvent};
use wire::Command;

/// Everything the controller knows, derived from server events.
#[derive(Debug, Default)]
pub struct SessionState {
    /// Live identifiers in connection order.
    debugger_ids: Vec<DebuggerId>,
    /// Most recent dump payload per identifier.
    game_data: HashMap<DebuggerId, serde_json::Value>,
    selected_id: Option<DebuggerId>,
    server_started: bool,
    server_error: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one server event into the state.
    pub fn handle_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Ready => {
                self.server_started = true;
            }
            ServerEvent::Error(error) => {
                tracing::warn!(%error, "debugger server error");
                self.server_error = Some(error);
            }
            ServerEvent::ConnectionOpened { id } => {
                self.debugger_ids.push(id);
                // The newest connection is the one the user just started:
                // select it.
                self.selected_id = Some(id);
            }
            ServerEvent::ConnectionClosed { id } => {
                self.debugger_ids.retain(|&live| live != id);
                self.game_data.remove(&id);
                if self.selected_id == Some(id) {
                    self.selected_id = self.debugger_ids.last().copied();
                }
            }
            ServerEvent::Message { id, command } => self.handle_message(id, command),
        }
    }

    fn handle_message(&mut self, id: DebuggerId, command: Command) {
        match command {
            Command::Dump { payload } => {
                self.game_data.insert(id, payload);
            }
            other => {
                tracing::warn!(id, ?other, "unexpected command from debuggee");
            }
        }
    }

    /// Select a debuggee explicitly. Ignored for identifiers that are not
    /// live, which keeps the selection invariant intact.
    pub fn select(&mut self, id: DebuggerId) -> bool {
        if self.debugger_ids.contains(&id) {
            self.selected_id = Some(id);
            true
        } else {
            false
        }
    }

    pub fn debugger_ids(&self) -> &[DebuggerId] {
        &self.debugger_ids
    }

    pub fn selected_id(&self) -> Option<DebuggerId> {
        self.selected_id
    }

    pub fn has_selected_debugger(&self) -> bool {
        self.selected_id
            .map(|id| self.debugger_ids.contains(&id))
            .unwrap_or(false)
    }

    /// The cached dump for the selected debuggee, if any has arrived.
    pub fn selected_game_data(&self) -> Option<&serde_json::Value> {
        self.game_data.get(&self.selected_id?)
    }

    pub fn game_data(&self, id: DebuggerId) -> Option<&serde_json::Value> {
        self.game_data.get(&id)
    }

    pub fn server_started(&self) -> bool {
        self.server_started
    }

    pub fn server_error(&self) -> Option<&str> {
        self.server_error.as_deref()
    }
}
