//! The host-side session multiplexer.
//!
//! The host accepts arbitrarily many concurrent debuggee connections,
//! assigns each a stable identifier, and routes commands and dumps between
//! every connection and a single controller.
//!
//! # Architecture
//!
//! [`bind`] starts two tasks:
//!
//! - an accept loop that allocates identifiers and spawns one read task
//!   per connection
//! - a single router task that exclusively owns the map of live
//!   connections, so no locking is needed anywhere
//!
//! The controller consumes [`ServerEvent`]s from the returned channel and
//! issues commands through the clone-able [`ServerHandle`]. Sending to an
//! identifier that has just closed is a silent no-op: the connection
//! closing concurrently is an expected race, not an error.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use eyre::WrapErr;
use futures::StreamExt;
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::mpsc;

use wire::{Command, CommandReader, CommandWriter, Frame};

/// Identifies one debuggee connection for the lifetime of the host
/// process. Allocated monotonically, never reused.
pub type DebuggerId = u64;

/// How long after a `set` or `call` the automatic refresh is sent.
///
/// A heuristic, not a guarantee: the mutation's execution is not
/// synchronized with the refresh.
pub const REFRESH_DELAY: Duration = Duration::from_millis(100);

/// Lifecycle and traffic notifications for the controller.
#[derive(Debug, Clone)]
pub enum ServerEvent {
    /// The listener is up and accepting connections.
    Ready,
    /// The listener failed to accept a connection.
    Error(String),
    /// A debuggee connected and was assigned `id`.
    ConnectionOpened { id: DebuggerId },
    /// The debuggee's transport closed or errored; `id` is gone from the
    /// live set.
    ConnectionClosed { id: DebuggerId },
    /// A message arrived from the debuggee behind `id`.
    Message { id: DebuggerId, command: Command },
}

enum RouterMessage {
    Opened {
        id: DebuggerId,
        writer: CommandWriter<tokio::net::tcp::OwnedWriteHalf>,
    },
    Inbound {
        id: DebuggerId,
        frame: Frame,
    },
    Closed {
        id: DebuggerId,
    },
    Outbound {
        id: DebuggerId,
        command: Command,
    },
}

/// The controller's way to issue commands, addressed by identifier.
#[derive(Clone)]
pub struct ServerHandle {
    tx: mpsc::Sender<RouterMessage>,
    local_addr: SocketAddr,
}

impl ServerHandle {
    /// The address the listener is bound to. On a port-0 bind this is the
    /// address debuggees should connect to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Send one command to one debuggee. A no-op if `id` is no longer
    /// live, or if the server itself has shut down.
    pub async fn send(&self, id: DebuggerId, command: Command) {
        let _ = self.tx.send(RouterMessage::Outbound { id, command }).await;
    }

    /// Resume execution of the debuggee.
    pub async fn play(&self, id: DebuggerId) {
        self.send(id, Command::Play).await;
    }

    /// Suspend the debuggee; it answers with a dump on its own.
    pub async fn pause(&self, id: DebuggerId) {
        self.send(id, Command::Pause).await;
    }

    /// Ask the debuggee for a fresh dump.
    pub async fn refresh(&self, id: DebuggerId) {
        self.send(id, Command::Refresh).await;
    }

    /// Assign a value remotely, then refresh after [`REFRESH_DELAY`] so
    /// the controller's cached snapshot converges to the mutated state.
    pub async fn set(&self, id: DebuggerId, path: Vec<String>, new_value: serde_json::Value) {
        self.send(id, Command::Set { path, new_value }).await;
        self.schedule_refresh(id);
    }

    /// Invoke a member remotely, then refresh after [`REFRESH_DELAY`].
    pub async fn call(&self, id: DebuggerId, path: Vec<String>, args: Vec<serde_json::Value>) {
        self.send(id, Command::Call { path, args }).await;
        self.schedule_refresh(id);
    }

    /// The delayed refresh runs on its own task: it never blocks or
    /// reorders traffic for other identifiers, and it degrades to a no-op
    /// send if the connection has closed meanwhile.
    fn schedule_refresh(&self, id: DebuggerId) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(REFRESH_DELAY).await;
            let _ = tx
                .send(RouterMessage::Outbound {
                    id,
                    command: Command::Refresh,
                })
                .await;
        });
    }
}

/// Bind the debugger host endpoint and start serving connections.
///
/// Returns the command handle and the event stream for the controller.
/// The server stops when both the handle (all clones) and the event
/// receiver are dropped.
pub async fn bind(
    addr: impl ToSocketAddrs,
) -> eyre::Result<(ServerHandle, mpsc::Receiver<ServerEvent>)> {
    let listener = TcpListener::bind(addr)
        .await
        .wrap_err("binding debugger host endpoint")?;
    let local_addr = listener
        .local_addr()
        .wrap_err("reading bound listener address")?;

    let (events_tx, events_rx) = mpsc::channel(256);
    let (router_tx, router_rx) = mpsc::channel(256);

    tokio::spawn(run_router(router_rx, events_tx.clone()));
    tokio::spawn(run_accept_loop(listener, router_tx.clone(), events_tx));

    tracing::info!(%local_addr, "debugger server started");
    Ok((
        ServerHandle {
            tx: router_tx,
            local_addr,
        },
        events_rx,
    ))
}

async fn run_accept_loop(
    listener: TcpListener,
    router_tx: mpsc::Sender<RouterMessage>,
    events_tx: mpsc::Sender<ServerEvent>,
) {
    let _ = events_tx.send(ServerEvent::Ready).await;

    let mut next_id: DebuggerId = 1;
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let id = next_id;
                next_id += 1;
                tracing::info!(id, %peer, "debuggee connected");

                let (reader, writer) = wire::split(stream);
                if router_tx
                    .send(RouterMessage::Opened { id, writer })
                    .await
                    .is_err()
                {
                    // Router gone: the server is shutting down.
                    return;
                }
                tokio::spawn(run_connection(id, reader, router_tx.clone()));
            }
            Err(e) => {
                tracing::warn!(error = %e, "accepting debuggee connection");
                let _ = events_tx.send(ServerEvent::Error(e.to_string())).await;
            }
        }
    }
}

/// Forward every frame from one debuggee to the router, then report the
/// close. Messages on a single connection stay in arrival order.
async fn run_connection(
    id: DebuggerId,
    mut reader: CommandReader<tokio::net::tcp::OwnedReadHalf>,
    router_tx: mpsc::Sender<RouterMessage>,
) {
    while let Some(frame) = reader.next().await {
        match frame {
            Ok(frame) => {
                if router_tx
                    .send(RouterMessage::Inbound { id, frame })
                    .await
                    .is_err()
                {
                    return;
                }
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "transport error from debuggee");
                break;
            }
        }
    }
    let _ = router_tx.send(RouterMessage::Closed { id }).await;
}

/// The single task that owns the live connection set.
async fn run_router(mut rx: mpsc::Receiver<RouterMessage>, events_tx: mpsc::Sender<ServerEvent>) {
    let mut connections: HashMap<DebuggerId, CommandWriter<tokio::net::tcp::OwnedWriteHalf>> =
        HashMap::new();

    while let Some(message) = rx.recv().await {
        match message {
            RouterMessage::Opened { id, writer } => {
                connections.insert(id, writer);
                let _ = events_tx.send(ServerEvent::ConnectionOpened { id }).await;
            }
            RouterMessage::Inbound { id, frame } => match frame {
                Frame::Command(command) => {
                    let _ = events_tx.send(ServerEvent::Message { id, command }).await;
                }
                Frame::Malformed { error } => {
                    tracing::warn!(id, %error, "dropping malformed message from debuggee");
                }
            },
            RouterMessage::Closed { id } => {
                if connections.remove(&id).is_some() {
                    tracing::info!(id, "debuggee disconnected");
                    let _ = events_tx.send(ServerEvent::ConnectionClosed { id }).await;
                }
            }
            RouterMessage::Outbound { id, command } => {
                let Some(writer) = connections.get_mut(&id) else {
                    // Expected race: the connection closed concurrently.
                    tracing::debug!(id, "dropping command for closed connection");
                    continue;
                };
                if let Err(e) = writer.send(command).await {
                    tracing::warn!(id, error = %e, "writing to debuggee failed");
                    connections.remove(&id);
                    let _ = events_tx.send(ServerEvent::ConnectionClosed { id }).await;
                }
            }
        }
    }
}
