use eyre::WrapErr;
use futures::StreamExt;
use tokio::io::AsyncWrite;
use tokio::net::{TcpStream, ToSocketAddrs};

use inspect::{mutate, snapshot, ExclusionRules, Inspect};
use wire::{Command, CommandWriter, Frame, Transport};

use crate::Debuggee;

/// Where the agent is in its connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// The debug agent: owns the live root state object and one connection to
/// the debugger host.
///
/// The root object lives behind a `Box` so that addresses inside the graph
/// stay put however the agent itself moves; identity-based exclusion rules
/// depend on that.
///
/// The agent never reconnects on its own; when the transport closes or
/// errors it returns to [`ConnectionState::Disconnected`] and its run loop
/// ends.
pub struct Agent<G> {
    game: Box<G>,
    rules: ExclusionRules,
    max_depth: usize,
    state: ConnectionState,
}

impl<G: Debuggee> Agent<G> {
    /// Take ownership of a root state object. Snapshots apply no
    /// exclusions until [`with_rules`](Agent::with_rules) installs some.
    pub fn new(game: G) -> Self {
        Self {
            game: Box::new(game),
            rules: ExclusionRules::new(),
            max_depth: snapshot::MAX_DEPTH,
            state: ConnectionState::Disconnected,
        }
    }

    /// Build the snapshot exclusion rules against the graph the agent now
    /// owns. Object identities are address-derived, so identity rules must
    /// be built here: rules built against the graph before it moved into
    /// the agent would never match.
    pub fn with_rules(mut self, build: impl FnOnce(&G) -> ExclusionRules) -> Self {
        self.rules = build(&self.game);
        self
    }

    /// Override the default snapshot depth limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The live root object; mainly useful after the run loop has ended.
    pub fn game(&self) -> &G {
        &self.game
    }

    /// Give the root object back.
    pub fn into_game(self) -> G {
        *self.game
    }

    /// Connect to the debugger host and serve commands until the
    /// connection closes.
    ///
    /// Only the initial connect can fail; once connected, transport
    /// problems end the loop cleanly rather than erroring.
    pub async fn connect(&mut self, addr: impl ToSocketAddrs) -> eyre::Result<()> {
        self.state = ConnectionState::Connecting;
        let stream = match TcpStream::connect(addr).await {
            Ok(stream) => stream,
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                return Err(e).wrap_err("connecting to debugger host");
            }
        };
        self.run_on(stream).await;
        Ok(())
    }

    /// Serve commands over an already-established transport until it
    /// closes. Tests drive this with an in-memory pair.
    pub async fn run_on<T: Transport>(&mut self, transport: T) {
        let (mut reader, mut writer) = wire::split(transport);
        self.state = ConnectionState::Connected;
        tracing::info!("debugger connection open");

        while let Some(frame) = reader.next().await {
            match frame {
                Ok(Frame::Command(command)) => {
                    if self.handle_command(command, &mut writer).await.is_err() {
                        break;
                    }
                }
                Ok(Frame::Malformed { error }) => {
                    tracing::warn!(%error, "received a badly formatted message");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "transport error");
                    break;
                }
            }
        }

        self.state = ConnectionState::Disconnected;
        tracing::info!("debugger connection closed");
    }

    /// Dispatch one command. `Err` means the transport failed while
    /// sending a dump; everything else is contained here.
    #[tracing::instrument(skip(self, writer))]
    async fn handle_command<W>(
        &mut self,
        command: Command,
        writer: &mut CommandWriter<W>,
    ) -> Result<(), wire::CodecError>
    where
        W: AsyncWrite + Unpin,
    {
        match command {
            Command::Play => {
                tracing::debug!("resuming execution");
                self.game.set_running(true);
            }
            Command::Pause => {
                // Pause always implies a fresh dump: the controller never
                // needs a separate refresh after pausing.
                tracing::debug!("suspending execution");
                self.game.set_running(false);
                self.send_dump(writer).await?;
            }
            Command::Refresh => {
                self.send_dump(writer).await?;
            }
            Command::Set { path, new_value } => {
                if let Err(e) = mutate::apply_set(&mut *self.game, &path, &new_value) {
                    tracing::error!(error = %e, ?path, "set operation from debugger aborted");
                }
            }
            Command::Call { path, args } => {
                if let Err(e) = mutate::apply_call(&mut *self.game, &path, &args) {
                    tracing::error!(error = %e, ?path, "call operation from debugger aborted");
                }
            }
            Command::Dump { .. } => {
                tracing::warn!("host sent a dump; ignoring");
            }
            Command::Unknown => {
                tracing::warn!("unknown command received by the debug agent");
            }
        }
        Ok(())
    }

    async fn send_dump<W>(&mut self, writer: &mut CommandWriter<W>) -> Result<(), wire::CodecError>
    where
        W: AsyncWrite + Unpin,
    {
        let payload = snapshot::capture(&*self.game as &dyn Inspect, &self.rules, self.max_depth);
        writer.send(Command::Dump { payload }).await
    }
}
