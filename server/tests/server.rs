//! Multiplexer behavior over loopback TCP.

use std::net::SocketAddr;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;

use agent::Agent;
use inspect::testing::TestGame;
use server::{DebuggerId, ServerEvent, ServerHandle};
use session::SessionState;
use wire::{Command, Frame};

type Debuggee = (
    wire::CommandReader<tokio::net::tcp::OwnedReadHalf>,
    wire::CommandWriter<tokio::net::tcp::OwnedWriteHalf>,
);

fn init_test_logger() {
    use std::io::IsTerminal;
    use tracing_subscriber::EnvFilter;

    let in_ci = std::env::var("CI")
        .map(|val| val == "true")
        .unwrap_or(false);

    if std::io::stderr().is_terminal() || in_ci {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .json()
            .try_init();
    }
}

async fn start_server() -> (ServerHandle, mpsc::Receiver<ServerEvent>) {
    init_test_logger();
    let (handle, mut events) = server::bind("127.0.0.1:0").await.unwrap();
    assert!(matches!(next_event(&mut events).await, ServerEvent::Ready));
    (handle, events)
}

async fn connect_debuggee(addr: SocketAddr) -> Debuggee {
    wire::connect(addr).await.unwrap()
}

async fn next_event(events: &mut mpsc::Receiver<ServerEvent>) -> ServerEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for a server event")
        .expect("event channel closed")
}

async fn expect_opened(events: &mut mpsc::Receiver<ServerEvent>) -> DebuggerId {
    match next_event(events).await {
        ServerEvent::ConnectionOpened { id } => id,
        other => panic!("expected ConnectionOpened, got {other:?}"),
    }
}

async fn expect_closed(events: &mut mpsc::Receiver<ServerEvent>) -> DebuggerId {
    match next_event(events).await {
        ServerEvent::ConnectionClosed { id } => id,
        other => panic!("expected ConnectionClosed, got {other:?}"),
    }
}

async fn expect_command(debuggee: &mut Debuggee) -> Command {
    let frame = tokio::time::timeout(Duration::from_secs(5), debuggee.0.next())
        .await
        .expect("timed out waiting for a command")
        .expect("connection closed")
        .expect("transport error");
    match frame {
        Frame::Command(command) => command,
        Frame::Malformed { error } => panic!("malformed frame: {error}"),
    }
}

#[tokio::test]
async fn identifiers_are_distinct_and_increasing() {
    let (handle, mut events) = start_server().await;

    let _first = connect_debuggee(handle.local_addr()).await;
    let a = expect_opened(&mut events).await;
    let _second = connect_debuggee(handle.local_addr()).await;
    let b = expect_opened(&mut events).await;
    let _third = connect_debuggee(handle.local_addr()).await;
    let c = expect_opened(&mut events).await;

    assert!(a < b && b < c);
}

#[tokio::test]
async fn identifiers_are_never_reused() {
    let (handle, mut events) = start_server().await;

    let first = connect_debuggee(handle.local_addr()).await;
    let a = expect_opened(&mut events).await;
    drop(first);
    assert_eq!(expect_closed(&mut events).await, a);

    let _second = connect_debuggee(handle.local_addr()).await;
    let b = expect_opened(&mut events).await;
    assert!(b > a);
}

#[tokio::test]
async fn session_tracks_three_debuggees_and_a_mid_list_close() {
    let (handle, mut events) = start_server().await;
    let mut session = SessionState::new();
    session.handle_event(ServerEvent::Ready);

    let _first = connect_debuggee(handle.local_addr()).await;
    let a = expect_opened(&mut events).await;
    session.handle_event(ServerEvent::ConnectionOpened { id: a });
    let second = connect_debuggee(handle.local_addr()).await;
    let b = expect_opened(&mut events).await;
    session.handle_event(ServerEvent::ConnectionOpened { id: b });
    let _third = connect_debuggee(handle.local_addr()).await;
    let c = expect_opened(&mut events).await;
    session.handle_event(ServerEvent::ConnectionOpened { id: c });

    assert_eq!(session.selected_id(), Some(c));

    // The second debuggee disconnects while it is not selected.
    drop(second);
    let closed = expect_closed(&mut events).await;
    assert_eq!(closed, b);
    session.handle_event(ServerEvent::ConnectionClosed { id: closed });

    assert_eq!(session.selected_id(), Some(c));
    assert_eq!(session.debugger_ids(), &[a, c]);
}

#[tokio::test]
async fn commands_are_routed_to_the_addressed_debuggee_only() {
    let (handle, mut events) = start_server().await;

    let mut first = connect_debuggee(handle.local_addr()).await;
    let a = expect_opened(&mut events).await;
    let mut second = connect_debuggee(handle.local_addr()).await;
    let b = expect_opened(&mut events).await;

    handle.pause(b).await;
    assert_eq!(expect_command(&mut second).await, Command::Pause);

    handle.play(a).await;
    assert_eq!(expect_command(&mut first).await, Command::Play);
}

#[tokio::test]
async fn sending_to_a_closed_id_is_a_silent_noop() {
    let (handle, mut events) = start_server().await;

    let first = connect_debuggee(handle.local_addr()).await;
    let a = expect_opened(&mut events).await;
    drop(first);
    assert_eq!(expect_closed(&mut events).await, a);

    // No panic, no event, and the server keeps serving.
    handle.refresh(a).await;

    let mut second = connect_debuggee(handle.local_addr()).await;
    let b = expect_opened(&mut events).await;
    handle.refresh(b).await;
    assert_eq!(expect_command(&mut second).await, Command::Refresh);
}

#[tokio::test]
async fn set_is_followed_by_a_delayed_refresh() {
    let (handle, mut events) = start_server().await;

    let mut debuggee = connect_debuggee(handle.local_addr()).await;
    let id = expect_opened(&mut events).await;

    handle
        .set(id, vec!["score".to_string()], serde_json::json!("42"))
        .await;

    assert_eq!(
        expect_command(&mut debuggee).await,
        Command::Set {
            path: vec!["score".to_string()],
            new_value: serde_json::json!("42"),
        }
    );
    // The automatic refresh arrives on its own after REFRESH_DELAY.
    assert_eq!(expect_command(&mut debuggee).await, Command::Refresh);
}

#[tokio::test]
async fn dumps_are_tagged_with_the_sending_id() {
    let (handle, mut events) = start_server().await;

    let mut first = connect_debuggee(handle.local_addr()).await;
    let a = expect_opened(&mut events).await;
    let mut second = connect_debuggee(handle.local_addr()).await;
    let b = expect_opened(&mut events).await;

    second
        .1
        .send(Command::Dump {
            payload: serde_json::json!({"from": "second"}),
        })
        .await
        .unwrap();
    first
        .1
        .send(Command::Dump {
            payload: serde_json::json!({"from": "first"}),
        })
        .await
        .unwrap();

    let mut seen = Vec::new();
    for _ in 0..2 {
        match next_event(&mut events).await {
            ServerEvent::Message {
                id,
                command: Command::Dump { payload },
            } => seen.push((id, payload)),
            other => panic!("expected a dump message, got {other:?}"),
        }
    }
    seen.sort_by_key(|(id, _)| *id);
    assert_eq!(seen[0], (a, serde_json::json!({"from": "first"})));
    assert_eq!(seen[1], (b, serde_json::json!({"from": "second"})));
}

#[tokio::test]
async fn end_to_end_pause_produces_one_dump_for_the_session() {
    let (handle, mut events) = start_server().await;
    let addr = handle.local_addr();

    let mut live_agent = Agent::new(TestGame::new());
    tokio::spawn(async move {
        let _ = live_agent.connect(addr).await;
    });

    let id = expect_opened(&mut events).await;
    let mut session = SessionState::new();
    session.handle_event(ServerEvent::ConnectionOpened { id });

    handle.pause(id).await;
    match next_event(&mut events).await {
        ServerEvent::Message { id: from, command } => {
            assert_eq!(from, id);
            session.handle_event(ServerEvent::Message { id: from, command });
        }
        other => panic!("expected a dump message, got {other:?}"),
    }

    let payload = session.selected_game_data().expect("dump cached");
    assert_eq!(payload["running"], serde_json::json!(false));
    assert_eq!(payload["title"], serde_json::json!("space shooter"));
}
