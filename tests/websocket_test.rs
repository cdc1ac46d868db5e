//! WebSocket sessions against a real server.

use std::sync::Arc;
use std::time::Duration;

use switchyard::{
    ClientConfig, ClientError, ClientFactory, DefaultClientFactory, HttpClient, Request,
    TransportError,
};

mod common;

use common::{Event, MockTransport, RecordingListener, UpgradeScript};

fn scripted_client(script: UpgradeScript, config: ClientConfig) -> HttpClient {
    let mock = Arc::new(MockTransport::scripted(script));
    HttpClient::from_transport(mock, common::engine(), config).unwrap()
}

fn errors(listener: &RecordingListener) -> usize {
    listener
        .events()
        .iter()
        .filter(|event| matches!(event, Event::Error(_)))
        .count()
}

#[test]
fn test_network_socket_push_and_echo() {
    let engine = common::engine();
    let addr = common::start_ws_server(&engine);
    let client = DefaultClientFactory::new(Arc::clone(&engine))
        .create_client(ClientConfig::new(format!("http://{addr}")))
        .unwrap();
    let listener = Arc::new(RecordingListener::default());

    let socket = client
        .open_socket(Request::get("/session/1/se/bidi"), listener.clone())
        .unwrap();

    assert!(common::wait_until(|| listener.texts().len() >= 3));
    assert_eq!(listener.texts()[..3], ["a", "b", "c"]);

    socket.send_text("ping").unwrap();
    assert!(common::wait_until(|| listener.texts().len() >= 4));
    assert_eq!(listener.texts()[3], "echo:ping");

    socket.close();
    assert!(socket.is_closed());
    assert!(matches!(socket.send_text("late"), Err(ClientError::SocketClosed)));
    assert!(common::wait_until(|| listener.closed()));
}

#[test]
fn test_close_waits_for_writer_to_flush() {
    let engine = common::engine();
    let addr = common::start_ws_server(&engine);
    let client = DefaultClientFactory::new(Arc::clone(&engine))
        .create_client(ClientConfig::new(format!("http://{addr}")))
        .unwrap();
    let listener = Arc::new(RecordingListener::default());

    let socket = client
        .open_socket(Request::get("/events"), listener.clone())
        .unwrap();
    assert!(common::wait_until(|| listener.texts().len() >= 3));

    socket.close();
    let flushed = engine
        .block_on(async {
            tokio::time::timeout(Duration::from_secs(5), socket.writer_finished()).await
        })
        .unwrap();
    assert!(flushed.is_ok());
    assert!(common::wait_until(|| listener.closed()));
}

#[test]
fn test_read_failure_after_handshake_reaches_listener() {
    let client = scripted_client(UpgradeScript::ReadError, ClientConfig::default());
    let listener = Arc::new(RecordingListener::default());

    let socket = client
        .open_socket(Request::get("/session/1/se/bidi"), listener.clone())
        .unwrap();

    assert!(common::wait_until(|| socket.is_closed()));
    let events = listener.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], Event::Text("a".into()));
    assert!(matches!(&events[1], Event::Error(message) if message.contains("corrupt frame")));
}

#[test]
fn test_stream_end_without_close_frame_reports_abnormal_closure() {
    let client = scripted_client(UpgradeScript::EndsAbruptly, ClientConfig::default());
    let listener = Arc::new(RecordingListener::default());

    let socket = client
        .open_socket(Request::get("/session/1/se/bidi"), listener.clone())
        .unwrap();

    assert!(common::wait_until(|| listener.closed()));
    assert_eq!(
        listener.events(),
        vec![Event::Text("a".into()), Event::Close(switchyard::websocket::ABNORMAL_CLOSURE)]
    );
    assert!(common::wait_until(|| socket.is_closed()));
}

#[test]
fn test_handshake_timeout_is_upgrade_error() {
    let mut config = ClientConfig::default();
    config.timeouts.connect_secs = 1;
    let client = scripted_client(UpgradeScript::Hang, config);
    let listener = Arc::new(RecordingListener::default());

    let err = client
        .open_socket(Request::get("/session/1/se/bidi"), listener.clone())
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::Upgrade(TransportError::Timeout(limit)) if limit == Duration::from_secs(1)
    ));
    assert!(listener.events().is_empty());
}

#[test]
fn test_write_failure_is_reported_once() {
    let client = scripted_client(UpgradeScript::WriteFails, ClientConfig::default());
    let listener = Arc::new(RecordingListener::default());

    let socket = client
        .open_socket(Request::get("/session/1/se/bidi"), listener.clone())
        .unwrap();
    socket.send_text("first").unwrap();

    assert!(common::wait_until(|| socket.is_closed()));
    assert!(matches!(socket.send_text("second"), Err(ClientError::SocketClosed)));
    std::thread::sleep(Duration::from_millis(50));

    assert_eq!(errors(&listener), 1);
    assert!(matches!(&listener.events()[..], [Event::Error(message)] if message.contains("peer went away")));
}

#[test]
fn test_handshake_failure_is_upgrade_error() {
    let engine = common::engine();
    let addr = common::start_echo_backend(&engine, "200 OK");
    let client = DefaultClientFactory::new(Arc::clone(&engine))
        .create_client(ClientConfig::new(format!("http://{addr}")))
        .unwrap();
    let listener = Arc::new(RecordingListener::default());

    let err = client
        .open_socket(Request::get("/not-a-socket"), listener.clone())
        .unwrap_err();

    assert!(matches!(err, ClientError::Upgrade(_)));
    assert!(listener.events().is_empty());
}

#[cfg(unix)]
#[test]
fn test_unix_socket_websocket() {
    let engine = common::engine();
    let path = common::socket_path("ws");
    common::start_unix_ws_server(&engine, &path);
    let client = DefaultClientFactory::new(Arc::clone(&engine))
        .create_client(ClientConfig::new(format!("unix://{}", path.display())))
        .unwrap();
    let listener = Arc::new(RecordingListener::default());

    let socket = client
        .open_socket(Request::get("/events"), listener.clone())
        .unwrap();

    assert!(common::wait_until(|| listener.texts().len() >= 3));
    assert_eq!(
        listener.events()[..3],
        [
            Event::Text("a".into()),
            Event::Text("b".into()),
            Event::Text("c".into())
        ]
    );

    socket.close();
    assert!(common::wait_until(|| listener.closed()));
    let _ = std::fs::remove_file(&path);
}
