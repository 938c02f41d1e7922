use futures::StreamExt;
use std::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite;
use tracing::{debug, error, info, warn};

use townhall_state::protocol::{ServerMessage, SessionId};
use townhall_state::{Action, ProtocolError, SessionAction};

use crate::api::{ApiClient, ApiError};
use crate::store::Inbound;

/// Keeps the session socket alive. Dropping the handle aborts the reader task.
pub struct SocketHandle {
    session_id: SessionId,
    task: JoinHandle<()>,
}

impl SocketHandle {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }
}

impl Drop for SocketHandle {
    fn drop(&mut self) {
        debug!(session_id = %self.session_id, "dropping session socket");
        self.task.abort();
    }
}

/// Translate one text frame into the action it should dispatch.
pub fn frame_to_action(frame: &str) -> Result<Action, ProtocolError> {
    ServerMessage::parse(frame).map(|msg| Action::Session(SessionAction::from(msg)))
}

/// Open `/sessions/{id}/messages` and forward every decoded message as an
/// action tagged with `session_id`. Connection failures and closures are
/// reported as `SocketClosed`; there is no reconnect.
pub fn open_session_socket(
    runtime: &tokio::runtime::Handle,
    api: &ApiClient,
    session_id: SessionId,
    tx: mpsc::Sender<Inbound>,
) -> SocketHandle {
    let request = api.socket_request(&session_id);
    let task = runtime.spawn(run_socket(request, session_id.clone(), tx));
    SocketHandle { session_id, task }
}

async fn run_socket(
    request: Result<tungstenite::handshake::client::Request, ApiError>,
    session_id: SessionId,
    tx: mpsc::Sender<Inbound>,
) {
    // false once the UI is gone
    let send = |action: Action| {
        tx.send(Inbound::Socket {
            session_id: session_id.clone(),
            action,
        })
        .is_ok()
    };
    let closed = |reason: Option<String>| {
        Action::Session(SessionAction::SocketClosed {
            session_id: session_id.clone(),
            reason,
        })
    };

    let request = match request {
        Ok(r) => r,
        Err(e) => {
            error!(%session_id, error = %e, "cannot build socket request");
            send(closed(Some(e.to_string())));
            return;
        }
    };

    let mut ws = match tokio_tungstenite::connect_async(request).await {
        Ok((ws, _)) => ws,
        Err(e) => {
            error!(%session_id, error = %e, "socket connect failed");
            send(closed(Some(e.to_string())));
            return;
        }
    };

    info!(%session_id, "session socket connected");
    if !send(Action::Session(SessionAction::SocketOpened {
        session_id: session_id.clone(),
    })) {
        return;
    }

    let mut reason = None;
    while let Some(msg) = ws.next().await {
        match msg {
            Ok(tungstenite::Message::Text(text)) => match frame_to_action(&text) {
                Ok(action) => {
                    if !send(action) {
                        return;
                    }
                }
                Err(e) => warn!(%session_id, error = %e, "skipping socket frame"),
            },
            Ok(tungstenite::Message::Binary(data)) => {
                let e = ProtocolError::UnexpectedBinary { len: data.len() };
                warn!(%session_id, error = %e, "skipping socket frame");
            }
            Ok(tungstenite::Message::Close(frame)) => {
                reason = frame.map(|f| format!("{} {}", f.code, f.reason.as_str()));
                break;
            }
            Ok(_) => {}
            Err(e) => {
                error!(%session_id, error = %e, "socket error");
                reason = Some(e.to_string());
                break;
            }
        }
    }

    info!(%session_id, reason = ?reason, "session socket closed");
    send(closed(reason));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use axum::{
        Router,
        extract::ws::{Message as AxumMessage, WebSocketUpgrade},
        response::IntoResponse,
        routing::get,
    };
    use std::time::Duration;

    #[test]
    fn test_frame_to_action_maps_tags() {
        let action = frame_to_action(r#"{"tag":"SessionLocked"}"#).unwrap();
        assert_eq!(action, Action::Session(SessionAction::Lock));

        let action = frame_to_action(
            r#"{"tag":"QuestionerJoined","questioner":{"questionerId":1,"name":"Ada"}}"#,
        )
        .unwrap();
        assert!(matches!(
            action,
            Action::Session(SessionAction::QuestionerJoined(ref q)) if q.name.as_deref() == Some("Ada")
        ));
    }

    #[test]
    fn test_frame_to_action_rejects_garbage() {
        assert!(frame_to_action("not json").is_err());
    }

    async fn push_messages(ws: WebSocketUpgrade) -> impl IntoResponse {
        ws.on_upgrade(|mut socket| async move {
            let frames = [
                r#"{"tag":"SessionState","session":{"session":{"sessionId":"s1","name":"AMA","locked":false},"answerer":{"name":"Ferris"},"questioners":[],"questions":[]}}"#,
                "garbage",
                r#"{"tag":"QuestionAsked","question":{"questionId":"q1","text":"hi","upvotes":0,"answered":false}}"#,
            ];
            for frame in frames {
                if socket.send(AxumMessage::Text(frame.into())).await.is_err() {
                    return;
                }
            }
            // Binary frames aren't part of the protocol and must be skipped.
            if socket
                .send(AxumMessage::Binary(vec![0xde, 0xad, 0xbe, 0xef].into()))
                .await
                .is_err()
            {
                return;
            }
            let _ = socket.send(AxumMessage::Close(None)).await;
        })
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_socket_forwards_messages_then_reports_close() {
        let router = Router::new().route("/sessions/{id}/messages", get(push_messages));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let api = ApiClient::new(&ClientConfig {
            api_url: format!("http://{addr}"),
            ws_url: format!("ws://{addr}"),
            tick: Duration::from_millis(100),
        })
        .unwrap();
        let (tx, rx) = mpsc::channel();
        let handle = open_session_socket(
            &tokio::runtime::Handle::current(),
            &api,
            SessionId::new("s1"),
            tx,
        );
        assert_eq!(handle.session_id().as_str(), "s1");

        let actions = tokio::task::spawn_blocking(move || {
            let mut out = Vec::new();
            while let Ok(inbound) = rx.recv_timeout(Duration::from_secs(5)) {
                let Inbound::Socket { session_id, action } = inbound else {
                    panic!("socket delivered a non-socket event");
                };
                assert_eq!(session_id.as_str(), "s1");
                let done = matches!(action, Action::Session(SessionAction::SocketClosed { .. }));
                out.push(action);
                if done {
                    break;
                }
            }
            out
        })
        .await
        .unwrap();

        // garbage text and the binary frame are skipped
        assert_eq!(actions.len(), 4, "got {:?}", actions);
        assert!(matches!(
            actions[0],
            Action::Session(SessionAction::SocketOpened { .. })
        ));
        assert!(matches!(actions[1], Action::Session(SessionAction::Load(_))));
        assert!(matches!(
            actions[2],
            Action::Session(SessionAction::QuestionAsked(_))
        ));
        assert!(matches!(
            actions[3],
            Action::Session(SessionAction::SocketClosed { .. })
        ));
    }

    #[tokio::test]
    async fn test_connect_failure_reports_close() {
        let addr = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let api = ApiClient::new(&ClientConfig {
            api_url: format!("http://{addr}"),
            ws_url: format!("ws://{addr}"),
            tick: Duration::from_millis(100),
        })
        .unwrap();
        let (tx, rx) = mpsc::channel();
        let handle = open_session_socket(
            &tokio::runtime::Handle::current(),
            &api,
            SessionId::new("s1"),
            tx,
        );

        for _ in 0..100 {
            if let Ok(inbound) = rx.try_recv() {
                assert!(matches!(
                    inbound,
                    Inbound::Socket {
                        action: Action::Session(SessionAction::SocketClosed {
                            reason: Some(_),
                            ..
                        }),
                        ..
                    }
                ));
                drop(handle);
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("no SocketClosed action received");
    }
}
