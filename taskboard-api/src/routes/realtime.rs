/// Realtime WebSocket endpoint
///
/// ```text
/// GET /api/ws?token=<jwt>        (or Authorization: Bearer <jwt>)
/// ```
///
/// The token is checked before the upgrade. Once connected, a client sends
/// `joinProject` / `leaveProject` frames and receives task events for every
/// project it has joined. Joining requires membership in the project's
/// tenant.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::Response,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{
        authorization::{authorize_project_join, AuthzError},
        middleware::{authenticate, bearer_token, AuthContext},
    },
    realtime::{channel_name, ClientMessage, ServerMessage, TaskEvent},
};
use tokio_stream::{
    wrappers::{errors::BroadcastStreamRecvError, BroadcastStream},
    StreamMap,
};

#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

type Subscriptions = StreamMap<i64, BroadcastStream<TaskEvent>>;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<WsParams>,
) -> ApiResult<Response> {
    let auth = match params.token.as_deref().filter(|token| !token.is_empty()) {
        Some(token) => authenticate(token, state.jwt_secret())?,
        None => authenticate(bearer_token(&headers)?, state.jwt_secret())?,
    };

    if state.realtime.is_closed() {
        return Err(ApiError::InternalError("Realtime hub is shut down".to_string()));
    }

    Ok(ws.on_upgrade(move |socket| async move {
        let user_id = auth.user_id;
        tracing::debug!(user_id, "Realtime connection opened");
        handle_socket(socket, state, auth).await;
        tracing::debug!(user_id, "Realtime connection closed");
    }))
}

async fn handle_socket(socket: WebSocket, state: AppState, auth: AuthContext) {
    let (mut sender, mut receiver) = socket.split();
    let mut subscriptions = Subscriptions::new();
    let mut closed = state.realtime.closed_signal();

    while !*closed.borrow() {
        tokio::select! {
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_client_frame(&state, &auth, &mut subscriptions, &text).await;
                        if send_json(&mut sender, &reply).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(user_id = auth.user_id, error = %e, "Realtime receive failed");
                        break;
                    }
                }
            }
            Some((project_id, item)) = subscriptions.next(), if !subscriptions.is_empty() => {
                match item {
                    Ok(event) => {
                        if send_json(&mut sender, &event).await.is_err() {
                            break;
                        }
                    }
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            user_id = auth.user_id,
                            project_id,
                            skipped,
                            "Realtime subscriber lagged; events dropped"
                        );
                    }
                }
            }
            _ = closed.changed() => break,
        }
    }

    let _ = sender.close().await;

    let joined: Vec<i64> = subscriptions.keys().copied().collect();
    drop(subscriptions);
    for project_id in joined {
        state.realtime.release(project_id).await;
    }
}

/// Applies one client frame and returns the reply to send
async fn handle_client_frame(
    state: &AppState,
    auth: &AuthContext,
    subscriptions: &mut Subscriptions,
    text: &str,
) -> ServerMessage {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(_) => return ServerMessage::error("Invalid message"),
    };

    match message {
        ClientMessage::JoinProject { project_id } => {
            if let Err(e) = authorize_project_join(&state.db, auth.user_id, project_id).await {
                return ServerMessage::error(join_error_message(&e));
            }

            if !subscriptions.contains_key(&project_id) {
                let rx = state.realtime.subscribe(project_id).await;
                subscriptions.insert(project_id, BroadcastStream::new(rx));
                tracing::info!(user_id = auth.user_id, project_id, "Joined project channel");
            }

            ServerMessage::Joined {
                project_id,
                channel: channel_name(project_id),
            }
        }
        ClientMessage::LeaveProject { project_id } => {
            if subscriptions.remove(&project_id).is_some() {
                state.realtime.release(project_id).await;
                tracing::info!(user_id = auth.user_id, project_id, "Left project channel");
            }

            ServerMessage::Left { project_id }
        }
    }
}

fn join_error_message(err: &AuthzError) -> &'static str {
    match err {
        AuthzError::ProjectNotFound => "Project not found",
        AuthzError::NotMember => "Access denied to this project",
        AuthzError::DatabaseError(e) => {
            tracing::error!(error = %e, "Realtime join check failed");
            "An internal error occurred"
        }
        _ => "Cannot join this project",
    }
}

async fn send_json<T: Serialize>(
    sender: &mut SplitSink<WebSocket, Message>,
    value: &T,
) -> Result<(), axum::Error> {
    match serde_json::to_string(value) {
        Ok(text) => sender.send(Message::Text(text)).await,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize realtime frame");
            Ok(())
        }
    }
}
