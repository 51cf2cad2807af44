//! Supabase realtime change feed (Phoenix channels, `vsn=1.0.0`).
//!
//! One websocket per subscription: join the bookings channel, heartbeat on
//! the `phoenix` topic, turn `postgres_changes` frames into
//! [`ChangeEvent`]s. A frame that does not decode becomes a
//! [`ChangeKind::Other`] event so it still invalidates. The stream ends when the socket closes or fails; the
//! booking store decides when to subscribe again.

use crate::config::SupabaseConfig;
use async_stream::stream;
use futures::{SinkExt, Stream, StreamExt};
use kinxplore_bookings::{
    BackendError, BackendFuture, BookingId, ChangeEvent, ChangeFeed, ChangeKind, ChangeStream,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::time::{Instant, interval_at};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

/// Channel joined for booking changes
pub const CHANNEL_TOPIC: &str = "realtime:kinxplore-bookings";

/// Interval between heartbeats
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);

/// Kind reported for a frame that does not decode
pub const MALFORMED_KIND: &str = "malformed";

const JOIN_REF: &str = "1";

/// A decoded realtime frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RealtimeMessage {
    /// A row changed
    Change(ChangeEvent),
    /// Reply to one of our pushes on the bookings channel
    Reply {
        /// `ref` of the push being answered
        reference: Option<String>,
        /// `Err` carries the server's reason
        outcome: Result<(), String>,
    },
    /// The server closed or errored the channel
    ChannelClosed(String),
    /// Heartbeat replies, presence and system notices
    Other,
}

#[derive(Deserialize)]
struct Envelope {
    topic: String,
    event: String,
    #[serde(default)]
    payload: Value,
    #[serde(rename = "ref", default)]
    reference: Option<String>,
}

/// Decode one text frame
///
/// # Errors
///
/// Returns [`BackendError::ResponseParseFailed`] if the frame is not a
/// Phoenix message.
pub fn parse_realtime_message(text: &str) -> Result<RealtimeMessage, BackendError> {
    let envelope: Envelope = serde_json::from_str(text)
        .map_err(|e| BackendError::ResponseParseFailed(format!("realtime frame: {e}")))?;

    if envelope.topic != CHANNEL_TOPIC {
        return Ok(RealtimeMessage::Other);
    }

    Ok(match envelope.event.as_str() {
        "postgres_changes" => RealtimeMessage::Change(change_event(&envelope.payload)),
        "phx_reply" => {
            let status = envelope.payload["status"].as_str().unwrap_or_default();
            RealtimeMessage::Reply {
                reference: envelope.reference,
                outcome: if status == "ok" {
                    Ok(())
                } else {
                    Err(reason(&envelope.payload["response"]))
                },
            }
        },
        "phx_error" => RealtimeMessage::ChannelClosed("channel error".to_string()),
        "phx_close" => RealtimeMessage::ChannelClosed("channel closed by server".to_string()),
        _ => RealtimeMessage::Other,
    })
}

fn change_event(payload: &Value) -> ChangeEvent {
    let data = &payload["data"];
    let kind = match data["type"].as_str().unwrap_or_default() {
        "INSERT" => ChangeKind::Insert,
        "UPDATE" => ChangeKind::Update,
        "DELETE" => ChangeKind::Delete,
        other => ChangeKind::Other(other.to_string()),
    };
    let booking_id = [&data["record"]["id"], &data["old_record"]["id"]]
        .into_iter()
        .find_map(|id| match id {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        })
        .map(BookingId::new);

    ChangeEvent { kind, booking_id }
}

fn reason(response: &Value) -> String {
    response["reason"]
        .as_str()
        .map_or_else(|| response.to_string(), str::to_string)
}

/// `phx_join` for the bookings channel
#[must_use]
pub fn join_message(access_token: &str) -> Value {
    let binding = |event: &str| json!({ "event": event, "schema": "public", "table": "bookings" });
    json!({
        "topic": CHANNEL_TOPIC,
        "event": "phx_join",
        "payload": {
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [binding("INSERT"), binding("UPDATE")],
            },
            "access_token": access_token,
        },
        "ref": JOIN_REF,
        "join_ref": JOIN_REF,
    })
}

/// Heartbeat push
#[must_use]
pub fn heartbeat_message(reference: u64) -> Value {
    json!({
        "topic": "phoenix",
        "event": "heartbeat",
        "payload": {},
        "ref": reference.to_string(),
    })
}

fn subscription_failed(error: impl std::fmt::Display) -> BackendError {
    BackendError::SubscriptionFailed(error.to_string())
}

/// Read frames until the server answers the join
async fn await_join<S>(read: &mut S) -> Result<(), BackendError>
where
    S: Stream<Item = Result<Message, WsError>> + Unpin,
{
    while let Some(frame) = read.next().await {
        match frame.map_err(subscription_failed)? {
            Message::Text(text) => match parse_realtime_message(&text)? {
                RealtimeMessage::Reply {
                    reference: Some(reference),
                    outcome,
                } if reference == JOIN_REF => {
                    return outcome.map_err(|reason| {
                        subscription_failed(format!("join rejected: {reason}"))
                    });
                },
                RealtimeMessage::ChannelClosed(reason) => return Err(subscription_failed(reason)),
                _ => {},
            },
            Message::Close(_) => break,
            _ => {},
        }
    }
    Err(subscription_failed("socket closed before join reply"))
}

enum Wake {
    Heartbeat,
    Frame(Option<Result<Message, WsError>>),
}

/// [`ChangeFeed`] over Supabase realtime
#[derive(Clone, Debug)]
pub struct RealtimeChangeFeed {
    config: SupabaseConfig,
    heartbeat_interval: Duration,
}

impl RealtimeChangeFeed {
    /// Feed for a project
    #[must_use]
    pub const fn new(config: SupabaseConfig) -> Self {
        Self {
            config,
            heartbeat_interval: HEARTBEAT_INTERVAL,
        }
    }

    /// Override the heartbeat interval
    #[must_use]
    pub const fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }
}

impl ChangeFeed for RealtimeChangeFeed {
    fn subscribe(&self) -> BackendFuture<'_, ChangeStream> {
        Box::pin(async move {
            let (socket, _) = connect_async(self.config.realtime_url())
                .await
                .map_err(subscription_failed)?;
            let (mut write, mut read) = socket.split();

            write
                .send(Message::Text(join_message(self.config.bearer()).to_string()))
                .await
                .map_err(subscription_failed)?;
            tokio::time::timeout(self.config.http_timeout(), await_join(&mut read))
                .await
                .map_err(|_| subscription_failed("timed out waiting for join reply"))??;
            tracing::info!(topic = CHANNEL_TOPIC, "Joined realtime channel");

            let period = self.heartbeat_interval;
            let changes = stream! {
                let mut heartbeat = interval_at(Instant::now() + period, period);
                let mut reference = 1_u64;

                loop {
                    let wake = tokio::select! {
                        _ = heartbeat.tick() => Wake::Heartbeat,
                        frame = read.next() => Wake::Frame(frame),
                    };

                    match wake {
                        Wake::Heartbeat => {
                            reference += 1;
                            let push = Message::Text(heartbeat_message(reference).to_string());
                            if let Err(error) = write.send(push).await {
                                yield Err(subscription_failed(error));
                                break;
                            }
                        },
                        Wake::Frame(Some(Ok(Message::Text(text)))) => {
                            match parse_realtime_message(&text) {
                                Ok(RealtimeMessage::Change(event)) => yield Ok(event),
                                Ok(RealtimeMessage::ChannelClosed(reason)) => {
                                    yield Err(subscription_failed(reason));
                                    break;
                                },
                                Ok(_) => {},
                                Err(error) => {
                                    // The store cannot tell what changed, so it reloads
                                    tracing::warn!(error = %error, "Malformed realtime frame");
                                    yield Ok(ChangeEvent {
                                        kind: ChangeKind::Other(MALFORMED_KIND.to_string()),
                                        booking_id: None,
                                    });
                                },
                            }
                        },
                        Wake::Frame(Some(Ok(Message::Close(frame)))) => {
                            tracing::info!(?frame, "Realtime socket closed");
                            break;
                        },
                        Wake::Frame(Some(Ok(_))) => {},
                        Wake::Frame(Some(Err(error))) => {
                            yield Err(subscription_failed(error));
                            break;
                        },
                        Wake::Frame(None) => break,
                    }
                }
            };

            Ok(Box::pin(changes) as ChangeStream)
        })
    }
}
