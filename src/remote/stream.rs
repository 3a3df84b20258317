/// Event-stream subscriptions on store paths with a locally merged snapshot
use futures_util::StreamExt;
use log::{debug, error, info, warn};
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

use crate::remote::connection::{check_status, RemoteError, RemoteStore};

const RESUBSCRIBE_DELAY_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    pub kind: String,
    pub data: String,
}

/// Incremental `text/event-stream` decoder.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
}

impl SseParser {
    /// Feed raw bytes, returning every event completed by them.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend(chunk.iter().filter(|&&b| b != b'\r'));

        let mut events = Vec::new();
        while let Some(end) = self.buffer.windows(2).position(|w| w == b"\n\n") {
            let block: Vec<u8> = self.buffer.drain(..end + 2).collect();
            let block = String::from_utf8_lossy(&block[..end]);

            let mut kind = String::from("message");
            let mut data: Vec<&str> = Vec::new();
            for line in block.lines() {
                if line.starts_with(':') {
                    continue;
                }
                let (field, value) = line.split_once(':').unwrap_or((line, ""));
                let value = value.strip_prefix(' ').unwrap_or(value);
                match field {
                    "event" => kind = value.to_string(),
                    "data" => data.push(value),
                    _ => {}
                }
            }
            events.push(SseEvent {
                kind,
                data: data.join("\n"),
            });
        }
        events
    }
}

fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Write `value` at `segments` below `root`. Null removes, new keys go last.
///
/// An array written into by child path becomes an object keyed by index, so
/// existing entries keep their order ahead of the new one.
fn set_at(root: &mut Value, segments: &[&str], value: Value) {
    let (head, rest) = match segments.split_first() {
        Some(split) => split,
        None => {
            *root = value;
            return;
        }
    };

    if let Value::Array(items) = root {
        let children: Map<String, Value> = std::mem::take(items)
            .into_iter()
            .enumerate()
            .filter(|(_, item)| !item.is_null())
            .map(|(i, item)| (i.to_string(), item))
            .collect();
        *root = Value::Object(children);
    }
    if !root.is_object() {
        if value.is_null() {
            return;
        }
        *root = Value::Object(Map::new());
    }
    let Some(children) = root.as_object_mut() else {
        return;
    };

    if rest.is_empty() && value.is_null() {
        children.shift_remove(*head);
        return;
    }

    let child = children.entry(head.to_string()).or_insert(Value::Null);
    set_at(child, rest, value);
    let emptied = match child {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if emptied {
        children.shift_remove(*head);
    }
}

/// What a single store event did to the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Changed,
    Unchanged,
    /// The server ended the subscription (`cancel` or `auth_revoked`).
    Ended(String),
}

/// Apply one store event to the snapshot.
pub fn apply_event(snapshot: &mut Value, event: &SseEvent) -> Result<EventOutcome, RemoteError> {
    match event.kind.as_str() {
        "put" | "patch" => {
            let payload: Value = serde_json::from_str(&event.data)?;
            let path = payload.get("path").and_then(Value::as_str).unwrap_or("/");
            let data = payload.get("data").cloned().unwrap_or(Value::Null);
            let segments = path_segments(path);

            if event.kind == "put" {
                set_at(snapshot, &segments, data);
            } else if let Value::Object(children) = data {
                for (key, child) in children {
                    let mut target = segments.clone();
                    target.extend(path_segments(&key));
                    set_at(snapshot, &target, child);
                }
            }
            Ok(EventOutcome::Changed)
        }
        "keep-alive" => Ok(EventOutcome::Unchanged),
        "cancel" | "auth_revoked" => Ok(EventOutcome::Ended(event.kind.clone())),
        other => {
            debug!("Ignoring store event '{}'", other);
            Ok(EventOutcome::Unchanged)
        }
    }
}

/// Stream changes at `path`, sending the full snapshot after each one
///
/// Returns `Ok` when the receiving side has gone away. Any other return is an
/// error: `SubscriptionEnded` when the server cancels, `StreamClosed` when the
/// connection just ends.
pub async fn subscribe(
    store: &RemoteStore,
    path: &str,
    updates: &mpsc::Sender<Value>,
) -> Result<(), RemoteError> {
    let response = store
        .client()
        .get(store.path_url(path)?)
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await?;
    let response = check_status(response).await?;
    info!("Subscribed to /{}", path);

    let mut parser = SseParser::default();
    let mut snapshot = Value::Null;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        for event in parser.feed(&chunk) {
            let changed = match apply_event(&mut snapshot, &event) {
                Ok(EventOutcome::Changed) => true,
                Ok(EventOutcome::Unchanged) => false,
                Ok(EventOutcome::Ended(reason)) => {
                    return Err(RemoteError::SubscriptionEnded {
                        path: path.to_string(),
                        reason,
                    });
                }
                Err(e) => {
                    warn!("Dropping malformed event on /{}: {}", path, e);
                    false
                }
            };
            if changed && updates.send(snapshot.clone()).await.is_err() {
                debug!("Receiver for /{} dropped", path);
                return Ok(());
            }
        }
    }

    Err(RemoteError::StreamClosed(path.to_string()))
}

/// Keep `path` subscribed, reconnecting after `retry_delay` on transport failures
///
/// Stops when the receiver is gone, when the server ends the subscription, or
/// when the store URL itself is unusable.
pub async fn keep_subscribed(
    store: &RemoteStore,
    path: &str,
    updates: &mpsc::Sender<Value>,
    retry_delay: Duration,
) {
    loop {
        match subscribe(store, path, updates).await {
            Ok(()) => return,
            Err(e @ (RemoteError::SubscriptionEnded { .. } | RemoteError::Url(_))) => {
                error!("Subscription failed: {}", e);
                return;
            }
            Err(e) => {
                warn!(
                    "Subscription to /{} interrupted: {}. Retrying in {:?}",
                    path, e, retry_delay
                );
            }
        }
        if updates.is_closed() {
            return;
        }
        sleep(retry_delay).await;
    }
}

/// Run a subscription in the background, mapping snapshots into `events`.
pub fn spawn_subscription<E, F>(
    store: RemoteStore,
    path: &'static str,
    events: mpsc::Sender<E>,
    map: F,
) -> JoinHandle<()>
where
    E: Send + 'static,
    F: Fn(Value) -> E + Send + 'static,
{
    tokio::spawn(async move {
        let (tx, mut rx) = mpsc::channel(16);
        let forward = async move {
            while let Some(snapshot) = rx.recv().await {
                if events.send(map(snapshot)).await.is_err() {
                    break;
                }
            }
        };
        let run = async move {
            keep_subscribed(&store, path, &tx, Duration::from_secs(RESUBSCRIBE_DELAY_SECS)).await;
        };
        tokio::join!(run, forward);
    })
}
