use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::common::{BROADCAST_TARGET, ChatMessage, MessageKind, Participant, RelayError};

use super::clock::Clock;
use super::messages::{self, MessageLog};
use super::registry::ParticipantRegistry;

/// Texts of the synthesized join/leave notices. Chat clients pattern-match
/// on these exact strings, so they are part of the wire contract.
const JOIN_TEXT: &str = "entra na sala...";
const LEAVE_TEXT: &str = "sai da sala...";

/// Shared room state: the participant registry and the message log behind a
/// single lock, so operations spanning both (register, eviction) stay
/// atomic with respect to concurrent requests.
#[derive(Clone)]
pub struct RoomState {
    clock: Arc<dyn Clock>,
    inner: Arc<Mutex<RoomInner>>,
}

struct RoomInner {
    registry: ParticipantRegistry,
    log: MessageLog,
}

impl RoomState {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            inner: Arc::new(Mutex::new(RoomInner {
                registry: ParticipantRegistry::new(),
                log: MessageLog::new(),
            })),
        }
    }

    /// Register a display name and announce the join to the room. Returns
    /// the new participant and the join notice so callers can mirror both
    /// to storage.
    pub async fn register(&self, name: &str) -> Result<(Participant, ChatMessage), RelayError> {
        let now = self.clock.now();
        let mut inner = self.inner.lock().await;
        let participant = inner.registry.register(name, now)?;
        let notice = self.status_notice(name, JOIN_TEXT);
        inner.log.append(notice.clone())?;
        Ok((participant, notice))
    }

    /// Refresh a participant's liveness timestamp.
    pub async fn heartbeat(&self, name: &str) -> Result<Participant, RelayError> {
        let now = self.clock.now();
        let mut inner = self.inner.lock().await;
        inner.registry.heartbeat(name, now)
    }

    /// Snapshot of all registered participants.
    pub async fn list_active(&self) -> Vec<Participant> {
        self.inner.lock().await.registry.list()
    }

    /// Validate and append a user message. The sender must be registered;
    /// `kind` arrives as a string from the shell and is parsed here so the
    /// closed-set rule is enforced regardless of transport.
    pub async fn post_message(
        &self,
        from: &str,
        to: &str,
        text: &str,
        kind: &str,
    ) -> Result<ChatMessage, RelayError> {
        let kind = MessageKind::parse(kind)
            .ok_or_else(|| RelayError::ValidationFailed(format!("unknown kind `{kind}`")))?;

        let mut inner = self.inner.lock().await;
        if !inner.registry.contains(from) {
            return Err(RelayError::UnknownParticipant(from.to_string()));
        }

        let message = ChatMessage {
            id: Uuid::new_v4().to_string(),
            from: from.to_string(),
            to: to.to_string(),
            text: text.to_string(),
            kind,
            time: self.display_time(),
        };
        inner.log.append(message.clone())?;
        Ok(message)
    }

    /// Messages visible to `viewer`, oldest first, truncated to the last
    /// `limit` entries (`None`/`0` mean no truncation).
    pub async fn read_messages(&self, viewer: &str, limit: Option<usize>) -> Vec<ChatMessage> {
        let inner = self.inner.lock().await;
        messages::tail(messages::visible(inner.log.all(), viewer), limit)
    }

    /// Participants whose heartbeat is older than `threshold_ms`, in join
    /// order. Sweep input only; detection happens on sweep boundaries.
    pub async fn stale_participants(&self, threshold_ms: i64) -> Vec<Participant> {
        let now = self.clock.now();
        self.inner.lock().await.registry.stale(now, threshold_ms)
    }

    /// Remove a participant; `None` when it was already gone.
    pub async fn evict(&self, name: &str) -> Option<Participant> {
        self.inner.lock().await.registry.evict(name)
    }

    /// Append the "left the room" notice for an evicted participant.
    pub async fn append_leave(&self, name: &str) -> Result<ChatMessage, RelayError> {
        let notice = self.status_notice(name, LEAVE_TEXT);
        let mut inner = self.inner.lock().await;
        inner.log.append(notice.clone())?;
        Ok(notice)
    }

    /// Seed registry and log from persisted state at startup.
    pub async fn restore(&self, participants: Vec<Participant>, messages: Vec<ChatMessage>) {
        let mut inner = self.inner.lock().await;
        inner.registry.restore(participants);
        inner.log.restore(messages);
    }

    pub async fn participant_count(&self) -> usize {
        self.inner.lock().await.registry.len()
    }

    pub async fn message_count(&self) -> usize {
        self.inner.lock().await.log.len()
    }

    fn status_notice(&self, name: &str, text: &str) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4().to_string(),
            from: name.to_string(),
            to: BROADCAST_TARGET.to_string(),
            text: text.to_string(),
            kind: MessageKind::Status,
            time: self.display_time(),
        }
    }

    fn display_time(&self) -> String {
        self.clock.now().format("%H:%M:%S").to_string()
    }
}
