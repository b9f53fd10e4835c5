use crate::common::{ChatMessage, MessageKind, RelayError};

/// Append-only, insertion-ordered history of chat events.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Vec<ChatMessage>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append. The log never reorders or drops entries.
    pub fn append(&mut self, message: ChatMessage) -> Result<(), RelayError> {
        validate(&message)?;
        self.messages.push(message);
        Ok(())
    }

    /// Full history in insertion order.
    pub fn all(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Re-seed from persisted state at startup.
    pub(crate) fn restore(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages;
    }
}

/// Field-level checks shared by every append path. The `kind` set is closed
/// by the type; emptiness of the remaining fields is checked here.
fn validate(message: &ChatMessage) -> Result<(), RelayError> {
    if message.from.trim().is_empty() {
        return Err(RelayError::ValidationFailed("`from` is required".into()));
    }
    if message.to.trim().is_empty() {
        return Err(RelayError::ValidationFailed("`to` is required".into()));
    }
    if message.text.trim().is_empty() {
        return Err(RelayError::ValidationFailed("`text` is required".into()));
    }
    Ok(())
}

/// Select the subsequence of `messages` visible to `viewer`, preserving
/// order. Broadcasts and status notices are public; direct messages are
/// visible to their two endpoints only.
pub fn visible(messages: &[ChatMessage], viewer: &str) -> Vec<ChatMessage> {
    messages
        .iter()
        .filter(|message| is_visible(message, viewer))
        .cloned()
        .collect()
}

fn is_visible(message: &ChatMessage, viewer: &str) -> bool {
    match message.kind {
        MessageKind::Broadcast | MessageKind::Status => true,
        MessageKind::Direct => message.from == viewer || message.to == viewer,
    }
}

/// Keep the last `limit` entries. `None` and `0` both mean no truncation;
/// polling clients send all sorts of limits and none of them are errors.
pub fn tail<T>(mut items: Vec<T>, limit: Option<usize>) -> Vec<T> {
    if let Some(n) = limit {
        if n > 0 && n < items.len() {
            items.drain(..items.len() - n);
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::common::BROADCAST_TARGET;

    use super::*;

    fn message(from: &str, to: &str, text: &str, kind: MessageKind) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4().to_string(),
            from: from.to_string(),
            to: to.to_string(),
            text: text.to_string(),
            kind,
            time: "12:00:00".to_string(),
        }
    }

    #[test]
    fn append_rejects_empty_fields() {
        let mut log = MessageLog::new();
        for bad in [
            message("", "Bob", "hi", MessageKind::Direct),
            message("Alice", " ", "hi", MessageKind::Direct),
            message("Alice", "Bob", "", MessageKind::Direct),
        ] {
            assert!(matches!(
                log.append(bad),
                Err(RelayError::ValidationFailed(_))
            ));
        }
        assert!(log.is_empty());
    }

    #[test]
    fn direct_messages_are_viewer_symmetric() {
        let log = [
            message("Alice", "Bob", "psst", MessageKind::Direct),
            message("Bob", BROADCAST_TARGET, "hey all", MessageKind::Broadcast),
        ];

        let alice = visible(&log, "Alice");
        let bob = visible(&log, "Bob");
        let carol = visible(&log, "Carol");

        assert_eq!(alice.len(), 2);
        assert_eq!(bob.len(), 2);
        assert_eq!(carol.len(), 1);
        assert_eq!(carol[0].kind, MessageKind::Broadcast);
    }

    #[test]
    fn broadcast_and_status_are_visible_to_everyone() {
        let log = [
            message("Dave", BROADCAST_TARGET, "sai da sala...", MessageKind::Status),
            message("Erin", BROADCAST_TARGET, "hello", MessageKind::Broadcast),
        ];

        // Even a viewer that never appears in the log sees both.
        assert_eq!(visible(&log, "nobody").len(), 2);
        assert_eq!(visible(&log, "").len(), 2);
    }

    #[test]
    fn filtering_preserves_order() {
        let log = [
            message("Alice", BROADCAST_TARGET, "one", MessageKind::Broadcast),
            message("Alice", "Bob", "two", MessageKind::Direct),
            message("Bob", BROADCAST_TARGET, "three", MessageKind::Broadcast),
        ];

        let bob: Vec<String> = visible(&log, "Bob").into_iter().map(|m| m.text).collect();
        assert_eq!(bob, ["one", "two", "three"]);
    }

    #[test]
    fn tail_truncates_only_for_positive_in_range_limits() {
        let items = vec![1, 2, 3, 4, 5];

        assert_eq!(tail(items.clone(), None), [1, 2, 3, 4, 5]);
        assert_eq!(tail(items.clone(), Some(0)), [1, 2, 3, 4, 5]);
        assert_eq!(tail(items.clone(), Some(99)), [1, 2, 3, 4, 5]);
        assert_eq!(tail(items.clone(), Some(5)), [1, 2, 3, 4, 5]);
        assert_eq!(tail(items, Some(2)), [4, 5]);
    }
}
