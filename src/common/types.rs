use serde::{Deserialize, Serialize};

/// Pseudo-recipient meaning "everyone currently in the room".
pub const BROADCAST_TARGET: &str = "Todos";

/// A registered chat identity, tracked for liveness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    /// Last registration or heartbeat, epoch milliseconds.
    pub last_seen: i64,
}

/// Classification of a chat event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Visible to every viewer.
    Broadcast,
    /// Visible only to the sender and the addressed recipient.
    Direct,
    /// Synthesized join/leave notice; always broadcast-visible.
    Status,
}

impl MessageKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "broadcast" => Some(Self::Broadcast),
            "direct" => Some(Self::Direct),
            "status" => Some(Self::Status),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Broadcast => "broadcast",
            Self::Direct => "direct",
            Self::Status => "status",
        }
    }
}

/// A single chat event: a user message or a synthesized join/leave notice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub from: String,
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
    /// Display timestamp (HH:MM:SS). Ordering is carried by log position.
    pub time: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_roundtrips_through_its_string_form() {
        for kind in [
            MessageKind::Broadcast,
            MessageKind::Direct,
            MessageKind::Status,
        ] {
            assert_eq!(MessageKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(MessageKind::parse("private_message"), None);
        assert_eq!(MessageKind::parse(""), None);
    }
}
