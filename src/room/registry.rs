use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::common::{Participant, RelayError};

/// In-memory participant set keyed by display name.
///
/// Snapshots (`list`, `stale`) iterate in join order so sweep batches are
/// processed oldest-member-first.
#[derive(Debug, Default)]
pub struct ParticipantRegistry {
    entries: HashMap<String, Participant>,
    order: Vec<String>,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new participant stamped with `now`. Blank names and names
    /// already present are rejected without mutating the registry.
    pub fn register(&mut self, name: &str, now: DateTime<Utc>) -> Result<Participant, RelayError> {
        if name.trim().is_empty() {
            return Err(RelayError::InvalidName);
        }
        if self.entries.contains_key(name) {
            return Err(RelayError::DuplicateName(name.to_string()));
        }

        let participant = Participant {
            name: name.to_string(),
            last_seen: now.timestamp_millis(),
        };
        self.entries.insert(name.to_string(), participant.clone());
        self.order.push(name.to_string());
        Ok(participant)
    }

    /// Refresh `last_seen` for an existing participant.
    pub fn heartbeat(&mut self, name: &str, now: DateTime<Utc>) -> Result<Participant, RelayError> {
        match self.entries.get_mut(name) {
            Some(participant) => {
                participant.last_seen = now.timestamp_millis();
                Ok(participant.clone())
            }
            None => Err(RelayError::UnknownParticipant(name.to_string())),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Snapshot of all participants in join order.
    pub fn list(&self) -> Vec<Participant> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name).cloned())
            .collect()
    }

    /// Remove a participant. Absent names return `None`, so a double
    /// eviction is a no-op rather than an error.
    pub fn evict(&mut self, name: &str) -> Option<Participant> {
        let removed = self.entries.remove(name);
        if removed.is_some() {
            self.order.retain(|entry| entry != name);
        }
        removed
    }

    /// Participants whose last heartbeat is more than `threshold_ms` old.
    pub fn stale(&self, now: DateTime<Utc>, threshold_ms: i64) -> Vec<Participant> {
        let now_ms = now.timestamp_millis();
        self.list()
            .into_iter()
            .filter(|participant| now_ms - participant.last_seen > threshold_ms)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-seed from persisted state at startup.
    pub(crate) fn restore(&mut self, participants: Vec<Participant>) {
        for participant in participants {
            if self.entries.contains_key(&participant.name) {
                continue;
            }
            self.order.push(participant.name.clone());
            self.entries.insert(participant.name.clone(), participant);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn duplicate_registration_is_rejected_without_mutation() {
        let mut registry = ParticipantRegistry::new();
        registry.register("Alice", t0()).unwrap();

        let err = registry
            .register("Alice", t0() + Duration::seconds(5))
            .unwrap_err();
        assert!(matches!(err, RelayError::DuplicateName(name) if name == "Alice"));

        let entries = registry.list();
        assert_eq!(entries.len(), 1);
        // The original entry's timestamp is untouched by the failed attempt.
        assert_eq!(entries[0].last_seen, t0().timestamp_millis());
    }

    #[test]
    fn blank_names_are_rejected() {
        let mut registry = ParticipantRegistry::new();
        assert!(matches!(
            registry.register("", t0()),
            Err(RelayError::InvalidName)
        ));
        assert!(matches!(
            registry.register("   ", t0()),
            Err(RelayError::InvalidName)
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn heartbeat_refreshes_last_seen() {
        let mut registry = ParticipantRegistry::new();
        registry.register("Bob", t0()).unwrap();

        let later = t0() + Duration::seconds(7);
        let updated = registry.heartbeat("Bob", later).unwrap();
        assert_eq!(updated.last_seen, later.timestamp_millis());
        assert_eq!(registry.list()[0].last_seen, later.timestamp_millis());
    }

    #[test]
    fn heartbeat_for_unknown_name_fails() {
        let mut registry = ParticipantRegistry::new();
        let err = registry.heartbeat("ghost", t0()).unwrap_err();
        assert!(matches!(err, RelayError::UnknownParticipant(name) if name == "ghost"));
    }

    #[test]
    fn evict_is_idempotent() {
        let mut registry = ParticipantRegistry::new();
        registry.register("Carol", t0()).unwrap();

        assert!(registry.evict("Carol").is_some());
        assert!(registry.evict("Carol").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn stale_respects_threshold_and_join_order() {
        let mut registry = ParticipantRegistry::new();
        registry.register("first", t0()).unwrap();
        registry.register("second", t0()).unwrap();
        registry.register("third", t0()).unwrap();
        registry
            .heartbeat("second", t0() + Duration::seconds(8))
            .unwrap();

        let stale = registry.stale(t0() + Duration::seconds(11), 10_000);
        let names: Vec<&str> = stale.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["first", "third"]);
    }

    #[test]
    fn exactly_at_threshold_is_not_stale() {
        let mut registry = ParticipantRegistry::new();
        registry.register("edge", t0()).unwrap();

        assert!(registry.stale(t0() + Duration::seconds(10), 10_000).is_empty());
        assert_eq!(
            registry
                .stale(t0() + Duration::milliseconds(10_001), 10_000)
                .len(),
            1
        );
    }
}
