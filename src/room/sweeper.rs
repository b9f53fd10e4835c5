use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::interval;

use crate::storage::SharedStore;

use super::state::RoomState;

/// Background task that evicts participants whose heartbeat went silent and
/// announces each eviction to the room.
pub struct PresenceSweeper {
    room: RoomState,
    store: Option<SharedStore>,
    sweep_interval: Duration,
    threshold_ms: i64,
}

impl PresenceSweeper {
    pub fn new(
        room: RoomState,
        store: Option<SharedStore>,
        sweep_interval: Duration,
        threshold_ms: i64,
    ) -> Self {
        Self {
            room,
            store,
            sweep_interval,
            threshold_ms,
        }
    }

    /// Spawn the fixed-interval sweep loop. Errors never escape the task;
    /// anything that fails is retried on a later cycle.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.sweep_interval);
            // The first tick of a tokio interval completes immediately;
            // consume it so the first real sweep lands one period in.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.sweep_once().await;
                log::debug!(
                    "Room status: {} participant(s), {} message(s)",
                    self.room.participant_count().await,
                    self.room.message_count().await
                );
            }
        })
    }

    /// One eviction pass over the current stale snapshot, in join order.
    /// A failed entry abandons the rest of the batch; the leftovers are
    /// still stale next cycle and get picked up then.
    pub async fn sweep_once(&self) {
        let stale = self.room.stale_participants(self.threshold_ms).await;
        if stale.is_empty() {
            return;
        }
        log::debug!("Sweeping {} stale participant(s)", stale.len());

        for participant in stale {
            let name = &participant.name;

            if self.room.evict(name).await.is_none() {
                log::warn!("{name} vanished before eviction; deferring rest of batch");
                break;
            }
            if let Some(store) = &self.store {
                if let Err(err) = store.lock().await.remove_participant(name) {
                    log::warn!("Failed to remove {name} from storage: {err}");
                    break;
                }
            }

            let notice = match self.room.append_leave(name).await {
                Ok(notice) => notice,
                Err(err) => {
                    log::warn!("Failed to record leave notice for {name}: {err}");
                    break;
                }
            };
            if let Some(store) = &self.store {
                if let Err(err) = store.lock().await.insert_message(&notice) {
                    log::warn!("Failed to persist leave notice for {name}: {err}");
                    break;
                }
            }

            log::info!("Evicted inactive participant {name}");
        }
    }
}
