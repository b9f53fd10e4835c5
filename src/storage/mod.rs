pub mod relay_db;

pub use relay_db::RelayDatabase;

use std::sync::Arc;

use tokio::sync::Mutex;

/// Durability mirror handle shared by the request handlers and the sweeper.
pub type SharedStore = Arc<Mutex<RelayDatabase>>;
