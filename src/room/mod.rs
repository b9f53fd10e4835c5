pub mod clock;
pub mod messages;
pub mod registry;
pub mod state;
pub mod sweeper;

pub use clock::{Clock, SystemClock};
pub use state::RoomState;
pub use sweeper::PresenceSweeper;
