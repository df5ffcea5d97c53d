pub mod sqlite;

pub use sqlite::{SaveDb, SaveDbError, SlotInfo};
