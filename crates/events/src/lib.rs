pub mod bus;

pub use bus::{CacheEvent, CacheEventKind, EventBus, MutationKind};
