pub mod server;
pub mod state;
pub mod store;

pub use server::{router, AppState};
pub use state::{Error, StateService, DEFAULT_TTL};
pub use store::{KvStore, MemoryStore, StoreError};
