mod api;
mod passwords;
mod state;

pub use api::{Api, Error};
pub use passwords::{FilePasswords, MemoryPasswords, PasswordStore, PASSWORD_KEY};
pub use state::CalendarState;
