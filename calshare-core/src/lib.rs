mod id;
mod model;
mod wire;

pub use id::{InvalidId, Password, StateId};
pub use model::{CalendarConfiguration, DayStates, HolidayEntry, HolidaySummary, StoredEntry};
pub use wire::{
    ErrorResponse, LegacySaveResponse, SaveRequest, SaveResponse, StateQuery, StateResponse,
};
