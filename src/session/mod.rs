pub mod commands;
pub mod controller;
pub mod events;
mod queries;
pub mod state;

pub use controller::{Collaborators, SessionCore, SessionSnapshot};
pub use events::SessionEvent;
pub use state::{SessionState, SessionStatus};
