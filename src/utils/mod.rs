pub mod logging;
pub mod network;

pub use network::{MachineIdentity, SystemIdentity};
