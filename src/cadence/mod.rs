//! Screenshot cadence: one recurring capture/upload/submit job per session.

pub mod controller;
pub mod loop_worker;

pub use controller::{CadenceController, CadenceSettings};
pub use loop_worker::{CycleContext, CycleOutcome, SkipReason};
