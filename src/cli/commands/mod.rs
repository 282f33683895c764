//! CLI command implementations.

mod check;
mod config;
mod doctor;
mod mux;
mod render;
mod serve;
mod sync;
mod transcribe;

pub use check::run_check;
pub use config::run_config;
pub use doctor::run_doctor;
pub use mux::run_mux;
pub use render::run_render;
pub use serve::run_serve;
pub use sync::{run_sync, SyncArgs};
pub use transcribe::run_transcribe;
