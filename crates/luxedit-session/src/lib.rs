//! LuxEdit Session - stateful host for the luxedit engine
//!
//! This crate wraps `luxedit-core` with the state an editor keeps per open
//! image and the machinery that keeps renders current while the user edits.
//!
//! # Module Structure
//!
//! - `image` - Source rasters, edit state, published outputs, undo history
//! - `history` - Snapshot history with capacity and debounce rules
//! - `scheduler` - Single-flight render scheduler with a trailing rerun
//! - `pass` - The render body (preview then full) and its context object
//! - `session` - Context plus scheduler; edits trigger renders
//! - `config` - Session tunables

mod config;
mod error;
mod history;
mod image;
mod pass;
mod scheduler;
mod session;

pub use config::SessionConfig;
pub use error::SessionError;
pub use history::{EditSnapshot, History};
pub use image::{EditableImage, RenderInput, RenderOutput};
pub use pass::{EditorPass, RenderContext, RenderListener};
pub use scheduler::{CancelToken, PassOutcome, RenderPass, RenderScheduler};
pub use session::EditSession;

/// Get the version of the crate
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
