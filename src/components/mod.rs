//! The components module contains all shared components for our app.

mod app;
#[cfg(target_arch = "wasm32")]
mod audio_manager;
mod icons;
mod player;
mod upload_panel;

pub use app::*;
pub use icons::*;
pub use player::*;
pub use upload_panel::*;
