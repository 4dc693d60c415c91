pub(crate) mod input;
mod options;
mod picker;
mod platform;
mod runtime;
pub mod sample;
mod status;
mod terminal;
mod view;

pub use options::UiOptions;
pub use picker::ReferencePicker;
pub use platform::{TerminalPlatform, TerminalSurface};
