pub mod content;
pub mod id;
pub mod message;
pub mod settings;

pub use content::{ContentKind, ContentRecord};
pub use id::{ActionId, ActionIdError};
pub use message::{ConnectionEvent, ServerMessage};
pub use settings::{
    DisplaySettings, MarkdownSettings, Theme, UnknownTheme, UnknownWindowMode, WindowMode,
    WindowSize,
};
