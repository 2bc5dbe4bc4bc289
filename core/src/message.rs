use crate::ActionId;

/// Text frame that tells a preview window to close itself.
pub const CLOSE_COMMAND: &str = "close";

/// Messages pushed from the server to a connected preview window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMessage {
    /// Ask the window to close, then tear the channel down.
    CloseWindow,
    /// Tear the channel down without closing the window.
    Disconnect,
}

impl ServerMessage {
    /// Text payload written to the channel before it is closed, if any.
    pub fn payload(&self) -> Option<&'static str> {
        match self {
            ServerMessage::CloseWindow => Some(CLOSE_COMMAND),
            ServerMessage::Disconnect => None,
        }
    }
}

/// Connection state transition delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionEvent {
    pub action_id: ActionId,
    pub connected: bool,
}

impl ConnectionEvent {
    pub fn opened(action_id: ActionId) -> Self {
        Self {
            action_id,
            connected: true,
        }
    }

    pub fn closed(action_id: ActionId) -> Self {
        Self {
            action_id,
            connected: false,
        }
    }
}
