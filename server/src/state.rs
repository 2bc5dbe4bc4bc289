use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use htmldisplay_core::{ActionId, ContentRecord};

use crate::tracker::ConnectionTracker;

#[derive(Clone, Default)]
pub(crate) struct AppState(Arc<AppStateInner>);

impl AppState {
    /// Store `record` for `action_id`, replacing any previous record.
    pub fn register_content(&self, action_id: ActionId, record: ContentRecord) {
        tracing::debug!("registering {:?} content for action {action_id}", record.kind);
        self.0.contents.lock().unwrap().insert(action_id, record);
    }

    pub fn unregister_content(&self, action_id: &ActionId) -> bool {
        self.0.contents.lock().unwrap().remove(action_id).is_some()
    }

    pub fn content(&self, action_id: &ActionId) -> Option<ContentRecord> {
        self.0.contents.lock().unwrap().get(action_id).cloned()
    }

    pub fn tracker(&self) -> &ConnectionTracker {
        &self.0.tracker
    }
}

#[derive(Default)]
struct AppStateInner {
    contents: Mutex<HashMap<ActionId, ContentRecord>>,
    tracker: ConnectionTracker,
}
