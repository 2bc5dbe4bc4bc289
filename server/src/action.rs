use std::{
    collections::HashMap,
    sync::{Arc, Mutex, OnceLock},
};

use htmldisplay_core::{
    ActionId, ContentKind, ContentRecord, DisplaySettings, MarkdownSettings, WindowMode,
    WindowSize,
};
use htmldisplay_render::{markdown_page, placeholder_page};

use crate::{
    PreviewServer,
    launcher::{self, WindowLauncher},
    tracker::SubscriberId,
};

const EMPTY_CONTENT_MESSAGE: &str = "No content configured for this action.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Open,
    Closed,
}

impl From<bool> for WindowState {
    fn from(connected: bool) -> Self {
        if connected {
            WindowState::Open
        } else {
            WindowState::Closed
        }
    }
}

/// Receives the data needed to redraw a button icon.
pub trait IconSink: Send + Sync {
    fn update_icon(&self, action_id: &ActionId, content: &ContentRecord, state: WindowState);
}

/// Per-action settings of something that can be previewed in a window.
pub trait PreviewSettings: Clone + Send + Sync + 'static {
    /// Content registered with the server for the action.
    fn content(&self) -> ContentRecord;

    fn window_mode(&self) -> WindowMode;

    fn window_size(&self) -> WindowSize;

    /// Whether there is anything worth drawing on the button.
    fn has_preview(&self) -> bool {
        true
    }
}

impl PreviewSettings for DisplaySettings {
    fn content(&self) -> ContentRecord {
        let record = DisplaySettings::content(self);
        if record.kind == ContentKind::Direct && record.payload.is_empty() {
            return ContentRecord::direct(placeholder_page(EMPTY_CONTENT_MESSAGE));
        }
        record
    }

    fn window_mode(&self) -> WindowMode {
        self.window_mode
    }

    fn window_size(&self) -> WindowSize {
        DisplaySettings::window_size(self)
    }

    fn has_preview(&self) -> bool {
        !self.payload().is_empty()
    }
}

impl PreviewSettings for MarkdownSettings {
    fn content(&self) -> ContentRecord {
        ContentRecord::direct(markdown_page(self.markdown(), self.theme))
    }

    fn window_mode(&self) -> WindowMode {
        self.window_mode
    }

    fn window_size(&self) -> WindowSize {
        MarkdownSettings::window_size(self)
    }
}

/// Action showing configured HTML, inline or from a file.
pub type DisplayAction = PreviewAction<DisplaySettings>;

/// Action showing Markdown rendered into a themed page.
pub type MarkdownAction = PreviewAction<MarkdownSettings>;

/// Lifecycle glue between controller events for one kind of action and the
/// preview server.
pub struct PreviewAction<S>(Arc<PreviewActionInner<S>>);

impl<S> Clone for PreviewAction<S> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

struct PreviewActionInner<S> {
    server: PreviewServer,
    launcher: Arc<dyn WindowLauncher>,
    icons: Arc<dyn IconSink>,
    settings: Mutex<HashMap<ActionId, S>>,
    listener: OnceLock<SubscriberId>,
}

impl<S: PreviewSettings> PreviewAction<S> {
    pub fn new(
        server: PreviewServer,
        launcher: Arc<dyn WindowLauncher>,
        icons: Arc<dyn IconSink>,
    ) -> Self {
        Self(Arc::new(PreviewActionInner {
            server,
            launcher,
            icons,
            settings: Mutex::new(HashMap::new()),
            listener: OnceLock::new(),
        }))
    }

    pub fn on_will_appear(&self, action_id: &ActionId, settings: S) {
        self.apply_settings(action_id, settings);
    }

    pub fn on_did_receive_settings(&self, action_id: &ActionId, settings: S) {
        self.apply_settings(action_id, settings);
    }

    /// Toggle the preview window of `action_id`.
    pub async fn on_key_down(
        &self,
        action_id: &ActionId,
        settings: S,
    ) -> anyhow::Result<WindowState> {
        self.cache_settings(action_id, &settings);

        self.0.server.start().await?;
        self.ensure_listener();

        if self.0.server.has_connection(action_id) {
            self.0.server.close_window(action_id);
            return Ok(WindowState::Closed);
        }

        let url = self.0.server.view_url(action_id);
        launcher::open_window(
            self.0.launcher.as_ref(),
            &url,
            settings.window_mode(),
            settings.window_size(),
        );

        Ok(WindowState::Open)
    }

    /// The action was removed from the controller.
    pub fn on_deleted(&self, action_id: &ActionId) {
        self.0.settings.lock().unwrap().remove(action_id);
        self.0.server.close_window(action_id);
        if self.0.server.unregister_content(action_id) {
            tracing::debug!("evicted content for deleted action {action_id}");
        }
    }

    /// Redraw the icon from cached settings, e.g. on request from the settings UI.
    pub fn refresh_preview(&self, action_id: &ActionId) {
        match self.cached_settings(action_id) {
            Some(settings) => self.update_icon(action_id, &settings),
            None => tracing::warn!("no cached settings for action {action_id}"),
        }
    }

    pub fn window_state(&self, action_id: &ActionId) -> WindowState {
        self.0.server.has_connection(action_id).into()
    }

    fn apply_settings(&self, action_id: &ActionId, settings: S) {
        self.cache_settings(action_id, &settings);
        let content = settings.content();
        self.0
            .server
            .register_content(action_id.clone(), content.kind, content.payload.clone());
        if settings.has_preview() {
            self.0
                .icons
                .update_icon(action_id, &content, self.window_state(action_id));
        }
    }

    fn cache_settings(&self, action_id: &ActionId, settings: &S) {
        self.0
            .settings
            .lock()
            .unwrap()
            .insert(action_id.clone(), settings.clone());
    }

    fn cached_settings(&self, action_id: &ActionId) -> Option<S> {
        self.0.settings.lock().unwrap().get(action_id).cloned()
    }

    fn update_icon(&self, action_id: &ActionId, settings: &S) {
        if !settings.has_preview() {
            return;
        }
        self.0
            .icons
            .update_icon(action_id, &settings.content(), self.window_state(action_id));
    }

    fn ensure_listener(&self) {
        self.0.listener.get_or_init(|| {
            let action = Arc::downgrade(&self.0);
            self.0.server.on_connection_change(move |event| {
                let Some(inner) = action.upgrade() else {
                    return;
                };
                let settings = inner.settings.lock().unwrap().get(&event.action_id).cloned();
                if let Some(settings) = settings.filter(S::has_preview) {
                    inner.icons.update_icon(
                        &event.action_id,
                        &settings.content(),
                        event.connected.into(),
                    );
                }
            })
        });
    }
}

impl<S> Drop for PreviewActionInner<S> {
    fn drop(&mut self) {
        if let Some(&id) = self.listener.get() {
            self.server.unsubscribe(id);
        }
    }
}

/// Icon sink that only logs state changes.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogIconSink;

impl IconSink for LogIconSink {
    fn update_icon(&self, action_id: &ActionId, content: &ContentRecord, state: WindowState) {
        tracing::info!("action {action_id} ({:?} content) is {state:?}", content.kind);
    }
}

#[cfg(test)]
mod tests {
    use htmldisplay_core::Theme;

    use super::*;
    use crate::{ServerConfig, launcher::LaunchError};

    #[derive(Default)]
    struct RecordingLauncher {
        urls: Mutex<Vec<String>>,
    }

    impl WindowLauncher for RecordingLauncher {
        fn open_popup(&self, url: &str, _size: WindowSize) -> Result<(), LaunchError> {
            self.urls.lock().unwrap().push(url.to_owned());
            Ok(())
        }

        fn open_default(&self, url: &str) -> Result<(), LaunchError> {
            self.urls.lock().unwrap().push(url.to_owned());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingIcons {
        updates: Mutex<Vec<(String, WindowState)>>,
        contents: Mutex<Vec<ContentRecord>>,
    }

    impl IconSink for RecordingIcons {
        fn update_icon(&self, action_id: &ActionId, content: &ContentRecord, state: WindowState) {
            self.updates
                .lock()
                .unwrap()
                .push((action_id.to_string(), state));
            self.contents.lock().unwrap().push(content.clone());
        }
    }

    fn build<S: PreviewSettings>()
    -> (PreviewAction<S>, PreviewServer, Arc<RecordingLauncher>, Arc<RecordingIcons>) {
        let server = PreviewServer::new(ServerConfig::default());
        let launcher = Arc::new(RecordingLauncher::default());
        let icons = Arc::new(RecordingIcons::default());
        let action = PreviewAction::new(server.clone(), launcher.clone(), icons.clone());
        (action, server, launcher, icons)
    }

    fn setup() -> (DisplayAction, PreviewServer, Arc<RecordingLauncher>, Arc<RecordingIcons>) {
        build()
    }

    fn direct(html: &str) -> DisplaySettings {
        DisplaySettings {
            html_content: Some(html.to_owned()),
            window_mode: WindowMode::Browser,
            ..Default::default()
        }
    }

    #[test]
    fn test_will_appear_registers_content_and_icon() {
        let (action, server, _, icons) = setup();
        let id = ActionId::try_from("A").unwrap();

        action.on_will_appear(&id, direct("<p>hello</p>"));

        assert_eq!(server.lookup(&id).unwrap().payload, "<p>hello</p>");
        assert_eq!(
            *icons.updates.lock().unwrap(),
            vec![("A".to_owned(), WindowState::Closed)]
        );
    }

    #[test]
    fn test_empty_direct_content_uses_placeholder() {
        let (action, server, _, icons) = setup();
        let id = ActionId::try_from("A").unwrap();

        action.on_did_receive_settings(&id, DisplaySettings::default());

        let record = server.lookup(&id).unwrap();
        assert_eq!(record.kind, ContentKind::Direct);
        assert!(record.payload.contains(EMPTY_CONTENT_MESSAGE));
        assert!(icons.updates.lock().unwrap().is_empty());
    }

    #[test]
    fn test_settings_change_replaces_content() {
        let (action, server, _, _) = setup();
        let id = ActionId::try_from("A").unwrap();

        action.on_will_appear(&id, direct("<p>one</p>"));
        action.on_did_receive_settings(
            &id,
            DisplaySettings {
                source_type: ContentKind::File,
                file_path: Some("/tmp/page.html".to_owned()),
                ..Default::default()
            },
        );

        let record = server.lookup(&id).unwrap();
        assert_eq!(record.kind, ContentKind::File);
        assert_eq!(record.payload, "/tmp/page.html");
    }

    #[test]
    fn test_deleted_evicts_content() {
        let (action, server, _, _) = setup();
        let id = ActionId::try_from("A").unwrap();

        action.on_will_appear(&id, direct("<p>x</p>"));
        action.on_deleted(&id);

        assert_eq!(server.lookup(&id), None);
    }

    #[tokio::test]
    async fn test_key_down_opens_view_url() {
        let (action, server, launcher, _) = setup();
        let id = ActionId::try_from("A").unwrap();

        action.on_will_appear(&id, direct("<p>x</p>"));
        let state = action.on_key_down(&id, direct("<p>x</p>")).await.unwrap();

        assert_eq!(state, WindowState::Open);
        assert_ne!(server.port(), 0);
        assert_eq!(
            *launcher.urls.lock().unwrap(),
            vec![format!("http://localhost:{}/view/A", server.port())]
        );
    }

    #[tokio::test]
    async fn test_key_down_closes_open_window() {
        let (action, server, launcher, icons) = setup();
        let id = ActionId::try_from("A").unwrap();
        action.on_will_appear(&id, direct("<p>x</p>"));
        action.on_key_down(&id, direct("<p>x</p>")).await.unwrap();

        let channel = server.tracker().connect(id.clone());
        assert_eq!(action.window_state(&id), WindowState::Open);

        let state = action.on_key_down(&id, direct("<p>x</p>")).await.unwrap();

        assert_eq!(state, WindowState::Closed);
        assert_eq!(action.window_state(&id), WindowState::Closed);
        assert_eq!(launcher.urls.lock().unwrap().len(), 1);
        assert!(channel.outbox().try_recv().is_ok());

        // Listener callbacks run on a spawned task.
        for _ in 0..100 {
            if icons.updates.lock().unwrap().len() >= 3 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(
            *icons.updates.lock().unwrap(),
            vec![
                ("A".to_owned(), WindowState::Closed),
                ("A".to_owned(), WindowState::Open),
                ("A".to_owned(), WindowState::Closed),
            ]
        );
    }

    #[test]
    fn test_markdown_registers_rendered_page() {
        let (action, server, _, icons) = build::<MarkdownSettings>();
        let id = ActionId::try_from("M").unwrap();

        action.on_will_appear(
            &id,
            MarkdownSettings {
                markdown_content: Some("**bold**".to_owned()),
                theme: Theme::Light,
                ..Default::default()
            },
        );

        let record = server.lookup(&id).unwrap();
        assert_eq!(record.kind, ContentKind::Direct);
        assert!(record.payload.contains("<strong>bold</strong>"));
        assert!(record.payload.contains("background: #ffffff"));
        assert_eq!(*icons.contents.lock().unwrap(), vec![record]);
    }

    #[test]
    fn test_markdown_defaults_to_greeting() {
        let (action, server, _, icons) = build::<MarkdownSettings>();
        let id = ActionId::try_from("M").unwrap();

        action.on_did_receive_settings(&id, MarkdownSettings::default());

        let record = server.lookup(&id).unwrap();
        assert!(record.payload.contains("<h1>Hello Markdown</h1>"));
        assert!(record.payload.contains("background: #1e1e1e"));
        assert_eq!(
            *icons.updates.lock().unwrap(),
            vec![("M".to_owned(), WindowState::Closed)]
        );
    }

    #[tokio::test]
    async fn test_markdown_key_down_toggles_window() {
        let (action, server, launcher, _) = build::<MarkdownSettings>();
        let id = ActionId::try_from("M").unwrap();
        let settings = MarkdownSettings {
            window_mode: WindowMode::Browser,
            ..Default::default()
        };

        action.on_will_appear(&id, settings.clone());
        let state = action.on_key_down(&id, settings.clone()).await.unwrap();
        assert_eq!(state, WindowState::Open);
        assert_eq!(
            *launcher.urls.lock().unwrap(),
            vec![format!("http://localhost:{}/view/M", server.port())]
        );

        let channel = server.tracker().connect(id.clone());
        let state = action.on_key_down(&id, settings).await.unwrap();
        assert_eq!(state, WindowState::Closed);
        assert!(channel.outbox().try_recv().is_ok());
    }

    #[test]
    fn test_refresh_preview_redraws_cached_content() {
        let (action, _, _, icons) = build::<MarkdownSettings>();
        let id = ActionId::try_from("M").unwrap();

        action.refresh_preview(&id);
        assert!(icons.updates.lock().unwrap().is_empty());

        action.on_will_appear(&id, MarkdownSettings::default());
        action.refresh_preview(&id);
        assert_eq!(icons.updates.lock().unwrap().len(), 2);
    }
}
