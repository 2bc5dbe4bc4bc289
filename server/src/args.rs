use std::{
    net::{IpAddr, Ipv4Addr},
    path::PathBuf,
    str::FromStr,
};

use clap::Parser;
use htmldisplay_core::{
    ActionId, ContentKind, DisplaySettings, MarkdownSettings, Theme, WindowMode, WindowSize,
};

use crate::ServerConfig;

const DEFAULT_ACTION_ID: &str = "preview";

#[derive(Parser)]
#[command(
    name = "htmldisplay-server",
    about = "Preview HTML content in a local browser window",
    long_about = None
)]
pub struct Args {
    /// Inline HTML to display
    #[arg(long, conflicts_with = "file")]
    pub html: Option<String>,

    /// HTML file to display; relative assets are served from its directory
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Markdown to render and display instead of HTML
    #[arg(long, conflicts_with_all = ["html", "file"])]
    pub markdown: Option<String>,

    /// Colour theme for rendered Markdown: light or dark
    #[arg(long, default_value_t = Theme::Dark)]
    pub theme: Theme,

    /// Identifier used in the preview URL
    #[arg(long, default_value = DEFAULT_ACTION_ID, value_parser = ActionId::from_str)]
    pub action_id: ActionId,

    /// Window mode: popup or browser
    #[arg(long, default_value_t = WindowMode::Popup)]
    pub mode: WindowMode,

    #[arg(long, default_value_t = WindowSize::default().width)]
    pub width: u32,

    #[arg(long, default_value_t = WindowSize::default().height)]
    pub height: u32,

    /// Only print the preview URL instead of opening a window
    #[arg(long)]
    pub no_open: bool,

    /// Interface to listen on; the port is assigned by the OS
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub bind: IpAddr,
}

impl Args {
    pub fn config(&self) -> ServerConfig {
        ServerConfig { bind_ip: self.bind }
    }

    /// Settings equivalent to what the controller would store for this action.
    pub fn settings(&self) -> DisplaySettings {
        let (source_type, file_path) = match &self.file {
            Some(file) => {
                let file = std::path::absolute(file).unwrap_or_else(|_| file.clone());
                (ContentKind::File, Some(file.display().to_string()))
            }
            None => (ContentKind::Direct, None),
        };

        DisplaySettings {
            source_type,
            html_content: self.html.clone(),
            file_path,
            window_mode: self.mode,
            window_width: Some(self.width.to_string()),
            window_height: Some(self.height.to_string()),
        }
    }

    /// Markdown action settings, if `--markdown` was given.
    pub fn markdown_settings(&self) -> Option<MarkdownSettings> {
        let markdown = self.markdown.clone()?;

        Some(MarkdownSettings {
            markdown_content: Some(markdown),
            theme: self.theme,
            window_mode: self.mode,
            window_width: Some(self.width.to_string()),
            window_height: Some(self.height.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let args = Args::try_parse_from(["htmldisplay-server"]).unwrap();

        assert_eq!(&*args.action_id, "preview");
        assert_eq!(args.mode, WindowMode::Popup);
        assert!(!args.no_open);
        assert!(args.config().bind_ip.is_loopback());

        let settings = args.settings();
        assert_eq!(settings.source_type, ContentKind::Direct);
        assert_eq!(settings.payload(), "");
        assert_eq!(settings.window_size(), WindowSize::default());
    }

    #[test]
    fn test_parse_file() {
        let args = Args::try_parse_from([
            "htmldisplay-server",
            "--file",
            "/tmp/demo/index.html",
            "--mode",
            "browser",
            "--width",
            "1024",
            "--action-id",
            "demo",
        ])
        .unwrap();

        let settings = args.settings();
        assert_eq!(settings.source_type, ContentKind::File);
        assert_eq!(settings.payload(), "/tmp/demo/index.html");
        assert_eq!(settings.window_mode, WindowMode::Browser);
        assert_eq!(settings.window_size().width, 1024);
        assert_eq!(&*args.action_id, "demo");
    }

    #[test]
    fn test_html_conflicts_with_file() {
        let result =
            Args::try_parse_from(["htmldisplay-server", "--html", "<p>x</p>", "--file", "a.html"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_markdown() {
        let args = Args::try_parse_from([
            "htmldisplay-server",
            "--markdown",
            "# Notes",
            "--theme",
            "light",
        ])
        .unwrap();

        let settings = args.markdown_settings().unwrap();
        assert_eq!(settings.markdown(), "# Notes");
        assert_eq!(settings.theme, Theme::Light);
        assert_eq!(settings.window_size(), WindowSize::default());

        let args = Args::try_parse_from(["htmldisplay-server"]).unwrap();
        assert_eq!(args.markdown_settings(), None);
        assert_eq!(args.theme, Theme::Dark);
    }

    #[test]
    fn test_markdown_conflicts_with_html() {
        let result =
            Args::try_parse_from(["htmldisplay-server", "--markdown", "x", "--html", "<p>x</p>"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unknown_mode() {
        let result = Args::try_parse_from(["htmldisplay-server", "--mode", "tab"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_empty_action_id() {
        let result = Args::try_parse_from(["htmldisplay-server", "--action-id", ""]);
        assert!(result.is_err());
    }
}
