use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{ContentKind, ContentRecord};

const DEFAULT_WIDTH: u32 = 800;
const DEFAULT_HEIGHT: u32 = 600;
const DEFAULT_MARKDOWN: &str = "# Hello Markdown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowMode {
    /// Chromeless app window sized to the configured dimensions.
    #[default]
    Popup,
    /// A tab in the system default browser.
    Browser,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown window mode: {0}")]
pub struct UnknownWindowMode(String);

impl FromStr for WindowMode {
    type Err = UnknownWindowMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "popup" => Ok(WindowMode::Popup),
            "browser" => Ok(WindowMode::Browser),
            _ => Err(UnknownWindowMode(s.to_owned())),
        }
    }
}

impl fmt::Display for WindowMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WindowMode::Popup => write!(f, "popup"),
            WindowMode::Browser => write!(f, "browser"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl WindowSize {
    /// Parse free-form dimensions from the settings form.
    ///
    /// Leading digits are used; anything else falls back to the default size.
    pub fn parse(width: Option<&str>, height: Option<&str>) -> Self {
        Self {
            width: parse_dimension(width).unwrap_or(DEFAULT_WIDTH),
            height: parse_dimension(height).unwrap_or(DEFAULT_HEIGHT),
        }
    }
}

/// Colour scheme of rendered Markdown pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown theme: {0}")]
pub struct UnknownTheme(String);

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(UnknownTheme(s.to_owned())),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

/// Per-action settings of an HTML display action as stored by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySettings {
    #[serde(default)]
    pub source_type: ContentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default)]
    pub window_mode: WindowMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_height: Option<String>,
}

impl DisplaySettings {
    /// The configured payload for the selected source type, empty if unset.
    pub fn payload(&self) -> &str {
        let payload = match self.source_type {
            ContentKind::Direct => &self.html_content,
            ContentKind::File => &self.file_path,
        };
        payload.as_deref().unwrap_or_default()
    }

    pub fn content(&self) -> ContentRecord {
        ContentRecord {
            kind: self.source_type,
            payload: self.payload().to_owned(),
        }
    }

    pub fn window_size(&self) -> WindowSize {
        WindowSize::parse(self.window_width.as_deref(), self.window_height.as_deref())
    }
}

/// Per-action settings of a Markdown action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkdownSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown_content: Option<String>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub window_mode: WindowMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_height: Option<String>,
}

impl MarkdownSettings {
    /// The Markdown source, or a greeting heading when none is set.
    pub fn markdown(&self) -> &str {
        self.markdown_content
            .as_deref()
            .filter(|markdown| !markdown.is_empty())
            .unwrap_or(DEFAULT_MARKDOWN)
    }

    pub fn window_size(&self) -> WindowSize {
        WindowSize::parse(self.window_width.as_deref(), self.window_height.as_deref())
    }
}

fn parse_dimension(value: Option<&str>) -> Option<u32> {
    let value = value?.trim();
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    value[..end].parse().ok().filter(|&n| n > 0)
}
