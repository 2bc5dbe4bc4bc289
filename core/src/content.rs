use std::path::Path;

use serde::{Deserialize, Serialize};

/// How a [`ContentRecord`] payload is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Payload is raw HTML text.
    #[default]
    Direct,
    /// Payload is a filesystem path to an HTML document.
    File,
}

/// Content configured for one action. Replaced wholesale on re-registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub kind: ContentKind,
    pub payload: String,
}

impl ContentRecord {
    pub fn direct(html: impl Into<String>) -> Self {
        Self {
            kind: ContentKind::Direct,
            payload: html.into(),
        }
    }

    pub fn file(path: impl Into<String>) -> Self {
        Self {
            kind: ContentKind::File,
            payload: path.into(),
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == ContentKind::File
    }

    /// Path of the HTML document for file-backed content.
    pub fn file_path(&self) -> Option<&Path> {
        self.is_file().then(|| Path::new(&self.payload))
    }

    /// Directory that relative assets of a file-backed document resolve against.
    ///
    /// A bare file name lives in the current directory.
    pub fn base_dir(&self) -> Option<&Path> {
        let parent = self.file_path()?.parent()?;
        if parent.as_os_str().is_empty() {
            Some(Path::new("."))
        } else {
            Some(parent)
        }
    }
}
