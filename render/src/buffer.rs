use std::ops::Deref;

use axum::response::{Html, IntoResponse, Response};
use pulldown_cmark::{Options, Parser};

const DEFAULT_BUFFER_SIZE: usize = 1024;

/// String builder for HTML output with escaping helpers.
pub struct Buffer {
    content: String,
}

impl Deref for Buffer {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.content
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self {
            content: String::with_capacity(DEFAULT_BUFFER_SIZE),
        }
    }
}

impl<T: AsRef<str>> From<T> for Buffer {
    fn from(s: T) -> Self {
        Self {
            content: s.as_ref().to_string(),
        }
    }
}

impl Buffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            content: String::with_capacity(capacity),
        }
    }

    pub fn push_str(&mut self, s: &str) {
        self.content.push_str(s);
    }

    pub fn push_html(&mut self, s: &str) {
        html_escape::encode_safe_to_string(s, &mut self.content);
    }

    pub fn push_uri(&mut self, s: &str) {
        let encoded = uri_encode::encode_uri_component(s);
        self.content.push_str(&encoded);
    }

    /// Push `s` as a JavaScript string literal that is safe inside a `<script>` element.
    pub fn push_js_string(&mut self, s: &str) {
        let literal = serde_json::Value::from(s).to_string();
        self.content.push_str(&literal.replace("</", "<\\/"));
    }

    /// Push `markdown` rendered as HTML, with tables and strikethrough enabled.
    pub fn push_markdown(&mut self, markdown: &str) {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        pulldown_cmark::html::push_html(&mut self.content, Parser::new_ext(markdown, options));
    }

    pub fn push_char(&mut self, c: char) {
        self.content.push(c);
    }

    pub fn into_html(self) -> Html<String> {
        Html(self.content)
    }
}

impl From<Buffer> for String {
    fn from(buffer: Buffer) -> Self {
        buffer.content
    }
}

impl IntoResponse for Buffer {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}
