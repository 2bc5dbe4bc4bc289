use std::{borrow::Cow, sync::LazyLock};

use htmldisplay_core::ActionId;
use regex::{Captures, Regex};

use crate::Buffer;

static ATTRIBUTE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(\s(?:src|href)\s*=\s*["'])([^"']+)(["'])"#)
        .expect("attribute reference pattern is valid")
});

static CSS_URL_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(url\(\s*["']?)([^"')]+?)(["']?\s*\))"#)
        .expect("css url pattern is valid")
});

/// URL prefix under which static assets of `action_id` are served.
pub fn static_prefix(action_id: &ActionId) -> String {
    let mut prefix = Buffer::with_capacity(action_id.len() + 9);
    prefix.push_str("/static/");
    prefix.push_uri(action_id);
    prefix.push_char('/');
    prefix.into()
}

/// Whether a reference points relative to the document.
///
/// Root-relative paths, fragments and anything carrying a URL scheme
/// (`http:`, `https:`, `data:`, `mailto:` ...) are left alone.
pub fn is_relative_reference(value: &str) -> bool {
    let value = value.trim_start();
    if value.is_empty() || value.starts_with('/') || value.starts_with('#') {
        return false;
    }

    match value.split_once(':') {
        Some((scheme, _)) => !is_scheme(scheme),
        None => true,
    }
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Route relative `src`/`href` attributes and CSS `url()` references through
/// the static asset endpoint of `action_id`.
pub fn rewrite_relative_paths<'a>(html: &'a str, action_id: &ActionId) -> Cow<'a, str> {
    let prefix = static_prefix(action_id);
    let replace = |caps: &Captures| {
        let reference = &caps[2];
        if is_relative_reference(reference) {
            format!("{}{prefix}{reference}{}", &caps[1], &caps[3])
        } else {
            caps[0].to_owned()
        }
    };

    match ATTRIBUTE_REFERENCE.replace_all(html, replace) {
        Cow::Borrowed(html) => CSS_URL_REFERENCE.replace_all(html, replace),
        Cow::Owned(html) => Cow::Owned(CSS_URL_REFERENCE.replace_all(&html, replace).into_owned()),
    }
}
