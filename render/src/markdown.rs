use htmldisplay_core::Theme;

use crate::Buffer;

struct Palette {
    background: &'static str,
    text: &'static str,
    code: &'static str,
    rule: &'static str,
}

impl From<Theme> for Palette {
    fn from(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Palette {
                background: "#1e1e1e",
                text: "#f0f0f0",
                code: "#2d2d2d",
                rule: "#444",
            },
            Theme::Light => Palette {
                background: "#ffffff",
                text: "#333333",
                code: "#f4f4f4",
                rule: "#ddd",
            },
        }
    }
}

/// Render `markdown` into a standalone page styled with `theme`.
pub fn markdown_page(markdown: &str, theme: Theme) -> String {
    let palette = Palette::from(theme);

    let mut page = Buffer::with_capacity(markdown.len() * 2 + 1024);
    page.push_str(concat!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n",
        "<meta charset=\"UTF-8\">\n",
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
        "<title>Markdown View</title>\n<style>\n",
    ));
    page.push_str(&format!(
        "body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; \
         background: {}; color: {}; padding: 2rem; line-height: 1.6; }}\n",
        palette.background, palette.text
    ));
    page.push_str(&format!(
        "pre, code {{ background: {}; padding: 0.2em 0.4em; border-radius: 4px; }}\n",
        palette.code
    ));
    page.push_str("pre { padding: 1em; overflow-x: auto; }\n");
    page.push_str(&format!(
        "h1, h2, h3 {{ border-bottom: 1px solid {}; padding-bottom: 0.3em; }}\n",
        palette.rule
    ));
    page.push_str(concat!(
        "a { color: #58a6ff; }\n",
        "blockquote { border-left: 4px solid #444; padding-left: 1em; margin-left: 0; color: #888; }\n",
        "</style>\n</head>\n<body>\n",
    ));
    page.push_markdown(markdown);
    page.push_str("</body>\n</html>\n");
    page.into()
}
