use crate::Buffer;

const PLACEHOLDER_TITLE: &str = "Info Display";

/// Page served for direct content that has not been configured yet.
pub fn placeholder_page(message: &str) -> String {
    let mut page = Buffer::from(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>",
    );
    page.push_html(PLACEHOLDER_TITLE);
    page.push_str("</title></head><body><p>");
    page.push_html(message);
    page.push_str("</p></body></html>");
    page.into()
}
