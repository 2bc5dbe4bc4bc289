use htmldisplay_core::{ActionId, message::CLOSE_COMMAND};

use crate::Buffer;

const BODY_CLOSE: &str = "</body>";

fn client_script(action_id: &ActionId) -> Buffer {
    let mut script = Buffer::with_capacity(512);
    script.push_str(
        "<script>\n(function () {\n    var scheme = location.protocol === 'https:' ? 'wss://' : 'ws://';\n    var ws = new WebSocket(scheme + location.host + '/?actionId=' + encodeURIComponent(",
    );
    script.push_js_string(action_id);
    script.push_str("));\n    ws.onmessage = function (event) {\n        if (event.data === ");
    script.push_js_string(CLOSE_COMMAND);
    script.push_str(") {\n            window.close();\n        }\n    };\n})();\n</script>\n");
    script
}

/// Add the live-channel bootstrap script to `html`.
///
/// The script goes right before the last `</body>` tag (matched without
/// regard to case) or at the end of the document when there is none.
pub fn inject_client_script(html: &str, action_id: &ActionId) -> Buffer {
    let script = client_script(action_id);
    let mut output = Buffer::with_capacity(html.len() + script.len());

    match find_body_close(html) {
        Some(index) => {
            output.push_str(&html[..index]);
            output.push_str(&script);
            output.push_str(&html[index..]);
        }
        None => {
            output.push_str(html);
            output.push_str(&script);
        }
    }

    output
}

fn find_body_close(html: &str) -> Option<usize> {
    // ASCII lowercasing keeps byte offsets intact.
    html.to_ascii_lowercase().rfind(BODY_CLOSE)
}
