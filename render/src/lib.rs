//! HTML transforms applied to preview content before it is served.

mod buffer;
mod markdown;
mod page;
mod rewrite;
mod script;

pub use buffer::Buffer;
pub use markdown::markdown_page;
pub use page::placeholder_page;
pub use rewrite::{is_relative_reference, rewrite_relative_paths, static_prefix};
pub use script::inject_client_script;
