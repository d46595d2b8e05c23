//! Content module - handles posts, front-matter and Markdown rendering

mod error;
mod frontmatter;
pub mod loader;
mod markdown;
mod post;
pub mod store;

pub use error::{ContentError, Result};
pub use frontmatter::{FrontMatter, FrontMatterError};
pub use loader::PostLoader;
pub use markdown::{MarkdownRenderer, RenderError};
pub use post::{sort_newest_first, Post};
pub use store::{ContentStore, DirStore, StoreEntry};
