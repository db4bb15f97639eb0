//! # mdpress – Markdown → branded PDF pipeline
//!
//! This crate converts line-oriented technical Markdown into paginated,
//! consistently branded PDF documents. The pipeline stages are:
//!
//! 1. **Classify** – Markdown lines → block elements ([`blocks`])
//! 2. **Format** – inline emphasis, code spans, and links → styled runs ([`inline`])
//! 3. **Layout** – flow elements into a measured text column ([`layout`])
//! 4. **Paginate** – split the column into pages with footers ([`pagination`])
//! 5. **Render** – emit PDF bytes via printpdf ([`render`])
//!
//! Multi-chapter books with a cover and table of contents are assembled by
//! [`book`]; Mermaid diagram sources become embeddable images via
//! [`mermaid`].

pub mod blocks;
pub mod book;
pub mod diagrams;
pub mod element;
pub mod error;
pub mod fonts;
pub mod inline;
pub mod layout;
pub mod layout_config;
pub mod mermaid;
pub mod pagination;
pub mod pipeline;
pub mod render;
pub mod samples;
pub mod style;

// Re-exports for convenience
pub use book::{convert_book, BookPlan, Chapter};
pub use error::{Error, Result};
pub use pipeline::{convert_document, convert_markdown, RenderOptions};
pub use style::{ColorScheme, PageSize};
