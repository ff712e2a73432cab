//! Blocking client for the Hatena Blog AtomPub API.
//!
//! # Overview
//! Lists a blog's entries page by page, optionally scoped to a category,
//! and creates, reads and updates individual entries.
//!
//! ```no_run
//! use hatena_blog::Client;
//!
//! # fn main() -> Result<(), hatena_blog::BlogError> {
//! let client = Client::new("hatena_id", "blog_id.hatenablog.com", "api_key");
//! for page in client.pages(None) {
//!     for entry in page?.draft_entries() {
//!         println!("{:?}", entry.title);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! - `BlogApi` is stateless: `build_*` produces an `HttpRequest`, `parse_*`
//!   consumes an `HttpResponse`, so the I/O boundary is explicit.
//! - `Transport` executes requests; `UreqTransport` is the default and any
//!   other implementation can be swapped in for tests.
//! - `Client` composes the two. `Collection::next` returns `None` on the last
//!   page rather than an empty collection.

pub mod api;
pub mod atom;
pub mod client;
pub mod collection;
pub mod config;
pub mod entry;
pub mod error;
pub mod http;
pub mod transport;

pub use api::BlogApi;
pub use client::{Client, Pages};
pub use collection::Collection;
pub use config::Config;
pub use entry::Entry;
pub use error::BlogError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
