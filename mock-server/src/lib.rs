//! In-memory stand-in for the Hatena Blog AtomPub API.
//!
//! Serves one blog under `/{hatena_id}/{blog_id}/atom`. Entries are kept
//! oldest first and listed newest first, `page_size` per page, with a
//! `rel="next"` link while more remain. Every route requires the blog's
//! Basic credentials.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{SecondsFormat, Utc};
use quick_xml::{escape::escape, events::Event, Reader};
use serde::Deserialize;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: usize = 10;
const BLOG_NUMBER: &str = "20000000000000";

/// The blog being served and the credentials it accepts.
#[derive(Clone, Debug)]
pub struct MockBlog {
    /// Absolute origin used in `edit`, `alternate` and `next` links.
    pub base_url: String,
    pub hatena_id: String,
    pub blog_id: String,
    pub api_key: String,
    pub page_size: usize,
}

impl MockBlog {
    pub fn new(base_url: &str, hatena_id: &str, blog_id: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            hatena_id: hatena_id.to_string(),
            blog_id: blog_id.to_string(),
            api_key: api_key.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn collection_url(&self) -> String {
        format!("{}/{}/{}/atom/entry", self.base_url, self.hatena_id, self.blog_id)
    }

    fn authorization(&self) -> String {
        let credentials = format!("{}:{}", self.hatena_id, self.api_key);
        format!("Basic {}", STANDARD.encode(credentials))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredEntry {
    pub id: String,
    pub title: String,
    pub content: String,
    pub content_type: String,
    pub categories: Vec<String>,
    pub draft: bool,
    pub published: String,
    pub updated: String,
}

/// Entries in creation order, oldest first.
pub type Db = Arc<RwLock<Vec<StoredEntry>>>;

#[derive(Clone)]
struct AppState {
    blog: Arc<MockBlog>,
    db: Db,
}

#[derive(Deserialize)]
struct ListQuery {
    page: Option<usize>,
}

pub fn app(blog: MockBlog) -> Router {
    router(blog, Db::default())
}

/// Router over an existing store, so tests can seed or inspect it.
pub fn router(blog: MockBlog, db: Db) -> Router {
    let state = AppState {
        blog: Arc::new(blog),
        db,
    };
    Router::new()
        .route(
            "/{hatena_id}/{blog_id}/atom/entry",
            get(list_entries).post(create_entry),
        )
        .route(
            "/{hatena_id}/{blog_id}/atom/entry/{entry_id}",
            get(get_entry).put(update_entry),
        )
        .with_state(state)
}

pub async fn run(listener: TcpListener, blog: MockBlog) -> Result<(), std::io::Error> {
    axum::serve(listener, app(blog)).await
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}

fn atom(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/atom+xml; charset=utf-8")],
        body,
    )
        .into_response()
}

/// 401 on bad credentials, 404 when the path names another blog.
fn authorize(
    blog: &MockBlog,
    headers: &HeaderMap,
    hatena_id: &str,
    blog_id: &str,
) -> Result<(), Response> {
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if presented != Some(blog.authorization().as_str()) {
        return Err((StatusCode::UNAUTHORIZED, "Unauthorized").into_response());
    }
    if hatena_id != blog.hatena_id || blog_id != blog.blog_id {
        return Err((StatusCode::NOT_FOUND, "Blog Not Found").into_response());
    }
    Ok(())
}

async fn list_entries(
    State(state): State<AppState>,
    Path((hatena_id, blog_id)): Path<(String, String)>,
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
) -> Response {
    if let Err(rejection) = authorize(&state.blog, &headers, &hatena_id, &blog_id) {
        return rejection;
    }
    let page = query.page.unwrap_or(1).max(1);
    let size = state.blog.page_size;
    let entries = state.db.read().await;

    let body: String = entries
        .iter()
        .rev()
        .skip((page - 1).saturating_mul(size))
        .take(size)
        .map(|e| render_entry(&state.blog, e))
        .collect();
    let next = (entries.len() > page.saturating_mul(size)).then(|| {
        format!(
            "  <link rel=\"next\" href=\"{}?page={}\"/>\n",
            state.blog.collection_url(),
            page + 1
        )
    });
    atom(StatusCode::OK, render_feed(&state.blog, next.as_deref(), &body))
}

async fn create_entry(
    State(state): State<AppState>,
    Path((hatena_id, blog_id)): Path<(String, String)>,
    headers: HeaderMap,
    body: String,
) -> Response {
    if let Err(rejection) = authorize(&state.blog, &headers, &hatena_id, &blog_id) {
        return rejection;
    }
    let posted = match parse_posted_entry(&body) {
        Ok(posted) => posted,
        Err(message) => return (StatusCode::BAD_REQUEST, message).into_response(),
    };
    let timestamp = now();
    let entry = StoredEntry {
        id: Uuid::new_v4().simple().to_string(),
        title: posted.title,
        content: posted.content,
        content_type: posted.content_type,
        categories: posted.categories,
        draft: posted.draft,
        published: timestamp.clone(),
        updated: timestamp,
    };
    let xml = render_document(&state.blog, &entry);
    state.db.write().await.push(entry);
    atom(StatusCode::CREATED, xml)
}

async fn get_entry(
    State(state): State<AppState>,
    Path((hatena_id, blog_id, entry_id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Response {
    if let Err(rejection) = authorize(&state.blog, &headers, &hatena_id, &blog_id) {
        return rejection;
    }
    let entries = state.db.read().await;
    match entries.iter().find(|e| e.id == entry_id) {
        Some(entry) => atom(StatusCode::OK, render_document(&state.blog, entry)),
        None => (StatusCode::NOT_FOUND, "Entry Not Found").into_response(),
    }
}

async fn update_entry(
    State(state): State<AppState>,
    Path((hatena_id, blog_id, entry_id)): Path<(String, String, String)>,
    headers: HeaderMap,
    body: String,
) -> Response {
    if let Err(rejection) = authorize(&state.blog, &headers, &hatena_id, &blog_id) {
        return rejection;
    }
    let posted = match parse_posted_entry(&body) {
        Ok(posted) => posted,
        Err(message) => return (StatusCode::BAD_REQUEST, message).into_response(),
    };
    let mut entries = state.db.write().await;
    let Some(entry) = entries.iter_mut().find(|e| e.id == entry_id) else {
        return (StatusCode::NOT_FOUND, "Entry Not Found").into_response();
    };
    entry.title = posted.title;
    entry.content = posted.content;
    entry.content_type = posted.content_type;
    entry.categories = posted.categories;
    entry.draft = posted.draft;
    entry.updated = now();
    atom(StatusCode::OK, render_document(&state.blog, entry))
}

fn render_feed(blog: &MockBlog, next: Option<&str>, entries: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:app="http://www.w3.org/2007/app">
  <link rel="first" href="{first}"/>
{next}  <title>{blog_id}</title>
  <link rel="alternate" href="{base}/{blog_id}/"/>
  <updated>{updated}</updated>
  <author><name>{hatena_id}</name></author>
  <id>hatenablog://blog/{BLOG_NUMBER}</id>
{entries}</feed>
"#,
        first = blog.collection_url(),
        next = next.unwrap_or_default(),
        blog_id = escape(blog.blog_id.as_str()),
        base = blog.base_url,
        updated = now(),
        hatena_id = escape(blog.hatena_id.as_str()),
    )
}

fn render_entry(blog: &MockBlog, entry: &StoredEntry) -> String {
    let categories: String = entry
        .categories
        .iter()
        .map(|c| format!("  <category term=\"{}\" />\n", escape(c.as_str())))
        .collect();
    format!(
        r#"<entry>
  <id>tag:blog.hatena.ne.jp,2013:blog-{hatena_id}-{BLOG_NUMBER}-{id}</id>
  <link rel="edit" href="{collection}/{id}"/>
  <link rel="alternate" type="text/html" href="{base}/{blog_id}/entry/{id}"/>
  <author><name>{hatena_id}</name></author>
  <title>{title}</title>
  <updated>{updated}</updated>
  <published>{published}</published>
  <app:edited>{updated}</app:edited>
  <content type="{content_type}">{content}</content>
{categories}  <app:control>
    <app:draft>{draft}</app:draft>
  </app:control>
</entry>
"#,
        hatena_id = escape(blog.hatena_id.as_str()),
        id = entry.id,
        collection = blog.collection_url(),
        base = blog.base_url,
        blog_id = blog.blog_id,
        title = escape(entry.title.as_str()),
        updated = entry.updated,
        published = entry.published,
        content_type = escape(entry.content_type.as_str()),
        content = escape(entry.content.as_str()),
        draft = if entry.draft { "yes" } else { "no" },
    )
}

/// A single-entry document, as returned by create, read and update.
fn render_document(blog: &MockBlog, entry: &StoredEntry) -> String {
    render_entry(blog, entry).replacen(
        "<entry>",
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<entry xmlns=\"http://www.w3.org/2005/Atom\" xmlns:app=\"http://www.w3.org/2007/app\">",
        1,
    )
}

/// Fields a client may set when creating or updating an entry.
#[derive(Debug, PartialEq, Eq)]
pub struct PostedEntry {
    pub title: String,
    pub content: String,
    pub content_type: String,
    pub categories: Vec<String>,
    pub draft: bool,
}

/// Read a posted `<entry>` document. Title is required; a missing draft
/// flag publishes the entry.
pub fn parse_posted_entry(xml: &str) -> Result<PostedEntry, String> {
    let mut reader = Reader::from_str(xml);
    let mut title = None;
    let mut content = String::new();
    let mut content_type = "text/plain".to_string();
    let mut categories = Vec::new();
    let mut draft = false;
    let mut capturing: Option<Vec<u8>> = None;
    let mut text = String::new();
    let mut seen_entry = false;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) => {
                let local = e.local_name().as_ref().to_vec();
                match local.as_slice() {
                    b"entry" => seen_entry = true,
                    b"content" => {
                        if let Some(attr) = e.try_get_attribute("type").map_err(|e| e.to_string())? {
                            content_type = attr.unescape_value().map_err(|e| e.to_string())?.into_owned();
                        }
                    }
                    _ => {}
                }
                if matches!(local.as_slice(), b"title" | b"content" | b"draft") {
                    text.clear();
                    capturing = Some(local);
                }
            }
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"category" {
                    if let Some(attr) = e.try_get_attribute("term").map_err(|e| e.to_string())? {
                        categories.push(attr.unescape_value().map_err(|e| e.to_string())?.into_owned());
                    }
                }
            }
            Event::Text(t) => {
                if capturing.is_some() {
                    text.push_str(&t.unescape().map_err(|e| e.to_string())?);
                }
            }
            Event::CData(c) => {
                if capturing.is_some() {
                    text.push_str(std::str::from_utf8(&c).map_err(|e| e.to_string())?);
                }
            }
            Event::End(e) => {
                if capturing.as_deref() == Some(e.local_name().as_ref()) {
                    match capturing.take().as_deref() {
                        Some(b"title") => title = Some(std::mem::take(&mut text)),
                        Some(b"content") => content = std::mem::take(&mut text),
                        Some(b"draft") => draft = text.trim() == "yes",
                        _ => {}
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_entry {
        return Err("body is not an <entry> document".to_string());
    }
    let title = title.ok_or_else(|| "entry has no <title>".to_string())?;
    Ok(PostedEntry {
        title,
        content,
        content_type,
        categories,
        draft,
    })
}
