//! Blocking client for one Hatena Blog.
//!
//! # Design
//! `Client` pairs the stateless `BlogApi` with a `Transport`. Every public
//! method is at most one round-trip: build, execute, parse. There is no
//! retry and no internal locking; callers wanting parallel fetches create
//! one client per thread.

use tracing::{debug, info};

use crate::api::BlogApi;
use crate::collection::Collection;
use crate::config::Config;
use crate::entry::Entry;
use crate::error::BlogError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};

#[derive(Debug, Clone)]
pub struct Client<T = UreqTransport> {
    config: Config,
    api: BlogApi,
    transport: T,
}

impl Client<UreqTransport> {
    /// Client for `https://blog.hatena.ne.jp/{hatena_id}/{blog_id}/atom`.
    pub fn new(hatena_id: &str, blog_id: &str, api_key: &str) -> Self {
        Self::from_config(Config::new(hatena_id, blog_id, api_key))
    }

    pub fn from_config(config: Config) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(config: Config, transport: T) -> Self {
        let api = BlogApi::new(&config);
        Self {
            config,
            api,
            transport,
        }
    }

    pub fn hatena_id(&self) -> &str {
        &self.config.hatena_id
    }

    pub fn blog_id(&self) -> &str {
        &self.config.blog_id
    }

    pub fn endpoint(&self) -> &str {
        self.api.endpoint()
    }

    pub fn api(&self) -> &BlogApi {
        &self.api
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, BlogError> {
        debug!(method = request.method.as_str(), url = %request.url, "sending request");
        let response = self.transport.execute(&request)?;
        debug!(status = response.status, url = %request.url, "received response");
        Ok(response)
    }

    /// Fetch the first page of the entry feed.
    pub fn get_collection(&self, category: Option<&str>) -> Result<Collection, BlogError> {
        let response = self.send(self.api.build_list_entries())?;
        let collection = self.api.parse_collection(response, category)?;
        debug!(entries = collection.len(), has_next = collection.has_next(), "fetched collection");
        Ok(collection)
    }

    /// Fetch the page at an absolute `url`, usually a `rel="next"` link.
    pub fn fetch_page(&self, url: &str, category: Option<&str>) -> Result<Collection, BlogError> {
        let response = self.send(self.api.build_get_page(url))?;
        self.api.parse_collection(response, category)
    }

    /// Walk every page, first to last.
    pub fn pages<'a>(&'a self, category: Option<&'a str>) -> Pages<'a, T> {
        Pages {
            client: self,
            category,
            state: PageState::First,
        }
    }

    /// A local entry for authoring. No request is made.
    pub fn get_entry(&self, entry_id: Option<&str>) -> Entry {
        Entry {
            entry_id: entry_id.map(str::to_string),
            ..Entry::default()
        }
    }

    /// PUT `entry` to its member URI and return the platform's copy.
    pub fn push_entry(&self, entry: &Entry) -> Result<Entry, BlogError> {
        let request = self.api.build_update_entry(entry)?;
        let updated = self.api.parse_entry(self.send(request)?)?;
        info!(entry_id = ?updated.entry_id, is_public = updated.is_public, "pushed entry");
        Ok(updated)
    }

    /// POST `entry` to the collection and return the created entry.
    pub fn create_entry(&self, entry: &Entry) -> Result<Entry, BlogError> {
        let request = self.api.build_create_entry(entry);
        let created = self.api.parse_entry(self.send(request)?)?;
        info!(entry_id = ?created.entry_id, "created entry");
        Ok(created)
    }

    /// Replace `entry` with the platform's current version of it.
    pub fn pull_entry(&self, entry: &mut Entry) -> Result<(), BlogError> {
        let request = self.api.build_get_entry(entry)?;
        *entry = self.api.parse_entry(self.send(request)?)?;
        info!(entry_id = ?entry.entry_id, "pulled entry");
        Ok(())
    }
}

#[derive(Debug)]
enum PageState {
    First,
    Next(String),
    Done,
}

/// Iterator over successive pages of the feed. Stops after the last page
/// or after the first error.
#[derive(Debug)]
pub struct Pages<'a, T> {
    client: &'a Client<T>,
    category: Option<&'a str>,
    state: PageState,
}

impl<T: Transport> Iterator for Pages<'_, T> {
    type Item = Result<Collection, BlogError>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = match std::mem::replace(&mut self.state, PageState::Done) {
            PageState::First => self.client.get_collection(self.category),
            PageState::Next(url) => self.client.fetch_page(&url, self.category),
            PageState::Done => return None,
        };
        if let Ok(collection) = &result {
            if let Some(url) = collection.next_url() {
                self.state = PageState::Next(url.to_string());
            }
        }
        Some(result)
    }
}
