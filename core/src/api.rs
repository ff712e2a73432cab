//! Stateless request builder and response parser for the AtomPub API.
//!
//! # Design
//! `BlogApi` holds the endpoint and the precomputed Basic credentials and
//! nothing else. Each operation is split into a `build_*` method producing
//! an `HttpRequest` and a `parse_*` method consuming an `HttpResponse`;
//! `Client` runs the transport in between.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::atom;
use crate::collection::Collection;
use crate::config::Config;
use crate::entry::Entry;
use crate::error::BlogError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

pub const ATOM_ENTRY_CONTENT_TYPE: &str = "application/atom+xml;type=entry;charset=utf-8";

#[derive(Debug, Clone)]
pub struct BlogApi {
    endpoint: String,
    hatena_id: String,
    authorization: String,
}

impl BlogApi {
    pub fn new(config: &Config) -> Self {
        let credentials = format!("{}:{}", config.hatena_id, config.api_key);
        Self {
            endpoint: config.endpoint(),
            hatena_id: config.hatena_id.clone(),
            authorization: format!("Basic {}", STANDARD.encode(credentials)),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The collection URI, `{endpoint}/entry`.
    pub fn collection_url(&self) -> String {
        format!("{}/entry", self.endpoint)
    }

    /// The member URI of `entry`: its `edit_url` when the platform gave
    /// one, otherwise built from `entry_id`.
    pub fn member_url(&self, entry: &Entry) -> Result<String, BlogError> {
        if let Some(edit_url) = entry.edit_url.as_deref().filter(|u| !u.is_empty()) {
            return Ok(edit_url.to_string());
        }
        match entry.entry_id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => Ok(format!("{}/entry/{id}", self.endpoint)),
            None => Err(BlogError::Validation(
                "entry has neither edit_url nor entry_id".to_string(),
            )),
        }
    }

    fn request(&self, method: HttpMethod, url: String, body: Option<String>) -> HttpRequest {
        let mut headers = vec![("authorization".to_string(), self.authorization.clone())];
        if body.is_some() {
            headers.push((
                "content-type".to_string(),
                ATOM_ENTRY_CONTENT_TYPE.to_string(),
            ));
        }
        HttpRequest {
            method,
            url,
            headers,
            body,
        }
    }

    pub fn build_list_entries(&self) -> HttpRequest {
        self.request(HttpMethod::Get, self.collection_url(), None)
    }

    /// GET an absolute page URL taken from a feed's `rel="next"` link.
    pub fn build_get_page(&self, url: &str) -> HttpRequest {
        self.request(HttpMethod::Get, url.to_string(), None)
    }

    pub fn build_get_entry(&self, entry: &Entry) -> Result<HttpRequest, BlogError> {
        Ok(self.request(HttpMethod::Get, self.member_url(entry)?, None))
    }

    pub fn build_create_entry(&self, entry: &Entry) -> HttpRequest {
        let body = atom::render_entry(entry, &self.hatena_id);
        self.request(HttpMethod::Post, self.collection_url(), Some(body))
    }

    pub fn build_update_entry(&self, entry: &Entry) -> Result<HttpRequest, BlogError> {
        let url = self.member_url(entry)?;
        let body = atom::render_entry(entry, &self.hatena_id);
        Ok(self.request(HttpMethod::Put, url, Some(body)))
    }

    pub fn parse_collection(
        &self,
        response: HttpResponse,
        category: Option<&str>,
    ) -> Result<Collection, BlogError> {
        check_status(&response)?;
        Collection::parse(&response.body, category)
    }

    /// Parse the single-entry document returned by create, update and read.
    pub fn parse_entry(&self, response: HttpResponse) -> Result<Entry, BlogError> {
        check_status(&response)?;
        atom::parse_entry(&response.body)
    }
}

/// Any status outside 2xx is an `InvalidRequest`.
fn check_status(response: &HttpResponse) -> Result<(), BlogError> {
    if response.is_success() {
        return Ok(());
    }
    tracing::warn!(status = response.status, "platform rejected request");
    Err(BlogError::InvalidRequest {
        status: response.status,
        body: response.body.clone(),
    })
}
