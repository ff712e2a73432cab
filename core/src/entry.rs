//! A single blog post.
//!
//! # Design
//! `Entry` is a plain value with public fields. The caller edits it freely,
//! then hands it to `push`/`post`, which serialize a snapshot of `&self`
//! before any I/O and replace the local fields with the platform's answer.
//! Every entry owns its own `categories` vector.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::error::BlogError;
use crate::transport::Transport;

/// One blog post, either authored locally or reconstructed from a feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub title: Option<String>,
    pub content: Option<String>,
    /// Media type of `content`, e.g. `text/x-markdown` or `text/html`.
    pub content_type: Option<String>,
    pub is_public: bool,
    /// Platform-assigned identifier; `None` until the platform knows the entry.
    pub entry_id: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub publish_date: Option<DateTime<FixedOffset>>,
    pub update_date: Option<DateTime<FixedOffset>>,
    pub public_url: Option<String>,
    pub edit_url: Option<String>,
}

fn is_blank(field: &Option<String>) -> bool {
    field.as_deref().is_none_or(str::is_empty)
}

impl Entry {
    /// A draft with a title and body, ready for `post`.
    pub fn new(title: &str, content: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            content: Some(content.to_string()),
            ..Self::default()
        }
    }

    pub fn is_draft(&self) -> bool {
        !self.is_public
    }

    pub fn has_category(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c == name)
    }

    /// Checks the fields an update needs: a known `entry_id` and a title.
    pub fn validate_for_push(&self) -> Result<(), BlogError> {
        if is_blank(&self.entry_id) {
            return Err(BlogError::Validation(
                "can't push: entry has no entry_id".to_string(),
            ));
        }
        if is_blank(&self.title) {
            return Err(BlogError::Validation(
                "can't push: entry has no title".to_string(),
            ));
        }
        Ok(())
    }

    /// Send local changes to the platform. Fails with `Validation` before
    /// any request when `entry_id` or `title` is missing.
    pub fn push<T: Transport>(&mut self, client: &Client<T>) -> Result<(), BlogError> {
        self.validate_for_push()?;
        *self = client.push_entry(self)?;
        Ok(())
    }

    /// Create this entry on the platform. Only a title is required; on
    /// success the entry carries its new `entry_id` and `edit_url`.
    pub fn post<T: Transport>(&mut self, client: &Client<T>) -> Result<(), BlogError> {
        if is_blank(&self.title) {
            return Err(BlogError::Validation(
                "can't post: entry has no title".to_string(),
            ));
        }
        *self = client.create_entry(self)?;
        Ok(())
    }

    /// Replace every local field with the platform's current version.
    pub fn pull<T: Transport>(&mut self, client: &Client<T>) -> Result<(), BlogError> {
        client.pull_entry(self)
    }

    pub fn publish<T: Transport>(&mut self, client: &Client<T>) -> Result<(), BlogError> {
        self.is_public = true;
        self.push(client)
    }

    pub fn unpublish<T: Transport>(&mut self, client: &Client<T>) -> Result<(), BlogError> {
        self.is_public = false;
        self.push(client)
    }
}
