//! One page of the entry feed.
//!
//! # Design
//! A `Collection` is built once from a response body and never changes.
//! The filters borrow from it. `next` returns `Ok(None)` when the feed has
//! no `rel="next"` link, so "no further page" is never confused with a page
//! that happens to be empty.

use crate::atom;
use crate::client::Client;
use crate::entry::Entry;
use crate::error::BlogError;
use crate::transport::Transport;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    entries: Vec<Entry>,
    category: Option<String>,
    next_url: Option<String>,
}

impl Collection {
    /// Parse a feed document. `category` is remembered for
    /// `scoped_entries` and carried over to following pages.
    pub fn parse(xml: &str, category: Option<&str>) -> Result<Self, BlogError> {
        let feed = atom::parse_feed(xml)?;
        Ok(Self {
            entries: feed.entries,
            category: category.map(str::to_string),
            next_url: feed.next_url,
        })
    }

    /// Entries in feed order, newest first.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn next_url(&self) -> Option<&str> {
        self.next_url.as_deref()
    }

    pub fn has_next(&self) -> bool {
        self.next_url.is_some()
    }

    pub fn public_entries(&self) -> Vec<&Entry> {
        self.entries.iter().filter(|e| e.is_public).collect()
    }

    pub fn draft_entries(&self) -> Vec<&Entry> {
        self.entries.iter().filter(|e| !e.is_public).collect()
    }

    /// Entries tagged with exactly `name`. Empty when none match.
    pub fn category_entries(&self, name: &str) -> Vec<&Entry> {
        self.entries.iter().filter(|e| e.has_category(name)).collect()
    }

    /// Entries in this collection's category, or all of them when the
    /// collection was fetched without one.
    pub fn scoped_entries(&self) -> Vec<&Entry> {
        match self.category.as_deref() {
            Some(name) => self.category_entries(name),
            None => self.entries.iter().collect(),
        }
    }

    /// Fetch the following page, or `None` on the last one.
    pub fn next<T: Transport>(&self, client: &Client<T>) -> Result<Option<Collection>, BlogError> {
        match self.next_url.as_deref() {
            Some(url) => client.fetch_page(url, self.category.as_deref()).map(Some),
            None => Ok(None),
        }
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
