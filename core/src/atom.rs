//! Atom XML to `Entry` and back.
//!
//! # Design
//! Parsing is a single pass over quick-xml events. Only elements inside an
//! `<entry>` are mapped onto entries; outside of one, the sole element of
//! interest is the feed-level `<link rel="next">`. Element names are matched
//! by local name, so `app:draft` is found regardless of its prefix.
//!
//! Parsing is strict: an entry missing any of title, content (or its `type`
//! attribute), updated, published, the alternate link, the edit link or id
//! fails the whole document, as does a `<category>` without `term`. The
//! draft flag is the exception; when absent the entry is a draft. When a
//! link relation repeats, the first one wins.

use chrono::{DateTime, FixedOffset};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::entry::Entry;
use crate::error::BlogError;

pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
pub const APP_NS: &str = "http://www.w3.org/2007/app";
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// The entries of one feed page plus its pagination link.
#[derive(Debug, Clone, Default)]
pub struct Feed {
    pub entries: Vec<Entry>,
    pub next_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Content,
    Updated,
    Published,
    Id,
    Draft,
}

impl Field {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Field::Title),
            b"content" => Some(Field::Content),
            b"updated" => Some(Field::Updated),
            b"published" => Some(Field::Published),
            b"id" => Some(Field::Id),
            b"draft" => Some(Field::Draft),
            _ => None,
        }
    }
}

/// Fields collected for one `<entry>` before it is checked for completeness.
#[derive(Debug, Default)]
struct PartialEntry {
    title: Option<String>,
    content: Option<String>,
    content_type: Option<String>,
    updated: Option<String>,
    published: Option<String>,
    id: Option<String>,
    draft: Option<String>,
    alternate: Option<String>,
    edit: Option<String>,
    categories: Vec<String>,
}

impl PartialEntry {
    fn set(&mut self, field: Field, text: String) {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Content => &mut self.content,
            Field::Updated => &mut self.updated,
            Field::Published => &mut self.published,
            Field::Id => &mut self.id,
            Field::Draft => &mut self.draft,
        };
        *slot = Some(text);
    }

    fn finish(self, index: usize) -> Result<Entry, BlogError> {
        let missing = |what: &str| BlogError::Parse(format!("entry #{index} has no {what}"));

        let title = self.title.ok_or_else(|| missing("<title>"))?;
        let content = self.content.ok_or_else(|| missing("<content>"))?;
        let content_type = self.content_type.ok_or_else(|| missing("content type"))?;
        let updated = self.updated.ok_or_else(|| missing("<updated>"))?;
        let published = self.published.ok_or_else(|| missing("<published>"))?;
        let public_url = self.alternate.ok_or_else(|| missing("alternate link"))?;
        let edit_url = self.edit.ok_or_else(|| missing("edit link"))?;
        let id = self.id.ok_or_else(|| missing("<id>"))?;

        Ok(Entry {
            title: Some(title),
            content: Some(content),
            content_type: Some(content_type),
            is_public: is_public_flag(self.draft.as_deref()),
            entry_id: Some(entry_id_from_atom_id(&id).to_string()),
            categories: self.categories,
            publish_date: Some(parse_date(&published)?),
            update_date: Some(parse_date(&updated)?),
            public_url: Some(public_url),
            edit_url: Some(edit_url),
        })
    }
}

/// Exactly `"no"` means published; anything else, including no flag, means draft.
pub fn is_public_flag(draft: Option<&str>) -> bool {
    draft == Some("no")
}

/// Hatena ids look like `tag:blog.hatena.ne.jp,2013:blog-{user}-{blog}-{entry}`.
/// The entry id is whatever follows the last hyphen.
pub fn entry_id_from_atom_id(id: &str) -> &str {
    let id = id.trim();
    id.rsplit('-').next().unwrap_or(id)
}

pub fn parse_date(value: &str) -> Result<DateTime<FixedOffset>, BlogError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map_err(|e| BlogError::Parse(format!("bad date {value:?}: {e}")))
}

fn attribute(element: &BytesStart<'_>, name: &str) -> Result<Option<String>, BlogError> {
    match element.try_get_attribute(name)? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

/// Parse a feed document (or a bare `<entry>` document) into entries in
/// document order.
pub fn parse_feed(xml: &str) -> Result<Feed, BlogError> {
    let mut reader = Reader::from_str(xml);
    let mut feed = Feed::default();
    let mut current: Option<PartialEntry> = None;
    let mut capture: Option<(Field, String)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if current.is_none() && e.local_name().as_ref() == b"entry" {
                    current = Some(PartialEntry::default());
                } else if let Some(field) = read_element(&e, current.as_mut(), &mut feed)? {
                    capture = Some((field, String::new()));
                }
            }
            Event::Empty(e) => {
                // e.g. <content type="text/plain"/>: present but empty.
                let field = read_element(&e, current.as_mut(), &mut feed)?;
                if let (Some(field), Some(entry)) = (field, current.as_mut()) {
                    entry.set(field, String::new());
                }
            }
            Event::Text(t) => {
                if let Some((_, buf)) = capture.as_mut() {
                    buf.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some((_, buf)) = capture.as_mut() {
                    let text = std::str::from_utf8(&c)
                        .map_err(|e| BlogError::Parse(format!("CDATA is not UTF-8: {e}")))?;
                    buf.push_str(text);
                }
            }
            Event::End(e) => {
                let closing = Field::from_local_name(e.local_name().as_ref());
                if e.local_name().as_ref() == b"entry" {
                    if let Some(entry) = current.take() {
                        let index = feed.entries.len();
                        feed.entries.push(entry.finish(index)?);
                    }
                } else if matches!(capture, Some((field, _)) if closing == Some(field)) {
                    if let (Some((field, text)), Some(entry)) = (capture.take(), current.as_mut()) {
                        entry.set(field, text);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if current.is_some() {
        return Err(BlogError::Parse("unterminated <entry>".to_string()));
    }
    Ok(feed)
}

/// Parse a document whose root is a single `<entry>`.
pub fn parse_entry(xml: &str) -> Result<Entry, BlogError> {
    let mut feed = parse_feed(xml)?;
    match feed.entries.len() {
        1 => Ok(feed.entries.remove(0)),
        n => Err(BlogError::Parse(format!(
            "expected exactly one <entry>, found {n}"
        ))),
    }
}

/// Handle an opening or self-closing element. Returns the text field it
/// starts when inside an entry.
fn read_element(
    element: &BytesStart<'_>,
    entry: Option<&mut PartialEntry>,
    feed: &mut Feed,
) -> Result<Option<Field>, BlogError> {
    let local = element.local_name();
    match (local.as_ref(), entry) {
        (b"link", entry) => {
            read_link(element, entry, feed)?;
            Ok(None)
        }
        (b"category", Some(entry)) => {
            read_category(element, entry)?;
            Ok(None)
        }
        (name, Some(entry)) => {
            let field = Field::from_local_name(name);
            if field == Some(Field::Content) {
                entry.content_type = attribute(element, "type")?;
            }
            Ok(field)
        }
        _ => Ok(None),
    }
}

fn read_link(
    element: &BytesStart<'_>,
    entry: Option<&mut PartialEntry>,
    feed: &mut Feed,
) -> Result<(), BlogError> {
    let rel = attribute(element, "rel")?;
    let href = attribute(element, "href")?;
    match (entry, rel.as_deref()) {
        (Some(entry), Some("alternate")) => {
            entry.alternate = entry.alternate.take().or(href);
        }
        (Some(entry), Some("edit")) => entry.edit = entry.edit.take().or(href),
        (None, Some("next")) => feed.next_url = feed.next_url.take().or(href),
        _ => {}
    }
    Ok(())
}

fn read_category(element: &BytesStart<'_>, entry: &mut PartialEntry) -> Result<(), BlogError> {
    let term = attribute(element, "term")?
        .ok_or_else(|| BlogError::Parse("<category> has no term".to_string()))?;
    entry.categories.push(term);
    Ok(())
}

/// Render `entry` as a Hatena AtomPub entry document. `author` is the
/// hatena id of the posting account.
pub fn render_entry(entry: &Entry, author: &str) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    xml.push_str(&format!(
        "<entry xmlns=\"{ATOM_NS}\" xmlns:app=\"{APP_NS}\">\n"
    ));
    xml.push_str(&format!(
        "  <title>{}</title>\n",
        escape(entry.title.as_deref().unwrap_or_default())
    ));
    xml.push_str(&format!(
        "  <author><name>{}</name></author>\n",
        escape(author)
    ));
    xml.push_str(&format!(
        "  <content type=\"{}\">{}</content>\n",
        escape(entry.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE)),
        escape(entry.content.as_deref().unwrap_or_default())
    ));
    if let Some(updated) = entry.update_date {
        xml.push_str(&format!("  <updated>{}</updated>\n", updated.to_rfc3339()));
    }
    for category in &entry.categories {
        xml.push_str(&format!("  <category term=\"{}\" />\n", escape(category)));
    }
    let draft = if entry.is_public { "no" } else { "yes" };
    xml.push_str(&format!(
        "  <app:control>\n    <app:draft>{draft}</app:draft>\n  </app:control>\n"
    ));
    xml.push_str("</entry>\n");
    xml
}
