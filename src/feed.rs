//! Support for creating Atom feeds from a list of posts.

use crate::config::Author;
use crate::post::PostRecord;
use atom_syndication::{Entry, Error as AtomError, Feed, Link, Person};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;
use url::Url;

/// Bundled configuration for creating a feed.
pub struct FeedConfig {
    pub title: String,
    pub id: String,
    pub author: Option<Author>,
    pub home_page: Url,
    pub feed_url: Url,
}

/// Creates a feed from some configuration ([`FeedConfig`]) and a list of
/// [`PostRecord`]s and writes the result to a [`std::io::Write`]. This
/// function takes ownership of the provided [`FeedConfig`].
pub fn write_feed<W: Write>(config: FeedConfig, posts: &[PostRecord], w: W) -> Result<()> {
    feed(config, posts).write_to(w)?;
    Ok(())
}

/// Like [`write_feed`] but creates the file at `path` (and its parent
/// directories).
pub fn write_feed_file(config: FeedConfig, posts: &[PostRecord], path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    write_feed(config, posts, File::create(path)?)?;
    info!(path = %path.display(), entries = posts.len(), "wrote feed");
    Ok(())
}

fn feed(config: FeedConfig, posts: &[PostRecord]) -> Feed {
    let mut feed = Feed {
        entries: feed_entries(&config, posts),
        title: config.title.into(),
        id: config.id,
        authors: author_to_people(config.author),
        links: vec![
            Link {
                href: config.home_page.to_string(),
                rel: "alternate".to_owned(),
                ..Default::default()
            },
            Link {
                href: config.feed_url.to_string(),
                rel: "self".to_owned(),
                ..Default::default()
            },
        ],
        ..Default::default()
    };
    // newest post, not build time; an empty feed keeps Atom's epoch default
    if let Some(newest) = posts.iter().map(|p| p.publish_date).max() {
        feed.updated = midnight_utc(newest);
    }
    feed
}

fn feed_entries(config: &FeedConfig, posts: &[PostRecord]) -> Vec<Entry> {
    posts
        .iter()
        .map(|post| {
            let date = midnight_utc(post.publish_date);
            Entry {
                id: post.url.to_string(),
                title: post.display_title().to_owned().into(),
                updated: date,
                authors: author_to_people(config.author.clone()),
                links: vec![Link {
                    href: post.url.to_string(),
                    rel: "alternate".to_owned(),
                    ..Default::default()
                }],
                summary: match post.excerpt.is_empty() {
                    true => None,
                    false => Some(post.excerpt.as_str().to_owned().into()),
                },
                published: Some(date),
                ..Default::default()
            }
        })
        .collect()
}

// Atom wants a full timestamp but posts only carry a date; use midnight UTC.
fn midnight_utc(date: NaiveDate) -> DateTime<FixedOffset> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)).into()
}

fn author_to_people(author: Option<Author>) -> Vec<Person> {
    match author {
        Some(author) => vec![Person {
            name: author.name,
            email: author.email,
            uri: None,
        }],
        None => Vec::new(),
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed. Variants inlude I/O and Atom
/// issues.
#[derive(Debug)]
pub enum Error {
    /// Returned when there is a generic I/O error.
    Io(std::io::Error),

    /// Returned when there is an Atom-related error.
    Atom(AtomError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(f),
            Error::Atom(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Atom(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator in fallible feed operations.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<AtomError> for Error {
    /// Converts [`AtomError`]s into [`Error`]. This allows us to use the `?`
    /// operator in fallible feed operations.
    fn from(err: AtomError) -> Error {
        Error::Atom(err)
    }
}
