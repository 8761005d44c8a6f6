//! Defines the [`PostRecord`], [`ImageRef`], and [`TrustedHtml`] types. A
//! [`PostRecord`] is the output of the content query ([`crate::parser`]) and
//! the input to the tile renderer ([`crate::tile`]).

use chrono::NaiveDate;
use pulldown_cmark::{escape::escape_html, html, Options, Parser};
use std::fmt;
use url::Url;

/// A fragment of HTML which is safe to drop into a page without escaping.
/// Plain strings don't convert into a [`TrustedHtml`]; construct one with
/// [`TrustedHtml::from_trusted`] when the producer vouches for the markup,
/// or with [`TrustedHtml::escape`] or [`TrustedHtml::from_markdown`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrustedHtml(String);

impl TrustedHtml {
    /// Wraps `html` as-is. The caller is responsible for sanitization (e.g.,
    /// the `spoiler` frontmatter field is written by the site author).
    pub fn from_trusted<S: Into<String>>(html: S) -> TrustedHtml {
        TrustedHtml(html.into())
    }

    /// Escapes `text` so it renders literally.
    pub fn escape(text: &str) -> TrustedHtml {
        let mut out = String::with_capacity(text.len());
        // writing into a `String` can't fail
        let _ = escape_html(&mut out, text);
        TrustedHtml(out)
    }

    /// Renders `markdown` into HTML.
    pub fn from_markdown(markdown: &str) -> TrustedHtml {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_SMART_PUNCTUATION);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        let mut out = String::new();
        html::push_html(&mut out, Parser::new_ext(markdown, options));
        TrustedHtml(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TrustedHtml {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A reference to a post's preview image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRef {
    /// The absolute URL of the image.
    pub url: Url,

    /// The width at which the image should be displayed, if known.
    pub width: Option<u32>,
}

/// A blog post as returned by the content query.
#[derive(Clone, Debug, PartialEq)]
pub struct PostRecord {
    /// Unique identifier for the post, derived from its path relative to the
    /// posts directory (e.g., `2021/ride`).
    pub slug: String,

    /// The post's title. Empty or missing titles fall back to the slug when
    /// rendered (see [`PostRecord::display_title`]).
    pub title: Option<String>,

    /// The URL of the post's page.
    pub url: Url,

    pub publish_date: NaiveDate,

    /// Estimated reading time in (fractional) minutes. Never negative.
    pub reading_time_minutes: f64,

    /// Number of photos in the post. See [`photo_count`].
    pub photo_count: usize,

    pub preview_image: Option<ImageRef>,

    /// The excerpt shown on the index page.
    pub excerpt: TrustedHtml,
}

impl PostRecord {
    /// Returns the title if it's present and not blank, otherwise the slug.
    pub fn display_title(&self) -> &str {
        match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title,
            _ => &self.slug,
        }
    }
}

/// Aggregates a post's general `images` and its inline `blogImages` into a
/// single photo count.
pub fn photo_count(images: usize, blog_images: usize) -> usize {
    images + blog_images
}
