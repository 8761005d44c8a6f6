//! Defines the [`PostListRenderer`], which turns the [`PostRecord`]s
//! returned by the content query into display-ready [`TileDescriptor`]s, one
//! per post-summary card on the index page. This step is pure; emitting
//! markup happens later in [`crate::write`].

use crate::format::{English, Format};
use crate::post::{ImageRef, PostRecord, TrustedHtml};
use gtmpl::Value;
use std::collections::HashMap;
use url::Url;

/// Everything the index template needs to render a single tile.
#[derive(Clone, Debug, PartialEq)]
pub struct TileDescriptor {
    /// Zero-based position of the tile in the list.
    pub position: usize,

    /// Whether the image and description columns swap places. True for
    /// every odd position so tiles alternate down the page.
    pub reversed_layout: bool,

    pub slug: String,
    pub url: Url,
    pub title: String,
    pub display_date: String,
    pub display_reading_time: String,

    /// `None` when the post has no photos.
    pub display_photo_count: Option<String>,

    pub preview_image: Option<ImageRef>,
    pub excerpt: TrustedHtml,
}

/// The result of a single render pass.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexView {
    pub site_title: String,

    /// One tile per input post, in input order.
    pub tiles: Vec<TileDescriptor>,
}

/// Derives [`TileDescriptor`]s from [`PostRecord`]s using a [`Format`] for
/// the human-readable fields.
pub struct PostListRenderer<F> {
    format: F,
}

impl Default for PostListRenderer<English> {
    fn default() -> Self {
        PostListRenderer::new(English)
    }
}

impl<F: Format> PostListRenderer<F> {
    pub fn new(format: F) -> PostListRenderer<F> {
        PostListRenderer { format }
    }

    /// Renders `posts` into an [`IndexView`]. The posts are expected to be
    /// sorted already; their order is preserved.
    pub fn render(&self, site_title: &str, posts: &[PostRecord]) -> IndexView {
        IndexView {
            site_title: site_title.to_owned(),
            tiles: posts
                .iter()
                .enumerate()
                .map(|(position, post)| self.tile(position, post))
                .collect(),
        }
    }

    fn tile(&self, position: usize, post: &PostRecord) -> TileDescriptor {
        TileDescriptor {
            position,
            reversed_layout: position % 2 == 1,
            slug: post.slug.clone(),
            url: post.url.clone(),
            title: post.display_title().to_owned(),
            display_date: self.format.date(post.publish_date),
            display_reading_time: self
                .format
                .reading_time(post.reading_time_minutes),
            display_photo_count: self.format.photo_count(post.photo_count),
            preview_image: post.preview_image.clone(),
            excerpt: post.excerpt.clone(),
        }
    }
}

/// Renders `posts` with the default [`English`] format.
pub fn render(site_title: &str, posts: &[PostRecord]) -> IndexView {
    PostListRenderer::new(English).render(site_title, posts)
}

fn escaped(text: &str) -> Value {
    Value::String(TrustedHtml::escape(text).to_string())
}

impl From<&ImageRef> for Value {
    /// Converts an [`ImageRef`] into a [`Value`] with fields `src` and
    /// `width` (nil when unknown).
    fn from(image: &ImageRef) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("src".to_owned(), escaped(image.url.as_str()));
        m.insert(
            "width".to_owned(),
            match image.width {
                Some(width) => Value::from(u64::from(width)),
                None => Value::Nil,
            },
        );
        Value::Object(m)
    }
}

impl From<&TileDescriptor> for Value {
    /// Converts a [`TileDescriptor`] into a [`Value`] for templating. All
    /// text fields are HTML-escaped here; only the excerpt is inserted
    /// verbatim. Absent optional fields become [`Value::Nil`] so templates
    /// can test them with `{{if}}`/`{{with}}`.
    fn from(tile: &TileDescriptor) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("position".to_owned(), Value::from(tile.position as u64));
        m.insert("reversed".to_owned(), Value::Bool(tile.reversed_layout));
        m.insert("slug".to_owned(), escaped(&tile.slug));
        m.insert("url".to_owned(), escaped(tile.url.as_str()));
        m.insert("title".to_owned(), escaped(&tile.title));
        m.insert("date".to_owned(), escaped(&tile.display_date));
        m.insert(
            "reading_time".to_owned(),
            escaped(&tile.display_reading_time),
        );
        m.insert(
            "photo_count".to_owned(),
            match &tile.display_photo_count {
                Some(count) => escaped(count),
                None => Value::Nil,
            },
        );
        m.insert(
            "preview_image".to_owned(),
            match &tile.preview_image {
                Some(image) => {
                    let mut value = Value::from(image);
                    if let Value::Object(obj) = &mut value {
                        obj.insert("alt".to_owned(), escaped(&tile.title));
                    }
                    value
                }
                None => Value::Nil,
            },
        );
        m.insert(
            "excerpt".to_owned(),
            Value::String(tile.excerpt.as_str().to_owned()),
        );
        Value::Object(m)
    }
}

impl From<&IndexView> for Value {
    /// Converts an [`IndexView`] into a [`Value::Object`] with fields
    /// `site_title` and `tiles`.
    fn from(view: &IndexView) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("site_title".to_owned(), escaped(&view.site_title));
        m.insert(
            "tiles".to_owned(),
            Value::Array(view.tiles.iter().map(Value::from).collect()),
        );
        Value::Object(m)
    }
}
