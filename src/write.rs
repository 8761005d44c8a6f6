use crate::post::TrustedHtml;
use crate::seo::MetaTag;
use crate::tile::IndexView;
use gtmpl::{Template, Value};
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

/// The template used when the project doesn't configure one.
pub const DEFAULT_INDEX_TEMPLATE: &str = include_str!("../theme/index.html");

/// Responsible for templating the index page and writing it to disk. Holds
/// the page chrome around the tile list.
pub struct Writer<'a> {
    /// The template for the index page.
    pub index_template: &'a Template,

    /// The heading of the header region (e.g., `Blog`).
    pub heading: &'a str,

    /// The URL for the site's home page, typically the destination for the
    /// site-header link.
    pub home_page: &'a Url,

    /// The URL of the feed, linked from the header region.
    pub feed_url: &'a Url,

    /// The URL of the theme's stylesheet, if any.
    pub stylesheet_url: Option<&'a Url>,

    /// The bio/introduction shown below the header.
    pub bio: &'a TrustedHtml,

    /// The page's `<meta>` tags.
    pub meta: &'a [MetaTag],

    /// The page's JSON-LD structured data.
    pub structured_data: &'a TrustedHtml,
}

impl Writer<'_> {
    /// Converts an [`IndexView`] plus the page chrome into a [`Value`]. The
    /// result is a [`Value::Object`] with the fields of the view
    /// (`site_title`, `tiles`) and of the [`Writer`] (`heading`,
    /// `home_page`, `feed_url`, `stylesheet_url`, `bio`, `meta`,
    /// `structured_data`).
    pub fn to_value(&self, view: &IndexView) -> Value {
        let escaped = |s: &str| Value::String(TrustedHtml::escape(s).to_string());

        let mut value = Value::from(view);
        if let Value::Object(obj) = &mut value {
            obj.insert("heading".to_owned(), escaped(self.heading));
            obj.insert("home_page".to_owned(), escaped(self.home_page.as_str()));
            obj.insert("feed_url".to_owned(), escaped(self.feed_url.as_str()));
            obj.insert(
                "stylesheet_url".to_owned(),
                match self.stylesheet_url {
                    Some(url) => escaped(url.as_str()),
                    None => Value::Nil,
                },
            );
            obj.insert(
                "bio".to_owned(),
                Value::String(self.bio.as_str().to_owned()),
            );
            obj.insert(
                "meta".to_owned(),
                Value::Array(self.meta.iter().map(Value::from).collect()),
            );
            obj.insert(
                "structured_data".to_owned(),
                Value::String(self.structured_data.as_str().to_owned()),
            );
        }
        value
    }

    /// Templates the index page into a string.
    pub fn render(&self, view: &IndexView) -> Result<String> {
        let mut out: Vec<u8> = Vec::new();
        self.index_template
            .execute(&mut out, &gtmpl::Context::from(self.to_value(view))?)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Templates the index page and writes it to `path`, creating parent
    /// directories as needed.
    pub fn write_index(&self, view: &IndexView, path: &Path) -> Result<()> {
        let html = self.render(view)?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, html)?;
        info!(path = %path.display(), tiles = view.tiles.len(), "wrote index page");
        Ok(())
    }
}

/// Loads the template file contents, concatenates them, and parses the
/// result into a template. Falls back to [`DEFAULT_INDEX_TEMPLATE`] when no
/// files are given.
pub fn parse_template<P: AsRef<Path>>(
    template_files: impl Iterator<Item = P>,
) -> Result<Template> {
    let mut contents = String::new();
    for template_file in template_files {
        use std::io::Read;
        let template_file = template_file.as_ref();
        debug!(path = %template_file.display(), "loading template file");
        File::open(&template_file)
            .map_err(|e| Error::OpenTemplateFile {
                path: template_file.to_owned(),
                err: e,
            })?
            .read_to_string(&mut contents)?;
        contents.push(' ');
    }
    if contents.is_empty() {
        contents.push_str(DEFAULT_INDEX_TEMPLATE);
    }

    let mut template = Template::default();
    template.parse(&contents).map_err(Error::ParseTemplate)?;
    Ok(template)
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate(String),

    /// An error during templating.
    Template(String),

    /// An error writing the output files.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`]. This
    /// allows us to use the `?` operator for fallible template operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate(err) => write!(f, "Parsing template: {}", err),
            Error::Template(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ParseTemplate(_) => None,
            Error::Template(_) => None,
            Error::Io(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::{ImageRef, PostRecord};
    use crate::seo::meta_tags;
    use crate::tile::render;
    use chrono::NaiveDate;

    fn post(slug: &str, title: Option<&str>, photos: usize) -> PostRecord {
        PostRecord {
            slug: slug.to_owned(),
            title: title.map(String::from),
            url: Url::parse(&format!("https://example.org/{}/", slug)).unwrap(),
            publish_date: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            reading_time_minutes: 4.5,
            photo_count: photos,
            preview_image: None,
            excerpt: TrustedHtml::from_trusted("<strong>Muddy</strong>"),
        }
    }

    fn render_page(posts: &[PostRecord]) -> Result<String> {
        let template = parse_template(std::iter::empty::<&Path>())?;
        let home_page = Url::parse("https://example.org/").unwrap();
        let feed_url = Url::parse("https://example.org/rss.xml").unwrap();
        let bio = TrustedHtml::from_markdown("I ride *bikes*.");
        let meta = meta_tags("Blog", Some("Rides & code"), &home_page);
        let structured_data = TrustedHtml::from_trusted(r#"{"@type":"WebSite"}"#);
        let writer = Writer {
            index_template: &template,
            heading: "Blog",
            home_page: &home_page,
            feed_url: &feed_url,
            stylesheet_url: None,
            bio: &bio,
            meta: &meta,
            structured_data: &structured_data,
        };
        writer.render(&render("Fish & Chips", posts))
    }

    #[test]
    fn test_render_page_chrome() -> Result<()> {
        let html = render_page(&[])?;
        assert!(html.contains("<h1>Blog</h1>"));
        assert!(html.contains(r#"href="https://example.org/rss.xml""#));
        assert!(html.contains("Fish &amp; Chips"));
        assert!(html.contains("<p>I ride <em>bikes</em>.</p>"));
        assert!(html.contains(r#"<meta property="og:type" content="website">"#));
        assert!(html.contains(r#"<meta name="description" content="Rides &amp; code">"#));
        assert!(html.contains(r#"<script type="application/ld+json">{"@type":"WebSite"}</script>"#));
        assert!(!html.contains("<article"));
        assert!(!html.contains("stylesheet"));
        Ok(())
    }

    #[test]
    fn test_render_tiles() -> Result<()> {
        let mut posts = vec![post("a", Some("First"), 0), post("b", None, 2)];
        posts[1].preview_image = Some(ImageRef {
            url: Url::parse("https://example.org/b/cover.jpg").unwrap(),
            width: Some(800),
        });
        let html = render_page(&posts)?;

        assert_eq!(2, html.matches("<article").count());
        assert_eq!(1, html.matches("blog-post-tile-reverse-order").count());
        assert!(html.contains(r#"<h3 class="blog-post-tile-title">First</h3>"#));
        assert!(html.contains(r#"<h3 class="blog-post-tile-title">b</h3>"#));
        assert!(html.contains(r#"href="https://example.org/a/""#));
        assert!(html.contains("January 01, 2021<span> &bull; </span>5 min read</small>"));
        assert!(html.contains("5 min read<span> &bull; </span>2 photos</small>"));
        assert!(html.contains(
            r#"<img src="https://example.org/b/cover.jpg" width="800" alt="b">"#
        ));
        assert_eq!(1, html.matches("<img").count());
        assert_eq!(2, html.matches("<strong>Muddy</strong>").count());

        // the reversed tile is the second one
        let reversed = html.find("blog-post-tile-reverse-order").unwrap();
        let second = html.rfind("<article").unwrap();
        assert!(reversed > second);
        Ok(())
    }

    #[test]
    fn test_write_index() -> Result<()> {
        let dir = std::env::temp_dir().join("blogindex-write-test");
        let path = dir.join("nested").join("index.html");
        let _ = std::fs::remove_dir_all(&dir);

        let template = parse_template(std::iter::empty::<&Path>())?;
        let url = Url::parse("https://example.org/").unwrap();
        let empty = TrustedHtml::default();
        let writer = Writer {
            index_template: &template,
            heading: "Blog",
            home_page: &url,
            feed_url: &url,
            stylesheet_url: Some(&url),
            bio: &empty,
            meta: &[],
            structured_data: &empty,
        };
        writer.write_index(&render("Site", &[post("a", None, 0)]), &path)?;

        let html = std::fs::read_to_string(&path)?;
        assert!(html.contains(r#"<link rel="stylesheet" href="https://example.org/">"#));
        assert!(!html.contains("blog-index-bio"));
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn test_parse_template_missing_file() {
        assert!(matches!(
            parse_template(std::iter::once(Path::new("/nonexistent/index.html"))),
            Err(Error::OpenTemplateFile { .. })
        ));
    }
}
