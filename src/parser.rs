//! Defines the [`Parser`] and [`Error`] types: the content query which loads
//! [`PostRecord`]s from source files, keeps the ones in the index's category,
//! and sorts them most-recent first.

use std::{
    collections::HashMap,
    fmt,
    fs::File,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use pulldown_cmark::{Event, Parser as MarkdownParser};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;
use walkdir::WalkDir;

use crate::post::{photo_count, ImageRef, PostRecord, TrustedHtml};

const MARKDOWN_EXTENSION: &str = "md";
const BUNDLE_INDEX: &str = "index.md";

/// Average adult reading speed used for reading-time estimates.
pub const WORDS_PER_MINUTE: f64 = 200.0;

/// Posts without a `category` field are assumed to belong to this one.
pub const DEFAULT_CATEGORY: &str = "blog";

/// Parses [`PostRecord`] objects from source files.
pub struct Parser<'a> {
    /// `posts_url` is the base URL for post pages; a post's URL is
    /// `{posts_url}/{slug}/`.
    posts_url: &'a Url,

    /// Only posts in this category are returned.
    category: &'a str,

    /// The display width attached to preview images, if any.
    preview_image_width: Option<u32>,
}

impl<'a> Parser<'a> {
    /// Constructs a new parser. See fields on [`Parser`] for argument
    /// descriptions.
    pub fn new(
        posts_url: &'a Url,
        category: &'a str,
        preview_image_width: Option<u32>,
    ) -> Parser<'a> {
        Parser {
            posts_url,
            category,
            preview_image_width,
        }
    }

    /// Searches `source_directory` (recursively) for posts and returns the
    /// ones in the parser's category sorted by date (most recent first). A
    /// post is either a markdown file (`{slug}.md`) or a bundle directory
    /// holding an `index.md` alongside the post's assets (`{slug}/index.md`).
    /// Posts in subdirectories keep the directory in their slug, so
    /// `2021/ride.md` becomes `2021/ride`. Two source files resolving to the
    /// same slug are an error. Each post file must be structured as follows:
    ///
    /// 1. Initial frontmatter fence (`---`)
    /// 2. YAML frontmatter with a `date` and optionally `title`, `spoiler`,
    ///    `indexImage`, `images`, `blogImages`, and `category`
    /// 3. Terminal frontmatter fence (`---`)
    /// 4. Post body
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// title: Hello, world!
    /// date: 2021-04-16
    /// spoiler: My <em>first</em> ride
    /// ---
    /// # Hello
    ///
    /// World
    /// ```
    pub fn parse_posts(&self, source_directory: &Path) -> Result<Vec<PostRecord>> {
        let mut posts = Vec::new();
        let mut skipped = 0;
        let mut seen: HashMap<String, PathBuf> = HashMap::new();
        for result in WalkDir::new(source_directory) {
            let entry = result?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(slug) = Self::slug(source_directory, entry.path()) {
                if let Some(first) = seen.get(&slug) {
                    return Err(Error::DuplicateSlug {
                        slug,
                        first: first.clone(),
                        second: entry.path().to_owned(),
                    });
                }
                seen.insert(slug.clone(), entry.path().to_owned());
                match self.parse_post(&slug, entry.path())? {
                    Some(post) => posts.push(post),
                    None => skipped += 1,
                }
            }
        }

        posts.sort_by(|a, b| {
            b.publish_date
                .cmp(&a.publish_date)
                .then_with(|| a.slug.cmp(&b.slug))
        });
        info!(
            directory = %source_directory.display(),
            found = posts.len(),
            skipped,
            category = self.category,
            "parsed posts"
        );
        Ok(posts)
    }

    /// Returns the slug for a post source file or `None` if the file isn't a
    /// post. The slug is the slugified path relative to `source_directory`
    /// less the extension; bundle posts take their last segment from the
    /// directory name.
    fn slug(source_directory: &Path, path: &Path) -> Option<String> {
        if path.extension()?.to_str()? != MARKDOWN_EXTENSION {
            return None;
        }
        let relative = path.strip_prefix(source_directory).ok()?;
        let (dir, stem) = if relative.file_name()? == BUNDLE_INDEX {
            let bundle = relative.parent()?;
            (bundle.parent()?, bundle.file_name()?)
        } else {
            (relative.parent()?, relative.file_stem()?)
        };

        let mut segments = Vec::new();
        for component in dir.components() {
            segments.push(slug::slugify(component.as_os_str().to_str()?));
        }
        segments.push(slug::slugify(stem.to_str()?));
        Some(segments.join("/"))
    }

    /// Parses a single post. Returns `Ok(None)` if the post belongs to some
    /// other category.
    fn parse_post(&self, slug: &str, path: &Path) -> Result<Option<PostRecord>> {
        match self._parse_post(slug, path) {
            Ok(p) => Ok(p),
            Err(e) => Err(Error::Annotated(
                format!("parsing post `{}`", path.display()),
                Box::new(e),
            )),
        }
    }

    fn _parse_post(&self, slug: &str, path: &Path) -> Result<Option<PostRecord>> {
        use std::io::Read;
        let mut contents = String::new();
        File::open(path)?.read_to_string(&mut contents)?;
        let input: &str = &contents;

        let (yaml_start, yaml_stop, body_start) = frontmatter_indices(input)?;
        let frontmatter: Frontmatter =
            serde_yaml::from_str(&input[yaml_start..yaml_stop])?;

        let category =
            frontmatter.category.as_deref().unwrap_or(DEFAULT_CATEGORY);
        if category != self.category {
            debug!(slug, category, "skipping post outside of category");
            return Ok(None);
        }

        let publish_date = NaiveDate::parse_from_str(frontmatter.date.trim(), "%Y-%m-%d")
            .map_err(|err| Error::InvalidDate {
                date: frontmatter.date.clone(),
                err,
            })?;

        // NOTE: the trailing slash matters; without it, `Url::join` would
        // treat the slug as a file name and resolve the preview image next
        // to it rather than inside of it.
        let url = self.posts_url.join(&format!("{}/", slug))?;
        let preview_image = match &frontmatter.index_image {
            Some(image) => Some(ImageRef {
                url: url.join(image)?,
                width: self.preview_image_width,
            }),
            None => None,
        };

        Ok(Some(PostRecord {
            slug: slug.to_owned(),
            title: frontmatter.title,
            url,
            publish_date,
            reading_time_minutes: reading_time_minutes(&input[body_start..]),
            photo_count: photo_count(
                frontmatter.images.len(),
                frontmatter.blog_images.len(),
            ),
            preview_image,
            excerpt: TrustedHtml::from_trusted(frontmatter.spoiler),
        }))
    }
}

/// Returns `(yaml_start, yaml_stop, body_start)`. The closing fence must be a
/// line of its own; a `---` inside a frontmatter value doesn't end it.
fn frontmatter_indices(input: &str) -> Result<(usize, usize, usize)> {
    const FENCE: &str = "---";
    const CLOSING_FENCE: &str = "\n---";
    if !input.starts_with(FENCE) {
        return Err(Error::FrontmatterMissingStartFence);
    }

    let mut search_start = FENCE.len();
    while let Some(offset) = input[search_start..].find(CLOSING_FENCE) {
        let newline = search_start + offset;
        let body_start = newline + CLOSING_FENCE.len();
        let rest = &input[body_start..];
        if rest.is_empty() || rest.starts_with('\n') || rest.starts_with("\r\n") {
            return Ok((FENCE.len(), newline + 1, body_start));
        }
        search_start = body_start;
    }
    Err(Error::FrontmatterMissingEndFence)
}

/// Estimates the time it takes to read a markdown document. Only prose and
/// inline code count towards the word total; markup does not.
pub fn reading_time_minutes(markdown: &str) -> f64 {
    let words: usize = MarkdownParser::new(markdown)
        .map(|event| match event {
            Event::Text(text) | Event::Code(text) => {
                text.split_whitespace().count()
            }
            _ => 0,
        })
        .sum();
    words as f64 / WORDS_PER_MINUTE
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
struct Frontmatter {
    /// The title of the post.
    #[serde(default)]
    pub title: Option<String>,

    /// The date of the post (`YYYY-MM-DD`).
    pub date: String,

    /// The HTML excerpt shown on index tiles.
    #[serde(default)]
    pub spoiler: String,

    /// Path (relative to the post) of the tile's preview image.
    #[serde(default)]
    pub index_image: Option<String>,

    /// General images attached to the post.
    #[serde(default)]
    pub images: Vec<serde_yaml::Value>,

    /// Images embedded inline in the post body.
    #[serde(default)]
    pub blog_images: Vec<serde_yaml::Value>,

    #[serde(default)]
    pub category: Option<String>,
}

/// Represents the result of a [`PostRecord`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`PostRecord`] object.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post source file is missing its starting frontmatter
    /// fence (`---`).
    FrontmatterMissingStartFence,

    /// Returned when a post source file is missing its terminal frontmatter
    /// fence (`---` i.e., the starting fence was found but the ending one was
    /// missing).
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when the frontmatter `date` isn't a `YYYY-MM-DD` date.
    InvalidDate {
        date: String,
        err: chrono::ParseError,
    },

    /// Returned when there is a problem parsing URLs.
    UrlParse(url::ParseError),

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// Returned for WalkDir I/O errors.
    WalkDir(walkdir::Error),

    /// Returned when two source files resolve to the same slug (e.g.,
    /// `ride.md` and `ride/index.md`) and would share a URL.
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingStartFence => {
                write!(f, "Post must begin with `---`")
            }
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::InvalidDate { date, err } => {
                write!(f, "invalid date `{}`: {}", date, err)
            }
            Error::UrlParse(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::DuplicateSlug {
                slug,
                first,
                second,
            } => write!(
                f,
                "posts `{}` and `{}` share the slug `{}`",
                first.display(),
                second.display(),
                slug
            ),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingStartFence => None,
            Error::FrontmatterMissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::InvalidDate { date: _, err } => Some(err),
            Error::UrlParse(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::DuplicateSlug { .. } => None,
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to use
    /// the `?` operator for URL parsing and joining functions.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator while walking the source directory.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

/// Returns the path of the `testdata` fixture directory.
#[cfg(test)]
pub(crate) fn testdata(relative: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join(relative)
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(category: &str) -> Result<Vec<PostRecord>> {
        let posts_url = Url::parse("https://example.org/")?;
        Parser::new(&posts_url, category, Some(800))
            .parse_posts(&testdata("site/posts"))
    }

    #[test]
    fn test_parse_posts() -> Result<()> {
        let posts = parse("blog")?;
        let slugs: Vec<&str> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(vec!["gravel-weekend", "first-ride"], slugs);

        let gravel = &posts[0];
        assert_eq!(Some(String::from("Gravel Weekend")), gravel.title);
        assert_eq!(
            NaiveDate::from_ymd_opt(2021, 2, 1).unwrap(),
            gravel.publish_date
        );
        assert_eq!(Url::parse("https://example.org/gravel-weekend/")?, gravel.url);
        assert_eq!(3, gravel.photo_count);
        assert_eq!(
            Some(ImageRef {
                url: Url::parse("https://example.org/gravel-weekend/cover.jpg")?,
                width: Some(800),
            }),
            gravel.preview_image
        );
        assert_eq!("A <em>muddy</em> two days", gravel.excerpt.as_str());

        let first = &posts[1];
        assert_eq!(None, first.title);
        assert_eq!(0, first.photo_count);
        assert_eq!(None, first.preview_image);
        assert!(first.excerpt.is_empty());
        Ok(())
    }

    #[test]
    fn test_parse_posts_other_category() -> Result<()> {
        let posts = parse("projects")?;
        let slugs: Vec<&str> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(vec!["a-side-project"], slugs);
        Ok(())
    }

    #[test]
    fn test_frontmatter_fences() {
        assert!(matches!(
            frontmatter_indices("title: x\n---\n"),
            Err(Error::FrontmatterMissingStartFence)
        ));
        assert!(matches!(
            frontmatter_indices("---\ntitle: x\n"),
            Err(Error::FrontmatterMissingEndFence)
        ));
        assert!(matches!(
            frontmatter_indices("---\ndate: 2021-01-01\n---\nbody"),
            Ok((3, 21, 24))
        ));
        assert!(matches!(
            frontmatter_indices("---\ndate: 2021-01-01\n---"),
            Ok((3, 21, 24))
        ));
        assert!(matches!(
            frontmatter_indices("---\ndate: 2021-01-01\n---\r\nbody"),
            Ok((3, 21, 24))
        ));
        assert!(matches!(
            frontmatter_indices("---\nspoiler: a---b\n"),
            Err(Error::FrontmatterMissingEndFence)
        ));
    }

    #[test]
    fn test_frontmatter_value_with_dashes() -> Result<()> {
        let posts_url = Url::parse("https://example.org/")?;
        let parser = Parser::new(&posts_url, DEFAULT_CATEGORY, None);
        let post = match parser.parse_post("dashes", &testdata("dashes.md"))? {
            Some(post) => post,
            None => panic!("wanted a post in the default category"),
        };
        assert_eq!("mud---lots of it", post.excerpt.as_str());
        assert_eq!(NaiveDate::from_ymd_opt(2021, 4, 1).unwrap(), post.publish_date);
        assert_eq!(Some(String::from("A---B")), post.title);
        Ok(())
    }

    #[test]
    fn test_parse_posts_duplicate_slug() -> Result<()> {
        let posts_url = Url::parse("https://example.org/")?;
        let parser = Parser::new(&posts_url, DEFAULT_CATEGORY, None);
        match parser.parse_posts(&testdata("duplicate-posts")) {
            Err(Error::DuplicateSlug {
                slug,
                first,
                second,
            }) => {
                assert_eq!("dup", slug);
                assert_ne!(first, second);
            }
            _ => panic!("wanted a duplicate-slug error"),
        }
        Ok(())
    }

    #[test]
    fn test_parse_posts_nested() -> Result<()> {
        let posts_url = Url::parse("https://example.org/")?;
        let parser = Parser::new(&posts_url, DEFAULT_CATEGORY, None);
        let posts = parser.parse_posts(&testdata("nested-posts"))?;
        let slugs: Vec<&str> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(vec!["2021/ride", "ride"], slugs);
        assert_eq!(Url::parse("https://example.org/2021/ride/")?, posts[0].url);
        assert_eq!(Url::parse("https://example.org/ride/")?, posts[1].url);
        Ok(())
    }

    #[test]
    fn test_parse_post_invalid_date() -> Result<()> {
        let posts_url = Url::parse("https://example.org/")?;
        let parser = Parser::new(&posts_url, DEFAULT_CATEGORY, None);
        match parser.parse_post("bad-date", &testdata("bad-date.md")) {
            Err(Error::Annotated(_, err)) => {
                assert!(matches!(*err, Error::InvalidDate { .. }))
            }
            _ => panic!("wanted an annotated invalid-date error"),
        }
        Ok(())
    }

    #[test]
    fn test_slug() {
        let root = Path::new("posts");
        assert_eq!(
            Some(String::from("my-post")),
            Parser::slug(root, Path::new("posts/My Post.md"))
        );
        assert_eq!(
            Some(String::from("bundle")),
            Parser::slug(root, Path::new("posts/bundle/index.md"))
        );
        assert_eq!(
            Some(String::from("2021/ride")),
            Parser::slug(root, Path::new("posts/2021/ride.md"))
        );
        assert_eq!(
            Some(String::from("2021/gravel-weekend")),
            Parser::slug(root, Path::new("posts/2021/Gravel Weekend/index.md"))
        );
        assert_eq!(None, Parser::slug(root, Path::new("posts/bundle/cover.jpg")));
        assert_eq!(None, Parser::slug(root, Path::new("posts/index.md")));
    }

    #[test]
    fn test_reading_time_minutes() {
        let words = vec!["word"; 400].join(" ");
        let markdown = format!("# Title\n\n{}\n\n`code`", words);
        // 1 heading word + 400 words + 1 code span
        assert!((reading_time_minutes(&markdown) - 402.0 / 200.0).abs() < 1e-9);
        assert_eq!(0.0, reading_time_minutes(""));
    }
}
