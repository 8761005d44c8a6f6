//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the blog index: querying the posts ([`crate::parser`]),
//! deriving tiles ([`crate::tile`]), rendering the index page
//! ([`crate::write`]) with its SEO metadata ([`crate::seo`]), and generating
//! the feed ([`crate::feed`]).

use crate::config::Config;
use crate::feed::{write_feed_file, Error as FeedError, FeedConfig};
use crate::parser::{Error as ParseError, Parser as PostParser};
use crate::post::TrustedHtml;
use crate::seo::{meta_tags, StructuredData};
use crate::tile;
use crate::write::{parse_template, Error as WriteError, Writer};
use std::fmt;
use tracing::info;

/// Builds the blog index from a [`Config`] object. This calls into
/// [`PostParser::parse_posts`], [`tile::render`], [`Writer::write_index`],
/// and [`write_feed_file`] which do the heavy-lifting.
pub fn build_site(config: Config) -> Result<()> {
    let post_parser = PostParser::new(
        &config.site_root,
        &config.category,
        config.preview_image_width,
    );

    // collect all posts in the index's category, most recent first
    let posts = post_parser.parse_posts(&config.posts_source_directory)?;

    let view = tile::render(&config.title, &posts);

    let index_template = parse_template(config.index_template.iter())?;
    let bio = match &config.bio {
        Some(bio) => TrustedHtml::from_markdown(bio),
        None => TrustedHtml::default(),
    };
    let meta = meta_tags(&config.title, config.description.as_deref(), &config.site_root);
    let structured_data = StructuredData::website(
        &config.site_root,
        config.site_name(),
        config.site_alternate_name(),
    )
    .to_json_ld()
    .map_err(Error::StructuredData)?;

    let writer = Writer {
        index_template: &index_template,
        heading: &config.heading,
        home_page: &config.site_root,
        feed_url: &config.feed_url,
        stylesheet_url: config.stylesheet_url.as_ref(),
        bio: &bio,
        meta: &meta,
        structured_data: &structured_data,
    };
    writer.write_index(&view, &config.index_output_path)?;

    write_feed_file(
        FeedConfig {
            title: config.title.clone(),
            id: config.site_root.to_string(),
            author: config.author.clone(),
            home_page: config.site_root.clone(),
            feed_url: config.feed_url.clone(),
        },
        &posts,
        &config.feed_output_path,
    )?;

    info!(posts = posts.len(), "built blog index");
    Ok(())
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building the index. Errors can be during parsing,
/// writing, serializing structured data, and writing the feed.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors during parsing.
    Parse(ParseError),

    /// Returned for errors templating or writing the index page.
    Write(WriteError),

    /// Returned for errors serializing the structured data.
    StructuredData(serde_json::Error),

    /// Returned for errors writing the feed.
    Feed(FeedError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::StructuredData(err) => {
                write!(f, "Serializing structured data: {}", err)
            }
            Error::Feed(err) => write!(f, "Writing feed: {}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::StructuredData(err) => Some(err),
            Error::Feed(err) => Some(err),
        }
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

impl From<FeedError> for Error {
    /// Converts [`FeedError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: FeedError) -> Error {
        Error::Feed(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::testdata;
    use std::path::Path;

    #[test]
    fn test_build_site() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let output = std::env::temp_dir().join("blogindex-build-test");
        let _ = std::fs::remove_dir_all(&output);

        let config = Config::from_project_file(&testdata("site/blogindex.yaml"), &output)?;
        build_site(config)?;

        let html = std::fs::read_to_string(output.join("index.html"))?;
        assert_eq!(2, html.matches("<article").count());
        let gravel = html.find("Gravel Weekend</h3>").ok_or("missing gravel tile")?;
        let first = html.find(">first-ride</h3>").ok_or("missing first-ride tile")?;
        assert!(gravel < first, "tiles should be most recent first");
        assert!(!html.contains("A Side Project"));
        assert!(html.contains("February 01, 2021"));
        assert!(html.contains("3 photos"));
        assert!(html.contains("A <em>muddy</em> two days"));
        assert!(html.contains(r#"src="https://example.org/gravel-weekend/cover.jpg""#));
        assert!(html.contains(r#""alternateName":"Jedr""#));
        assert!(html.contains("<p>I ride <em>bikes</em> and write software.</p>"));

        let feed = std::fs::read_to_string(output.join("rss.xml"))?;
        assert!(feed.contains("https://example.org/gravel-weekend/"));
        assert!(!feed.contains("a-side-project"));

        std::fs::remove_dir_all(&output)?;
        Ok(())
    }

    #[test]
    fn test_build_site_missing_posts_directory() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut config = Config::from_project_file(
            &testdata("site/blogindex.yaml"),
            Path::new("/tmp/blogindex-never-written"),
        )?;
        config.posts_source_directory = testdata("no-such-posts");
        assert!(matches!(build_site(config), Err(Error::Parse(_))));
        Ok(())
    }
}
