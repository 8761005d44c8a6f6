//! Loads the project configuration ([`Config`]) from a `blogindex.yaml`
//! project file.

use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file. [`Config::from_directory`] searches for it
/// in the given directory and each of its ancestors.
pub const PROJECT_FILE: &str = "blogindex.yaml";

const DEFAULT_HEADING: &str = "Blog";
const DEFAULT_FEED: &str = "rss.xml";
const DEFAULT_POSTS_DIRECTORY: &str = "posts";
const DEFAULT_PREVIEW_IMAGE_WIDTH: u32 = 800;

/// The site's author. Used for the feed and the structured data.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Author {
    pub name: String,

    /// The name under which the site is also known. Defaults to `name`.
    #[serde(default)]
    pub alternate_name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,
}

fn default_heading() -> String {
    DEFAULT_HEADING.to_owned()
}

fn default_category() -> String {
    crate::parser::DEFAULT_CATEGORY.to_owned()
}

fn default_feed() -> String {
    DEFAULT_FEED.to_owned()
}

fn default_posts_directory() -> PathBuf {
    PathBuf::from(DEFAULT_POSTS_DIRECTORY)
}

fn default_preview_image_width() -> Option<u32> {
    Some(DEFAULT_PREVIEW_IMAGE_WIDTH)
}

/// The on-disk shape of the project file.
#[derive(Deserialize)]
struct Project {
    title: String,

    #[serde(default)]
    description: Option<String>,

    site_root: Url,

    #[serde(default)]
    author: Option<Author>,

    #[serde(default = "default_heading")]
    heading: String,

    /// Markdown.
    #[serde(default)]
    bio: Option<String>,

    #[serde(default = "default_category")]
    category: String,

    /// Path of the feed relative to `site_root` and to the output directory.
    #[serde(default = "default_feed")]
    feed: String,

    #[serde(default = "default_posts_directory")]
    posts_directory: PathBuf,

    #[serde(default)]
    stylesheet: Option<String>,

    #[serde(default = "default_preview_image_width")]
    preview_image_width: Option<u32>,

    #[serde(default)]
    index_template: Vec<PathBuf>,
}

/// Resolved configuration for building the index page. All paths are
/// absolute or relative to the working directory, and all URLs are absolute.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// The site title, passed to the tile renderer and the feed.
    pub title: String,
    pub description: Option<String>,
    pub author: Option<Author>,

    /// The root URL of the site. Post URLs are `{site_root}/{slug}/`.
    pub site_root: Url,

    /// The heading of the index page's header region.
    pub heading: String,

    /// The bio markdown rendered below the header.
    pub bio: Option<String>,

    /// Only posts in this category are listed.
    pub category: String,

    pub posts_source_directory: PathBuf,
    pub preview_image_width: Option<u32>,
    pub stylesheet_url: Option<Url>,

    /// The template files for the index page, concatenated before parsing.
    /// When empty, the built-in template is used.
    pub index_template: Vec<PathBuf>,

    pub feed_url: Url,

    /// Where the feed is written.
    pub feed_output_path: PathBuf,

    /// Where `index.html` is written.
    pub index_output_path: PathBuf,
}

impl Config {
    /// Searches `dir` and its ancestors for a project file and loads it.
    /// `output_directory` is the directory into which the page and the feed
    /// will be written.
    pub fn from_directory(dir: &Path, output_directory: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.is_file() {
            Config::from_project_file(&path, output_directory)
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, output_directory),
                None => Err(Error::MissingProjectFile),
            }
        }
    }

    /// Loads the project file at `path`.
    pub fn from_project_file(path: &Path, output_directory: &Path) -> Result<Config> {
        let file = File::open(path).map_err(|err| Error::OpenProjectFile {
            path: path.to_owned(),
            err,
        })?;
        let project: Project = serde_yaml::from_reader(file)?;
        let project_root = path
            .parent()
            .ok_or_else(|| Error::MissingParentDirectory(path.to_owned()))?;

        Ok(Config {
            feed_url: project.site_root.join(&project.feed)?,
            feed_output_path: output_directory.join(&project.feed),
            index_output_path: output_directory.join("index.html"),
            posts_source_directory: project_root.join(&project.posts_directory),
            stylesheet_url: match &project.stylesheet {
                Some(stylesheet) => Some(project.site_root.join(stylesheet)?),
                None => None,
            },
            index_template: project
                .index_template
                .iter()
                .map(|relpath| project_root.join(relpath))
                .collect(),
            title: project.title,
            description: project.description,
            author: project.author,
            site_root: project.site_root,
            heading: project.heading,
            bio: project.bio,
            category: project.category,
            preview_image_width: project.preview_image_width,
        })
    }

    /// The name used for the site's structured data: the author's name when
    /// configured, otherwise the site title.
    pub fn site_name(&self) -> &str {
        match &self.author {
            Some(author) => &author.name,
            None => &self.title,
        }
    }

    /// The alternate name used for the site's structured data.
    pub fn site_alternate_name(&self) -> &str {
        match &self.author {
            Some(Author {
                alternate_name: Some(alternate_name),
                ..
            }) => alternate_name,
            _ => self.site_name(),
        }
    }
}

/// The result of a fallible configuration operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading the project configuration.
#[derive(Debug)]
pub enum Error {
    /// Returned when no project file was found in the directory or any of
    /// its ancestors.
    MissingProjectFile,

    /// Returned when the project file couldn't be opened.
    OpenProjectFile { path: PathBuf, err: std::io::Error },

    /// Returned when the project file path has no parent directory.
    MissingParentDirectory(PathBuf),

    /// Returned when the project file isn't valid YAML or is missing
    /// required fields.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when a configured URL can't be joined onto `site_root`.
    UrlParse(url::ParseError),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingProjectFile => write!(
                f,
                "Could not find `{}` in any parent directory",
                PROJECT_FILE
            ),
            Error::OpenProjectFile { path, err } => {
                write!(f, "Opening project file '{}': {}", path.display(), err)
            }
            Error::MissingParentDirectory(path) => write!(
                f,
                "Can't get parent directory for project file '{}'",
                path.display()
            ),
            Error::DeserializeYaml(err) => {
                write!(f, "Loading configuration: {}", err)
            }
            Error::UrlParse(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MissingProjectFile => None,
            Error::OpenProjectFile { path: _, err } => Some(err),
            Error::MissingParentDirectory(_) => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::UrlParse(err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to use
    /// the `?` operator for URL joining functions.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}
