//! The library code for the `blogindex` generator, which renders the blog
//! index page of a static site. The architecture can be generally broken
//! down into three distinct steps:
//!
//! 1. Querying posts from source files on disk ([`crate::parser`])
//! 2. Deriving display-ready tiles from the posts ([`crate::tile`])
//! 3. Rendering the index page and the feed to disk ([`crate::write`],
//!    [`crate::feed`])
//!
//! The second step is pure: [`tile::PostListRenderer`] maps each
//! [`post::PostRecord`] to a [`tile::TileDescriptor`] (title fallback,
//! formatted date, reading time and photo count, alternating layout) without
//! touching markup, so it can be tested without a template.
//!
//! The third step wraps the tiles in page chrome (header with feed link, bio,
//! [`seo`] meta tags and structured data), applies the index template, and
//! writes the result alongside an Atom feed of the same posts.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod feed;
pub mod format;
pub mod parser;
pub mod post;
pub mod seo;
pub mod tile;
pub mod write;
