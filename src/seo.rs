//! Page metadata for search engines and social cards: schema.org structured
//! data ([`StructuredData`]) and `<meta>` tags ([`MetaTag`]).

use crate::post::TrustedHtml;
use gtmpl::Value;
use gtmpl_derive::Gtmpl;
use serde::Serialize;
use url::Url;

/// The schema.org identity object for the site, embedded in the index page
/// as JSON-LD.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StructuredData {
    #[serde(rename = "@context")]
    pub context: &'static str,

    #[serde(rename = "@type")]
    pub kind: &'static str,

    pub url: String,
    pub name: String,

    #[serde(rename = "alternateName")]
    pub alternate_name: String,
}

impl StructuredData {
    /// Describes a `WebSite` located at `url`.
    pub fn website(url: &Url, name: &str, alternate_name: &str) -> Self {
        StructuredData {
            context: "https://schema.org",
            kind: "WebSite",
            url: url.to_string(),
            name: name.to_owned(),
            alternate_name: alternate_name.to_owned(),
        }
    }

    /// Serializes the structured data into JSON suitable for the body of a
    /// `<script type="application/ld+json">` element.
    pub fn to_json_ld(&self) -> serde_json::Result<TrustedHtml> {
        // a `</script>` inside any field must not close the element
        let json = serde_json::to_string(self)?.replace('<', "\\u003c");
        Ok(TrustedHtml::from_trusted(json))
    }
}

/// Which attribute of the `<meta>` element carries the key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetaKey {
    /// `<meta name="...">`, e.g. `description`.
    Name,

    /// `<meta property="...">`, used by Open Graph.
    Property,
}

impl MetaKey {
    fn attribute(self) -> &'static str {
        match self {
            MetaKey::Name => "name",
            MetaKey::Property => "property",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetaTag {
    pub kind: MetaKey,
    pub key: String,
    pub content: String,
}

impl MetaTag {
    pub fn name(key: &str, content: &str) -> Self {
        MetaTag {
            kind: MetaKey::Name,
            key: key.to_owned(),
            content: content.to_owned(),
        }
    }

    pub fn property(key: &str, content: &str) -> Self {
        MetaTag {
            kind: MetaKey::Property,
            key: key.to_owned(),
            content: content.to_owned(),
        }
    }
}

/// Template-facing form of a [`MetaTag`], with every field escaped.
#[derive(Gtmpl)]
struct EscapedMetaTag {
    attribute: String,
    key: String,
    content: String,
}

impl From<&MetaTag> for Value {
    /// Converts a [`MetaTag`] into a [`Value::Object`] with fields
    /// `attribute`, `key`, and `content`.
    fn from(tag: &MetaTag) -> Value {
        let escaped = EscapedMetaTag {
            attribute: tag.kind.attribute().to_owned(),
            key: TrustedHtml::escape(&tag.key).to_string(),
            content: TrustedHtml::escape(&tag.content).to_string(),
        };
        escaped.into()
    }
}

/// Returns the meta tags for the index page. The page is always an Open
/// Graph `website`.
pub fn meta_tags(title: &str, description: Option<&str>, url: &Url) -> Vec<MetaTag> {
    let mut tags = Vec::with_capacity(5);
    if let Some(description) = description {
        tags.push(MetaTag::name("description", description));
    }
    tags.push(MetaTag::property("og:title", title));
    if let Some(description) = description {
        tags.push(MetaTag::property("og:description", description));
    }
    tags.push(MetaTag::property("og:url", url.as_str()));
    tags.push(MetaTag::property("og:type", "website"));
    tags
}
