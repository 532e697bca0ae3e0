//! Turning the indexer's loosely shaped comment references into things we
//! can draw: an image, optionally with a title, a domain and a link.

use serde::Deserialize;
use serde_json::Value;
use url::Url;

const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];

/// A reference attached to a comment, as far as we care about its shape.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub enum RawReference {
    Image {
        url: Option<String>,
    },
    Webpage {
        url: Option<String>,
        opengraph: Option<OpenGraph>,
    },
    /// Any other `type` tag (or none at all)
    Other {
        url: Option<String>,
    },
    /// Not even an object
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OpenGraph {
    pub image: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnhancedReference {
    pub image: String,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub url: Option<String>,
}

impl EnhancedReference {
    fn image(url: &str) -> Self {
        EnhancedReference {
            image: url.to_owned(),
            ..Default::default()
        }
    }
}

fn string_field(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_owned)
}

impl From<Value> for RawReference {
    fn from(value: Value) -> Self {
        let Value::Object(obj) = value else {
            return RawReference::Unknown;
        };

        let url = string_field(&obj, "url");
        match obj.get("type").and_then(Value::as_str) {
            Some("image") => RawReference::Image { url },
            Some("webpage") => {
                let opengraph = match obj.get("opengraph") {
                    Some(Value::Object(og)) => Some(OpenGraph {
                        image: string_field(og, "image"),
                        title: string_field(og, "title"),
                    }),
                    _ => None,
                };
                RawReference::Webpage { url, opengraph }
            }
            _ => RawReference::Other { url },
        }
    }
}

impl RawReference {
    pub fn url(&self) -> Option<&str> {
        match self {
            RawReference::Image { url }
            | RawReference::Webpage { url, .. }
            | RawReference::Other { url, .. } => url.as_deref(),
            RawReference::Unknown => None,
        }
    }

    /// The displayable form of this reference, if it has one.
    pub fn enhance(&self) -> Option<EnhancedReference> {
        if let RawReference::Image { url: Some(url) } = self {
            if !url.is_empty() {
                return Some(EnhancedReference::image(url));
            }
        }

        if let Some(url) = self.url().filter(|url| has_image_extension(url)) {
            return Some(EnhancedReference::image(url));
        }

        match self {
            RawReference::Webpage {
                url: Some(url),
                opengraph: Some(og),
            } if !url.is_empty() => {
                let image = og.image.as_deref().filter(|img| !img.is_empty())?;
                Some(EnhancedReference {
                    image: image.to_owned(),
                    title: og.title.clone(),
                    subtitle: Some(display_domain(url)),
                    url: Some(url.clone()),
                })
            }
            RawReference::Image { .. }
            | RawReference::Webpage { .. }
            | RawReference::Other { .. }
            | RawReference::Unknown => None,
        }
    }
}

fn has_image_extension(url: &str) -> bool {
    let url = url.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| url.ends_with(ext))
}

/// Hostname of `url` without a leading `www.`. Unparseable or hostless
/// urls are shown as-is.
pub fn display_domain(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => host.strip_prefix("www.").unwrap_or(host).to_owned(),
            None => url.to_owned(),
        },
        Err(_) => url.to_owned(),
    }
}

/// Displayable references in their original order. Callers decide how many
/// they want.
pub fn enhance_references(
    references: &[RawReference],
) -> impl Iterator<Item = EnhancedReference> + '_ {
    references.iter().filter_map(RawReference::enhance)
}
