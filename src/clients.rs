//! Other apps that can show an ECP comment. The comment page links out to
//! each of them.

use crate::comment::{ChainId, CommentId};
use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Link {
    Town,
    Interface,
    Paper,
    /// A url that may contain `{commentId}` and `{chainId}` placeholders
    Template(String),
}

const CUSTOM_ID: &str = "custom";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub id: &'static str,
    pub title: Cow<'static, str>,
    pub logo: Cow<'static, str>,
    pub link: Link,
}

impl Client {
    const fn known(id: &'static str, title: &'static str, logo: &'static str, link: Link) -> Self {
        Client {
            id,
            title: Cow::Borrowed(title),
            logo: Cow::Borrowed(logo),
            link,
        }
    }

    pub fn custom(title: String, logo: String, url: String) -> Self {
        Client {
            id: CUSTOM_ID,
            title: Cow::Owned(title),
            logo: Cow::Owned(logo),
            link: Link::Template(url),
        }
    }

    /// A custom client from the page's `clientTitle`, `clientLogo` and
    /// `clientUrl` query parameters. All three must be present.
    pub fn from_query(query: Option<&str>) -> Option<Self> {
        let mut title = None;
        let mut logo = None;
        let mut link = None;

        for (key, value) in url::form_urlencoded::parse(query?.as_bytes()) {
            let slot = match &*key {
                "clientTitle" => &mut title,
                "clientLogo" => &mut logo,
                "clientUrl" => &mut link,
                _ => continue,
            };
            if slot.is_none() && !value.is_empty() {
                *slot = Some(value.into_owned());
            }
        }

        Some(Client::custom(title?, logo?, link?))
    }

    pub fn is_custom(&self) -> bool {
        self.id == CUSTOM_ID
    }

    pub fn link(&self, chain_id: ChainId, comment_id: &CommentId) -> String {
        match &self.link {
            Link::Town => format!("https://town.steer.fun/c/{comment_id}"),
            Link::Interface => {
                format!("https://app.interface.social/tx/{chain_id}/{comment_id}")
            }
            Link::Paper => format!("https://paper.ink/p/{comment_id}"),
            Link::Template(template) => template
                .replace("{commentId}", comment_id.as_str())
                .replace("{chainId}", &chain_id.to_string()),
        }
    }
}

pub static KNOWN_CLIENTS: [Client; 3] = [
    Client::known("town", "town", "/clients/town.png", Link::Town),
    Client::known("interface", "Interface", "/clients/interface.png", Link::Interface),
    Client::known("paper", "Paper", "/clients/paper.png", Link::Paper),
];

/// Every client to list on a comment page, the custom one first.
pub fn all_clients(custom: Option<Client>) -> Vec<Client> {
    custom.into_iter().chain(KNOWN_CLIENTS.iter().cloned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment_id() -> CommentId {
        CommentId::parse("0x00000000000000000000000000000000000000000000000000000000000000ff").unwrap()
    }

    #[test]
    fn test_known_client_links() {
        let id = comment_id();
        let links: Vec<String> = KNOWN_CLIENTS.iter().map(|c| c.link(8453, &id)).collect();
        assert_eq!(links[0], format!("https://town.steer.fun/c/{id}"));
        assert_eq!(links[1], format!("https://app.interface.social/tx/8453/{id}"));
        assert_eq!(links[2], format!("https://paper.ink/p/{id}"));
    }

    #[test]
    fn test_custom_client_from_query() {
        let query = "clientTitle=My%20App&clientLogo=https%3A%2F%2Fapp.example%2Flogo.png&clientUrl=https%3A%2F%2Fapp.example%2Fc%2F%7BcommentId%7D%3Fchain%3D%7BchainId%7D";
        let client = Client::from_query(Some(query)).unwrap();

        assert!(client.is_custom());
        assert_eq!(client.id, "custom");
        assert_eq!(client.title, "My App");
        assert_eq!(client.logo, "https://app.example/logo.png");
        assert_eq!(
            client.link(10, &comment_id()),
            format!("https://app.example/c/{}?chain=10", comment_id())
        );
    }

    #[test]
    fn test_custom_client_verbatim_url() {
        let client = Client::custom("x".into(), "y".into(), "https://x.example/thread/9".into());
        assert_eq!(client.link(8453, &comment_id()), "https://x.example/thread/9");
    }

    #[test]
    fn test_custom_client_needs_everything() {
        assert_eq!(Client::from_query(None), None);
        assert_eq!(Client::from_query(Some("clientTitle=a&clientLogo=b")), None);
        assert_eq!(Client::from_query(Some("clientTitle=a&clientLogo=b&clientUrl=")), None);
    }

    #[test]
    fn test_custom_client_listed_first() {
        let custom = Client::custom("a".into(), "b".into(), "c".into());
        let clients = all_clients(Some(custom.clone()));
        assert_eq!(clients.len(), 4);
        assert_eq!(clients[0], custom);
        assert_eq!(all_clients(None).len(), 3);
    }
}
