use crate::abbrev::truncate_address;
use crate::comment::Author;

pub const ANONYMOUS: &str = "Anonymous";

/// Who wrote a comment, reduced to what we display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorInfo {
    pub name: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub address: Option<String>,
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|s| !s.is_empty())
}

impl AuthorInfo {
    pub fn resolve(author: Option<&Author>) -> Self {
        let ens = author.and_then(|a| a.ens.as_ref());
        let farcaster = author.and_then(|a| a.farcaster.as_ref());
        let address = author.and_then(|a| non_empty(&a.address));

        let name = ens
            .and_then(|e| non_empty(&e.name))
            .or_else(|| farcaster.and_then(|f| non_empty(&f.display_name)))
            .or_else(|| farcaster.and_then(|f| non_empty(&f.username)))
            .map(str::to_owned)
            .or_else(|| address.map(truncate_address))
            .unwrap_or_else(|| ANONYMOUS.to_owned());

        let username = farcaster
            .and_then(|f| non_empty(&f.username))
            .map(str::to_owned);

        let avatar_url = ens
            .and_then(|e| non_empty(&e.avatar_url))
            .or_else(|| farcaster.and_then(|f| non_empty(&f.pfp_url)))
            .map(str::to_owned);

        AuthorInfo {
            name,
            username,
            avatar_url,
            address: address.map(str::to_owned),
        }
    }

    /// Letter shown in place of an avatar when there is nothing to draw
    pub fn initial(&self) -> String {
        self.name
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_else(|| "?".to_owned())
    }
}
