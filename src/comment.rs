//! The comment record as the ECP indexer returns it.
//!
//! Only the fields we render are modelled; everything else in the indexer
//! response is ignored by serde.

use crate::error::{Error, Result};
use crate::references::RawReference;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::fmt;

/// Base mainnet
pub const DEFAULT_CHAIN_ID: ChainId = 8453;

pub type ChainId = u64;

/// A `0x`-prefixed 32-byte comment id, normalized to lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommentId(String);

impl CommentId {
    pub fn parse(raw: &str) -> Result<Self> {
        let digits = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .ok_or(Error::InvalidCommentId)?;

        let bytes = hex::decode(digits).map_err(|_| Error::InvalidCommentId)?;
        if bytes.len() != 32 {
            return Err(Error::InvalidCommentId);
        }

        Ok(CommentId(format!("0x{}", hex::encode(bytes))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default)]
    pub id: String,
    pub content: Option<String>,
    pub created_at: Option<Timestamp>,
    pub author: Option<Author>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub references: Vec<RawReference>,
}

fn null_as_empty<'de, D>(de: D) -> std::result::Result<Vec<RawReference>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<RawReference>>::deserialize(de)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub address: Option<String>,
    pub ens: Option<EnsIdentity>,
    pub farcaster: Option<FarcasterIdentity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsIdentity {
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarcasterIdentity {
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub pfp_url: Option<String>,
}

/// When a comment was created. The indexer sends RFC 3339 strings, older
/// payloads carry unix seconds either as a number or as a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawTimestamp")]
pub enum Timestamp {
    Date(DateTime<Utc>),
    Seconds(f64),
    SecondsStr(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Number(f64),
    Text(String),
}

impl From<RawTimestamp> for Timestamp {
    fn from(raw: RawTimestamp) -> Self {
        match raw {
            RawTimestamp::Number(secs) => Timestamp::Seconds(secs),
            RawTimestamp::Text(text) => match DateTime::parse_from_rfc3339(&text) {
                Ok(date) => Timestamp::Date(date.with_timezone(&Utc)),
                Err(_) => Timestamp::SecondsStr(text),
            },
        }
    }
}
