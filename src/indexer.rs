use crate::comment::{ChainId, Comment, CommentId};
use crate::error::{Error, Result};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

/// Read-only client for the ECP indexer's REST api.
#[derive(Debug, Clone)]
pub struct Indexer {
    client: reqwest::Client,
    base_url: String,
}

impl Indexer {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("calink/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Indexer {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn fetch_comment(&self, chain_id: ChainId, id: &CommentId) -> Result<Comment> {
        let url = format!("{}/api/comments/{}?chainId={}", self.base_url, id, chain_id);
        debug!("fetching comment {}", url);

        let response = self.client.get(&url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(Error::NotFound),
            status if !status.is_success() => Err(Error::IndexerStatus(status.as_u16())),
            _ => {
                let body = response.bytes().await?;
                let comment: Comment = serde_json::from_slice(&body)?;
                debug!("got comment {} ({} references)", comment.id, comment.references.len());
                Ok(comment)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fake_indexer, COMMENT_ID, SAMPLE_COMMENT};
    use hyper::StatusCode as HyperStatus;

    fn comment_id() -> CommentId {
        CommentId::parse(COMMENT_ID).unwrap()
    }

    fn local_indexer(url: &str) -> Indexer {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        Indexer::with_client(client, url)
    }

    #[tokio::test]
    async fn test_fetch_comment() {
        let url = fake_indexer(HyperStatus::OK, SAMPLE_COMMENT).await;
        let indexer = local_indexer(&url);

        let comment = indexer.fetch_comment(8453, &comment_id()).await.unwrap();
        assert_eq!(comment.id, COMMENT_ID);
        assert_eq!(comment.references.len(), 4);
    }

    #[tokio::test]
    async fn test_not_found() {
        let url = fake_indexer(HyperStatus::NOT_FOUND, "{}").await;
        let indexer = local_indexer(&url);

        let err = indexer.fetch_comment(8453, &comment_id()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound));
    }

    #[tokio::test]
    async fn test_wrong_chain_is_an_indexer_error() {
        let url = fake_indexer(HyperStatus::OK, SAMPLE_COMMENT).await;
        let indexer = local_indexer(&url);

        // the fake indexer only knows chain 8453
        let err = indexer.fetch_comment(1, &comment_id()).await.unwrap_err();
        assert!(matches!(err, Error::IndexerStatus(400)));
    }

    #[tokio::test]
    async fn test_garbage_body() {
        let url = fake_indexer(HyperStatus::OK, "<html>oops</html>").await;
        let indexer = local_indexer(&url);

        let err = indexer.fetch_comment(8453, &comment_id()).await.unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
