//! Fixtures shared by the test modules.

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use tokio::net::TcpListener;

pub const COMMENT_ID: &str = "0x1b2c54bba58d63aa6bd7ae3b0d9ae7f8b5dde6c9e0b3a6f3f0c6a5ab7d0e1f21";

/// Three displayable references and one that gets dropped
pub const SAMPLE_COMMENT: &str = r#"{
    "id": "0x1b2c54bba58d63aa6bd7ae3b0d9ae7f8b5dde6c9e0b3a6f3f0c6a5ab7d0e1f21",
    "content": "gm <frens> & welcome",
    "createdAt": "2024-01-05T12:00:00.000Z",
    "author": {
        "address": "0x8ba1f109551bD432803012645Ac136ddd64DBA72",
        "farcaster": { "displayName": "Alice", "username": "alice" }
    },
    "references": [
        { "type": "image", "url": "https://cdn.example/one.png" },
        { "type": "file", "url": "https://cdn.example/two.webp" },
        {
            "type": "webpage",
            "url": "https://www.example.com/post",
            "opengraph": { "image": "https://cdn.example/og.png", "title": "A post" }
        },
        { "type": "ens", "name": "alice.eth" }
    ]
}"#;

/// An indexer that answers every `/api/comments/..?chainId=8453` request
/// with `status` and `body`, and anything else with 400. Returns its base url.
pub async fn fake_indexer(status: StatusCode, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let io = TokioIo::new(stream);

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| async move {
                    let known = req.uri().path().starts_with("/api/comments/")
                        && req.uri().query() == Some("chainId=8453");
                    let status = if known { status } else { StatusCode::BAD_REQUEST };

                    Ok::<_, Infallible>(
                        Response::builder()
                            .status(status)
                            .body(Full::new(Bytes::from(body)))
                            .unwrap(),
                    )
                });
                let _ = http1::Builder::new().serve_connection(io, service).await;
            });
        }
    });

    format!("http://{addr}")
}
