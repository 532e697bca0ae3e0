use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http_body_util::Full;
use hyper::header;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::net::TcpListener;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use crate::clients::{all_clients, Client};
use crate::comment::{ChainId, CommentId};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::indexer::Indexer;
use crate::render::{CommentRenderData, PreviewAssets, PreviewImages};

mod abbrev;
mod author;
mod blockies;
mod clients;
mod comment;
mod config;
mod error;
mod fonts;
mod format;
mod html;
mod images;
mod indexer;
mod pfp;
mod references;
mod render;

#[cfg(test)]
mod testing;

#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    Home,
    CommentPage(&'a str),
    CommentImage(&'a str),
    ClientLogo(&'a str),
    Metrics,
    NotFound,
}

impl<'a> Route<'a> {
    fn parse(path: &'a str) -> Self {
        if path == "/" {
            return Route::Home;
        }
        if path == "/metrics" {
            return Route::Metrics;
        }
        if let Some(file) = path.strip_prefix("/clients/") {
            return if is_plain_file_name(file) {
                Route::ClientLogo(file)
            } else {
                Route::NotFound
            };
        }

        let Some(rest) = path.strip_prefix("/c/") else {
            return Route::NotFound;
        };
        match rest.split_once('/') {
            None if !rest.is_empty() => Route::CommentPage(rest),
            Some((id, "opengraph-image")) if !id.is_empty() => Route::CommentImage(id),
            _ => Route::NotFound,
        }
    }
}

fn is_plain_file_name(file: &str) -> bool {
    !file.is_empty() && !file.starts_with('.') && !file.contains(['/', '\\'])
}

fn content_type(file: &str) -> &'static str {
    match file.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "svg" => "image/svg+xml",
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        Some(ext) if ext == "webp" => "image/webp",
        Some(ext) if ext == "ico" => "image/x-icon",
        _ => "application/octet-stream",
    }
}

/// `chainId` from the query string, if it is there and numeric
fn query_chain_id(query: Option<&str>) -> Option<ChainId> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == "chainId")
        .and_then(|(_, value)| value.parse().ok())
}

#[derive(Clone)]
pub struct Calink {
    config: Arc<Config>,
    indexer: Indexer,
    /// For avatars and reference thumbnails
    http: reqwest::Client,
    assets: Arc<PreviewAssets>,
    metrics: PrometheusHandle,
}

impl Calink {
    fn chain_id(&self, query: Option<&str>) -> ChainId {
        query_chain_id(query).unwrap_or(self.config.chain_id)
    }

    async fn render_data(&self, id: &str, query: Option<&str>) -> Result<CommentRenderData> {
        let id = CommentId::parse(id)?;
        let chain_id = self.chain_id(query);
        let comment = self.indexer.fetch_comment(chain_id, &id).await?;
        Ok(CommentRenderData::new(id, chain_id, &comment))
    }
}

async fn serve_comment_page(
    app: &Calink,
    id: &str,
    query: Option<&str>,
) -> Result<Response<Full<Bytes>>> {
    let data = app.render_data(id, query).await?;

    let image_query = if data.chain_id == app.config.chain_id {
        String::new()
    } else {
        format!("?chainId={}", data.chain_id)
    };
    let clients = all_clients(Client::from_query(query));
    let body = html::render_comment_page(&app.config.base_url, &data, &clients, &image_query)?;

    metrics::counter!("calink_page_renders_total", 1);
    html::html_response(StatusCode::OK, body)
}

async fn serve_comment_image(
    app: &Calink,
    id: &str,
    query: Option<&str>,
) -> Result<Response<Full<Bytes>>> {
    let data = app.render_data(id, query).await?;
    let images = PreviewImages::load(&app.http, &data).await;

    let start = Instant::now();
    let assets = app.assets.clone();
    let png =
        tokio::task::spawn_blocking(move || render::render_preview(&assets, &data, &images))
            .await??;
    metrics::histogram!("calink_render_duration_seconds", start.elapsed().as_secs_f64());
    metrics::counter!("calink_image_renders_total", 1);

    Ok(Response::builder()
        .header(header::CONTENT_TYPE, "image/png")
        .header(header::CACHE_CONTROL, "public, max-age=31536000")
        .status(StatusCode::OK)
        .body(Full::new(Bytes::from(png)))?)
}

async fn serve_client_logo(app: &Calink, file: &str) -> Result<Response<Full<Bytes>>> {
    let path = app.config.static_dir.join("clients").join(file);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return not_found("No such file");
        }
        Err(err) => return Err(err.into()),
    };

    Ok(Response::builder()
        .header(header::CONTENT_TYPE, content_type(file))
        .header(header::CACHE_CONTROL, "public, max-age=86400")
        .status(StatusCode::OK)
        .body(Full::new(Bytes::from(bytes)))?)
}

fn not_found(message: &str) -> Result<Response<Full<Bytes>>> {
    metrics::counter!("calink_not_found_total", 1);
    html::html_response(StatusCode::NOT_FOUND, html::render_not_found(message)?)
}

fn error_response(err: Error) -> Result<Response<Full<Bytes>>> {
    if err.is_not_found() {
        debug!("comment unavailable: {}", err);
        return not_found(&err.to_string());
    }

    let (status, message) = match &err {
        Error::Indexer(_) | Error::IndexerStatus(_) | Error::Json(_) => {
            metrics::counter!("calink_indexer_errors_total", 1);
            (StatusCode::BAD_GATEWAY, "Could not reach the comment indexer\n")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error\n"),
    };
    error!("{}: {}", status, err);

    Ok(Response::builder()
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .status(status)
        .body(Full::new(Bytes::from(message)))?)
}

async fn respond(app: &Calink, path: &str, query: Option<&str>) -> Result<Response<Full<Bytes>>> {
    let response = match Route::parse(path) {
        Route::Home => html::html_response(StatusCode::OK, html::render_home_page()?),
        Route::CommentPage(id) => serve_comment_page(app, id, query).await,
        Route::CommentImage(id) => serve_comment_image(app, id, query).await,
        Route::ClientLogo(file) => serve_client_logo(app, file).await,
        Route::Metrics => Ok(Response::builder()
            .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
            .status(StatusCode::OK)
            .body(Full::new(Bytes::from(app.metrics.render())))?),
        Route::NotFound => not_found("Page not found"),
    };

    response.or_else(error_response)
}

async fn serve(
    app: &Calink,
    r: Request<hyper::body::Incoming>,
) -> Result<Response<Full<Bytes>>> {
    debug!("{} {}", r.method(), r.uri());
    respond(app, r.uri().path(), r.uri().query()).await
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    let metrics = PrometheusBuilder::new().install_recorder()?;

    let http = reqwest::Client::builder()
        .user_agent(concat!("calink/", env!("CARGO_PKG_VERSION")))
        .timeout(config.timeout)
        .connect_timeout(Duration::from_secs(3))
        .build()?;

    let app = Calink {
        indexer: Indexer::new(&config.indexer_url, config.timeout)?,
        http,
        assets: Arc::new(PreviewAssets::load(config.font_path.as_deref())),
        metrics,
        config: Arc::new(config),
    };

    let listener = TcpListener::bind(app.config.bind).await?;
    info!(
        "Listening on {} (indexer {}, chain {})",
        app.config.bind, app.config.indexer_url, app.config.chain_id
    );

    loop {
        let (stream, _) = listener.accept().await?;

        // Use an adapter to access something implementing `tokio::io` traits as if they implement
        // `hyper::rt` IO traits.
        let io = TokioIo::new(stream);

        let app_copy = app.clone();

        tokio::task::spawn(async move {
            if let Err(err) = http1::Builder::new()
                .serve_connection(io, service_fn(|req| serve(&app_copy, req)))
                .await
            {
                error!("Error serving connection: {:?}", err);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fake_indexer, COMMENT_ID, SAMPLE_COMMENT};
    use http_body_util::BodyExt;

    #[test]
    fn test_route_parse() {
        assert_eq!(Route::parse("/"), Route::Home);
        assert_eq!(Route::parse("/metrics"), Route::Metrics);
        assert_eq!(Route::parse("/c/0xabc"), Route::CommentPage("0xabc"));
        assert_eq!(
            Route::parse("/c/0xabc/opengraph-image"),
            Route::CommentImage("0xabc")
        );
        assert_eq!(Route::parse("/clients/town.png"), Route::ClientLogo("town.png"));

        assert_eq!(Route::parse("/c/"), Route::NotFound);
        assert_eq!(Route::parse("/c/0xabc/other"), Route::NotFound);
        assert_eq!(Route::parse("/c//opengraph-image"), Route::NotFound);
        assert_eq!(Route::parse("/clients/../Cargo.toml"), Route::NotFound);
        assert_eq!(Route::parse("/clients/.hidden"), Route::NotFound);
        assert_eq!(Route::parse("/favicon.ico"), Route::NotFound);
    }

    #[test]
    fn test_query_chain_id() {
        assert_eq!(query_chain_id(Some("chainId=10")), Some(10));
        assert_eq!(query_chain_id(Some("clientTitle=x&chainId=1")), Some(1));
        assert_eq!(query_chain_id(Some("chainId=base")), None);
        assert_eq!(query_chain_id(None), None);
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type("town.PNG"), "image/png");
        assert_eq!(content_type("logo.svg"), "image/svg+xml");
        assert_eq!(content_type("README"), "application/octet-stream");
    }

    fn test_app(indexer_url: &str) -> Calink {
        let http = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        Calink {
            config: Arc::new(Config {
                base_url: "https://calink.example".to_string(),
                indexer_url: indexer_url.to_string(),
                ..Config::default()
            }),
            indexer: Indexer::with_client(http.clone(), indexer_url),
            http,
            assets: Arc::new(PreviewAssets::default()),
            metrics: PrometheusBuilder::new().build_recorder().handle(),
        }
    }

    async fn body_text(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_comment_page() {
        let app = test_app(&fake_indexer(StatusCode::OK, SAMPLE_COMMENT).await);
        let path = format!("/c/{COMMENT_ID}");

        let response = respond(&app, &path, None).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("<h2>Alice</h2>"));
        assert!(html.contains(&format!(
            "https://calink.example/c/{COMMENT_ID}/opengraph-image\""
        )));
    }

    #[tokio::test]
    async fn test_comment_image() {
        let app = test_app(&fake_indexer(StatusCode::OK, SAMPLE_COMMENT).await);
        let path = format!("/c/{COMMENT_ID}/opengraph-image");

        let response = respond(&app, &path, None).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "public, max-age=31536000"
        );

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let png = image::load_from_memory(&bytes).unwrap();
        assert_eq!((png.width(), png.height()), (1200, 800));
    }

    #[tokio::test]
    async fn test_missing_comment_is_404() {
        let app = test_app(&fake_indexer(StatusCode::NOT_FOUND, "{}").await);
        let path = format!("/c/{COMMENT_ID}");

        let response = respond(&app, &path, None).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = respond(&app, "/c/not-a-comment-id", None).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_indexer_failure_is_502() {
        let app = test_app(&fake_indexer(StatusCode::INTERNAL_SERVER_ERROR, "oops").await);
        let path = format!("/c/{COMMENT_ID}/opengraph-image");

        let response = respond(&app, &path, None).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        // the fake indexer only knows chain 8453
        let app = test_app(&fake_indexer(StatusCode::OK, SAMPLE_COMMENT).await);
        let path = format!("/c/{COMMENT_ID}");
        let response = respond(&app, &path, Some("chainId=10")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = test_app("http://127.0.0.1:9");
        let response = respond(&app, "/nope", None).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = respond(&app, "/clients/missing.png", None).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
