use crate::abbrev::abbreviate;
use crate::blockies::Blockies;
use crate::clients::Client;
use crate::error::Result;
use crate::render::CommentRenderData;
use bytes::Bytes;
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use http_body_util::Full;
use hyper::{header, Response, StatusCode};
use std::io::Write;
use tracing::warn;

/// og:description length
const DESCRIPTION_CHARS: usize = 200;

const STYLE: &str = r#"
    body { margin: 0; min-height: 100vh; display: flex; flex-direction: column; font-family: system-ui, -apple-system, "Segoe UI", Roboto, sans-serif; color: #111827; background: #fafafa; }
    main { flex: 1; width: 100%; max-width: 56rem; margin: 0 auto; padding: 2rem 1.5rem; box-sizing: border-box; }
    .card { position: relative; background: #fff; border: 1px solid #e5e7eb; border-radius: 0.75rem; padding: 2rem; }
    .actions { position: absolute; top: 1rem; right: 1rem; display: flex; gap: 0.5rem; }
    .actions a { color: #6b7280; text-decoration: none; font-size: 0.875rem; }
    .author { display: flex; align-items: center; gap: 0.5rem; margin-bottom: 1rem; }
    .avatar { width: 2.25rem; height: 2.25rem; border-radius: 50%; object-fit: cover; }
    .avatar-fallback { display: inline-flex; align-items: center; justify-content: center; background: #e5e7eb; color: #6b7280; font-weight: 500; }
    .author h2 { margin: 0; font-size: 1rem; }
    .meta { font-size: 0.875rem; color: #6b7280; }
    .content { line-height: 1.6; overflow-wrap: break-word; white-space: pre-wrap; }
    .references { display: flex; gap: 1rem; overflow-x: auto; padding: 1rem 0; }
    .reference { flex-shrink: 0; width: 18rem; }
    .reference img { width: 288px; height: 180px; object-fit: cover; border-radius: 0.75rem; border: 1px solid #e5e7eb; }
    .reference .title { font-size: 0.875rem; font-weight: 600; }
    .reference .subtitle { font-size: 0.75rem; color: #6b7280; }
    .clients { display: flex; flex-wrap: wrap; justify-content: center; gap: 1rem; margin-top: 2rem; }
    .clients a { display: flex; flex-direction: column; align-items: center; gap: 0.5rem; color: inherit; text-decoration: none; font-size: 0.875rem; }
    .clients img { width: 48px; height: 48px; border-radius: 0.375rem; }
    footer { border-top: 1px solid #e5e7eb; padding: 1.5rem; text-align: center; font-size: 0.875rem; color: #6b7280; }
    footer a { color: #111827; }
"#;

fn write_head(body: &mut Vec<u8>, title: &str, extra: impl FnOnce(&mut Vec<u8>) -> std::io::Result<()>) -> Result<()> {
    write!(
        body,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{}</title>
"#,
        text(title)
    )?;
    extra(body)?;
    write!(body, "  <style>{}</style>\n</head>\n<body>\n<main>\n", STYLE)?;
    Ok(())
}

fn write_footer(body: &mut Vec<u8>) -> Result<()> {
    write!(
        body,
        r#"</main>
<footer>
  by <a href="https://paper.so/u/stephancill.eth" target="_blank" rel="noopener noreferrer">@stephancill</a>
  &bull;
  <a href="https://github.com/stephancill/calink" target="_blank" rel="noopener noreferrer">source</a>
</footer>
</body>
</html>
"#
    )?;
    Ok(())
}

fn write_avatar(body: &mut Vec<u8>, data: &CommentRenderData) -> Result<()> {
    let blockies = match (&data.author.avatar_url, &data.author.address) {
        (Some(_), _) | (None, None) => None,
        (None, Some(address)) => match Blockies::new(address).to_data_uri() {
            Ok(uri) => Some(uri),
            Err(err) => {
                warn!("blockies for {} failed: {}", address, err);
                None
            }
        },
    };

    match data.author.avatar_url.as_ref().or(blockies.as_ref()) {
        Some(src) => write!(body, r#"<img class="avatar" src="{}" alt="Avatar">"#, attr(src))?,
        None => write!(
            body,
            r#"<span class="avatar avatar-fallback">{}</span>"#,
            text(&data.author.initial())
        )?,
    }
    Ok(())
}

/// The shareable comment page.
pub fn render_comment_page(
    base_url: &str,
    data: &CommentRenderData,
    clients: &[Client],
    image_query: &str,
) -> Result<Vec<u8>> {
    let mut body = Vec::new();

    let title = match &data.author.username {
        Some(username) => format!("@{} on ECP", username),
        None => "Anonymous on ECP".to_string(),
    };
    let description = abbreviate(&data.content, DESCRIPTION_CHARS);
    let image_path = format!("/c/{}/opengraph-image{}", data.id, image_query);
    let image_url = format!("{}{}", base_url, image_path);
    let page_url = format!("{}/c/{}", base_url, data.id);

    write_head(&mut body, &title, |body| {
        write!(
            body,
            r#"  <meta name="description" content="{1}">
  <meta property="og:title" content="{0}">
  <meta property="og:description" content="{1}">
  <meta property="og:type" content="article">
  <meta property="og:url" content="{2}">
  <meta property="og:image" content="{3}">
  <meta property="og:image:alt" content="ecp-image">
  <meta property="og:image:type" content="image/png">
  <meta property="og:image:width" content="1200">
  <meta property="og:image:height" content="800">
  <meta name="twitter:card" content="summary_large_image">
  <meta name="twitter:title" content="{0}">
  <meta name="twitter:description" content="{1}">
  <meta name="twitter:image" content="{3}">
"#,
            attr(&title),
            attr(description),
            attr(&page_url),
            attr(&image_url),
        )
    })?;

    write!(
        body,
        r#"<div class="card">
  <div class="actions">
    <a href="{}" download="ecp-comment-{}.png" title="Download image">Download</a>
"#,
        attr(&image_path),
        attr(data.id.as_str()),
    )?;

    if let Some(custom) = clients.iter().find(|c| c.is_custom()) {
        write!(
            body,
            r#"    <a href="{}" target="_blank" rel="noopener noreferrer" title="Open in {}">Open &#8599;</a>
"#,
            attr(&custom.link(data.chain_id, &data.id)),
            attr(&custom.title),
        )?;
    }

    write!(body, "  </div>\n  <div class=\"author\">\n    ")?;
    write_avatar(&mut body, data)?;
    write!(
        body,
        "\n    <div>\n      <h2>{}</h2>\n      <div class=\"meta\">",
        text(&data.author.name)
    )?;
    if let Some(username) = &data.author.username {
        write!(body, "@{} <span>&bull;</span> ", text(username))?;
    }
    if let Some(date) = &data.date {
        write!(body, "{}", text(date))?;
    }
    write!(
        body,
        "</div>\n    </div>\n  </div>\n  <div class=\"content\">{}</div>\n",
        text(&data.content)
    )?;

    if !data.references.is_empty() {
        write!(body, "  <div class=\"references\">\n")?;
        for (i, reference) in data.references.iter().enumerate() {
            let img = format!(
                r#"<img src="{}" alt="Reference {}" width="288" height="180" loading="lazy">"#,
                attr(&reference.image),
                i + 1
            );
            write!(body, "    <div class=\"reference\">")?;
            match &reference.url {
                Some(url) => write!(
                    body,
                    r#"<a href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#,
                    attr(url),
                    img
                )?,
                None => write!(body, "{}", img)?,
            }
            if let Some(title) = &reference.title {
                write!(body, r#"<div class="title">{}</div>"#, text(title))?;
            }
            if let Some(subtitle) = &reference.subtitle {
                write!(body, r#"<div class="subtitle">{}</div>"#, text(subtitle))?;
            }
            write!(body, "</div>\n")?;
        }
        write!(body, "  </div>\n")?;
    }

    write!(body, "</div>\n<nav class=\"clients\">\n")?;
    for client in clients {
        write!(
            body,
            r#"  <a data-client="{}" href="{}" target="_blank" rel="noopener noreferrer"><img src="{}" alt="{}"><span>{}</span></a>
"#,
            attr(client.id),
            attr(&client.link(data.chain_id, &data.id)),
            attr(&client.logo),
            attr(&client.title),
            text(&client.title),
        )?;
    }
    write!(body, "</nav>\n")?;

    write_footer(&mut body)?;
    Ok(body)
}

pub fn render_home_page() -> Result<Vec<u8>> {
    let mut body = Vec::new();
    let description = "A client-agnostic ECP linker with OpenGraph support.";

    write_head(&mut body, "calink", |body| {
        write!(
            body,
            r#"  <meta name="description" content="{0}">
  <meta property="og:title" content="calink">
  <meta property="og:description" content="{0}">
  <meta name="twitter:card" content="summary_large_image">
"#,
            description
        )
    })?;

    write!(
        body,
        r#"<h1>calink</h1>
<p>A client-agnostic ECP (Ethereum Comment Protocol) linker with OpenGraph support.</p>
<ul>
  <li><strong>Client-Agnostic</strong>: view ECP comments without being tied to a specific client</li>
  <li><strong>OpenGraph Support</strong>: rich social media previews with comment content and author info</li>
  <li><strong>Custom Clients</strong>: support for custom client integration via <code>clientTitle</code>, <code>clientLogo</code> and <code>clientUrl</code> url parameters</li>
</ul>
<p><strong>Usage:</strong> share ECP comments with urls like <code>/c/&lt;commentId&gt;</code></p>
<p><a href="https://ecp.eth.limo" target="_blank" rel="noopener noreferrer">Learn about ECP</a></p>
"#
    )?;

    write_footer(&mut body)?;
    Ok(body)
}

pub fn render_not_found(message: &str) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    write_head(&mut body, "Comment unavailable", |_| Ok(()))?;
    write!(
        body,
        "<h1>Comment unavailable</h1>\n<p>{}</p>\n<p><a href=\"/\">calink</a></p>\n",
        text(message)
    )?;
    write_footer(&mut body)?;
    Ok(body)
}

pub fn html_response(status: StatusCode, body: Vec<u8>) -> Result<Response<Full<Bytes>>> {
    Ok(Response::builder()
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .status(status)
        .body(Full::new(Bytes::from(body)))?)
}
