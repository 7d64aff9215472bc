//! Local preview server with on-demand post rendering
//!
//! Serves the generated public directory. A post page that was not
//! pre-rendered answers with the loading shell while the post is fetched in
//! the background; once it resolves the page is written to disk so later
//! requests hit the static file, or the id is remembered as not found.

use anyhow::Result;
use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    response::{Html, IntoResponse, Response},
    Router,
};
use percent_encoding::percent_decode_str;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::client::ContentClient;
use crate::generator::{DetailState, Generator, Resolved, FALLBACK_FILE};
use crate::Blog;

/// Server state
struct ServerState<C> {
    generator: Generator<C>,
    /// Posts rendered on demand that are not (yet) a static file
    details: Mutex<HashMap<String, DetailState>>,
}

/// Start the preview server
pub async fn start(blog: &Blog, ip: &str, port: u16, open: bool) -> Result<()> {
    let generator = Generator::new(blog, blog.client()?)?;
    let app = router(generator);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router serving a generator's output
pub fn router<C>(generator: Generator<C>) -> Router
where
    C: ContentClient + Send + Sync + 'static,
{
    let state = Arc::new(ServerState {
        generator,
        details: Mutex::new(HashMap::new()),
    });

    Router::new()
        .fallback(fallback_handler::<C>)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve static files, rendering missing post pages on demand
async fn fallback_handler<C>(
    State(state): State<Arc<ServerState<C>>>,
    request: Request<Body>,
) -> Response
where
    C: ContentClient + Send + Sync + 'static,
{
    let generator = &state.generator;

    if let Some(id) = post_id_from_path(&generator.blog().config.post_dir, request.uri().path()) {
        let prerendered = generator
            .post_file(&id)
            .map(|path| path.exists())
            .unwrap_or(false);
        if !prerendered {
            return on_demand(&state, id).await;
        }
    }

    let public_dir = &generator.blog().public_dir;
    let mut service = ServeDir::new(public_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(public_dir.join("404.html")));
    match service.try_call(request).await {
        Ok(response) => response.into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}

/// Answer for a post without a static page
///
/// The first request starts the fetch; until it resolves every request gets
/// the loading shell.
async fn on_demand<C>(state: &Arc<ServerState<C>>, id: String) -> Response
where
    C: ContentClient + Send + Sync + 'static,
{
    let mut details = state.details.lock().await;
    match details.get(&id) {
        Some(DetailState::Loading) => {}
        Some(done) => {
            let status = match done {
                DetailState::NotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::OK,
            };
            return render_page(&state.generator, done, status);
        }
        None => {
            tracing::info!("Rendering post {} on demand", id);
            details.insert(id.clone(), DetailState::Loading);
            tokio::spawn(resolve_in_background(Arc::clone(state), id));
        }
    }
    drop(details);

    loading_page(&state.generator).await
}

/// Fetch a post and move it out of `Loading`
///
/// A ready post is written next to the pre-rendered ones; it stays in the
/// map only when writing fails. Fetch errors clear the entry so the next
/// request retries.
async fn resolve_in_background<C>(state: Arc<ServerState<C>>, id: String)
where
    C: ContentClient + Send + Sync + 'static,
{
    let generator = &state.generator;

    let next = match Resolved::from_fetch(generator.fetch_detail(&id).await) {
        Ok(Resolved::Ready(detail)) => {
            let written = generator
                .render_post(&detail)
                .and_then(|html| generator.write_post(&id, &html));
            match written {
                Ok(path) => {
                    tracing::debug!("Cached post {} at {:?}", id, path);
                    None
                }
                Err(e) => {
                    tracing::warn!("Failed to cache post {}: {:#}", id, e);
                    Some(DetailState::Ready(detail))
                }
            }
        }
        Ok(Resolved::NotFound) => {
            tracing::warn!("Post {} not found", id);
            Some(DetailState::NotFound)
        }
        Err(e) => {
            tracing::error!("Failed to fetch post {}: {}", id, e);
            None
        }
    };

    let mut details = state.details.lock().await;
    match next {
        Some(resolved) => details.insert(id, resolved),
        None => details.remove(&id),
    };
}

/// The pre-rendered loading shell, rendered afresh if it is missing
async fn loading_page<C: ContentClient>(generator: &Generator<C>) -> Response {
    let shell = generator.post_dir().join(FALLBACK_FILE);
    match tokio::fs::read_to_string(&shell).await {
        Ok(html) => ([(header::CACHE_CONTROL, "no-store")], Html(html)).into_response(),
        Err(_) => render_page(generator, &DetailState::Loading, StatusCode::OK),
    }
}

fn render_page<C: ContentClient>(
    generator: &Generator<C>,
    state: &DetailState,
    status: StatusCode,
) -> Response {
    match generator.render_state(state) {
        Ok(html) => (status, [(header::CACHE_CONTROL, "no-store")], Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Render error").into_response()
        }
    }
}

/// Extract `{id}` from `/{post_dir}/{id}` or `/{post_dir}/{id}/`
fn post_id_from_path(post_dir: &str, path: &str) -> Option<String> {
    let prefix = format!("/{}/", post_dir.trim_matches('/'));
    let rest = path.strip_prefix(&prefix)?;
    let raw = rest.strip_suffix('/').unwrap_or(rest);
    if raw.is_empty() || raw.contains('/') || raw.ends_with(".html") {
        return None;
    }
    let id = percent_decode_str(raw).decode_utf8().ok()?;
    Some(id.into_owned())
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
