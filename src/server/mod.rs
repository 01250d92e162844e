//! HTTP server: renders pages on demand, with optional live reload

use anyhow::Result;
use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket},
        Path, Query, State, WebSocketUpgrade,
    },
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::commands::generate::needs_rebuild;
use crate::content::loader::is_valid_slug;
use crate::content::{ContentLoader, PostSummary};
use crate::search::{self, SearchQuery};
use crate::templates::TemplateRenderer;
use crate::Blog;

/// Live reload script injected into HTML pages
const LIVE_RELOAD_SCRIPT: &str = r#"
<script>
(function() {
    var ws = new WebSocket('ws://' + location.host + '/__livereload');
    ws.onmessage = function(msg) {
        if (msg.data === 'reload') {
            location.reload();
        }
    };
    ws.onclose = function() {
        console.log('Live reload disconnected. Attempting to reconnect...');
        setTimeout(function() { location.reload(); }, 1000);
    };
})();
</script>
</body>
"#;

/// Server state, shared read-only by every request
pub struct ServerState {
    blog: Blog,
    loader: ContentLoader,
    renderer: TemplateRenderer,
    reload_tx: broadcast::Sender<()>,
    live_reload: bool,
}

impl ServerState {
    pub fn new(blog: &Blog, live_reload: bool) -> Result<Self> {
        // Create broadcast channel for live reload notifications
        let (reload_tx, _) = broadcast::channel::<()>(16);

        Ok(Self {
            blog: blog.clone(),
            loader: ContentLoader::new(blog),
            renderer: TemplateRenderer::new()?,
            reload_tx,
            live_reload,
        })
    }

    /// The index listing; a failure yields an empty list
    fn load_listing(&self) -> Vec<PostSummary> {
        match self.loader.load_summaries() {
            Ok(posts) => posts,
            Err(e) => {
                tracing::error!("Error fetching blogs: {:#}", e);
                Vec::new()
            }
        }
    }

    /// Index page HTML for the given request parameters
    fn index_page(&self, params: &IndexParams) -> Result<String> {
        let posts = self.load_listing();
        let known_tags = search::collect_tags(&posts);
        let query = SearchQuery::from_params(params.q.as_deref(), params.tag.as_deref(), &known_tags);
        self.renderer
            .render_index(&self.blog.config, &posts, &query)
    }

    /// Article page HTML, or `None` when the post cannot be shown
    fn post_page(&self, slug: &str) -> Result<Option<String>> {
        match self.loader.load_post(slug) {
            Ok(post) => self
                .renderer
                .render_post(&self.blog.config, &post)
                .map(Some),
            Err(e) if e.is_not_found() => {
                tracing::debug!("{}", e);
                Ok(None)
            }
            Err(e) => {
                tracing::error!("Error fetching report: {}", e);
                Ok(None)
            }
        }
    }

    fn html(&self, status: StatusCode, html: String) -> Response {
        let html = if self.live_reload {
            inject_live_reload(&html)
        } else {
            html
        };
        (status, Html(html)).into_response()
    }

    fn not_found(&self) -> Response {
        match self.renderer.render_not_found(&self.blog.config) {
            Ok(html) => self.html(StatusCode::NOT_FOUND, html),
            Err(e) => {
                tracing::error!("Failed to render 404 page: {:#}", e);
                (StatusCode::NOT_FOUND, "Not found").into_response()
            }
        }
    }
}

/// Query string of the index page
#[derive(Debug, Default, PartialEq, Eq)]
pub struct IndexParams {
    /// Search text
    pub q: Option<String>,
    /// Comma-separated selected tags
    pub tag: Option<String>,
}

impl IndexParams {
    /// First `q` and first `tag`; repeats and unknown keys are ignored
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "q" if params.q.is_none() => params.q = Some(value),
                "tag" if params.tag.is_none() => params.tag = Some(value),
                _ => {}
            }
        }
        params
    }
}

/// Build the router
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/search.json", get(search_index_handler))
        .route("/__livereload", get(livereload_handler))
        .route("/:slug", get(post_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(blog: &Blog, ip: &str, port: u16, watch: bool, open: bool) -> Result<()> {
    let state = Arc::new(ServerState::new(blog, watch)?);
    let app = router(state.clone());

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    if watch {
        println!("Live reload enabled. Watching for changes...");
    }
    println!("Press Ctrl+C to stop.");

    // Open browser if requested
    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    // Pages are rendered per request, so a change only needs a browser reload
    if watch {
        let watched = vec![blog.content_dir.clone(), blog.static_dir.clone()];
        let public_dir = blog.public_dir.clone();
        let reload_tx = state.reload_tx.clone();

        tokio::task::spawn_blocking(move || {
            if let Err(e) = watch_and_reload(watched, public_dir, reload_tx) {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Watch for file changes and trigger reload
fn watch_and_reload(
    paths: Vec<PathBuf>,
    public_dir: PathBuf,
    reload_tx: broadcast::Sender<()>,
) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();

    // Create debouncer to avoid multiple rapid reloads
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    for path in &paths {
        if path.exists() {
            debouncer.watcher().watch(path, RecursiveMode::Recursive)?;
            tracing::debug!("Watching: {:?}", path);
        }
    }

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                if !needs_rebuild(&events, &public_dir) {
                    continue;
                }
                for event in &events {
                    tracing::info!("File changed: {}", event.path.display());
                }
                // No subscribers is fine
                let _ = reload_tx.send(());
            }
            Ok(Err(e)) => {
                tracing::error!("Watch error: {:?}", e);
            }
            Err(e) => {
                tracing::error!("Channel error: {:?}", e);
                break;
            }
        }
    }

    Ok(())
}

async fn index_handler(
    State(state): State<Arc<ServerState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let params = IndexParams::from_pairs(pairs);
    let page_state = state.clone();
    let result = tokio::task::spawn_blocking(move || page_state.index_page(&params)).await;

    match result {
        Ok(Ok(html)) => state.html(StatusCode::OK, html),
        Ok(Err(e)) => internal_error(e),
        Err(e) => internal_error(e.into()),
    }
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
    request: Request<Body>,
) -> Response {
    // Top-level static files (favicon.ico, twitter.png) share the slug namespace
    if is_valid_slug(&slug) && state.blog.static_dir.join(&slug).is_file() {
        return serve_static(&state, request).await;
    }

    let page_state = state.clone();
    let result = tokio::task::spawn_blocking(move || page_state.post_page(&slug)).await;

    match result {
        Ok(Ok(Some(html))) => state.html(StatusCode::OK, html),
        Ok(Ok(None)) => state.not_found(),
        Ok(Err(e)) => internal_error(e),
        Err(e) => internal_error(e.into()),
    }
}

async fn search_index_handler(State(state): State<Arc<ServerState>>) -> Response {
    let page_state = state.clone();
    let result = tokio::task::spawn_blocking(move || page_state.load_listing()).await;

    match result {
        Ok(posts) => {
            let entries: Vec<serde_json::Value> =
                posts.iter().map(PostSummary::to_search_entry).collect();
            Json(entries).into_response()
        }
        Err(e) => internal_error(e.into()),
    }
}

/// Static files, then a redirect for `/slug/`, then the 404 page
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let path = request.uri().path().to_string();
    let trimmed = path.trim_matches('/');

    if path.ends_with('/')
        && is_valid_slug(trimmed)
        && !state.blog.static_dir.join(trimmed).is_dir()
    {
        return Redirect::permanent(&format!("/{}", trimmed)).into_response();
    }

    let response = serve_static(&state, request).await;
    if response.status() == StatusCode::NOT_FOUND {
        state.not_found()
    } else {
        response
    }
}

/// Serve a file from the static directory using tower-http
async fn serve_static(state: &ServerState, request: Request<Body>) -> Response {
    let mut service = ServeDir::new(&state.blog.static_dir);
    match service.try_call(request).await {
        Ok(response) => response.into_response(),
        Err(e) => {
            tracing::error!("Failed to serve static file: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

fn internal_error(e: anyhow::Error) -> Response {
    tracing::error!("Failed to render page: {:#}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
}

/// WebSocket handler for live reload
async fn livereload_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> Response {
    if !state.live_reload {
        return state.not_found();
    }
    let reload_rx = state.reload_tx.subscribe();
    ws.on_upgrade(move |socket| handle_livereload_socket(socket, reload_rx))
}

/// Handle WebSocket connection for live reload
async fn handle_livereload_socket(mut socket: WebSocket, mut reload_rx: broadcast::Receiver<()>) {
    tracing::debug!("Live reload client connected");

    loop {
        tokio::select! {
            result = reload_rx.recv() => {
                match result {
                    Ok(_) => {
                        if socket.send(Message::Text("reload".to_string())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    tracing::debug!("Live reload client disconnected");
}

/// Inject live reload script into HTML content
fn inject_live_reload(html: &str) -> String {
    if html.contains("</body>") {
        html.replacen("</body>", LIVE_RELOAD_SCRIPT, 1)
    } else {
        format!("{}{}", html, LIVE_RELOAD_SCRIPT)
    }
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
