//! Development server with live reload

use anyhow::Result;
use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket},
        Path as UrlPath, Query, State, WebSocketUpgrade,
    },
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode, DebounceEventResult};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, RwLock};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::commands::list;
use crate::content::{Post, PostRepository};
use crate::generator::Generator;
use crate::Folio;

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

/// Server state
struct ServerState {
    public_dir: PathBuf,
    reload_tx: broadcast::Sender<()>,
    live_reload: bool,
    /// Current snapshot; replaced whole after every rebuild
    posts: RwLock<Arc<PostRepository>>,
}

impl ServerState {
    async fn snapshot(&self) -> Arc<PostRepository> {
        self.posts.read().await.clone()
    }

    async fn replace(&self, repo: PostRepository) {
        *self.posts.write().await = Arc::new(repo);
    }
}

/// Query string of `/api/posts`
#[derive(Debug, Default, Deserialize)]
struct PostQuery {
    q: Option<String>,
    tag: Option<String>,
}

/// Start the development server over an already built site
pub async fn start(
    folio: &Folio,
    repo: PostRepository,
    ip: &str,
    port: u16,
    watch: bool,
    open: bool,
) -> Result<()> {
    // Create broadcast channel for live reload notifications
    let (reload_tx, _) = broadcast::channel::<()>(16);

    let state = Arc::new(ServerState {
        public_dir: folio.public_dir.clone(),
        reload_tx,
        live_reload: watch,
        posts: RwLock::new(Arc::new(repo)),
    });

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

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    if watch {
        let folio = folio.clone();
        tokio::spawn(async move {
            if let Err(e) = watch_and_reload(folio, state).await {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/__livereload", get(livereload_handler))
        .route("/api/posts", get(posts_handler))
        .route("/api/posts/*slug", get(post_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Watch content and config, rebuild, swap the snapshot, then reload clients
async fn watch_and_reload(mut folio: Folio, state: Arc<ServerState>) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<DebounceEventResult>();

    // Create debouncer to avoid multiple rapid rebuilds
    let mut debouncer = new_debouncer(Duration::from_millis(500), move |res| {
        let _ = tx.send(res);
    })?;

    if folio.content_dir.exists() {
        debouncer
            .watcher()
            .watch(&folio.content_dir, RecursiveMode::Recursive)?;
        tracing::debug!("Watching: {:?}", folio.content_dir);
    }

    let config_path = folio.config_path();
    if config_path.exists() {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
        tracing::debug!("Watching: {:?}", config_path);
    }

    while let Some(result) = rx.recv().await {
        let events = match result {
            Ok(events) => events,
            Err(e) => {
                tracing::error!("Watch error: {:?}", e);
                continue;
            }
        };

        // Skip VCS metadata and editor temp files
        let relevant: Vec<_> = events
            .iter()
            .filter(|e| {
                let path_str = e.path.to_string_lossy();
                !path_str.contains(".git")
                    && !path_str.contains(".DS_Store")
                    && !path_str.ends_with('~')
            })
            .collect();

        if relevant.is_empty() {
            continue;
        }

        for event in &relevant {
            tracing::info!("File changed: {}", event.path.display());
        }

        tracing::info!("Regenerating...");
        match rebuild(&folio).await {
            Ok((next, repo)) => {
                folio = next;
                state.replace(repo).await;
                tracing::info!("Regenerated successfully");
                // Notify all connected clients to reload
                let _ = state.reload_tx.send(());
            }
            Err(e) => {
                tracing::error!("Generation failed: {}", e);
            }
        }
    }

    Ok(())
}

async fn rebuild(folio: &Folio) -> Result<(Folio, PostRepository)> {
    let (folio, repo) = folio.reload().await?;
    Generator::new(&folio).generate(&repo)?;
    Ok((folio, repo))
}

/// JSON listing, optionally filtered by `q` (title/tag search) and `tag`
async fn posts_handler(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<PostQuery>,
) -> Json<Vec<Post>> {
    let repo = state.snapshot().await;
    let posts = list::select(&repo, params.tag.as_deref(), params.q.as_deref())
        .into_iter()
        .cloned()
        .collect();
    Json(posts)
}

/// A single post by slug
async fn post_handler(
    State(state): State<Arc<ServerState>>,
    UrlPath(slug): UrlPath<String>,
) -> Response {
    let repo = state.snapshot().await;
    match repo.get_by_slug(&slug) {
        Some(post) => Json(post.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, format!("Post not found: {}", slug)).into_response(),
    }
}

/// WebSocket handler for live reload
async fn livereload_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
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

/// Fallback handler that serves files and injects live reload script
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let Some(file_path) = resolve_public_path(&state.public_dir, request.uri().path()) else {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    };

    let is_html = file_path
        .extension()
        .map(|ext| ext == "html" || ext == "htm")
        .unwrap_or(false);

    if is_html && state.live_reload {
        match tokio::fs::read_to_string(&file_path).await {
            Ok(content) => Html(inject_live_reload(&content)).into_response(),
            Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
        }
    } else {
        let mut service = ServeDir::new(&state.public_dir).append_index_html_on_directories(true);
        match service.try_call(request).await {
            Ok(response) => response.into_response(),
            Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
        }
    }
}

/// File under `public_dir` for a request path. Paths with `..` or any other
/// non-plain segment are refused.
fn resolve_public_path(public_dir: &Path, uri_path: &str) -> Option<PathBuf> {
    let relative = Path::new(uri_path.trim_start_matches('/'));
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }

    let candidate = public_dir.join(relative);
    if candidate.is_dir() {
        Some(candidate.join("index.html"))
    } else {
        Some(candidate)
    }
}

/// Inject live reload script into HTML content
fn inject_live_reload(html: &str) -> String {
    if html.contains("</body>") {
        html.replace("</body>", LIVE_RELOAD_SCRIPT)
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

#[cfg(test)]
mod tests {
    use super::*;

    fn state(repo: PostRepository) -> Arc<ServerState> {
        let (reload_tx, _) = broadcast::channel(1);
        Arc::new(ServerState {
            public_dir: PathBuf::from("public"),
            reload_tx,
            live_reload: true,
            posts: RwLock::new(Arc::new(repo)),
        })
    }

    fn repo(titles: &[(&str, &str)]) -> PostRepository {
        PostRepository::new(titles.iter().map(|(file, header)| {
            Post::parse(file, &format!("---\n{}\n---\nbody", header))
        }))
    }

    #[test]
    fn test_inject_live_reload() {
        let html = inject_live_reload("<html><body><p>x</p></body></html>");
        assert!(html.contains("__livereload"));
        assert!(html.ends_with("</html>"));

        let bare = inject_live_reload("<p>x</p>");
        assert!(bare.starts_with("<p>x</p>"));
        assert!(bare.contains("</script>"));
    }

    #[test]
    fn test_resolve_public_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let public = dir.path().join("public");
        std::fs::create_dir_all(public.join("blog/a")).unwrap();

        assert_eq!(
            resolve_public_path(&public, "/"),
            Some(public.join("index.html"))
        );
        assert_eq!(
            resolve_public_path(&public, "/blog/a/"),
            Some(public.join("blog/a/index.html"))
        );
        assert_eq!(
            resolve_public_path(&public, "/search.json"),
            Some(public.join("search.json"))
        );
        assert_eq!(resolve_public_path(&public, "/../_config.yml"), None);
        assert_eq!(resolve_public_path(&public, "/blog/../../secret.html"), None);
    }

    #[tokio::test]
    async fn test_traversal_is_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let public = dir.path().join("public");
        std::fs::create_dir_all(&public).unwrap();
        std::fs::write(dir.path().join("outside.html"), "<p>secret</p>").unwrap();

        let (reload_tx, _) = broadcast::channel(1);
        let state = Arc::new(ServerState {
            public_dir: public,
            reload_tx,
            live_reload: true,
            posts: RwLock::new(Arc::new(PostRepository::default())),
        });
        let request = Request::builder()
            .uri("/../outside.html")
            .body(Body::empty())
            .unwrap();
        let response = fallback_handler(State(state), request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_posts_api_filters() {
        let state = state(repo(&[
            ("a.md", "title: Alpha\ntags: [Rust]"),
            ("b.md", "title: Beta\ntags: [Design]"),
        ]));

        let Json(all) = posts_handler(State(state.clone()), Query(PostQuery::default())).await;
        assert_eq!(all.len(), 2);

        let query = PostQuery {
            q: None,
            tag: Some("rust".to_string()),
        };
        let Json(tagged) = posts_handler(State(state), Query(query)).await;
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].title, "Alpha");
    }

    #[tokio::test]
    async fn test_snapshot_is_replaced_whole() {
        let state = state(repo(&[("a.md", "title: Alpha")]));
        let before = state.snapshot().await;

        state
            .replace(repo(&[("a.md", "title: Alpha"), ("c.md", "title: Gamma")]))
            .await;

        assert_eq!(before.len(), 1);
        assert_eq!(state.snapshot().await.len(), 2);

        let missing = post_handler(State(state.clone()), UrlPath("zzz".to_string())).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        let found = post_handler(State(state), UrlPath("c".to_string())).await;
        assert_eq!(found.status(), StatusCode::OK);
    }
}
