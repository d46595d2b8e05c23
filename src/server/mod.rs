//! Blog HTTP server

pub mod middleware;

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    response::{Html, IntoResponse, Response},
    routing::get,
    Extension, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tera::Context;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cache::PostCache;
use crate::config::SiteConfig;
use crate::content::{ContentError, Post};
use crate::templates::{PostData, SiteData, TemplateRenderer};
use crate::Folio;
use middleware::{garnish, redirect_to_https, Garnish};

const ABOUT_SLUG: &str = "about";
const BOOKSHELF_SLUG: &str = "bookshelf";

/// Server state shared by all handlers
pub struct AppState {
    cache: Arc<PostCache>,
    templates: TemplateRenderer,
    site: SiteData,
}

impl AppState {
    pub fn new(cache: Arc<PostCache>, config: &SiteConfig) -> Result<Self> {
        Ok(Self {
            cache,
            templates: TemplateRenderer::new()?,
            site: SiteData::from(config),
        })
    }
}

/// Build the router with all blog routes and middleware
pub fn router(state: Arc<AppState>, config: &SiteConfig, assets_dir: &std::path::Path) -> Router {
    let region: Arc<str> = Arc::from(config.region());

    let app = Router::new()
        .route("/", get(home_handler))
        .route("/blog", get(blog_handler))
        .route("/about", get(about_handler))
        .route("/bookshelf", get(bookshelf_handler))
        .route("/post/:slug", get(post_handler))
        .nest_service("/assets", ServeDir::new(assets_dir))
        .fallback(not_found_handler)
        .with_state(state)
        .layer(from_fn_with_state(region, garnish));

    let app = if config.force_https {
        app.layer(from_fn(redirect_to_https))
    } else {
        app
    };

    app.layer(TraceLayer::new_for_http())
}

/// Start the blog server
pub async fn start(folio: &Folio, ip: &str, port: u16) -> Result<()> {
    let cache = Arc::new(folio.post_cache());

    // Warm the listing so the first visitor does not pay for it
    let warm = Arc::clone(&cache);
    match tokio::task::spawn_blocking(move || warm.list_all()).await? {
        Ok(snapshot) => tracing::info!("Loaded {} posts", snapshot.posts().len()),
        Err(e) => tracing::warn!("Could not load posts at startup: {}", e),
    }

    let state = Arc::new(AppState::new(cache, &folio.config)?);
    let app = router(state, &folio.config, &folio.assets_dir);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

/// Run a blocking content operation off the async workers
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> crate::content::Result<T> + Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await??)
}

async fn home_handler(
    State(state): State<Arc<AppState>>,
    Extension(garnish): Extension<Garnish>,
) -> Response {
    render_page(&state, &garnish, StatusCode::OK, "home", "home.html", Context::new())
}

async fn blog_handler(
    State(state): State<Arc<AppState>>,
    Extension(garnish): Extension<Garnish>,
) -> Response {
    let cache = Arc::clone(&state.cache);
    match run_blocking(move || cache.list_all()).await {
        Ok(snapshot) => {
            tracing::debug!("Found {} posts", snapshot.posts().len());
            let posts: Vec<PostData> = snapshot.posts().iter().map(PostData::from).collect();
            let mut context = Context::new();
            context.insert("posts", &posts);
            render_page(&state, &garnish, StatusCode::OK, "blog", "blog.html", context)
        }
        Err(e) => {
            tracing::error!("Failed to list posts: {:#}", e);
            render_error(&state, &garnish, StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn about_handler(
    State(state): State<Arc<AppState>>,
    Extension(garnish): Extension<Garnish>,
) -> Response {
    single_post(&state, &garnish, ABOUT_SLUG.to_string(), "about").await
}

async fn bookshelf_handler(
    State(state): State<Arc<AppState>>,
    Extension(garnish): Extension<Garnish>,
) -> Response {
    single_post(&state, &garnish, BOOKSHELF_SLUG.to_string(), "bookshelf").await
}

async fn post_handler(
    State(state): State<Arc<AppState>>,
    Extension(garnish): Extension<Garnish>,
    Path(slug): Path<String>,
) -> Response {
    single_post(&state, &garnish, slug, "post").await
}

async fn not_found_handler(
    State(state): State<Arc<AppState>>,
    Extension(garnish): Extension<Garnish>,
) -> Response {
    render_error(&state, &garnish, StatusCode::NOT_FOUND)
}

/// Render one post straight from the store, bypassing the listing cache
async fn single_post(state: &AppState, garnish: &Garnish, slug: String, section: &str) -> Response {
    let cache = Arc::clone(&state.cache);
    let loaded: Result<Post> = run_blocking(move || cache.loader().load_by_slug(&slug)).await;

    match loaded {
        Ok(post) => {
            let mut context = Context::new();
            context.insert("post", &PostData::from(&post));
            render_page(state, garnish, StatusCode::OK, section, "post.html", context)
        }
        Err(e) => {
            let not_found = e
                .downcast_ref::<ContentError>()
                .is_some_and(ContentError::is_not_found);
            if not_found {
                tracing::debug!("{}", e);
            } else {
                tracing::warn!("Failed to load post: {:#}", e);
            }
            render_error(state, garnish, StatusCode::NOT_FOUND)
        }
    }
}

fn render_error(state: &AppState, garnish: &Garnish, status: StatusCode) -> Response {
    let heading = match status {
        StatusCode::NOT_FOUND => "Not Found",
        _ => "Internal Server Error",
    };
    let mut context = Context::new();
    context.insert("heading", heading);
    render_page(state, garnish, status, "error", "error.html", context)
}

fn render_page(
    state: &AppState,
    garnish: &Garnish,
    status: StatusCode,
    section: &str,
    template: &str,
    mut context: Context,
) -> Response {
    context.insert("site", &state.site);
    context.insert("section", section);
    context.insert("garnish", &garnish.data());

    match state.templates.render(template, &context) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render {}: {:?}", template, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}
