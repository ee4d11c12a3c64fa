//! Local gallery server.
//!
//! Serves the curated catalogue and proxies image search to Pexels so the
//! API key never leaves this process.
//!
//! Endpoints:
//! - GET /gallery - Curated photos (`?category=&query=` to filter)
//! - GET /gallery/{id} - One curated photo
//! - GET /search - Image search (`?query=&per_page=`)
//! - GET /assets/* - Static gallery images, when an assets directory is set

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{error, info, warn};

use crate::gallery::{Catalog, PexelsClient, DEFAULT_PER_PAGE};
use crate::models::{Category, Photo};

/// Largest page Pexels accepts.
const MAX_PER_PAGE: u32 = 80;

/// Shared server state.
#[derive(Debug)]
pub struct ServerState {
    catalog: Catalog,
    /// `None` when no key is configured.
    pexels: Option<PexelsClient>,
}

impl ServerState {
    pub const fn new(catalog: Catalog, pexels: Option<PexelsClient>) -> Self {
        Self { catalog, pexels }
    }
}

/// Server settings.
#[derive(Debug, Clone)]
pub struct ServeOptions {
    pub port: u16,
    /// Directory served under `/assets`.
    pub assets: Option<PathBuf>,
    pub open_browser: bool,
}

#[derive(Debug, Deserialize)]
struct GalleryParams {
    category: Option<String>,
    query: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: String,
    per_page: Option<u32>,
}

/// Build the router.
pub fn router(state: Arc<ServerState>, assets: Option<PathBuf>) -> Router {
    let mut app = Router::new()
        .route("/gallery", get(list_gallery))
        .route("/gallery/{id}", get(get_photo))
        .route("/search", get(search))
        .with_state(state);

    if let Some(dir) = assets {
        app = app.nest_service("/assets", ServeDir::new(dir));
    }

    app.layer(CorsLayer::permissive())
}

// === Server Lifecycle ===

/// Start the server and run until it fails.
pub async fn start_server(state: ServerState, options: ServeOptions) -> Result<()> {
    if state.pexels.is_none() {
        warn!("PEXELS_API_KEY is not set, image search will answer 503");
    }

    let app = router(Arc::new(state), options.assets);
    let addr = SocketAddr::from(([127, 0, 0, 1], options.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(%addr, "Gallery server listening");
    println!("Gallery server running on http://{addr}");

    if options.open_browser {
        if let Err(e) = open::that(format!("http://{addr}/gallery")) {
            warn!(error = %e, "Could not open browser");
        }
    }

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

// === Handlers ===

async fn list_gallery(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<GalleryParams>,
) -> Result<Json<Vec<Photo>>, StatusCode> {
    let category = match params.category.as_deref() {
        Some(name) => Category::from_name(name).ok_or(StatusCode::BAD_REQUEST)?,
        None => Category::All,
    };
    let query = params.query.unwrap_or_default();

    Ok(Json(
        state
            .catalog
            .filter(category, &query)
            .into_iter()
            .cloned()
            .collect(),
    ))
}

async fn get_photo(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<u64>,
) -> Result<Json<Photo>, StatusCode> {
    state
        .catalog
        .get(id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn search(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<SearchParams>,
) -> Response {
    let Some(pexels) = &state.pexels else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            "Image search is not configured",
        )
            .into_response();
    };

    let query = params.query.trim();
    if query.is_empty() {
        return Json(Vec::<Photo>::new()).into_response();
    }
    let per_page = params
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);

    match pexels.search(query, per_page).await {
        Ok(photos) => Json(photos).into_response(),
        Err(e) => {
            error!(error = %e, query, "Image search failed");
            (StatusCode::BAD_GATEWAY, "Image search failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::serve;
    use serde_json::json;
    use std::collections::HashMap;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Photo {
                id: 1,
                title: "Robotics Club".to_string(),
                image: "/assets/1.jpg".to_string(),
                category: "Activities".to_string(),
            },
            Photo {
                id: 2,
                title: "Main Library".to_string(),
                image: "/assets/2.jpg".to_string(),
                category: "Facilities".to_string(),
            },
            Photo {
                id: 3,
                title: "Darkroom Prints".to_string(),
                image: "/assets/3.jpg".to_string(),
                category: "CollagePhotography".to_string(),
            },
        ])
    }

    /// Answers with one photo whose `alt` echoes the requested page size.
    async fn fake_pexels(fail: bool) -> String {
        let app = Router::new().route(
            "/v1/search",
            get(move |Query(params): Query<HashMap<String, String>>| async move {
                if fail {
                    return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({})));
                }
                let per_page = params.get("per_page").cloned().unwrap_or_default();
                (
                    StatusCode::OK,
                    Json(json!({"photos": [{
                        "id": 9,
                        "alt": format!("Quad x{per_page}"),
                        "src": {"original": "https://images.pexels.com/9.jpg"}
                    }]})),
                )
            }),
        );
        format!("{}/v1/search", serve(app).await)
    }

    async fn gallery_server(pexels: Option<PexelsClient>) -> String {
        serve(router(Arc::new(ServerState::new(catalog(), pexels)), None)).await
    }

    #[tokio::test]
    async fn gallery_filters() {
        let base = gallery_server(None).await;

        let all: Vec<Photo> = reqwest::get(format!("{base}/gallery"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(all.len(), 3);

        let some: Vec<Photo> = reqwest::get(format!("{base}/gallery?category=facilities"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(some[0].id, 2);

        for name in ["CollagePhotography", "collage-photography"] {
            let res = reqwest::get(format!("{base}/gallery?category={name}"))
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::OK, "category {name}");
            let photos: Vec<Photo> = res.json().await.unwrap();
            assert_eq!(photos.len(), 1);
            assert_eq!(photos[0].id, 3);
        }

        let bad = reqwest::get(format!("{base}/gallery?category=nope"))
            .await
            .unwrap();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let missing = reqwest::get(format!("{base}/gallery/99")).await.unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn search_without_key_is_unavailable() {
        let base = gallery_server(None).await;
        let res = reqwest::get(format!("{base}/search?query=quad"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn search_proxies_to_pexels() {
        let upstream = fake_pexels(false).await;
        let base = gallery_server(Some(PexelsClient::with_search_url("k", upstream))).await;

        let photos: Vec<Photo> = reqwest::get(format!("{base}/search?query=quad"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(photos[0].title, format!("Quad x{DEFAULT_PER_PAGE}"));
    }

    #[tokio::test]
    async fn search_page_size_is_clamped() {
        let upstream = fake_pexels(false).await;
        let base = gallery_server(Some(PexelsClient::with_search_url("k", upstream))).await;

        for (asked, sent) in [(500, MAX_PER_PAGE), (0, 1)] {
            let photos: Vec<Photo> =
                reqwest::get(format!("{base}/search?query=quad&per_page={asked}"))
                    .await
                    .unwrap()
                    .json()
                    .await
                    .unwrap();
            assert_eq!(photos[0].title, format!("Quad x{sent}"));
        }
    }

    #[tokio::test]
    async fn upstream_failure_is_bad_gateway() {
        let upstream = fake_pexels(true).await;
        let base = gallery_server(Some(PexelsClient::with_search_url("k", upstream))).await;

        let res = reqwest::get(format!("{base}/search?query=quad"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    }
}
