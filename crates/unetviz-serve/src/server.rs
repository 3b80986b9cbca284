//! Web server setup and routing

use anyhow::Result;
use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;
use unetviz_core::ViewerConfig;

use crate::config::Config;

/// Build the router: config API, image assets, then the web bundle as fallback
pub fn router(config: &Config) -> Router {
    let viewer = Arc::new(config.viewer.clone());
    let image_route = config.image_route();

    let app = Router::new().route("/api/config", get(get_config));
    // Static files (WASM frontend) - must be fallback for root
    let web = ServeDir::new(&config.server.web_dir);
    let images = ServeDir::new(config.image_dir());
    let app = if image_route == "/" {
        // axum cannot nest at the root; images sit next to the bundle instead
        app.fallback_service(web.fallback(images))
    } else {
        app.nest_service(&image_route, images).fallback_service(web)
    };

    app.layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    )
    .with_state(viewer)
}

/// Viewer config as JSON
async fn get_config(State(viewer): State<Arc<ViewerConfig>>) -> Json<ViewerConfig> {
    Json((*viewer).clone())
}

/// Run plain HTTP server
pub async fn run(config: &Config) -> Result<()> {
    let app = router(config);
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(
        address = %config.server.bind,
        web_dir = %config.server.web_dir.display(),
        images = %config.image_dir().display(),
        "Starting web server"
    );
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::path::Path;
    use tower::ServiceExt;

    /// Site with `web/index.html` and one image below `assets/<img_dir>`
    fn site(root: &Path, img_dir: &str) -> Config {
        let web = root.join("web");
        let images = root.join("assets").join(img_dir);
        std::fs::create_dir_all(&web).unwrap();
        std::fs::create_dir_all(&images).unwrap();
        std::fs::write(web.join("index.html"), "<canvas id=\"unetviz-canvas\"></canvas>").unwrap();
        std::fs::write(images.join("step1.jpeg"), b"jpeg bytes").unwrap();

        let mut config = Config::default();
        config.server.web_dir = web;
        config.server.assets_dir = root.join("assets");
        config.viewer.assets.img_dir = img_dir.to_string();
        config
    }

    async fn get_body(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_config_handler_returns_viewer_section() {
        let mut viewer = ViewerConfig::default();
        viewer.slider.interval_ms = 4000;

        let Json(body) = get_config(State(Arc::new(viewer.clone()))).await;
        assert_eq!(body, viewer);

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["slider"]["interval_ms"], 4000);
        assert_eq!(json["slider"]["target"], "preVisu");
    }

    #[tokio::test]
    async fn test_routes_config_images_and_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = site(dir.path(), "img");
        config.viewer.slider.interval_ms = 2500;
        let app = router(&config);

        let (status, body) = get_body(app.clone(), "/api/config").await;
        assert_eq!(status, StatusCode::OK);
        let viewer: ViewerConfig = serde_json::from_slice(&body).unwrap();
        assert_eq!(viewer.slider.interval_ms, 2500);

        let (status, body) = get_body(app.clone(), "/img/step1.jpeg").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"jpeg bytes");

        let (status, body) = get_body(app.clone(), "/index.html").await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8_lossy(&body).contains("unetviz-canvas"));

        let (status, _) = get_body(app, "/img/missing.jpeg").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_image_dir_serves_images_from_root() {
        let dir = tempfile::tempdir().unwrap();
        let config = site(dir.path(), "");
        let app = router(&config);

        let (status, body) = get_body(app.clone(), "/step1.jpeg").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"jpeg bytes");

        let (status, _) = get_body(app, "/index.html").await;
        assert_eq!(status, StatusCode::OK);
    }
}
