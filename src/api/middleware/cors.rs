//! CORS middleware configuration.

use tower_http::cors::CorsLayer;

/// Create the CORS layer.
///
/// Permissive by default; set `ALLOWED_ORIGINS` (comma separated) to
/// restrict the allowed origins.
pub fn create_cors_layer() -> CorsLayer {
    match std::env::var("ALLOWED_ORIGINS") {
        Ok(origins) if !origins.trim().is_empty() => {
            let parsed = origins
                .split(',')
                .filter_map(|o| o.trim().parse::<axum::http::HeaderValue>().ok())
                .collect::<Vec<_>>();
            CorsLayer::new()
                .allow_origin(tower_http::cors::AllowOrigin::list(parsed))
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any)
        }
        _ => CorsLayer::permissive(),
    }
}
