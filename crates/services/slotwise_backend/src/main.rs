// File: crates/services/slotwise_backend/src/main.rs
mod app_state;

use app_state::AppState;
use axum::http::{header, Method};
use axum::{routing::get, Router};
use slotwise_common::{config_error, internal_error, logging, SlotwiseError};
use slotwise_config::load_config;
use slotwise_gcal::routes as gcal_routes;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    logging::init();

    if let Err(e) = run().await {
        error!(error = %e, "slotwise backend stopped");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), SlotwiseError> {
    let config = Arc::new(load_config().map_err(config_error)?);
    let state = AppState::new(config.clone()).await?;

    let api_router = Router::new()
        .route("/", get(|| async { "Welcome to the slotwise API!" }))
        .merge(gcal_routes::routes(state.gcal_state.clone()));

    #[allow(unused_mut)] // for the features it needs to be mutable
    let mut app = Router::new().nest("/api", api_router);

    // Conditionally add Swagger UI and JSON endpoint if openapi feature enabled
    #[cfg(feature = "openapi")]
    {
        use slotwise_gcal::doc::GcalApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "slotwise API",
                version = "0.1.0",
                description = "Public booking pages backed by Google Calendar",
                license(name = "MIT", url = "https://opensource.org/licenses/MIT")
            ),
            servers( (url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(GcalApiDoc::openapi());
        info!("Adding Swagger UI at /api/docs");

        let swagger_ui = SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc);
        app = app.merge(swagger_ui);
    }

    // booking pages are embedded on the owners' own sites
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);
    let app = app.layer(cors).layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| internal_error(format!("cannot bind {}: {}", addr, e)))?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(internal_error)?;
    Ok(())
}
