// API layer - HTTP endpoints
pub mod admin;
pub mod auth;
pub mod health;
pub mod helpers;

use poem::{Endpoint, Route};
use poem_openapi::OpenApiService;

pub use admin::AdminApi;
pub use auth::AuthApi;
pub use health::HealthApi;

use crate::app_data::AppData;

/// Build the HTTP application: the API under `/api`, Swagger UI under `/swagger`
///
/// # Arguments
/// * `server_url` - Public base URL advertised in the OpenAPI document
pub fn build_routes(app_data: &AppData, server_url: &str) -> impl Endpoint {
    let cookie_name = app_data.settings.session_cookie_name().to_string();

    let api_service = OpenApiService::new(
        (
            HealthApi::new(app_data.db.clone()),
            AuthApi::new(app_data.auth_service.clone(), cookie_name.clone()),
            AdminApi::new(app_data.auth_service.clone(), cookie_name),
        ),
        "Classroom Auth API",
        env!("CARGO_PKG_VERSION"),
    )
    .server(format!("{}/api", server_url.trim_end_matches('/')));

    let ui = api_service.swagger_ui();

    Route::new().nest("/api", api_service).nest("/swagger", ui)
}
