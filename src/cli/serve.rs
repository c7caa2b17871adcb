use poem::{listener::TcpListener, Server};

use crate::api::build_routes;
use crate::app_data::AppData;

/// Serve the HTTP API until the process is stopped
pub async fn run_server(app_data: &AppData) -> Result<(), std::io::Error> {
    let bind_address = app_data.settings.bind_address();
    let public_url = format!("http://{}", bind_address);
    let app = build_routes(app_data, &public_url);

    tracing::info!("Starting server on {}", public_url);
    tracing::info!("Swagger UI available at {}/swagger", public_url);

    Server::new(TcpListener::bind(bind_address)).run(app).await
}
