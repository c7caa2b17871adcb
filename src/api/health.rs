use chrono::Utc;
use poem_openapi::{payload::Json, OpenApi, Tags};
use sea_orm::{ConnectionTrait, DatabaseConnection};

use crate::types::dto::common::HealthResponse;

/// Health check API
pub struct HealthApi {
    db: DatabaseConnection,
}

impl HealthApi {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// API tags for health endpoints
#[derive(Tags)]
enum ApiTags {
    /// Health check endpoints
    Health,
}

#[OpenApi]
impl HealthApi {
    /// Health check endpoint
    ///
    /// Reports "degraded" when the database does not answer.
    #[oai(path = "/health", method = "get", tag = "ApiTags::Health")]
    async fn health(&self) -> Json<HealthResponse> {
        let status = match self.db.execute_unprepared("SELECT 1").await {
            Ok(_) => "healthy",
            Err(e) => {
                tracing::warn!("Health check database query failed: {}", e);
                "degraded"
            }
        };

        Json(HealthResponse {
            status: status.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        })
    }
}
