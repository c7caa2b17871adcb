use crate::app_data::AppData;

/// Remove expired session rows
pub async fn purge_sessions(app_data: &AppData) -> Result<u64, Box<dyn std::error::Error>> {
    Ok(app_data.auth_service.purge_expired_sessions().await?)
}
