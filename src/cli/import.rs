use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::app_data::AppData;
use crate::errors::AuthError;
use crate::services::LegacyUser;
use crate::types::internal::Role;

/// One exported row of the old users table
///
/// `role` defaults to student, matching the old admin form.
#[derive(Deserialize)]
pub struct LegacyUserRow {
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    pub password_text: String,
}

#[derive(Debug, Default, PartialEq)]
pub struct ImportSummary {
    pub imported: usize,
    pub duplicates: usize,
    pub rejected: usize,
}

/// Parse a JSON array of legacy rows
pub fn parse_legacy_rows(json: &str) -> Result<Vec<LegacyUserRow>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Import every row; existing usernames are skipped, invalid rows reported
pub async fn import_rows(app_data: &AppData, rows: Vec<LegacyUserRow>) -> ImportSummary {
    let mut summary = ImportSummary::default();

    for (index, row) in rows.into_iter().enumerate() {
        let role = match row.role.as_deref().map(Role::from_str).transpose() {
            Ok(role) => role.unwrap_or(Role::Student),
            Err(e) => {
                tracing::warn!("Row {} ('{}') rejected: {}", index, row.username, e);
                summary.rejected += 1;
                continue;
            }
        };

        let legacy = LegacyUser {
            username: row.username,
            display_name: row.display_name,
            role,
            password_text: row.password_text,
        };
        let username = legacy.username.clone();

        match app_data.auth_service.import_legacy_user(legacy).await {
            Ok(_) => summary.imported += 1,
            Err(AuthError::DuplicateUsername) => {
                tracing::info!("Row {} ('{}') skipped: username already exists", index, username);
                summary.duplicates += 1;
            }
            Err(e) => {
                tracing::warn!("Row {} ('{}') rejected: {}", index, username, e);
                summary.rejected += 1;
            }
        }
    }

    summary
}

/// Read an exported JSON file and import its rows
pub async fn import_legacy_users(
    app_data: &AppData,
    path: &Path,
) -> Result<ImportSummary, Box<dyn std::error::Error>> {
    let json = fs::read_to_string(path)?;
    let rows = parse_legacy_rows(&json)?;
    tracing::info!("Importing {} legacy user row(s) from {}", rows.len(), path.display());

    Ok(import_rows(app_data, rows).await)
}
