use std::fs;

use actix_web::{web, HttpResponse};
use indexmap::IndexMap;
use log::*;
use serde_derive::Serialize;

use portal_core::document;
use portal_core::mapping::ProjectMappingRecord;

use crate::app::AppState;
use crate::errors::ServerError;

const BASELINE_FILES: [&str; 2] = ["globex.yml", "wayne.yml"];

/// The two baseline demo clients. Reset overwrites the whole client list
/// with exactly these records; this is the one place that does not
/// merge minimally.
pub fn baseline_clients() -> Vec<ProjectMappingRecord> {
    let globex_mappings: IndexMap<String, String> = vec![
        ("candidate_id", "staff_id"),
        ("full_name", "full_name"),
        ("email", "work_email"),
        ("phone_number", "phone"),
        ("hire_date", "onboard_date"),
        ("hourly_rate", "pay_rate"),
        ("client_code", "'GLOBEX'"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v.to_owned()))
    .collect();

    let wayne_mappings: IndexMap<String, String> = vec![
        ("candidate_id", "worker_id"),
        ("full_name", "first_name || ' ' || last_name"),
        ("email", "email"),
        ("phone_number", "contact_phone"),
        ("hire_date", "hire_date"),
        ("hourly_rate", "hourly_wage"),
        ("client_code", "'WAYNE'"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v.to_owned()))
    .collect();

    vec![
        ProjectMappingRecord {
            client_code: "GLOBEX".to_owned(),
            client_name: "Globex Corporation".to_owned(),
            source_table: "globex_staff_records".to_owned(),
            target_model: "dim_candidate".to_owned(),
            field_mappings: globex_mappings,
        },
        ProjectMappingRecord {
            client_code: "WAYNE".to_owned(),
            client_name: "Wayne Enterprises".to_owned(),
            source_table: "wayne_enterprises_workers".to_owned(),
            target_model: "dim_candidate".to_owned(),
            field_mappings: wayne_mappings,
        },
    ]
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetResponse {
    pub success: bool,
    pub message: String,
    pub remaining_clients: Vec<String>,
    pub deleted_files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Returns the project to the known demo state: only the baseline
/// clients in `dbt_project.yml`, only the baseline mapping files on
/// disk. Deleted files are gone for good; confirmation is the caller's
/// responsibility.
pub async fn reset_demo_handler(
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServerError> {
    info!("Resetting demo data");

    let baseline = baseline_clients();
    let remaining: Vec<String> = baseline.iter().map(|c| c.client_code.clone()).collect();

    let _guard = state.mappings_lock.lock().unwrap();

    // full overwrite of the client list, everything else untouched
    let mut doc = document::load_document(&state.layout.project_yml())?;
    let records = document::client_mappings_mut(&mut doc)?;
    records.clear();
    for client in &baseline {
        records.push(
            serde_yaml::to_value(client)
                .map_err(|e| ServerError::Persistence { cause: e.to_string() })?,
        );
    }
    document::write_document(&state.layout.project_yml(), &doc)?;

    let mut deleted = vec![];
    for entry in fs::read_dir(state.layout.client_mappings_dir())? {
        let entry = entry?;
        let filename = entry.file_name().to_string_lossy().into_owned();
        if !filename.ends_with(".yml") || BASELINE_FILES.contains(&filename.as_str()) {
            continue;
        }
        fs::remove_file(entry.path())?;
        info!("Deleted {}", filename);
        deleted.push(filename);
    }

    let message = "Reset demo data to base configuration\n\n- Removed test client mappings\n- Kept base clients: GLOBEX, WAYNE";
    let response = match state
        .publisher
        .publish(&["dbt_project.yml", "models/staging/client_mappings"], message)
    {
        Ok(()) => ResetResponse {
            success: true,
            message: "Demo data reset successfully and pushed to remote".to_owned(),
            remaining_clients: remaining,
            deleted_files: deleted,
            warning: None,
        },
        Err(err) => {
            warn!("publish failed during reset: {}", err);
            ResetResponse {
                success: true,
                message: "Demo data reset (git commit failed)".to_owned(),
                remaining_clients: remaining,
                deleted_files: deleted,
                warning: Some("Could not commit to git".to_owned()),
            }
        }
    };

    Ok(HttpResponse::Ok().json(response))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn baseline_is_exactly_globex_and_wayne() {
        let baseline = baseline_clients();
        assert_eq!(baseline.len(), 2);
        assert_eq!(baseline[0].client_code, "GLOBEX");
        assert_eq!(baseline[1].client_code, "WAYNE");
        assert_eq!(
            baseline[1].field_mappings.get("full_name").map(String::as_str),
            Some("first_name || ' ' || last_name")
        );
    }
}
