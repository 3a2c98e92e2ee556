use std::fs;

use actix_web::{web, HttpResponse};
use chrono::Utc;
use indexmap::IndexMap;
use log::*;
use serde_derive::{Deserialize, Serialize};
use serde_yaml::Value;

use portal_core::mapping::{self, ClientMappingConfig, FieldMapping};
use portal_core::document;

use crate::app::AppState;
use crate::errors::ServerError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientSummary {
    id: String,
    name: String,
    target_model: String,
    status: &'static str,
    last_updated: String,
}

/// Dashboard list, derived from the per-client mapping files.
pub async fn list_clients_handler(
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServerError> {
    let dir = state.layout.client_mappings_dir();
    let mut clients = vec![];

    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        let filename = entry.file_name().to_string_lossy().into_owned();
        let stem = match filename.strip_suffix(".yml") {
            Some(stem) => stem.to_owned(),
            None => continue,
        };

        let content = fs::read_to_string(entry.path())?;
        let doc: Value = serde_yaml::from_str(&content)
            .map_err(|e| ServerError::Persistence { cause: e.to_string() })?;
        let config = doc.get("client_config");

        let field = |key: &str| -> Option<String> {
            config
                .and_then(|c| c.get(key))
                .and_then(Value::as_str)
                .map(str::to_owned)
        };

        clients.push(ClientSummary {
            name: field("client_name").unwrap_or_else(|| stem.clone()),
            target_model: field("target_model").unwrap_or_else(|| "unknown".to_owned()),
            status: "Active",
            last_updated: field("created_at")
                .unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string()),
            id: stem,
        });
    }

    Ok(HttpResponse::Ok().json(clients))
}

#[derive(Debug, Deserialize)]
pub struct SubmitBody {
    pub config: ClientMappingConfig,
    #[serde(default)]
    pub mappings: IndexMap<String, FieldMapping>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Creates or updates a client mapping: writes the per-client YAML file,
/// merges the record into `dbt_project.yml` by client code, and commits
/// the pair. A publish failure still reports success with a warning.
pub async fn create_client_handler(
    state: web::Data<AppState>,
    body: web::Json<SubmitBody>,
) -> Result<HttpResponse, ServerError> {
    let SubmitBody { config, mappings } = body.into_inner();

    let missing = config.missing_fields();
    if !missing.is_empty() {
        return Err(ServerError::missing(missing));
    }

    info!(
        "Client mapping submission: {} -> {}",
        config.client_code, config.target_model
    );

    let created_at = Utc::now().to_rfc3339();
    let rendered = mapping::render(&config, &mappings, &created_at)?;

    // single writer for the whole read-modify-write span
    let _guard = state.mappings_lock.lock().unwrap();

    fs::create_dir_all(state.layout.client_mappings_dir())?;
    fs::write(state.layout.mapping_file(&rendered.filename), &rendered.file_yaml)?;

    let mut doc = document::load_document(&state.layout.project_yml())?;
    let records = document::client_mappings_mut(&mut doc)?;
    document::upsert(records, "client_code", rendered.record);
    document::write_document(&state.layout.project_yml(), &doc)?;

    let mapping_path = format!("models/staging/client_mappings/{}", rendered.filename);
    let message = format!(
        "Add client mapping for {}\n\n- Client: {} ({})\n- Target model: {}\n- Source: {}\n- Created via Client Mapping Portal",
        config.client_name,
        config.client_name,
        config.client_code,
        config.target_model,
        config.source_table,
    );

    let response = match state
        .publisher
        .publish(&[&mapping_path, "dbt_project.yml"], &message)
    {
        Ok(()) => SubmitResponse {
            success: true,
            message: "Client mapping created successfully and pushed to remote".to_owned(),
            filename: rendered.filename,
            warning: None,
        },
        Err(err) => {
            warn!("publish failed for {}: {}", config.client_code, err);
            let warning = if state.debug {
                format!("Could not commit to git: {}", err)
            } else {
                "Could not commit to git".to_owned()
            };
            SubmitResponse {
                success: true,
                message: "Client mapping created (git commit failed)".to_owned(),
                filename: rendered.filename,
                warning: Some(warning),
            }
        }
    };

    Ok(HttpResponse::Ok().json(response))
}
