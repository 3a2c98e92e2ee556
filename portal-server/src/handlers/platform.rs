use std::fs;

use actix_web::{web, HttpResponse};
use log::*;
use serde_derive::Serialize;
use serde_json::json;
use serde_yaml::Sequence;

use portal_core::catalog;
use portal_core::document;
use portal_core::entity::{self, PlatformEntityConfig};
use portal_core::sources;

use crate::app::AppState;
use crate::errors::ServerError;

pub async fn entity_types_handler() -> HttpResponse {
    HttpResponse::Ok().json(catalog::entity_type_catalog())
}

pub async fn cardinality_types_handler() -> HttpResponse {
    HttpResponse::Ok().json(catalog::cardinality_catalog())
}

/// Source tables available to the entity designer.
pub async fn platform_sources_handler(
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServerError> {
    let tables = sources::list_sources(&state.layout.platform_seeds_dir())?;

    Ok(HttpResponse::Ok().json(json!({ "platform_demo": tables })))
}

pub async fn platform_source_schema_handler(
    state: web::Data<AppState>,
    table: web::Path<String>,
) -> Result<HttpResponse, ServerError> {
    info!("Platform source schema for {}", table);

    let csv_path = state
        .layout
        .platform_seeds_dir()
        .join(format!("{}.csv", table));
    let columns = sources::describe_columns(&csv_path)?;

    Ok(HttpResponse::Ok().json(columns))
}

/// Persisted entities from the platform schema document. No document
/// yet means no entities, not an error.
pub async fn list_entities_handler(
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServerError> {
    let schema_path = state.layout.platform_schema_yml();
    if !schema_path.exists() {
        return Ok(HttpResponse::Ok().json(Sequence::new()));
    }

    let doc = document::load_document(&schema_path)?;
    let models = document::models(&doc).cloned().unwrap_or_default();

    Ok(HttpResponse::Ok().json(models))
}

#[derive(Debug, Serialize)]
pub struct EntityResponse {
    pub success: bool,
    pub message: String,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Creates or updates a platform entity: writes the generated model
/// file, merges the schema entry by model name, and commits both.
pub async fn create_entity_handler(
    state: web::Data<AppState>,
    body: web::Json<PlatformEntityConfig>,
) -> Result<HttpResponse, ServerError> {
    let config = body.into_inner();

    let missing = config.missing_fields();
    if !missing.is_empty() {
        return Err(ServerError::missing(missing));
    }

    info!(
        "Platform entity submission: {} ({})",
        config.model_name, config.entity_type
    );

    let rendered = entity::render(&config)?;

    let _guard = state.schema_lock.lock().unwrap();

    fs::create_dir_all(state.layout.platform_models_dir())?;
    fs::write(state.layout.model_file(&rendered.filename), &rendered.model_sql)?;

    let schema_path = state.layout.platform_schema_yml();
    let mut doc = if schema_path.exists() {
        document::load_document(&schema_path)?
    } else {
        document::new_schema_document()
    };
    let models = document::models_mut(&mut doc)?;
    document::upsert(models, "name", rendered.schema_entry);
    document::write_document(&schema_path, &doc)?;

    let model_path = format!("models/platform_demo/{}", rendered.filename);
    let message = format!(
        "Add platform entity {}\n\n- Type: {}\n- Source: {}\n- Created via Platform Entity Designer",
        config.model_name, config.entity_type, config.source_table,
    );

    let response = match state
        .publisher
        .publish(&[&model_path, "models/platform_demo/platform_demo.yml"], &message)
    {
        Ok(()) => EntityResponse {
            success: true,
            message: format!("Entity {} created successfully", config.model_name),
            filename: rendered.filename,
            warning: None,
        },
        Err(err) => {
            warn!("publish failed for entity {}: {}", config.model_name, err);
            let warning = if state.debug {
                format!("Could not commit to git: {}", err)
            } else {
                "Could not commit to git".to_owned()
            };
            EntityResponse {
                success: true,
                message: format!("Entity {} created (git commit failed)", config.model_name),
                filename: rendered.filename,
                warning: Some(warning),
            }
        }
    };

    Ok(HttpResponse::Ok().json(response))
}

/// Removes the named entity's model file and schema entry. Either being
/// absent already is tolerated silently.
pub async fn delete_entity_handler(
    state: web::Data<AppState>,
    name: web::Path<String>,
) -> Result<HttpResponse, ServerError> {
    let name = name.into_inner();
    info!("Deleting platform entity {}", name);

    let _guard = state.schema_lock.lock().unwrap();

    let model_path = state.layout.model_file(&format!("{}.sql", name));
    if model_path.exists() {
        fs::remove_file(&model_path)?;
    }

    let schema_path = state.layout.platform_schema_yml();
    if schema_path.exists() {
        let mut doc = document::load_document(&schema_path)?;
        let models = document::models_mut(&mut doc)?;
        document::remove(models, "name", &name);
        document::write_document(&schema_path, &doc)?;
    }

    let message = format!("Remove platform entity {}", name);
    let publish_result = state
        .publisher
        .publish(&["models/platform_demo"], &message);
    let warning = match publish_result {
        Ok(()) => None,
        Err(err) => {
            warn!("publish failed removing entity {}: {}", name, err);
            Some("Could not commit to git".to_owned())
        }
    };

    let mut body = json!({
        "success": true,
        "message": format!("Entity {} deleted", name),
    });
    if let Some(warning) = warning {
        body["warning"] = json!(warning);
    }

    Ok(HttpResponse::Ok().json(body))
}
