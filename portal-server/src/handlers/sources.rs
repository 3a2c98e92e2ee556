use actix_web::{web, HttpResponse};
use log::*;
use serde_json::json;

use portal_core::sources;

use crate::app::AppState;
use crate::errors::ServerError;

/// Available client source tables, grouped under the seed set name.
pub async fn list_sources_handler(
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServerError> {
    let tables = sources::list_sources(&state.layout.client_seeds_dir())?;

    Ok(HttpResponse::Ok().json(json!({ "raw_clients": tables })))
}

/// Column descriptors for one source table. The schema path segment is
/// routing only; seed files are flat under the seeds directory.
pub async fn source_schema_handler(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ServerError> {
    let (schema, table) = path.into_inner();
    info!("Source schema for {}.{}", schema, table);

    let csv_path = state.layout.client_seeds_dir().join(format!("{}.csv", table));
    let columns = sources::describe_columns(&csv_path)?;

    Ok(HttpResponse::Ok().json(columns))
}
