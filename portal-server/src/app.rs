use std::path::{Path, PathBuf};
use std::sync::Mutex;

use actix_web::web;

use crate::handlers;
use crate::publish::Publisher;

/// File layout of the external dbt project. Paths must stay stable; the
/// execution engine reads the same tree.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    pub root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: &Path) -> Self {
        ProjectLayout {
            root: root.to_path_buf(),
        }
    }

    pub fn project_yml(&self) -> PathBuf {
        self.root.join("dbt_project.yml")
    }

    pub fn client_mappings_dir(&self) -> PathBuf {
        self.root.join("models").join("staging").join("client_mappings")
    }

    pub fn mapping_file(&self, filename: &str) -> PathBuf {
        self.client_mappings_dir().join(filename)
    }

    pub fn client_seeds_dir(&self) -> PathBuf {
        self.root.join("seeds").join("raw_clients")
    }

    pub fn platform_seeds_dir(&self) -> PathBuf {
        self.root.join("seeds").join("platform_demo")
    }

    pub fn platform_models_dir(&self) -> PathBuf {
        self.root.join("models").join("platform_demo")
    }

    pub fn platform_schema_yml(&self) -> PathBuf {
        self.platform_models_dir().join("platform_demo.yml")
    }

    pub fn model_file(&self, filename: &str) -> PathBuf {
        self.platform_models_dir().join(filename)
    }
}

/// Shared request state. The two mutexes serialize the read-modify-write
/// span on each project document; nothing is cached between requests.
pub struct AppState {
    pub debug: bool,
    pub layout: ProjectLayout,
    pub publisher: Box<dyn Publisher>,
    pub mappings_lock: Mutex<()>,
    pub schema_lock: Mutex<()>,
}

pub fn config_app(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health_handler))
        .route("/api/clients", web::get().to(handlers::list_clients_handler))
        .route("/api/clients", web::post().to(handlers::create_client_handler))
        .route("/api/sources", web::get().to(handlers::list_sources_handler))
        .route(
            "/api/sources/{schema}/{table}",
            web::get().to(handlers::source_schema_handler),
        )
        .route("/api/reset-demo", web::post().to(handlers::reset_demo_handler))
        .route(
            "/api/platform/entity-types",
            web::get().to(handlers::entity_types_handler),
        )
        .route(
            "/api/platform/cardinality-types",
            web::get().to(handlers::cardinality_types_handler),
        )
        .route(
            "/api/platform/sources",
            web::get().to(handlers::platform_sources_handler),
        )
        .route(
            "/api/platform/sources/{table}/schema",
            web::get().to(handlers::platform_source_schema_handler),
        )
        .route(
            "/api/platform/entities",
            web::get().to(handlers::list_entities_handler),
        )
        .route(
            "/api/platform/entities",
            web::post().to(handlers::create_entity_handler),
        )
        .route(
            "/api/platform/entities/{name}",
            web::delete().to(handlers::delete_entity_handler),
        );
}
