//! portal-core contains the rendering and document-merge logic for the
//! Client Mapping Portal.
//!
//! The server crate holds routes and request validation; everything that
//! turns a wizard submission into persisted YAML/SQL artifacts lives
//! here, so it can be exercised without an HTTP stack:
//!
//! - `catalog`: static entity-type and cardinality tables
//! - `sources`: seed-file introspection and column-type inference
//! - `mapping`: client mapping renderer
//! - `entity`: platform entity renderer
//! - `document`: upsert/remove engine and read-modify-write YAML store

pub mod catalog;
pub mod document;
mod error;
pub mod entity;
pub mod mapping;
pub mod sources;

pub use self::catalog::{Cardinality, EntityType};
pub use self::entity::{PlatformEntityConfig, RenderedEntity};
pub use self::error::CoreError;
pub use self::mapping::{ClientMappingConfig, FieldMapping, RenderedMapping};
pub use self::sources::{ColumnInfo, ColumnType};
