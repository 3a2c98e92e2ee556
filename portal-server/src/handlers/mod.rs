mod clients;
mod index;
mod platform;
mod reset;
mod sources;

pub use self::clients::create_client_handler;
pub use self::clients::list_clients_handler;
pub use self::index::health_handler;
pub use self::platform::cardinality_types_handler;
pub use self::platform::create_entity_handler;
pub use self::platform::delete_entity_handler;
pub use self::platform::entity_types_handler;
pub use self::platform::list_entities_handler;
pub use self::platform::platform_source_schema_handler;
pub use self::platform::platform_sources_handler;
pub use self::reset::reset_demo_handler;
pub use self::sources::list_sources_handler;
pub use self::sources::source_schema_handler;
