#[cfg(target_arch = "wasm32")]
pub mod api_client;
pub mod cloud;
pub mod csv_service;
pub mod sync_service;

#[cfg(target_arch = "wasm32")]
pub use api_client::HttpBackend;
pub use cloud::CloudBackend;
pub use csv_service::{export_csv, export_filename, import_csv, ImportReport};
pub use sync_service::SyncCoordinator;
