/*
 * This module consolidates the core, platform-agnostic logic of the application:
 * the application record model, directory size accounting, the record store with
 * generation-token refreshes, the filter/sort query engine and the incremental
 * diff engine. Package data reaches the core through the
 * `PackageEnumeratorOperations` and `PackageDetailOperations` abstractions; the
 * bundled implementation reads a JSON inventory file.
 */
pub mod app_details;
pub mod checksum_utils;
pub mod config;
pub mod diff_engine;
pub mod format_utils;
pub mod inventory_source;
pub mod models;
pub mod package_source;
pub mod path_utils;
pub mod query_engine;
pub mod record_store;
pub mod refresh;
pub mod size_calculator;

// Re-export key structures and enums
pub use models::{ApplicationRecord, PackageDescriptor, SortCriterion, StorageLayout};

// Re-export package source related items
pub use inventory_source::InventorySource;
pub use package_source::{
    CatalogError, FootprintPolicy, PackageDetailOperations, PackageEnumeratorOperations,
};

// Re-export config related items
pub use config::{ConfigError, ConfigManagerOperations, CoreConfigManager, ViewPreferences};

// Re-export store and refresh items
pub use record_store::{RecordStore, RefreshToken};
pub use refresh::{RefreshCoordinator, RefreshEvent};

pub use app_details::AppDetails;
pub use diff_engine::{EditOp, Keyed};
pub use query_engine::DisplayView;
