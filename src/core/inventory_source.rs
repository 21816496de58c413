/*
 * A package source backed by an inventory file: a JSON export of the package
 * descriptors a device reports, of the form `{"packages": [ {...}, ... ]}`.
 * Storage paths inside the descriptors are resolved against the local file system,
 * so a pulled copy of the app data directories yields real size figures.
 *
 * The file is re-read on every call, mirroring a live package manager query: a
 * refresh after the file changed sees the new contents.
 */
use super::app_details::AppDetails;
use super::models::PackageDescriptor;
use super::package_source::{
    CatalogError, PackageDetailOperations, PackageEnumeratorOperations, Result,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub packages: Vec<PackageDescriptor>,
}

/*
 * Reads and parses an inventory file. I/O and format problems are returned as
 * `CatalogError::Io` / `CatalogError::Serde`.
 */
pub fn load_inventory(path: &Path) -> Result<Inventory> {
    log::trace!("InventorySource: Loading inventory from {path:?}");
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let inventory: Inventory = serde_json::from_reader(reader)?;
    log::debug!(
        "InventorySource: Loaded {} descriptors from {path:?}.",
        inventory.packages.len()
    );
    Ok(inventory)
}

pub struct InventorySource {
    inventory_path: PathBuf,
}

impl InventorySource {
    pub fn new(inventory_path: impl Into<PathBuf>) -> Self {
        InventorySource {
            inventory_path: inventory_path.into(),
        }
    }

    /*
     * Loads the inventory, turning any failure into `EnumerationUnavailable`:
     * without a readable inventory there is nothing to enumerate at all.
     */
    fn load(&self) -> Result<Inventory> {
        load_inventory(&self.inventory_path).map_err(|e| {
            log::error!(
                "InventorySource: Inventory {:?} unavailable: {e}",
                self.inventory_path
            );
            CatalogError::EnumerationUnavailable(format!(
                "{}: {e}",
                self.inventory_path.display()
            ))
        })
    }
}

impl PackageEnumeratorOperations for InventorySource {
    fn list_installed(&self) -> Result<Vec<PackageDescriptor>> {
        Ok(self.load()?.packages)
    }
}

impl PackageDetailOperations for InventorySource {
    fn load_details(&self, package_id: &str) -> Result<AppDetails> {
        let inventory = self.load()?;
        let descriptor = inventory
            .packages
            .iter()
            .find(|d| d.package_name.trim() == package_id)
            .ok_or_else(|| {
                log::debug!("InventorySource: Package '{package_id}' is not installed.");
                CatalogError::NotFound(package_id.to_string())
            })?;
        AppDetails::from_descriptor(descriptor).map_err(|reason| {
            log::warn!("InventorySource: Descriptor for '{package_id}' unusable: {reason}");
            CatalogError::NotFound(package_id.to_string())
        })
    }
}
