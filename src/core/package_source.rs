/*
 * This module defines the seams between the catalog core and whatever knows about
 * installed packages: `PackageEnumeratorOperations` lists every installed package,
 * and `PackageDetailOperations` fetches the extended metadata of one package. It
 * also owns the error taxonomy for those calls and the mapping from raw
 * `PackageDescriptor`s into `ApplicationRecord`s.
 *
 * Mapping is tolerant per item: a descriptor that cannot be turned into a record
 * is logged and left out, and the rest of the batch goes through.
 */
use super::app_details::AppDetails;
use super::models::{ApplicationRecord, IconRef, PackageDescriptor};
use super::size_calculator;
use std::collections::HashSet;
use std::io;

/*
 * Errors surfaced by package sources. Only failures that affect a whole request
 * end up here; per-item problems are handled locally during mapping.
 */
#[derive(Debug)]
pub enum CatalogError {
    NotFound(String),
    EnumerationUnavailable(String),
    Io(io::Error),
    Serde(serde_json::Error),
}

impl From<io::Error> for CatalogError {
    fn from(err: io::Error) -> Self {
        CatalogError::Io(err)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Serde(err)
    }
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::NotFound(package_id) => {
                write!(f, "Package not found: {package_id}")
            }
            CatalogError::EnumerationUnavailable(reason) => {
                write!(f, "Package enumeration unavailable: {reason}")
            }
            CatalogError::Io(e) => write!(f, "I/O error: {e}"),
            CatalogError::Serde(e) => write!(f, "Inventory format error: {e}"),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Io(e) => Some(e),
            CatalogError::Serde(e) => Some(e),
            _ => None,
        }
    }
}

impl CatalogError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/*
 * Lists every installed package. A failure here means the enumeration as a whole
 * could not run; callers keep whatever batch they already had.
 */
pub trait PackageEnumeratorOperations: Send + Sync {
    fn list_installed(&self) -> Result<Vec<PackageDescriptor>>;
}

/*
 * Fetches extended metadata for one package. Returns `CatalogError::NotFound`
 * when the package is no longer installed.
 */
pub trait PackageDetailOperations: Send + Sync {
    fn load_details(&self, package_id: &str) -> Result<AppDetails>;
}

/* Whether mapping should walk each package's storage to fill in its footprint. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FootprintPolicy {
    Measure,
    #[default]
    Skip,
}

/*
 * Reasons a single descriptor is left out of a batch.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingPackageName,
    DuplicatePackage(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingPackageName => write!(f, "descriptor has no package name"),
            SkipReason::DuplicatePackage(id) => write!(f, "package {id} listed more than once"),
        }
    }
}

/*
 * Maps one descriptor into a record. The label falls back to the package id and a
 * missing version name becomes the empty string.
 */
pub fn record_from_descriptor(
    descriptor: &PackageDescriptor,
    footprint: FootprintPolicy,
) -> std::result::Result<ApplicationRecord, SkipReason> {
    let package_id = descriptor.package_name.trim();
    if package_id.is_empty() {
        return Err(SkipReason::MissingPackageName);
    }

    let display_name = descriptor
        .label
        .as_deref()
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .unwrap_or(package_id);

    let footprint_bytes = match footprint {
        FootprintPolicy::Measure => {
            Some(size_calculator::compute_app_sizes(&descriptor.storage).total())
        }
        FootprintPolicy::Skip => None,
    };

    Ok(ApplicationRecord::new(package_id, display_name)
        .with_version(
            descriptor.version_name.clone().unwrap_or_default(),
            descriptor.version_code,
        )
        .with_timestamps(descriptor.first_install_time, descriptor.last_update_time)
        .with_system_owned(descriptor.system)
        .with_icon(descriptor.icon.clone().map(IconRef))
        .with_footprint(footprint_bytes))
}

/*
 * Maps a whole enumeration result into a batch, keeping enumeration order. The
 * first descriptor for a package id wins; later duplicates and unmappable
 * descriptors are skipped with a warning.
 */
pub fn build_records(
    descriptors: &[PackageDescriptor],
    footprint: FootprintPolicy,
) -> Vec<ApplicationRecord> {
    let mut seen: HashSet<String> = HashSet::with_capacity(descriptors.len());
    let mut records = Vec::with_capacity(descriptors.len());

    for descriptor in descriptors {
        let mapped = record_from_descriptor(descriptor, footprint).and_then(|record| {
            if seen.insert(record.package_id().to_string()) {
                Ok(record)
            } else {
                Err(SkipReason::DuplicatePackage(record.package_id().to_string()))
            }
        });
        match mapped {
            Ok(record) => records.push(record),
            Err(reason) => {
                log::warn!(
                    "PackageSource: Skipping descriptor '{}': {reason}",
                    descriptor.package_name
                );
            }
        }
    }

    if records.len() != descriptors.len() {
        log::info!(
            "PackageSource: Mapped {} of {} descriptors.",
            records.len(),
            descriptors.len()
        );
    }
    records
}
