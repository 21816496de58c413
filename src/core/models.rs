/*
 * Defines the value types that flow through the catalog core: the immutable
 * `ApplicationRecord` shown in the list view, the raw `PackageDescriptor` handed
 * out by package sources, and the `SortCriterion` used to order a view.
 *
 * Records never change after construction. A refresh produces a fresh batch and
 * replaces the previous one wholesale, so the only way to "update" a record is to
 * substitute a new value carrying the same `package_id`.
 */
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/*
 * Opaque handle to a platform image resource. The core passes it through to the
 * display surface untouched; decoding is the image loader's business.
 */
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IconRef(pub String);

/*
 * One installed application as presented in the list view.
 * Two records with the same `package_id` denote the same install even when other
 * fields differ (for example after an update bumped `version_code`).
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationRecord {
    package_id: String,
    display_name: String,
    version_name: String,
    version_code: i64,
    installed_at: i64,
    last_updated_at: i64,
    is_system_owned: bool,
    icon_reference: Option<IconRef>,
    storage_footprint_bytes: Option<u64>,
}

impl ApplicationRecord {
    /*
     * Creates a record with the identifying fields set and every optional field
     * empty. Use the `with_*` methods to fill in the remaining metadata while the
     * value is still being assembled.
     */
    pub fn new(package_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        ApplicationRecord {
            package_id: package_id.into(),
            display_name: display_name.into(),
            version_name: String::new(),
            version_code: 0,
            installed_at: 0,
            last_updated_at: 0,
            is_system_owned: false,
            icon_reference: None,
            storage_footprint_bytes: None,
        }
    }

    pub fn with_version(mut self, version_name: impl Into<String>, version_code: i64) -> Self {
        self.version_name = version_name.into();
        self.version_code = version_code;
        self
    }

    pub fn with_timestamps(mut self, installed_at: i64, last_updated_at: i64) -> Self {
        self.installed_at = installed_at;
        self.last_updated_at = last_updated_at;
        self
    }

    pub fn with_system_owned(mut self, is_system_owned: bool) -> Self {
        self.is_system_owned = is_system_owned;
        self
    }

    pub fn with_icon(mut self, icon_reference: Option<IconRef>) -> Self {
        self.icon_reference = icon_reference;
        self
    }

    pub fn with_footprint(mut self, storage_footprint_bytes: Option<u64>) -> Self {
        self.storage_footprint_bytes = storage_footprint_bytes;
        self
    }

    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn version_name(&self) -> &str {
        &self.version_name
    }

    pub fn version_code(&self) -> i64 {
        self.version_code
    }

    pub fn installed_at(&self) -> i64 {
        self.installed_at
    }

    pub fn last_updated_at(&self) -> i64 {
        self.last_updated_at
    }

    pub fn is_system_owned(&self) -> bool {
        self.is_system_owned
    }

    pub fn icon_reference(&self) -> Option<&IconRef> {
        self.icon_reference.as_ref()
    }

    pub fn storage_footprint_bytes(&self) -> Option<u64> {
        self.storage_footprint_bytes
    }
}

/*
 * The ordering applied to a display view. Persisted in view preferences, hence
 * the serde derives.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortCriterion {
    #[default]
    Name,
    Package,
    Type,
    Date,
    Size,
}

impl SortCriterion {
    pub const ALL: [SortCriterion; 5] = [
        SortCriterion::Name,
        SortCriterion::Package,
        SortCriterion::Type,
        SortCriterion::Date,
        SortCriterion::Size,
    ];

    /*
     * Parses a criterion from user input (case-insensitive). Returns `None` for
     * anything that is not one of the five known names.
     */
    pub fn parse(text: &str) -> Option<SortCriterion> {
        match text.trim().to_ascii_lowercase().as_str() {
            "name" => Some(SortCriterion::Name),
            "package" => Some(SortCriterion::Package),
            "type" => Some(SortCriterion::Type),
            "date" => Some(SortCriterion::Date),
            "size" => Some(SortCriterion::Size),
            _ => None,
        }
    }
}

impl fmt::Display for SortCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SortCriterion::Name => "name",
            SortCriterion::Package => "package",
            SortCriterion::Type => "type",
            SortCriterion::Date => "date",
            SortCriterion::Size => "size",
        };
        f.write_str(label)
    }
}

/* On-disk locations attributed to one package. Every entry is optional. */
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageLayout {
    pub source_path: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub external_data_dir: Option<PathBuf>,
    pub external_cache_dir: Option<PathBuf>,
    pub obb_dir: Option<PathBuf>,
    pub media_dir: Option<PathBuf>,
}

/* Components a package declares in its manifest, by class name. */
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeclaredComponents {
    pub activities: Vec<String>,
    pub services: Vec<String>,
    pub receivers: Vec<String>,
    pub providers: Vec<String>,
}

impl DeclaredComponents {
    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
            && self.services.is_empty()
            && self.receivers.is_empty()
            && self.providers.is_empty()
    }
}

/*
 * Raw package metadata as a package source reports it, before it is mapped into
 * an `ApplicationRecord`. Field names follow the platform package manager so an
 * inventory exported from a device deserializes without renaming.
 */
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PackageDescriptor {
    pub package_name: String,
    pub label: Option<String>,
    pub version_name: Option<String>,
    pub version_code: i64,
    pub first_install_time: i64,
    pub last_update_time: i64,
    pub system: bool,
    pub icon: Option<String>,
    pub shared_user_id: Option<String>,
    pub uid: u32,
    pub storage: StorageLayout,
    pub components: DeclaredComponents,
    pub requested_permissions: Vec<String>,
    pub requested_features: Vec<String>,
    /* Base64-encoded DER certificates, in signing order. */
    pub signatures: Vec<String>,
}
