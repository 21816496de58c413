/*
 * Storage accounting for installed packages. `directory_size` sums the bytes of
 * every regular file reachable below a path, and `compute_app_sizes` applies it
 * to each location of a package's `StorageLayout` to produce the per-category
 * breakdown shown on the detail view.
 *
 * Traversal is tolerant: an entry that cannot be listed or stat'ed counts as zero
 * and the walk carries on. Symbolic links are followed, and `walkdir`'s ancestor
 * tracking stops a link that points back up the tree from recursing forever.
 */
use super::models::StorageLayout;
use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/*
 * Byte counts for each storage category attributed to a package.
 * All values are zero when the corresponding location is unknown or missing.
 */
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppSizes {
    pub code: u64,
    pub data: u64,
    pub cache: u64,
    pub external_data: u64,
    pub external_cache: u64,
    pub obb: u64,
    pub media: u64,
}

impl AppSizes {
    pub fn total(&self) -> u64 {
        [
            self.code,
            self.data,
            self.cache,
            self.external_data,
            self.external_cache,
            self.obb,
            self.media,
        ]
        .iter()
        .fold(0u64, |acc, v| acc.saturating_add(*v))
    }
}

/*
 * Returns the total size in bytes of `path`.
 *
 * A missing path yields 0. A regular file yields its length. A directory yields
 * the sum of all regular files below it, recursively. Entries that cannot be read
 * (permission denied, dangling links, link cycles) contribute 0 and are logged.
 */
pub fn directory_size(path: &Path) -> u64 {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::trace!("SizeCalculator: {path:?} does not exist, counting 0 bytes.");
            return 0;
        }
        Err(e) => {
            log::warn!("SizeCalculator: Cannot stat {path:?}, counting 0 bytes: {e}");
            return 0;
        }
    };

    if metadata.is_file() {
        return metadata.len();
    }
    if !metadata.is_dir() {
        return 0;
    }

    let mut total: u64 = 0;
    for entry_result in WalkDir::new(path).follow_links(true) {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                if let Some(ancestor) = err.loop_ancestor() {
                    log::warn!(
                        "SizeCalculator: Link cycle at {:?} back to {ancestor:?}, skipping.",
                        err.path()
                    );
                } else {
                    log::warn!(
                        "SizeCalculator: Inaccessible entry {:?}, counting 0 bytes: {err}",
                        err.path()
                    );
                }
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        match entry.metadata() {
            Ok(metadata) => total = total.saturating_add(metadata.len()),
            Err(err) => {
                log::warn!(
                    "SizeCalculator: Cannot read metadata for {:?}, counting 0 bytes: {err}",
                    entry.path()
                );
            }
        }
    }

    log::debug!("SizeCalculator: {path:?} totals {total} bytes.");
    total
}

fn optional_size(path: Option<&Path>) -> u64 {
    path.map(directory_size).unwrap_or(0)
}

/*
 * Computes the storage breakdown for a package layout. The code size covers the
 * installed APK, which may be a single file or a directory of split APKs.
 */
pub fn compute_app_sizes(layout: &StorageLayout) -> AppSizes {
    AppSizes {
        code: optional_size(layout.source_path.as_deref()),
        data: optional_size(layout.data_dir.as_deref()),
        cache: optional_size(layout.cache_dir.as_deref()),
        external_data: optional_size(layout.external_data_dir.as_deref()),
        external_cache: optional_size(layout.external_cache_dir.as_deref()),
        obb: optional_size(layout.obb_dir.as_deref()),
        media: optional_size(layout.media_dir.as_deref()),
    }
}
