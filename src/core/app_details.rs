/*
 * The extended per-package metadata shown on the detail view: everything in the
 * list record plus install paths, storage breakdown, declared components,
 * permissions, features and signing certificates. Also renders a manifest-shaped
 * text summary of a package.
 */
use super::checksum_utils;
use super::models::{ApplicationRecord, DeclaredComponents, PackageDescriptor};
use super::package_source::{FootprintPolicy, SkipReason, record_from_descriptor};
use super::size_calculator::{self, AppSizes};
use std::fmt::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
    pub sha256_fingerprint: String,
    pub byte_len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDetails {
    pub record: ApplicationRecord,
    pub source_path: Option<PathBuf>,
    pub shared_user_id: Option<String>,
    pub uid: u32,
    pub sizes: AppSizes,
    pub components: DeclaredComponents,
    pub requested_permissions: Vec<String>,
    pub requested_features: Vec<String>,
    pub signing_certificates: Vec<CertificateInfo>,
}

impl AppDetails {
    /*
     * Builds the detail record for one descriptor. Walks the package's storage
     * locations, so this belongs on a worker thread for real installs. The list
     * record's footprint is set to the computed total.
     */
    pub fn from_descriptor(
        descriptor: &PackageDescriptor,
    ) -> std::result::Result<AppDetails, SkipReason> {
        let sizes = size_calculator::compute_app_sizes(&descriptor.storage);
        let record = record_from_descriptor(descriptor, FootprintPolicy::Skip)?
            .with_footprint(Some(sizes.total()));

        let signing_certificates = descriptor
            .signatures
            .iter()
            .enumerate()
            .filter_map(|(index, encoded)| {
                match checksum_utils::decode_certificate(encoded) {
                    Ok(der) => Some(CertificateInfo {
                        sha256_fingerprint: checksum_utils::format_fingerprint(
                            &checksum_utils::calculate_sha256_hex(&der),
                        ),
                        byte_len: der.len(),
                    }),
                    Err(e) => {
                        log::warn!(
                            "AppDetails: Skipping undecodable certificate #{index} of {}: {e}",
                            descriptor.package_name
                        );
                        None
                    }
                }
            })
            .collect();

        Ok(AppDetails {
            record,
            source_path: descriptor.storage.source_path.clone(),
            shared_user_id: descriptor.shared_user_id.clone(),
            uid: descriptor.uid,
            sizes,
            components: descriptor.components.clone(),
            requested_permissions: descriptor.requested_permissions.clone(),
            requested_features: descriptor.requested_features.clone(),
            signing_certificates,
        })
    }
}

fn write_section(out: &mut String, indent: &str, title: &str, tag: &str, names: &[String]) {
    if names.is_empty() {
        return;
    }
    let _ = writeln!(out, "{indent}<!-- {title} -->");
    for name in names {
        let _ = writeln!(out, "{indent}<{tag} android:name=\"{name}\" />");
    }
}

/*
 * Renders a manifest-shaped text summary of `details`: header comments with the
 * label, version and package, then permissions, features and components.
 */
pub fn manifest_summary(details: &AppDetails) -> String {
    let record = &details.record;
    let mut out = String::new();
    let _ = writeln!(out, "<!-- App: {} -->", record.display_name());
    let _ = writeln!(
        out,
        "<!-- Version: {} ({}) -->",
        record.version_name(),
        record.version_code()
    );
    let _ = writeln!(out, "<!-- Package: {} -->", record.package_id());
    if let Some(path) = &details.source_path {
        let _ = writeln!(out, "<!-- Source: {} -->", path.display());
    }
    let _ = writeln!(
        out,
        "<manifest package=\"{}\" android:versionCode=\"{}\" android:versionName=\"{}\">",
        record.package_id(),
        record.version_code(),
        record.version_name()
    );

    write_section(
        &mut out,
        "    ",
        "Permissions",
        "uses-permission",
        &details.requested_permissions,
    );
    write_section(
        &mut out,
        "    ",
        "Features",
        "uses-feature",
        &details.requested_features,
    );

    if !details.components.is_empty() {
        let _ = writeln!(out, "    <application>");
        let components = &details.components;
        for (title, tag, names) in [
            ("Activities", "activity", &components.activities),
            ("Services", "service", &components.services),
            ("Receivers", "receiver", &components.receivers),
            ("Providers", "provider", &components.providers),
        ] {
            write_section(&mut out, "        ", title, tag, names);
        }
        let _ = writeln!(out, "    </application>");
    }

    out.push_str("</manifest>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::StorageLayout;
    use std::fs::{self, File};
    use std::io::{self, Write as IoWrite};
    use tempfile::tempdir;

    fn sample_descriptor() -> PackageDescriptor {
        PackageDescriptor {
            package_name: "com.example.chat".to_string(),
            label: Some("Chat".to_string()),
            version_name: Some("3.1".to_string()),
            version_code: 310,
            uid: 10123,
            shared_user_id: Some("com.example.shared".to_string()),
            components: DeclaredComponents {
                activities: vec!["com.example.chat.MainActivity".to_string()],
                services: vec!["com.example.chat.SyncService".to_string()],
                ..DeclaredComponents::default()
            },
            requested_permissions: vec!["android.permission.INTERNET".to_string()],
            // "abc"
            signatures: vec!["YWJj".to_string(), "%%%".to_string()],
            ..PackageDescriptor::default()
        }
    }

    #[test]
    fn test_from_descriptor_computes_sizes_and_fingerprints() -> io::Result<()> {
        let dir = tempdir()?;
        let data = dir.path().join("data");
        fs::create_dir_all(&data)?;
        File::create(data.join("db"))?.write_all(&[1u8; 300])?;

        let mut descriptor = sample_descriptor();
        descriptor.storage = StorageLayout {
            data_dir: Some(data),
            ..StorageLayout::default()
        };

        let details = AppDetails::from_descriptor(&descriptor).unwrap();
        assert_eq!(details.sizes.data, 300);
        assert_eq!(details.record.storage_footprint_bytes(), Some(300));
        assert_eq!(details.uid, 10123);
        assert_eq!(details.signing_certificates.len(), 1);
        assert_eq!(details.signing_certificates[0].byte_len, 3);
        assert!(
            details.signing_certificates[0]
                .sha256_fingerprint
                .starts_with("BA:78:16:BF")
        );
        Ok(())
    }

    #[test]
    fn test_from_descriptor_rejects_nameless_descriptor() {
        let descriptor = PackageDescriptor::default();
        assert_eq!(
            AppDetails::from_descriptor(&descriptor).unwrap_err(),
            SkipReason::MissingPackageName
        );
    }

    #[test]
    fn test_manifest_summary_lists_declared_items() {
        let details = AppDetails::from_descriptor(&sample_descriptor()).unwrap();
        let summary = manifest_summary(&details);
        assert!(summary.contains("<!-- App: Chat -->"));
        assert!(summary.contains("<!-- Version: 3.1 (310) -->"));
        assert!(summary.contains("<uses-permission android:name=\"android.permission.INTERNET\" />"));
        assert!(summary.contains("<activity android:name=\"com.example.chat.MainActivity\" />"));
        assert!(summary.contains("<service android:name=\"com.example.chat.SyncService\" />"));
        assert!(!summary.contains("<!-- Receivers -->"));
        assert!(!summary.contains("<!-- Features -->"));
        assert!(summary.ends_with("</manifest>\n"));
    }

    #[test]
    fn test_manifest_summary_nests_components_inside_application() {
        let details = AppDetails::from_descriptor(&sample_descriptor()).unwrap();
        let summary = manifest_summary(&details);
        let lines: Vec<&str> = summary.lines().collect();
        assert!(lines.contains(&"    <!-- Permissions -->"));
        assert!(lines.contains(&"    <uses-permission android:name=\"android.permission.INTERNET\" />"));
        assert!(lines.contains(&"    <application>"));
        assert!(lines.contains(&"        <!-- Activities -->"));
        assert!(lines.contains(&"        <activity android:name=\"com.example.chat.MainActivity\" />"));

        let opened = lines.iter().position(|l| *l == "    <application>").unwrap();
        let closed = lines.iter().position(|l| *l == "    </application>").unwrap();
        let service = lines
            .iter()
            .position(|l| l.contains("<service "))
            .unwrap();
        assert!(opened < service && service < closed);
    }
}
