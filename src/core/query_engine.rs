/*
 * Derives the displayed list from a batch of records: a case-insensitive text
 * filter over display name and package id, followed by an ordering chosen by
 * `SortCriterion`. The engine keeps no state between calls; every change to the
 * filter, the criterion or the batch recomputes the whole projection.
 */
use super::models::{ApplicationRecord, SortCriterion};
use std::cmp::Ordering;

/*
 * Returns true when `record` should be visible for `filter_text`. The text is
 * matched as given; an empty filter matches every record.
 */
pub fn matches_filter(record: &ApplicationRecord, filter_text: &str) -> bool {
    let needle = filter_text.to_lowercase();
    matches_lowercase_needle(record, &needle)
}

fn matches_lowercase_needle(record: &ApplicationRecord, needle: &str) -> bool {
    needle.is_empty()
        || record.display_name().to_lowercase().contains(needle)
        || record.package_id().to_lowercase().contains(needle)
}

/*
 * Compares two records under `criterion`. Records without a footprint are placed
 * after every record that has one when sorting by size.
 */
pub fn compare_records(
    a: &ApplicationRecord,
    b: &ApplicationRecord,
    criterion: SortCriterion,
) -> Ordering {
    match criterion {
        SortCriterion::Name => a
            .display_name()
            .to_lowercase()
            .cmp(&b.display_name().to_lowercase()),
        SortCriterion::Package => a
            .package_id()
            .to_lowercase()
            .cmp(&b.package_id().to_lowercase()),
        SortCriterion::Type => a.is_system_owned().cmp(&b.is_system_owned()),
        SortCriterion::Date => b.installed_at().cmp(&a.installed_at()),
        SortCriterion::Size => {
            match (a.storage_footprint_bytes(), b.storage_footprint_bytes()) {
                (Some(x), Some(y)) => y.cmp(&x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }
    }
}

/*
 * Filters `batch` by `filter_text` and orders the survivors by `criterion`.
 * The sort is stable, so records that compare equal keep their batch order.
 */
pub fn project(
    batch: &[ApplicationRecord],
    filter_text: &str,
    criterion: SortCriterion,
) -> Vec<ApplicationRecord> {
    let needle = filter_text.to_lowercase();
    let mut projected: Vec<ApplicationRecord> = batch
        .iter()
        .filter(|record| matches_lowercase_needle(record, &needle))
        .cloned()
        .collect();

    match criterion {
        // Lowercasing once per record instead of once per comparison.
        SortCriterion::Name => {
            projected.sort_by_cached_key(|record| record.display_name().to_lowercase())
        }
        SortCriterion::Package => {
            projected.sort_by_cached_key(|record| record.package_id().to_lowercase())
        }
        _ => projected.sort_by(|a, b| compare_records(a, b, criterion)),
    }

    log::trace!(
        "QueryEngine: Projected {} of {} records (filter '{}', sort {criterion}).",
        projected.len(),
        batch.len(),
        filter_text
    );
    projected
}

/*
 * A filtered, sorted projection together with the parameters that produced it.
 * Owned by whoever presents the list; rebuilt from the full batch on demand.
 */
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayView {
    pub records: Vec<ApplicationRecord>,
    pub filter_text: String,
    pub sort_criterion: SortCriterion,
}

impl DisplayView {
    pub fn build(
        batch: &[ApplicationRecord],
        filter_text: &str,
        sort_criterion: SortCriterion,
    ) -> Self {
        DisplayView {
            records: project(batch, filter_text, sort_criterion),
            filter_text: filter_text.to_string(),
            sort_criterion,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
