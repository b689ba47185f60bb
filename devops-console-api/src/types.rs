use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============ List Response ============

/// Wire shape of every list response: `{ "items": [...], "total_count": n }`.
///
/// `total_count` is optional; [`total`](Self::total) never reports fewer
/// than the number of items returned.
///
/// # Type Parameters
///
/// * `T`: The raw item schema (e.g. [`ObjectMeta`]-carrying resource objects).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ListResponse<T> {
    /// Items in the current page, in server order. A missing or `null`
    /// `items` field reads as an empty page.
    #[serde(default = "Vec::new", deserialize_with = "null_as_empty")]
    pub items: Vec<T>,
    /// Total number of matching items across all pages, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

impl<T> ListResponse<T> {
    pub fn new(items: Vec<T>, total_count: Option<u64>) -> Self {
        Self { items, total_count }
    }

    /// Server-reported total, raised to the item count when the server omits
    /// it or reports less than it sent (`total_count: 0` on a full page).
    pub fn total(&self) -> u64 {
        let returned = self.items.len() as u64;
        self.total_count.map_or(returned, |n| n.max(returned))
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// ============ Kubernetes Object Metadata ============

/// The subset of Kubernetes `metadata` the console reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_timestamp: Option<DateTime<Utc>>,
}

impl ObjectMeta {
    /// Annotation value by key.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    /// Label value by key.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}

// ============ Batch Operation Types ============

/// Result of a batch delete operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDeleteResult {
    /// Number of resources successfully deleted.
    pub success_count: usize,
    /// Number of resources that failed to delete.
    pub failed_count: usize,
    /// Details about each failed deletion.
    pub failures: Vec<BatchDeleteFailure>,
}

/// Information about a single failed deletion in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDeleteFailure {
    /// Name of the resource that failed to delete.
    pub name: String,
    /// Human-readable reason for the failure.
    pub reason: String,
}
