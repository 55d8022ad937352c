// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns feed records and asset descriptions into uniform documents.
//!
//! The vulnerability normalizer synthesizes a textual summary; that text,
//! not the raw structured record, is what gets chunked and embedded.
//! Missing upstream fields degrade to stable defaults so one malformed
//! record never aborts a batch.

use std::fmt::Write;

use crate::feed::records::{InfrastructureAsset, VulnerabilityRecord};
use crate::knowledge::document::{Document, DocumentMetadata};

const UNKNOWN_ID: &str = "Unknown";
const UNKNOWN_SEVERITY: &str = "UNKNOWN";
const NO_DESCRIPTION: &str = "No description available";

/// Maximum number of affected products listed in the summary text.
const MAX_AFFECTED_IN_TEXT: usize = 5;

/// Builds a document from a vulnerability record.
pub fn normalize_vulnerability(record: &VulnerabilityRecord) -> Document {
    let identifier = non_empty(&record.identifier, UNKNOWN_ID);
    let severity = non_empty(&record.severity, UNKNOWN_SEVERITY);
    let description = non_empty(&record.description, NO_DESCRIPTION);
    let score = record.score.clamp(0.0, 10.0);

    let mut text = String::new();
    let _ = writeln!(text, "Vulnerability {}", identifier);
    let _ = writeln!(text, "Severity: {} (CVSS score {})", severity, score);
    if !record.published_at.is_empty() {
        let _ = writeln!(text, "Published: {}", record.published_at);
    }
    let _ = writeln!(text, "\nDescription:\n{}", description);

    if !record.affected.is_empty() {
        let _ = writeln!(text, "\nAffected products:");
        for product in record.affected.iter().take(MAX_AFFECTED_IN_TEXT) {
            let _ = writeln!(text, "- {}", product);
        }
    }

    let _ = write!(
        text,
        "\nThis vulnerability has a {} severity rating with a CVSS score of {}. \
         Organizations running the affected products should prioritize remediation accordingly.",
        severity.to_lowercase(),
        score
    );

    Document::new(
        text,
        DocumentMetadata::Vulnerability {
            record_id: identifier.to_string(),
            severity: severity.to_string(),
            score,
            published_at: record.published_at.clone(),
        },
    )
}

/// Builds a document from an infrastructure asset description.
pub fn normalize_infrastructure(asset: &InfrastructureAsset) -> Document {
    let name = non_empty(&asset.name, UNKNOWN_ID);
    let asset_type = non_empty(&asset.asset_type, UNKNOWN_ID);

    let description = asset.description.trim();
    let content = if description.is_empty() {
        format!("{} ({})", name, asset_type)
    } else {
        description.to_string()
    };

    Document::new(
        content,
        DocumentMetadata::Infrastructure {
            asset_name: name.to_string(),
            asset_type: asset_type.to_string(),
        },
    )
}

/// Normalizes both collections in order, vulnerabilities first.
pub fn normalize_all(
    records: &[VulnerabilityRecord],
    assets: &[InfrastructureAsset],
) -> Vec<Document> {
    records
        .iter()
        .map(normalize_vulnerability)
        .chain(assets.iter().map(normalize_infrastructure))
        .collect()
}

fn non_empty<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_contains_record_fields() {
        let record = VulnerabilityRecord {
            identifier: "CVE-2024-1234".to_string(),
            description: "Remote code execution in the admin console".to_string(),
            score: 9.8,
            severity: "CRITICAL".to_string(),
            affected: vec![
                "cpe:2.3:a:vendor:console:1.0".to_string(),
                "cpe:2.3:a:vendor:console:1.1".to_string(),
            ],
            published_at: "2024-06-01T00:00:00.000".to_string(),
        };

        let doc = normalize_vulnerability(&record);
        assert!(doc.content.contains("CVE-2024-1234"));
        assert!(doc.content.contains("CRITICAL"));
        assert!(doc.content.contains("9.8"));
        assert!(doc.content.contains("Remote code execution"));
        assert!(doc.content.contains("cpe:2.3:a:vendor:console:1.0"));
        assert_eq!(doc.metadata.source(), "vulnerability");
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let doc = normalize_vulnerability(&VulnerabilityRecord::default());
        assert!(!doc.content.is_empty());
        assert!(doc.content.contains("Unknown"));
        assert!(doc.content.contains("No description available"));
        match doc.metadata {
            DocumentMetadata::Vulnerability {
                record_id,
                severity,
                score,
                ..
            } => {
                assert_eq!(record_id, "Unknown");
                assert_eq!(severity, "UNKNOWN");
                assert_eq!(score, 0.0);
            }
            other => panic!("unexpected metadata: {:?}", other),
        }
    }

    #[test]
    fn test_score_clamped_to_cvss_range() {
        let record = VulnerabilityRecord {
            score: 42.0,
            ..Default::default()
        };
        match normalize_vulnerability(&record).metadata {
            DocumentMetadata::Vulnerability { score, .. } => assert_eq!(score, 10.0),
            other => panic!("unexpected metadata: {:?}", other),
        }
    }

    #[test]
    fn test_affected_list_limited_in_text() {
        let record = VulnerabilityRecord {
            affected: (0..10).map(|i| format!("product-{}", i)).collect(),
            ..Default::default()
        };
        let doc = normalize_vulnerability(&record);
        assert!(doc.content.contains("product-4"));
        assert!(!doc.content.contains("product-5"));
    }

    #[test]
    fn test_infrastructure_uses_description() {
        let asset = InfrastructureAsset {
            name: "Database Server".to_string(),
            asset_type: "database".to_string(),
            description: "PostgreSQL 15.2 on RHEL 9".to_string(),
        };
        let doc = normalize_infrastructure(&asset);
        assert_eq!(doc.content, "PostgreSQL 15.2 on RHEL 9");
        match doc.metadata {
            DocumentMetadata::Infrastructure {
                asset_name,
                asset_type,
            } => {
                assert_eq!(asset_name, "Database Server");
                assert_eq!(asset_type, "database");
            }
            other => panic!("unexpected metadata: {:?}", other),
        }
    }

    #[test]
    fn test_infrastructure_empty_description_still_has_content() {
        let asset = InfrastructureAsset {
            name: "Edge Proxy".to_string(),
            asset_type: "network".to_string(),
            description: String::new(),
        };
        let doc = normalize_infrastructure(&asset);
        assert_eq!(doc.content, "Edge Proxy (network)");
    }

    #[test]
    fn test_normalize_all_order() {
        let records = vec![VulnerabilityRecord {
            identifier: "CVE-2024-0001".to_string(),
            ..Default::default()
        }];
        let assets = vec![InfrastructureAsset {
            name: "Web Server Cluster".to_string(),
            asset_type: "servers".to_string(),
            description: "Apache".to_string(),
        }];

        let docs = normalize_all(&records, &assets);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].metadata.source(), "vulnerability");
        assert_eq!(docs[1].metadata.source(), "infrastructure");
    }
}
