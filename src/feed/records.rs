// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record shapes supplied by the vulnerability feed, plus the on-disk
//! JSON cache and the built-in sample infrastructure descriptions.
//!
//! Every field tolerates absence: a record with holes deserializes to
//! stable defaults instead of failing the batch.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A normalized vulnerability record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VulnerabilityRecord {
    pub identifier: String,
    pub description: String,
    pub score: f32,
    pub severity: String,
    pub affected: Vec<String>,
    pub published_at: String,
}

impl Default for VulnerabilityRecord {
    fn default() -> Self {
        Self {
            identifier: String::new(),
            description: String::new(),
            score: 0.0,
            severity: "UNKNOWN".to_string(),
            affected: Vec::new(),
            published_at: String::new(),
        }
    }
}

/// An infrastructure asset description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfrastructureAsset {
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    pub description: String,
}

/// Saves fetched records as pretty JSON for offline reuse.
pub fn save_records(path: impl AsRef<Path>, records: &[VulnerabilityRecord]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write records to {}", path.display()))?;
    Ok(())
}

/// Loads cached records written by [`save_records`].
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<VulnerabilityRecord>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read records from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse records in {}", path.display()))
}

/// Loads infrastructure assets from a JSON file.
pub fn load_assets(path: impl AsRef<Path>) -> Result<Vec<InfrastructureAsset>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read assets from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse assets in {}", path.display()))
}

/// Built-in infrastructure descriptions used when no asset file is given.
pub fn sample_infrastructure() -> Vec<InfrastructureAsset> {
    vec![
        InfrastructureAsset {
            name: "Web Server Cluster".to_string(),
            asset_type: "servers".to_string(),
            description: "\
Web Server Cluster Infrastructure:
- Operating System: Ubuntu 22.04 LTS
- Web Server: Apache 2.4.52
- Application: WordPress 6.4
- PHP Version: 8.1.2
- Database: MySQL 8.0.32
- SSL/TLS: OpenSSL 3.0.2
- Location: Primary Data Center
- Critical Asset: Handles public-facing website
- Exposed Services: HTTP (80), HTTPS (443)"
                .to_string(),
        },
        InfrastructureAsset {
            name: "Database Server".to_string(),
            asset_type: "database".to_string(),
            description: "\
Database Server Infrastructure:
- Operating System: Red Hat Enterprise Linux 9
- Database: PostgreSQL 15.2
- Backup System: Automated daily backups
- Location: Secure Data Center
- Critical Asset: Stores customer data and financial records
- Network: Internal network only, no external exposure
- Security: Encrypted at rest and in transit"
                .to_string(),
        },
        InfrastructureAsset {
            name: "Application Server".to_string(),
            asset_type: "application".to_string(),
            description: "\
Application Server Infrastructure:
- Operating System: Windows Server 2022
- Runtime: .NET Framework 4.8, .NET 7.0
- Application Server: IIS 10.0
- Message Queue: RabbitMQ 3.12
- Cache: Redis 7.0
- Critical Asset: Runs core business applications
- Exposed Services: API Gateway (Port 8080)"
                .to_string(),
        },
        InfrastructureAsset {
            name: "Network Infrastructure".to_string(),
            asset_type: "network".to_string(),
            description: "\
Network Infrastructure:
- Firewall: Cisco ASA 5516-X (Software version 9.16)
- VPN: OpenVPN 2.6.0
- Router: Cisco ISR 4000 Series
- Switch: Cisco Catalyst 9300
- IDS/IPS: Snort 3.1.50
- Network Segmentation: DMZ, Internal, Management VLANs
- Remote Access: VPN required for all external access"
                .to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_record_defaults_on_missing_fields() {
        let record: VulnerabilityRecord =
            serde_json::from_str(r#"{"identifier": "CVE-2024-9999"}"#).unwrap();
        assert_eq!(record.identifier, "CVE-2024-9999");
        assert_eq!(record.severity, "UNKNOWN");
        assert_eq!(record.score, 0.0);
        assert!(record.affected.is_empty());
        assert!(record.description.is_empty());
    }

    #[test]
    fn test_asset_type_field_rename() {
        let asset: InfrastructureAsset =
            serde_json::from_str(r#"{"name": "Edge Proxy", "type": "network"}"#).unwrap();
        assert_eq!(asset.asset_type, "network");
        assert!(asset.description.is_empty());
    }

    #[test]
    fn test_record_cache_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("cve_data.json");

        let records = vec![VulnerabilityRecord {
            identifier: "CVE-2024-0001".to_string(),
            description: "A test vulnerability".to_string(),
            score: 7.2,
            severity: "HIGH".to_string(),
            affected: vec!["cpe:2.3:a:vendor:product:1.0".to_string()],
            published_at: "2024-02-01T12:00:00.000".to_string(),
        }];

        save_records(&path, &records).unwrap();
        let loaded = load_records(&path).unwrap();
        assert_eq!(loaded, records);
    }

    #[test]
    fn test_sample_infrastructure_is_nonempty() {
        let assets = sample_infrastructure();
        assert_eq!(assets.len(), 4);
        for asset in &assets {
            assert!(!asset.name.is_empty());
            assert!(!asset.description.is_empty());
        }
    }
}
