// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vulnerability feed client for the NVD 2.0 JSON registry.
//!
//! Fetches recent records or a single record by identifier, parses the
//! registry envelope leniently (absent fields become defaults, a hole in
//! one record never drops the batch), and respects the registry's rate
//! limits with a post-request delay.

pub mod records;

use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::config::FeedConfig;
use records::VulnerabilityRecord;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Maximum number of affected products kept per record.
const MAX_AFFECTED: usize = 10;

/// Rate limit: 5 requests per 30 seconds without a key, 50 with one.
const DELAY_WITHOUT_KEY: Duration = Duration::from_secs(6);
const DELAY_WITH_KEY: Duration = Duration::from_millis(600);

/// HTTP client for the vulnerability registry.
pub struct FeedClient {
    base_url: Url,
    api_key: Option<String>,
    agent: ureq::Agent,
    rate_limit_delay: Duration,
}

impl FeedClient {
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url())
            .with_context(|| format!("Invalid feed URL: {}", config.base_url()))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        let api_key = config.api_key();
        let rate_limit_delay = if api_key.is_some() {
            DELAY_WITH_KEY
        } else {
            DELAY_WITHOUT_KEY
        };

        Ok(Self {
            base_url,
            api_key,
            agent,
            rate_limit_delay,
        })
    }

    /// Fetches records published within the last `days` days.
    pub fn fetch_recent(&self, days: u32, max_results: usize) -> Result<Vec<VulnerabilityRecord>> {
        let end = Utc::now();
        let start = end - ChronoDuration::days(i64::from(days));

        let start_param = start.format("%Y-%m-%dT00:00:00.000").to_string();
        let end_param = end.format("%Y-%m-%dT23:59:59.999").to_string();
        let per_page = max_results.min(2000).to_string();

        info!(
            "Fetching vulnerability records from {} to {}",
            start.date_naive(),
            end.date_naive()
        );

        let body = self.get(&[
            ("pubStartDate", start_param.as_str()),
            ("pubEndDate", end_param.as_str()),
            ("resultsPerPage", per_page.as_str()),
        ])?;

        let mut parsed = parse_envelope(&body)?;
        parsed.truncate(max_results);
        info!("Fetched {} vulnerability records", parsed.len());
        Ok(parsed)
    }

    /// Fetches a single record by identifier, e.g. `CVE-2024-1234`.
    pub fn fetch_by_id(&self, identifier: &str) -> Result<Option<VulnerabilityRecord>> {
        let body = self.get(&[("cveId", identifier)])?;
        let mut parsed = parse_envelope(&body)?;
        Ok(if parsed.is_empty() {
            None
        } else {
            Some(parsed.remove(0))
        })
    }

    fn get(&self, query: &[(&str, &str)]) -> Result<String> {
        let mut request = self.agent.get(self.base_url.as_str());
        for (key, value) in query {
            request = request.query(*key, *value);
        }
        if let Some(key) = &self.api_key {
            request = request.header("apiKey", key);
        }

        debug!("GET {} with {} query params", self.base_url, query.len());

        let body = request
            .call()
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .context("Vulnerability feed request failed")?;

        std::thread::sleep(self.rate_limit_delay);
        Ok(body)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NvdResponse {
    vulnerabilities: Vec<NvdVulnerability>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NvdVulnerability {
    cve: NvdCve,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NvdCve {
    id: String,
    descriptions: Vec<NvdDescription>,
    metrics: NvdMetrics,
    configurations: Vec<NvdConfiguration>,
    published: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NvdDescription {
    lang: String,
    value: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct NvdMetrics {
    cvss_metric_v31: Vec<NvdCvssMetric>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct NvdCvssMetric {
    cvss_data: NvdCvssData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct NvdCvssData {
    base_score: f32,
    base_severity: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NvdConfiguration {
    nodes: Vec<NvdNode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct NvdNode {
    cpe_match: Vec<NvdCpeMatch>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NvdCpeMatch {
    vulnerable: bool,
    criteria: String,
}

fn parse_envelope(body: &str) -> Result<Vec<VulnerabilityRecord>> {
    let response: NvdResponse =
        serde_json::from_str(body).context("Failed to parse feed response")?;
    Ok(response
        .vulnerabilities
        .into_iter()
        .map(|item| normalize_item(item.cve))
        .collect())
}

fn normalize_item(cve: NvdCve) -> VulnerabilityRecord {
    let description = cve
        .descriptions
        .iter()
        .find(|d| d.lang == "en")
        .map(|d| d.value.clone())
        .unwrap_or_default();

    let (score, severity) = cve
        .metrics
        .cvss_metric_v31
        .first()
        .map(|metric| {
            (
                metric.cvss_data.base_score,
                metric.cvss_data.base_severity.clone(),
            )
        })
        .unwrap_or((0.0, String::new()));

    let mut affected = Vec::new();
    for configuration in &cve.configurations {
        for node in &configuration.nodes {
            for cpe in &node.cpe_match {
                if cpe.vulnerable && affected.len() < MAX_AFFECTED {
                    affected.push(cpe.criteria.clone());
                }
            }
        }
    }

    VulnerabilityRecord {
        identifier: cve.id,
        description,
        score,
        severity: if severity.is_empty() {
            "UNKNOWN".to_string()
        } else {
            severity
        },
        affected,
        published_at: cve.published,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "vulnerabilities": [
            {
                "cve": {
                    "id": "CVE-2024-1234",
                    "published": "2024-03-01T10:00:00.000",
                    "descriptions": [
                        {"lang": "es", "value": "Descripcion"},
                        {"lang": "en", "value": "SQL injection in the login form"}
                    ],
                    "metrics": {
                        "cvssMetricV31": [
                            {"cvssData": {"baseScore": 8.5, "baseSeverity": "HIGH"}}
                        ]
                    },
                    "configurations": [
                        {
                            "nodes": [
                                {
                                    "cpeMatch": [
                                        {"vulnerable": true, "criteria": "cpe:2.3:a:vendor:product_x:1.0"},
                                        {"vulnerable": false, "criteria": "cpe:2.3:a:vendor:other:2.0"}
                                    ]
                                }
                            ]
                        }
                    ]
                }
            },
            {
                "cve": {"id": "CVE-2024-5678"}
            }
        ]
    }"#;

    #[test]
    fn test_parse_envelope() {
        let records = parse_envelope(FIXTURE).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.identifier, "CVE-2024-1234");
        assert_eq!(first.description, "SQL injection in the login form");
        assert_eq!(first.score, 8.5);
        assert_eq!(first.severity, "HIGH");
        assert_eq!(first.affected, vec!["cpe:2.3:a:vendor:product_x:1.0"]);
        assert_eq!(first.published_at, "2024-03-01T10:00:00.000");
    }

    #[test]
    fn test_parse_envelope_sparse_record_gets_defaults() {
        let records = parse_envelope(FIXTURE).unwrap();
        let sparse = &records[1];
        assert_eq!(sparse.identifier, "CVE-2024-5678");
        assert_eq!(sparse.severity, "UNKNOWN");
        assert_eq!(sparse.score, 0.0);
        assert!(sparse.description.is_empty());
        assert!(sparse.affected.is_empty());
    }

    #[test]
    fn test_parse_envelope_empty_body() {
        let records = parse_envelope("{}").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_non_vulnerable_cpes_excluded() {
        let records = parse_envelope(FIXTURE).unwrap();
        assert!(!records[0]
            .affected
            .iter()
            .any(|c| c.contains("vendor:other")));
    }
}
