// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end retrieval lifecycle tests using the deterministic hash
//! embedder: build, retrieve, append, persist, restore.

use tempfile::TempDir;

use secgrep::knowledge::{
    ChunkConfig, Document, DocumentMetadata, HashEmbedder, KnowledgeStore, TextChunker,
};

fn new_store(dimension: usize) -> KnowledgeStore {
    let chunker = TextChunker::new(ChunkConfig::new(200, 20).unwrap());
    let embedder = Box::new(HashEmbedder::new(dimension).unwrap());
    KnowledgeStore::new(chunker, embedder).unwrap()
}

fn corpus() -> Vec<Document> {
    vec![
        Document::new(
            "SQL injection in product X, severity HIGH, score 8.5",
            DocumentMetadata::Vulnerability {
                record_id: "CVE-2024-0001".to_string(),
                severity: "HIGH".to_string(),
                score: 8.5,
                published_at: "2024-01-15T00:00:00.000".to_string(),
            },
        ),
        Document::new(
            "Web Server Cluster running product X",
            DocumentMetadata::Infrastructure {
                asset_name: "Web Server Cluster".to_string(),
                asset_type: "servers".to_string(),
            },
        ),
        Document::new(
            "Kernel privilege escalation in legacy appliance firmware",
            DocumentMetadata::Vulnerability {
                record_id: "CVE-2024-0002".to_string(),
                severity: "MEDIUM".to_string(),
                score: 6.1,
                published_at: "2024-02-20T00:00:00.000".to_string(),
            },
        ),
    ]
}

#[test]
fn build_then_retrieve_ranks_relevant_chunks_first() {
    let mut store = new_store(128);
    store.build(&corpus()).unwrap();

    let results = store.retrieve("product X vulnerability", 3).unwrap();
    assert_eq!(results.len(), 3);

    for pair in results.windows(2) {
        assert!(pair[0].relevance_score >= pair[1].relevance_score);
    }

    // The two product X chunks beat the unrelated kernel record.
    assert!(results[0].content.contains("product X"));
    assert!(results[1].content.contains("product X"));
}

#[test]
fn persist_restore_round_trip_is_exact() {
    let dir = TempDir::new().unwrap();
    let queries = ["product X vulnerability", "web server", "kernel firmware"];

    let mut store = new_store(128);
    store.build(&corpus()).unwrap();
    store.persist(dir.path()).unwrap();

    let mut fresh = new_store(128);
    assert!(fresh.restore(dir.path()).unwrap());

    for query in queries {
        for k in [1, 2, 5] {
            let before = store.retrieve(query, k).unwrap();
            let after = fresh.retrieve(query, k).unwrap();
            assert_eq!(before.len(), after.len());
            for (a, b) in before.iter().zip(after.iter()) {
                assert_eq!(a.content, b.content);
                assert_eq!(a.metadata, b.metadata);
                assert!((a.relevance_score - b.relevance_score).abs() < 1e-6);
            }
        }
    }
}

#[test]
fn append_keeps_existing_results_stable() {
    let mut store = new_store(128);
    store.build(&corpus()).unwrap();

    let before = store.retrieve("product X vulnerability", 2).unwrap();

    store
        .append(
            "Staging Database Server running PostgreSQL 15.2",
            DocumentMetadata::Infrastructure {
                asset_name: "Staging Database".to_string(),
                asset_type: "database".to_string(),
            },
        )
        .unwrap();

    let after = store.retrieve("product X vulnerability", 2).unwrap();
    assert_eq!(before.len(), after.len());
    for (a, b) in before.iter().zip(after.iter()) {
        assert_eq!(a.content, b.content);
        assert_eq!(a.metadata, b.metadata);
    }

    // And the appended document is reachable.
    let db = store.retrieve("staging postgresql database", 1).unwrap();
    assert!(db[0].content.contains("PostgreSQL"));
}

#[test]
fn retrieve_on_unbuilt_store_is_empty_not_an_error() {
    let mut store = new_store(64);
    assert!(store.retrieve("anything at all", 5).unwrap().is_empty());
}

#[test]
fn top_k_never_exceeds_corpus() {
    let mut store = new_store(64);
    store.build(&corpus()[..2]).unwrap();

    let results = store.retrieve("product X", 5).unwrap();
    assert_eq!(results.len(), 2);
}

#[test]
fn restore_into_mismatched_dimension_reports_false() {
    let dir = TempDir::new().unwrap();

    let mut store = new_store(128);
    store.build(&corpus()).unwrap();
    store.persist(dir.path()).unwrap();

    let mut other = new_store(64);
    assert!(!other.restore(dir.path()).unwrap());
    assert!(other.is_empty());
}
