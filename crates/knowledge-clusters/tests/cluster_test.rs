//! Integration tests for the clustering engine against real storage.

use std::sync::Arc;

use tempfile::TempDir;

use knowledge_clusters::{ClusterConfig, ClusterEngine, ClusterOutcome};
use knowledge_storage::Storage;
use knowledge_types::{Conversation, ConversationSource};
use ulid::Ulid;

fn open_temp() -> (TempDir, Arc<Storage>) {
    let temp = TempDir::new().unwrap();
    let storage = Arc::new(Storage::open(temp.path()).unwrap());
    (temp, storage)
}

fn engine(storage: &Arc<Storage>) -> ClusterEngine {
    ClusterEngine::new(
        storage.clone(),
        ClusterConfig {
            min_cluster_size: 3,
            seed: Some(7),
            ..ClusterConfig::default()
        },
    )
}

fn add_conversation(storage: &Storage, title: &str, embedding: Vec<f32>) -> String {
    let mut conv = Conversation::new(
        Ulid::new().to_string(),
        title.to_string(),
        ConversationSource::User,
    );
    conv.embedding = Some(embedding);
    storage.put_conversation(&conv).unwrap();
    conv.id
}

/// Two well-separated topic groups in embedding space.
fn seed_two_topics(storage: &Storage) -> (Vec<String>, Vec<String>) {
    let inventory: Vec<String> = (0..4)
        .map(|i| {
            add_conversation(
                storage,
                &format!("Inventory shortfall report {}", i),
                vec![1.0, 0.05 * i as f32, 0.0, 0.0],
            )
        })
        .collect();
    let security: Vec<String> = (0..4)
        .map(|i| {
            add_conversation(
                storage,
                &format!("Security badge audit {}", i),
                vec![0.0, 0.0, 1.0, 0.05 * i as f32],
            )
        })
        .collect();
    (inventory, security)
}

#[test]
fn test_two_topics_form_two_clusters() {
    let (_temp, storage) = open_temp();
    let (inventory, security) = seed_two_topics(&storage);
    let engine = engine(&storage);

    let outcome = engine.cluster_conversations().unwrap();
    let report = match outcome {
        ClusterOutcome::Completed(report) => report,
        ClusterOutcome::NotEnoughData { .. } => panic!("eight conversations must cluster"),
    };

    assert_eq!(report.clusters.len(), 2);
    assert_eq!(report.clustered, 8);
    assert_eq!(report.unclustered, 0);

    // Members of one topic all share a cluster.
    let cluster_of = |id: &str| {
        storage
            .get_conversation(id)
            .unwrap()
            .unwrap()
            .cluster_id
            .expect("member must be assigned")
    };
    let inv_cluster = cluster_of(&inventory[0]);
    assert!(inventory.iter().all(|id| cluster_of(id) == inv_cluster));
    let sec_cluster = cluster_of(&security[0]);
    assert!(security.iter().all(|id| cluster_of(id) == sec_cluster));
    assert_ne!(inv_cluster, sec_cluster);
}

#[test]
fn test_labels_and_tags_come_from_titles() {
    let (_temp, storage) = open_temp();
    let (inventory, _) = seed_two_topics(&storage);
    let engine = engine(&storage);

    engine.cluster_conversations().unwrap();

    let clusters = storage.all_clusters().unwrap();
    let inv_cluster = clusters
        .iter()
        .find(|c| c.member_ids.contains(&inventory[0]))
        .unwrap();
    assert!(
        inv_cluster.label.contains("inventory"),
        "label built from member titles, got '{}'",
        inv_cluster.label
    );

    // The same keywords land back on members as auto-tags.
    let tags = storage.tags_for_conversation(&inventory[0]).unwrap();
    assert!(tags.contains(&"inventory".to_string()));
}

#[test]
fn test_rerun_replaces_previous_clusters() {
    let (_temp, storage) = open_temp();
    seed_two_topics(&storage);
    let engine = engine(&storage);

    engine.cluster_conversations().unwrap();
    let first_ids: Vec<String> = storage
        .all_clusters()
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();

    engine.cluster_conversations().unwrap();
    let second = storage.all_clusters().unwrap();

    assert_eq!(second.len(), 2);
    assert!(
        second.iter().all(|c| !first_ids.contains(&c.id)),
        "a run must replace clusters wholesale, not update them"
    );
}

#[test]
fn test_not_enough_data_writes_nothing() {
    let (_temp, storage) = open_temp();
    add_conversation(&storage, "Lonely conversation", vec![1.0, 0.0]);
    add_conversation(&storage, "Another one", vec![0.0, 1.0]);
    let engine = engine(&storage);

    let outcome = engine.cluster_conversations().unwrap();
    assert!(matches!(
        outcome,
        ClusterOutcome::NotEnoughData { conversations: 2 }
    ));
    assert!(storage.all_clusters().unwrap().is_empty());
}

#[test]
fn test_conversations_without_embeddings_skipped() {
    let (_temp, storage) = open_temp();
    seed_two_topics(&storage);
    let bare = Conversation::new(
        Ulid::new().to_string(),
        "Never embedded".to_string(),
        ConversationSource::Agent,
    );
    storage.put_conversation(&bare).unwrap();
    let engine = engine(&storage);

    let ClusterOutcome::Completed(report) = engine.cluster_conversations().unwrap() else {
        panic!("must complete");
    };
    assert_eq!(report.clustered + report.unclustered, 8);
    assert!(storage
        .get_conversation(&bare.id)
        .unwrap()
        .unwrap()
        .cluster_id
        .is_none());
}

#[test]
fn test_find_similar_ranks_same_topic_first() {
    let (_temp, storage) = open_temp();
    let (inventory, security) = seed_two_topics(&storage);
    let engine = engine(&storage);

    let similar = engine.find_similar(&inventory[0], 3).unwrap();
    assert_eq!(similar.len(), 3);
    assert!(
        inventory.contains(&similar[0].conversation_id),
        "nearest neighbor must come from the same topic"
    );
    assert!(!security.contains(&similar[0].conversation_id));
}

#[test]
fn test_conversations_by_cluster_label() {
    let (_temp, storage) = open_temp();
    seed_two_topics(&storage);
    let engine = engine(&storage);
    engine.cluster_conversations().unwrap();

    let clusters = storage.all_clusters().unwrap();
    let label = &clusters[0].label;
    let members = engine.conversations_by_cluster(label).unwrap();
    assert_eq!(members.len(), clusters[0].member_count());

    assert!(engine.conversations_by_cluster("no such label").unwrap().is_empty());
}
