//! Pins and graph statistics

mod common;

use common::{provider, provider_over};
use notegraph_core::{
    MemoryObjectStore, NoteSaveRequest, NotegraphError, NotesProvider, ObjectStore, StatsOptions,
};

const PINS: &str = ".pin-list.txt";

async fn create(provider: &NotesProvider, slug: &str, content: &str) {
    provider
        .put(NoteSaveRequest::create(content).with_slug(slug))
        .await
        .unwrap();
}

fn slugs(items: &[notegraph_core::NoteListItem]) -> Vec<&str> {
    items.iter().map(|item| item.slug.as_str()).collect()
}

#[tokio::test]
async fn test_pin_and_unpin() {
    let (provider, store) = provider();
    create(&provider, "a", "# A").await;
    create(&provider, "b", "# B").await;

    provider.pin("a").await.unwrap();
    let pins = provider.pin("b").await.unwrap();
    assert_eq!(slugs(&pins), vec!["a", "b"]);

    let again = provider.pin("a").await.unwrap();
    assert_eq!(slugs(&again), vec!["a", "b"]);
    assert_eq!(store.get_string(PINS).as_deref(), Some("a\nb"));

    let err = provider.pin("missing").await.unwrap_err();
    assert_eq!(err, NotegraphError::NoteNotFound("missing".into()));

    let pins = provider.unpin("a").await.unwrap();
    assert_eq!(slugs(&pins), vec!["b"]);
    let pins = provider.unpin("a").await.unwrap();
    assert_eq!(slugs(&pins), vec!["b"]);

    let reloaded = provider_over(&store);
    assert_eq!(slugs(&reloaded.get_pins().await.unwrap()), vec!["b"]);
}

#[tokio::test]
async fn test_move_pin_position_clamps() {
    let (provider, _) = provider();
    for slug in ["a", "b", "c"] {
        create(&provider, slug, slug).await;
        provider.pin(slug).await.unwrap();
    }

    let pins = provider.move_pin_position("a", 1).await.unwrap();
    assert_eq!(slugs(&pins), vec!["b", "a", "c"]);

    let pins = provider.move_pin_position("b", 10).await.unwrap();
    assert_eq!(slugs(&pins), vec!["a", "c", "b"]);

    let pins = provider.move_pin_position("b", -10).await.unwrap();
    assert_eq!(slugs(&pins), vec!["b", "a", "c"]);

    let err = provider.move_pin_position("zzz", 1).await.unwrap_err();
    assert_eq!(err.code(), "PINNED_NOTE_NOT_FOUND");
}

#[tokio::test]
async fn test_unchanged_pin_position_writes_nothing() {
    let (provider, store) = provider();
    create(&provider, "a", "a").await;
    create(&provider, "b", "b").await;
    provider.pin("a").await.unwrap();
    provider.pin("b").await.unwrap();

    store.remove_object(PINS).await.unwrap();

    let pins = provider.move_pin_position("a", 0).await.unwrap();
    assert_eq!(slugs(&pins), vec!["a", "b"]);
    provider.move_pin_position("a", -1).await.unwrap();
    provider.move_pin_position("b", 1).await.unwrap();
    assert!(!store.contains(PINS));

    provider.move_pin_position("a", 1).await.unwrap();
    assert_eq!(store.get_string(PINS).as_deref(), Some("b\na"));
}

#[tokio::test]
async fn test_stats_count_only_resolved_links() {
    let (provider, _) = provider();
    create(
        &provider,
        "dangling",
        "[[One]] [[Two]] [[Three]]\n[[Four]] [[Five]] [[Six]]\n/a /b /c /d /e",
    )
    .await;
    create(&provider, "source", "# Source\n[[Target]] and /target").await;
    create(&provider, "target", "# Target").await;
    create(&provider, "alone", "# Alone").await;
    provider
        .put(NoteSaveRequest::update("alone", "# Alone").with_aliases(["solo"]))
        .await
        .unwrap();
    provider.pin("target").await.unwrap();

    let stats = provider.get_stats(StatsOptions::default()).await.unwrap();
    assert_eq!(stats.number_of_all_notes, 4);
    assert_eq!(stats.number_of_links, 1);
    assert_eq!(stats.number_of_unlinked_notes, 2);
    assert_eq!(stats.number_of_aliases, 1);
    assert_eq!(stats.number_of_pins, 1);
    assert_eq!(stats.number_of_files, 0);
    assert!(stats.size.is_none());
}

#[tokio::test]
async fn test_stats_with_size() {
    let (provider, store) = provider();
    create(&provider, "a", "hello").await;
    provider
        .add_file(
            Box::new(std::io::Cursor::new(b"12345".to_vec())),
            "files",
            "five.txt",
        )
        .await
        .unwrap();

    let stats = provider
        .get_stats(StatsOptions { include_size: true })
        .await
        .unwrap();
    let size = stats.size.unwrap();
    assert_eq!(size.files, 5);
    assert_eq!(size.graph, store.get_total_size().await.unwrap());
    assert!(size.graph > size.files);
}

#[tokio::test]
async fn test_pins_naming_missing_notes_are_not_listed_or_counted() {
    let store = MemoryObjectStore::with_objects([("a.subtext", "# A"), (PINS, "ghost\na")]);
    let provider = provider_over(&store);

    assert_eq!(slugs(&provider.get_pins().await.unwrap()), vec!["a"]);
    let stats = provider.get_stats(StatsOptions::default()).await.unwrap();
    assert_eq!(stats.number_of_pins, 1);
    assert_eq!(stats.number_of_all_notes, 1);
}
