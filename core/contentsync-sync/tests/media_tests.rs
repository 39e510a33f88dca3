mod common;

use common::{FakeSite, cid, fid};
use contentsync_sync::{MediaImporter, ReferenceCache};
use proptest::prelude::*;
use serde_json::json;

// ── resolve_attachment ───────────────────────────────────────────

#[tokio::test]
async fn imports_once_per_url() {
    let site = FakeSite::new();
    let mut media = MediaImporter::new(&site, cid(1));

    let first = media.resolve_attachment("https://src.test/a.png", "").await;
    let second = media.resolve_attachment("https://src.test/a.png", "").await;

    assert_eq!(first, Some(fid(100)));
    assert_eq!(first, second);
    assert_eq!(site.import_count(), 1);
    assert_eq!(media.imported(), 1);
}

#[tokio::test]
async fn rejects_malformed_urls_without_importing() {
    let site = FakeSite::new();
    let mut media = MediaImporter::new(&site, cid(1));

    for url in ["", "not a url", "ftp://src.test/a.png", "/relative/a.png"] {
        assert_eq!(media.resolve_attachment(url, "").await, None, "{url}");
    }
    assert!(site.event_log().is_empty());
}

#[tokio::test]
async fn failed_import_degrades_to_none_and_is_not_cached() {
    let site = FakeSite::new().failing("https://src.test/broken.png");
    let mut media = MediaImporter::new(&site, cid(1));

    assert_eq!(media.resolve_attachment("https://src.test/broken.png", "").await, None);
    assert!(media.cache().is_empty());
    assert_eq!(media.imported(), 0);
}

#[tokio::test]
async fn alt_text_only_set_on_images() {
    let site = FakeSite::new();
    let mut media = MediaImporter::new(&site, cid(1));

    let image = media.resolve_attachment("https://src.test/cat.jpg", "A cat").await.unwrap();
    media.resolve_attachment("https://src.test/doc.pdf", "A document").await.unwrap();
    media.resolve_attachment("https://src.test/dog.png", "").await.unwrap();

    assert_eq!(*site.alt_texts.lock().unwrap(), vec![(image, "A cat".to_string())]);
}

#[tokio::test]
async fn existing_cache_short_circuits_imports() {
    let site = FakeSite::new();
    let mut cache = ReferenceCache::new();
    cache.insert("https://src.test/known.png", fid(42));
    let mut media = MediaImporter::with_cache(&site, cid(1), cache);

    assert_eq!(media.resolve_attachment("https://src.test/known.png", "").await, Some(fid(42)));
    assert_eq!(site.import_count(), 0);
}

#[tokio::test]
async fn resolve_reads_payload_shape() {
    let site = FakeSite::new();
    let mut media = MediaImporter::new(&site, cid(1));

    let payload = json!({"type": "attachment", "url": "https://src.test/a.jpg", "alt": "Alt"});
    assert_eq!(media.resolve(&payload).await, Some(fid(100)));
    assert_eq!(media.resolve(&json!(12)).await, None);
    assert_eq!(site.alt_texts.lock().unwrap().len(), 1);
}

// ── ReferenceCache ───────────────────────────────────────────────

#[test]
fn cache_keeps_first_id() {
    let mut cache = ReferenceCache::new();
    assert_eq!(cache.insert("u", fid(1)), fid(1));
    assert_eq!(cache.insert("u", fid(2)), fid(1));
    assert_eq!(cache.get("u"), Some(fid(1)));
    assert_eq!(cache.len(), 1);
}

proptest! {
    /// Any sequence of lookups imports each distinct URL exactly once and
    /// always answers a URL with the same ID.
    #[test]
    fn importer_is_idempotent_per_url(picks in prop::collection::vec(0usize..6, 1..40)) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let site = FakeSite::new();
            let mut media = MediaImporter::new(&site, cid(1));
            let mut seen = std::collections::HashMap::new();

            for pick in &picks {
                let url = format!("https://src.test/{pick}.png");
                let id = media.resolve_attachment(&url, "").await.unwrap();
                let first = *seen.entry(url).or_insert(id);
                prop_assert_eq!(first, id);
            }

            prop_assert_eq!(site.import_count(), seen.len());
            prop_assert_eq!(media.imported(), seen.len());
            Ok(())
        })?;
    }
}
