mod common;

use common::{FakeSite, cid};
use contentsync_sync::ContentMapper;
use serde_json::json;

fn site() -> FakeSite {
    FakeSite::new()
        .with_item(10, "page", "about-us", "About Us")
        .with_item(11, "page", "team", "Our Team")
        .with_item(12, "page", "team-2", "Our Team")
        .with_item(20, "post", "about-us", "About Us (post)")
}

#[test]
fn slug_lookup_is_scoped_to_content_type() {
    let site = site();
    let mapper = ContentMapper::new(&site);

    assert_eq!(mapper.resolve(&json!({"slug": "about-us"}), "page"), Some(cid(10)));
    assert_eq!(mapper.resolve(&json!({"slug": "about-us"}), "post"), Some(cid(20)));
}

#[test]
fn slug_is_normalized_before_lookup() {
    let site = site();
    let mapper = ContentMapper::new(&site);

    assert_eq!(mapper.resolve(&json!({"slug": "/About-Us/"}), "page"), Some(cid(10)));
}

#[test]
fn bare_string_is_tried_as_slug() {
    let site = site();
    let mapper = ContentMapper::new(&site);

    assert_eq!(mapper.resolve(&json!("team"), "page"), Some(cid(11)));
}

#[test]
fn falls_back_to_title_when_slug_misses() {
    let site = site();
    let mapper = ContentMapper::new(&site);

    let value = json!({"type": "post", "id": 5, "slug": "renamed", "title": "About Us"});
    assert_eq!(mapper.resolve(&value, "page"), Some(cid(10)));
}

#[test]
fn title_match_prefers_most_recent() {
    let site = site();
    let mapper = ContentMapper::new(&site);

    assert_eq!(mapper.resolve(&json!({"title": "Our Team"}), "page"), Some(cid(12)));
}

#[test]
fn source_id_is_never_used() {
    let site = site();
    let mapper = ContentMapper::new(&site);

    assert_eq!(mapper.resolve(&json!(10), "page"), None);
    assert_eq!(mapper.resolve(&json!({"id": 10}), "page"), None);
}

#[test]
fn unresolvable_reference_is_none() {
    let site = site();
    let mapper = ContentMapper::new(&site);

    assert_eq!(mapper.resolve(&json!({"slug": "nope", "title": "Nope"}), "page"), None);
    assert_eq!(mapper.resolve(&json!(null), "page"), None);
}
