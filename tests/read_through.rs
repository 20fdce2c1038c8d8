mod common;

use blog_backend::cache::{CacheBackend, CacheEntity};
use blog_backend::database::CategoryStore;
use blog_backend::models::{Category, Post, UpdatePost};
use chrono::Utc;
use common::{category, harness, harness_with_failing_cache, post, user};

#[tokio::test]
async fn second_get_is_served_from_cache() {
    let h = harness();
    let created = category(&h.services, "Tech").await;
    // 创建时已写入缓存，先清掉以观察一次完整的读穿
    h.cache
        .del(&[format!("{}{}", Category::PREFIX, created.id)])
        .await
        .unwrap();

    let before = h.store.find_by_id_calls();
    let first = h.services.categories.get(created.id).await.unwrap();
    let second = h.services.categories.get(created.id).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(h.store.find_by_id_calls() - before, 1);
}

#[tokio::test]
async fn freshly_created_entity_is_a_cache_hit() {
    let h = harness();
    let created = category(&h.services, "Databases").await;

    let before = h.store.find_by_id_calls();
    let fetched = h.services.categories.get(created.id).await.unwrap();
    assert_eq!(fetched, created);
    assert_eq!(h.store.find_by_id_calls(), before);
}

#[tokio::test]
async fn created_post_reads_back_equal() {
    let h = harness();
    let author = user(&h.services, "alice").await;
    let cat = category(&h.services, "Rust").await;
    let created = post(&h.services, "Hello", &author, &cat).await;

    let fetched = h.services.posts.get(created.id).await.unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.title, "Hello");
    assert_eq!(fetched.user_id, author.id);
}

#[tokio::test]
async fn update_refreshes_the_cached_snapshot() {
    let h = harness();
    let author = user(&h.services, "bob").await;
    let cat = category(&h.services, "Go").await;
    let created = post(&h.services, "Draft title", &author, &cat).await;
    h.services.posts.get(created.id).await.unwrap();

    let changes = UpdatePost {
        title: Some("Final title".to_string()),
        ..UpdatePost::default()
    };
    h.services.posts.update(created.id, changes, None).await.unwrap();

    let fetched: Post = h.services.posts.get(created.id).await.unwrap();
    assert_eq!(fetched.title, "Final title");
    assert_eq!(fetched.content, created.content);
}

#[tokio::test]
async fn missing_entity_is_not_found() {
    let h = harness();
    let err = h.services.categories.get(404).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn cache_population_failure_does_not_fail_the_read() {
    let (store, services) = harness_with_failing_cache();
    let now = Utc::now();
    let seeded = CategoryStore::create(
        store.as_ref(),
        &Category {
            id: 0,
            name: "Seeded".to_string(),
            description: String::new(),
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .unwrap();

    let first = services.categories.get(seeded.id).await.unwrap();
    let second = services.categories.get(seeded.id).await.unwrap();

    assert_eq!(first, seeded);
    assert_eq!(second, seeded);
    assert_eq!(store.find_by_id_calls(), 2);
}
