mod common;

use std::sync::Arc;
use std::time::Duration;

use blog_backend::cache::EntityCache;
use blog_backend::database::PostStore;
use blog_backend::models::Post;
use common::{category, harness, post, user};

#[tokio::test]
async fn views_are_flushed_to_the_store_in_batches() {
    let h = harness();
    let author = user(&h.services, "alice").await;
    let cat = category(&h.services, "Tech").await;
    let article = post(&h.services, "Article", &author, &cat).await;

    for expected in 1..=9 {
        let count = h.services.posts.increment_view_count(article.id).await.unwrap();
        assert_eq!(count, expected);
    }
    assert_eq!(h.store.view_count_updates(), 0);
    let stored = PostStore::find_by_id(&*h.store, article.id).await.unwrap();
    assert_eq!(stored.view_count, 0);

    let count = h.services.posts.increment_view_count(article.id).await.unwrap();
    assert_eq!(count, 10);
    assert_eq!(h.store.view_count_updates(), 1);
    let stored = PostStore::find_by_id(&*h.store, article.id).await.unwrap();
    assert_eq!(stored.view_count, 10);

    // 快照已失效，重新读取拿到数据库中的新值
    let fetched = h.services.posts.get(article.id).await.unwrap();
    assert_eq!(fetched.view_count, 10);
}

#[tokio::test]
async fn view_reports_pending_views() {
    let h = harness();
    let author = user(&h.services, "alice").await;
    let cat = category(&h.services, "Tech").await;
    let article = post(&h.services, "Article", &author, &cat).await;

    for expected in 1..=9 {
        let viewed = h.services.posts.view(article.id).await.unwrap();
        assert_eq!(viewed.view_count, expected);
    }

    let viewed = h.services.posts.view(article.id).await.unwrap();
    assert_eq!(viewed.view_count, 10);
    assert_eq!(h.store.view_count_updates(), 1);

    let viewed = h.services.posts.view(article.id).await.unwrap();
    assert_eq!(viewed.view_count, 11);
}

#[tokio::test]
async fn viewing_a_missing_post_is_not_found() {
    let h = harness();
    let err = h.services.posts.view(404).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(h.store.view_count_updates(), 0);
}

#[tokio::test]
async fn deleting_a_post_resets_its_counter() {
    let h = harness();
    let author = user(&h.services, "alice").await;
    let cat = category(&h.services, "Tech").await;
    let article = post(&h.services, "Article", &author, &cat).await;

    for _ in 0..3 {
        h.services.posts.increment_view_count(article.id).await.unwrap();
    }
    let counters = EntityCache::<Post>::new(h.cache.clone(), Duration::from_secs(60));
    assert_eq!(counters.view_count(article.id).await.unwrap(), 3);

    h.services.posts.delete(article.id).await.unwrap();
    assert_eq!(counters.view_count(article.id).await.unwrap(), 0);

    assert!(h.services.posts.get(article.id).await.unwrap_err().is_not_found());
    assert!(h.services.posts.view(article.id).await.unwrap_err().is_not_found());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_views_are_counted_exactly_and_flushed_once_per_batch() {
    let h = harness();
    let author = user(&h.services, "alice").await;
    let cat = category(&h.services, "Tech").await;
    let article = post(&h.services, "Article", &author, &cat).await;

    let services = Arc::new(h.services);
    let mut handles = Vec::with_capacity(100);
    for _ in 0..100 {
        let services = Arc::clone(&services);
        handles.push(tokio::spawn(async move {
            services.posts.view(article.id).await.map(|_| ())
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let counters = EntityCache::<Post>::new(h.cache.clone(), Duration::from_secs(60));
    assert_eq!(counters.view_count(article.id).await.unwrap(), 100);
    assert_eq!(h.store.view_count_updates(), 10);
    let stored = PostStore::find_by_id(&*h.store, article.id).await.unwrap();
    assert_eq!(stored.view_count, 100);
}
