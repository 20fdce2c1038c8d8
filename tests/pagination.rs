mod common;

use blog_backend::models::PageRequest;
use blog_backend::services::ServiceError;
use common::{category, harness};

#[tokio::test]
async fn empty_store_yields_an_empty_page() {
    let h = harness();
    let page = h
        .services
        .categories
        .list(PageRequest::new(1, 10))
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn zero_page_or_page_size_is_rejected() {
    let h = harness();
    for request in [PageRequest::new(0, 10), PageRequest::new(1, 0)] {
        let err = h.services.categories.list(request).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)), "{err:?}");
    }
    assert_eq!(h.store.list_calls(), 0);
}

#[tokio::test]
async fn pages_slice_in_id_order_with_the_full_total() {
    let h = harness();
    for name in ["A", "B", "C"] {
        category(&h.services, name).await;
    }

    let second = h
        .services
        .categories
        .list(PageRequest::new(2, 2))
        .await
        .unwrap();
    assert_eq!(second.total, 3);
    assert_eq!(second.items.len(), 1);
    assert_eq!(second.items[0].name, "C");

    let past_the_end = h
        .services
        .categories
        .list(PageRequest::new(5, 2))
        .await
        .unwrap();
    assert!(past_the_end.items.is_empty());
    assert_eq!(past_the_end.total, 3);
}

#[tokio::test]
async fn oversized_pages_are_clamped() {
    let h = harness();
    for i in 0..3 {
        category(&h.services, &format!("c{i}")).await;
    }
    let page = h
        .services
        .categories
        .list(PageRequest::new(1, 10_000))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 3);
}
