mod common;

use blog_backend::models::{PageRequest, UpdatePost, UpdateTag};
use common::{category, harness, new_post, user};

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[tokio::test]
async fn find_or_create_is_idempotent() {
    let h = harness();
    let first = h
        .services
        .tags
        .find_or_create(&names(&["rust", " web ", "rust"]))
        .await
        .unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first[1].name, "web");

    let again = h
        .services
        .tags
        .find_or_create(&names(&["web", "rust"]))
        .await
        .unwrap();
    assert_eq!(again[0].id, first[1].id);
    assert_eq!(again[1].id, first[0].id);

    assert_eq!(h.services.tags.list_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn posts_create_missing_tags_and_list_all_sees_them() {
    let h = harness();
    let author = user(&h.services, "alice").await;
    let cat = category(&h.services, "Tech").await;

    assert!(h.services.tags.list_all().await.unwrap().is_empty());

    let post = h
        .services
        .posts
        .create(new_post("Tagged", &author, &cat), &names(&["rust", "async"]))
        .await
        .unwrap();
    let tag_names: Vec<_> = post.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tag_names, ["rust", "async"]);

    let all = h.services.tags.list_all().await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn updating_tags_replaces_or_clears_the_set() {
    let h = harness();
    let author = user(&h.services, "alice").await;
    let cat = category(&h.services, "Tech").await;
    let post = h
        .services
        .posts
        .create(new_post("Tagged", &author, &cat), &names(&["rust", "async"]))
        .await
        .unwrap();

    assert_eq!(h.services.tags.post_tags(post.id).await.unwrap().len(), 2);

    // 不传标签时保持不变
    let retitled = h
        .services
        .posts
        .update(
            post.id,
            UpdatePost {
                title: Some("Retitled".to_string()),
                ..UpdatePost::default()
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(retitled.tags.len(), 2);

    let replaced = h
        .services
        .posts
        .update(post.id, UpdatePost::default(), Some(names(&["go"])))
        .await
        .unwrap();
    assert_eq!(replaced.tags.len(), 1);
    let cached = h.services.tags.post_tags(post.id).await.unwrap();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].name, "go");

    let cleared = h
        .services
        .posts
        .update(post.id, UpdatePost::default(), Some(Vec::new()))
        .await
        .unwrap();
    assert!(cleared.tags.is_empty());
    assert!(h.services.tags.post_tags(post.id).await.unwrap().is_empty());
    assert!(h.services.posts.get(post.id).await.unwrap().tags.is_empty());
}

#[tokio::test]
async fn tag_filter_lists_only_tagged_posts() {
    let h = harness();
    let author = user(&h.services, "alice").await;
    let cat = category(&h.services, "Tech").await;
    let tagged = h
        .services
        .posts
        .create(new_post("Tagged", &author, &cat), &names(&["rust"]))
        .await
        .unwrap();
    h.services
        .posts
        .create(new_post("Plain", &author, &cat), &[])
        .await
        .unwrap();

    let rust = &tagged.tags[0];
    let listed = h
        .services
        .posts
        .list_by_tag(rust.id, PageRequest::new(1, 10))
        .await
        .unwrap();
    assert_eq!(listed.total, 1);
    assert_eq!(listed.items[0].id, tagged.id);
}

#[tokio::test]
async fn renaming_a_tag_refreshes_cached_posts() {
    let h = harness();
    let author = user(&h.services, "alice").await;
    let cat = category(&h.services, "Tech").await;
    let post = h
        .services
        .posts
        .create(new_post("Tagged", &author, &cat), &names(&["rust"]))
        .await
        .unwrap();
    let rust = post.tags[0].clone();
    let page = PageRequest::new(1, 10);

    // 预热文章快照、文章标签与按标签过滤的列表
    h.services.posts.get(post.id).await.unwrap();
    h.services.tags.post_tags(post.id).await.unwrap();
    h.services.posts.list_by_tag(rust.id, page).await.unwrap();

    h.services
        .tags
        .update(
            rust.id,
            UpdateTag {
                name: Some("rustlang".to_string()),
            },
        )
        .await
        .unwrap();

    let cached = h.services.tags.post_tags(post.id).await.unwrap();
    assert_eq!(cached[0].name, "rustlang");
    let fetched = h.services.posts.get(post.id).await.unwrap();
    assert_eq!(fetched.tags[0].name, "rustlang");
    let listed = h.services.posts.list_by_tag(rust.id, page).await.unwrap();
    assert_eq!(listed.items[0].tags[0].name, "rustlang");
}

#[tokio::test]
async fn deleting_a_tag_detaches_it_from_cached_posts() {
    let h = harness();
    let author = user(&h.services, "alice").await;
    let cat = category(&h.services, "Tech").await;
    let post = h
        .services
        .posts
        .create(new_post("Tagged", &author, &cat), &names(&["rust", "web"]))
        .await
        .unwrap();
    let rust = post.tags[0].clone();
    let page = PageRequest::new(1, 10);

    h.services.posts.get(post.id).await.unwrap();
    h.services.tags.post_tags(post.id).await.unwrap();
    assert_eq!(
        h.services.posts.list_by_tag(rust.id, page).await.unwrap().total,
        1
    );

    h.services.tags.delete(rust.id).await.unwrap();

    let cached = h.services.tags.post_tags(post.id).await.unwrap();
    let cached_names: Vec<_> = cached.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(cached_names, ["web"]);
    let fetched = h.services.posts.get(post.id).await.unwrap();
    assert_eq!(fetched.tags.len(), 1);
    assert_eq!(fetched.tags[0].name, "web");
    let listed = h.services.posts.list_by_tag(rust.id, page).await.unwrap();
    assert_eq!(listed.total, 0);
    assert!(h.services.tags.get(rust.id).await.unwrap_err().is_not_found());
}
