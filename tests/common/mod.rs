#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use blog_backend::cache::{CacheBackend, CacheError, MemoryCache};
use blog_backend::config::{CacheSettings, ServiceSettings};
use blog_backend::database::MemoryStore;
use blog_backend::models::{Category, NewCategory, NewPost, NewUser, Post, PostStatus, User};
use blog_backend::services::{Services, Stores};

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub cache: Arc<MemoryCache>,
    pub services: Services,
}

pub fn settings() -> ServiceSettings {
    ServiceSettings {
        bcrypt_cost: 4,
        jwt_secret: "test-secret".to_string(),
        ..ServiceSettings::default()
    }
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let cache = Arc::new(MemoryCache::new());
    let services = Services::new(
        Stores::memory(store.clone()),
        cache.clone(),
        &CacheSettings::default(),
        settings(),
    );
    Harness {
        store,
        cache,
        services,
    }
}

/// 缓存写入总是失败的服务组合
pub fn harness_with_failing_cache() -> (Arc<MemoryStore>, Services) {
    let store = Arc::new(MemoryStore::new());
    let services = Services::new(
        Stores::memory(store.clone()),
        Arc::new(FailingWrites::default()),
        &CacheSettings::default(),
        settings(),
    );
    (store, services)
}

/// 读取正常（均未命中），所有写入均被拒绝
#[derive(Default)]
pub struct FailingWrites {
    inner: MemoryCache,
}

fn refused() -> CacheError {
    CacheError::Unavailable("writes disabled".to_string())
}

#[async_trait]
impl CacheBackend for FailingWrites {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.inner.get(key).await
    }

    async fn set_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        Err(refused())
    }

    async fn del(&self, keys: &[String]) -> Result<(), CacheError> {
        self.inner.del(keys).await
    }

    async fn incr(&self, _key: &str) -> Result<i64, CacheError> {
        Err(refused())
    }

    async fn sadd(&self, _key: &str, _member: &str, _ttl: Duration) -> Result<(), CacheError> {
        Err(refused())
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, CacheError> {
        self.inner.smembers(key).await
    }
}

pub async fn user(services: &Services, name: &str) -> User {
    services
        .users
        .register(NewUser {
            username: name.to_string(),
            password: "password".to_string(),
            email: format!("{name}@example.com"),
            ..NewUser::default()
        })
        .await
        .expect("register user")
}

pub async fn category(services: &Services, name: &str) -> Category {
    services
        .categories
        .create(NewCategory {
            name: name.to_string(),
            description: String::new(),
        })
        .await
        .expect("create category")
}

pub fn new_post(title: &str, user: &User, category: &Category) -> NewPost {
    NewPost {
        title: title.to_string(),
        content: "body".to_string(),
        summary: String::new(),
        cover: String::new(),
        status: PostStatus::Published,
        pinned: false,
        user_id: user.id,
        category_id: category.id,
    }
}

pub async fn post(services: &Services, title: &str, user: &User, category: &Category) -> Post {
    services
        .posts
        .create(new_post(title, user, category), &[])
        .await
        .expect("create post")
}
