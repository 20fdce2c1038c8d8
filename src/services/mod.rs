// 实体服务：每个服务组合一个存储与一个实体缓存
// 读取先查缓存，未命中时查库并回填；写入先落库，再刷新实体快照并清除列表缓存

pub mod category;
pub mod comment;
pub mod error;
pub mod post;
pub mod tag;
pub mod user;

use std::future::Future;
use std::sync::Arc;

use sqlx::PgPool;

use crate::cache::{CacheBackend, CacheEntity, CacheError, EntityCache};
use crate::config::{CacheSettings, ServiceSettings};
use crate::database::{
    CategoryOperation, CategoryStore, CommentOperation, CommentStore, MemoryStore, PostOperation,
    PostStore, RepoError, TagOperation, TagStore, UserOperation, UserStore,
};
use crate::models::{Id, Page, PageRequest};

pub use category::CategoryService;
pub use comment::CommentService;
pub use error::{ServiceError, ServiceResult};
pub use post::PostService;
pub use tag::TagService;
pub use user::{LoginOutcome, UserService};

use error::OrMissing;

/// 各实体的存储实现
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub categories: Arc<dyn CategoryStore>,
    pub tags: Arc<dyn TagStore>,
    pub posts: Arc<dyn PostStore>,
    pub comments: Arc<dyn CommentStore>,
}

impl Stores {
    pub fn postgres(pool: Arc<PgPool>) -> Self {
        Self {
            users: Arc::new(UserOperation::new(pool.clone())),
            categories: Arc::new(CategoryOperation::new(pool.clone())),
            tags: Arc::new(TagOperation::new(pool.clone())),
            posts: Arc::new(PostOperation::new(pool.clone())),
            comments: Arc::new(CommentOperation::new(pool)),
        }
    }

    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            categories: store.clone(),
            tags: store.clone(),
            posts: store.clone(),
            comments: store,
        }
    }
}

/// 启动时构建一次，由路由层通过 `AppState` 共享
pub struct Services {
    pub users: UserService,
    pub categories: CategoryService,
    pub tags: TagService,
    pub posts: PostService,
    pub comments: CommentService,
}

impl Services {
    pub fn new(
        stores: Stores,
        backend: Arc<dyn CacheBackend>,
        cache: &CacheSettings,
        settings: ServiceSettings,
    ) -> Self {
        let settings = Arc::new(settings);
        let tag_cache = EntityCache::new(backend.clone(), cache.tag_ttl);
        let post_cache = EntityCache::new(backend.clone(), cache.post_ttl);

        Self {
            users: UserService::new(
                stores.users.clone(),
                EntityCache::new(backend.clone(), cache.user_ttl),
                cache.token_ttl,
                settings.clone(),
            ),
            categories: CategoryService::new(
                stores.categories.clone(),
                EntityCache::new(backend.clone(), cache.category_ttl),
                settings.clone(),
            ),
            tags: TagService::new(
                stores.tags.clone(),
                stores.posts.clone(),
                tag_cache.clone(),
                post_cache.clone(),
            ),
            posts: PostService::new(
                stores.posts.clone(),
                stores.tags.clone(),
                stores.categories.clone(),
                post_cache,
                tag_cache,
                settings.clone(),
            ),
            comments: CommentService::new(
                stores.comments,
                stores.posts,
                EntityCache::new(backend, cache.comment_ttl),
                settings,
            ),
        }
    }
}

/// 读穿：缓存命中直接返回，未命中查库后回填缓存
///
/// 回填失败只记录日志，不影响已经成功的读取。
pub(crate) async fn read_through<T, F, Fut>(
    cache: &EntityCache<T>,
    id: Id,
    entity: &'static str,
    load: F,
) -> ServiceResult<T>
where
    T: CacheEntity,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, RepoError>>,
{
    if let Some(hit) = cache.get(id).await? {
        tracing::debug!("Cache hit for {} {}", entity, id);
        return Ok(hit);
    }

    tracing::debug!("Cache miss for {} {}", entity, id);
    let loaded = load().await.or_missing(entity)?;
    if let Err(err) = cache.set(&loaded).await {
        tracing::warn!("Failed to cache {} {}: {}", entity, id, err);
    }
    Ok(loaded)
}

/// 列表读穿：只有非空页被视为命中，回填时把键登记到 `index`
pub(crate) async fn list_through<T, F, Fut>(
    cache: &EntityCache<T>,
    index: &str,
    key: String,
    load: F,
) -> ServiceResult<Page<T>>
where
    T: CacheEntity,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Page<T>, RepoError>>,
{
    if let Some(page) = cache.get_list(&key).await? {
        if !page.items.is_empty() {
            tracing::debug!("List cache hit for {}", key);
            return Ok(page);
        }
    }

    let page = load().await?;
    if !page.items.is_empty() {
        if let Err(err) = cache.set_list(index, &key, &page).await {
            tracing::warn!("Failed to cache list {}: {}", key, err);
        }
    }
    Ok(page)
}

/// 校验分页参数，超出上限的页大小被截断
pub(crate) fn check_page(page: PageRequest, settings: &ServiceSettings) -> ServiceResult<PageRequest> {
    if page.page < 1 {
        return Err(ServiceError::InvalidInput("page must be at least 1".into()));
    }
    if page.page_size < 1 {
        return Err(ServiceError::InvalidInput("page size must be at least 1".into()));
    }
    Ok(PageRequest::new(
        page.page,
        page.page_size.min(settings.max_page_size.max(1)),
    ))
}

/// 按唯一字段查重：存在且不是 `own_id` 时视为重复
pub(crate) async fn ensure_unique<T, F>(
    field: &'static str,
    own_id: Option<Id>,
    lookup: F,
) -> ServiceResult<()>
where
    T: CacheEntity,
    F: Future<Output = Result<T, RepoError>>,
{
    match lookup.await {
        Ok(existing) if Some(existing.id()) == own_id => Ok(()),
        Ok(_) => Err(ServiceError::duplicate(field)),
        Err(RepoError::NotFound) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// 删除路径的缓存清理：逐项执行，全部尝试后返回第一个错误
pub(crate) fn first_failure(
    entity: &'static str,
    id: Id,
    results: Vec<Result<(), CacheError>>,
) -> ServiceResult<()> {
    let mut first = None;
    for err in results.into_iter().filter_map(Result::err) {
        tracing::warn!("Cache cleanup after deleting {} {} failed: {}", entity, id, err);
        first.get_or_insert(err);
    }
    match first {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

/// 非空文本校验
pub(crate) fn require_text(field: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(())
}
