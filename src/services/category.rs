use std::sync::Arc;

use chrono::Utc;

use super::error::{OrMissing, ServiceResult};
use super::{check_page, ensure_unique, first_failure, list_through, read_through, require_text};
use crate::cache::EntityCache;
use crate::config::ServiceSettings;
use crate::database::CategoryStore;
use crate::models::{Category, Conditions, Id, NewCategory, Page, PageRequest, UpdateCategory};

/// 分类服务
pub struct CategoryService {
    store: Arc<dyn CategoryStore>,
    cache: EntityCache<Category>,
    settings: Arc<ServiceSettings>,
}

impl CategoryService {
    pub fn new(
        store: Arc<dyn CategoryStore>,
        cache: EntityCache<Category>,
        settings: Arc<ServiceSettings>,
    ) -> Self {
        Self {
            store,
            cache,
            settings,
        }
    }

    pub async fn create(&self, new: NewCategory) -> ServiceResult<Category> {
        require_text("category name", &new.name)?;
        ensure_unique("category name", None, self.store.find_by_name(&new.name)).await?;

        let now = Utc::now();
        let category = Category {
            id: 0,
            name: new.name,
            description: new.description,
            created_at: now,
            updated_at: now,
        };
        let category = self.store.create(&category).await?;
        self.cache.set(&category).await?;
        self.cache.invalidate_lists().await?;

        tracing::info!("Created category {} ({})", category.id, category.name);
        Ok(category)
    }

    pub async fn update(&self, id: Id, changes: UpdateCategory) -> ServiceResult<Category> {
        if let Some(name) = &changes.name {
            require_text("category name", name)?;
            ensure_unique("category name", Some(id), self.store.find_by_name(name)).await?;
        }

        let category = self
            .store
            .update(id, &changes, Utc::now())
            .await
            .or_missing("category")?;
        self.cache.set(&category).await?;
        self.cache.invalidate_lists().await?;

        tracing::info!("Updated category {}", id);
        Ok(category)
    }

    pub async fn delete(&self, id: Id) -> ServiceResult<()> {
        self.store.delete(id).await.or_missing("category")?;

        let results = vec![
            self.cache.delete(id).await,
            self.cache.invalidate_lists().await,
        ];
        tracing::info!("Deleted category {}", id);
        first_failure("category", id, results)
    }

    pub async fn get(&self, id: Id) -> ServiceResult<Category> {
        read_through(&self.cache, id, "category", || self.store.find_by_id(id)).await
    }

    pub async fn list(&self, page: PageRequest) -> ServiceResult<Page<Category>> {
        let page = check_page(page, &self.settings)?;
        let key = self.cache.list_key(&Conditions::new(), page);
        let index = self.cache.sentinel();
        list_through(&self.cache, &index, key, || self.store.list(page)).await
    }
}
