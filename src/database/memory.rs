// 进程内存储，供测试及 `DATABASE_URL=memory://` 使用
// 与 Postgres 表结构保持相同的唯一约束、外键、软删除与排序规则

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::error::RepoError;
use super::store::{CategoryStore, CommentStore, PostStore, TagStore, UserStore};
use crate::models::{
    Category, Comment, Conditions, Id, Page, PageRequest, Post, Tag, UpdateCategory,
    UpdateComment, UpdatePost, UpdateTag, UpdateUser, User,
};

#[derive(Default)]
struct Tables {
    next_id: u64,
    users: BTreeMap<Id, User>,
    categories: BTreeMap<Id, Category>,
    tags: BTreeMap<Id, Tag>,
    posts: BTreeMap<Id, Post>,
    post_tags: HashMap<Id, Vec<Id>>,
    comments: BTreeMap<Id, Comment>,
}

impl Tables {
    fn allocate(&mut self) -> Id {
        self.next_id += 1;
        self.next_id
    }

    fn live_post(&self, id: Id) -> Result<&Post, RepoError> {
        self.posts
            .get(&id)
            .filter(|p| p.deleted_at.is_none())
            .ok_or(RepoError::NotFound)
    }

    fn live_comment(&self, id: Id) -> Result<&Comment, RepoError> {
        self.comments
            .get(&id)
            .filter(|c| c.deleted_at.is_none())
            .ok_or(RepoError::NotFound)
    }

    /// 文章快照附带当前标签，按标签ID排序
    fn with_tags(&self, post: &Post) -> Post {
        let mut tags: Vec<Tag> = self
            .post_tags
            .get(&post.id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.tags.get(id).cloned())
            .collect();
        tags.sort_by_key(|t| t.id);
        Post {
            tags,
            ..post.clone()
        }
    }

    fn ensure_category(&self, id: Id) -> Result<(), RepoError> {
        if self.categories.contains_key(&id) {
            Ok(())
        } else {
            Err(RepoError::Integrity(format!("category {id} does not exist")))
        }
    }

    fn ensure_user(&self, id: Id) -> Result<(), RepoError> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(RepoError::Integrity(format!("user {id} does not exist")))
        }
    }

    fn matches(&self, post: &Post, conditions: &Conditions) -> Result<bool, RepoError> {
        for (name, value) in conditions {
            let hit = match name.as_str() {
                "user_id" => Some(post.user_id as i64) == value.as_i64(),
                "category_id" => Some(post.category_id as i64) == value.as_i64(),
                "tag_id" => {
                    let tag_id = value.as_i64().ok_or_else(|| {
                        RepoError::InvalidInput(format!("condition `{name}` expects an integer"))
                    })?;
                    self.post_tags
                        .get(&post.id)
                        .is_some_and(|ids| ids.iter().any(|id| *id as i64 == tag_id))
                }
                "status" => post.status.as_str() == value.to_string(),
                "pinned" => Some(post.pinned) == value.as_bool(),
                other => {
                    return Err(RepoError::InvalidInput(format!(
                        "unsupported post condition `{other}`"
                    )));
                }
            };
            if !hit {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn duplicate(constraint: &str) -> RepoError {
    RepoError::Duplicate {
        constraint: constraint.to_string(),
    }
}

/// 内存存储，同时记录读写次数供测试断言
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    find_by_id_calls: AtomicU64,
    list_calls: AtomicU64,
    view_count_updates: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 所有实体 `find_by_id` 的调用次数
    pub fn find_by_id_calls(&self) -> u64 {
        self.find_by_id_calls.load(Ordering::SeqCst)
    }

    /// 所有实体列表查询的次数
    pub fn list_calls(&self) -> u64 {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// 浏览量写回数据库的次数
    pub fn view_count_updates(&self) -> u64 {
        self.view_count_updates.load(Ordering::SeqCst)
    }

    fn record_find(&self) {
        self.find_by_id_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn record_list(&self) {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: &User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(duplicate("users_username_key"));
        }
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(duplicate("users_email_key"));
        }
        let id = tables.allocate();
        let stored = User {
            id,
            ..user.clone()
        };
        tables.users.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        id: Id,
        changes: &UpdateUser,
        at: DateTime<Utc>,
    ) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if let Some(username) = &changes.username {
            if tables
                .users
                .values()
                .any(|u| u.id != id && &u.username == username)
            {
                return Err(duplicate("users_username_key"));
            }
        }
        if let Some(email) = &changes.email {
            if tables.users.values().any(|u| u.id != id && &u.email == email) {
                return Err(duplicate("users_email_key"));
            }
        }

        let user = tables.users.get_mut(&id).ok_or(RepoError::NotFound)?;
        if let Some(v) = &changes.username {
            user.username = v.clone();
        }
        if let Some(v) = &changes.email {
            user.email = v.clone();
        }
        if let Some(v) = &changes.nickname {
            user.nickname = v.clone();
        }
        if let Some(v) = &changes.avatar {
            user.avatar = v.clone();
        }
        if let Some(v) = &changes.bio {
            user.bio = v.clone();
        }
        if let Some(v) = changes.role {
            user.role = v;
        }
        if let Some(v) = changes.status {
            user.status = v;
        }
        user.updated_at = at;
        Ok(user.clone())
    }

    async fn update_password(
        &self,
        id: Id,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        let user = tables.users.get_mut(&id).ok_or(RepoError::NotFound)?;
        user.password_hash = password_hash.to_string();
        user.updated_at = at;
        Ok(user.clone())
    }

    async fn delete(&self, id: Id) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&id) {
            return Err(RepoError::NotFound);
        }
        if tables.posts.values().any(|p| p.user_id == id)
            || tables.comments.values().any(|c| c.user_id == id)
        {
            return Err(RepoError::Integrity(format!(
                "user {id} is still referenced"
            )));
        }
        tables.users.remove(&id);
        Ok(())
    }

    async fn find_by_id(&self, id: Id) -> Result<User, RepoError> {
        self.record_find();
        let tables = self.tables.read().await;
        tables.users.get(&id).cloned().ok_or(RepoError::NotFound)
    }

    async fn find_by_username(&self, username: &str) -> Result<User, RepoError> {
        let tables = self.tables.read().await;
        tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, RepoError> {
        let tables = self.tables.read().await;
        tables
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn list(&self, page: PageRequest) -> Result<Page<User>, RepoError> {
        self.record_list();
        let tables = self.tables.read().await;
        Ok(Page::slice(tables.users.values().cloned().collect(), page))
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn create(&self, category: &Category) -> Result<Category, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.categories.values().any(|c| c.name == category.name) {
            return Err(duplicate("categories_name_key"));
        }
        let id = tables.allocate();
        let stored = Category {
            id,
            ..category.clone()
        };
        tables.categories.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        id: Id,
        changes: &UpdateCategory,
        at: DateTime<Utc>,
    ) -> Result<Category, RepoError> {
        let mut tables = self.tables.write().await;
        if let Some(name) = &changes.name {
            if tables
                .categories
                .values()
                .any(|c| c.id != id && &c.name == name)
            {
                return Err(duplicate("categories_name_key"));
            }
        }
        let category = tables.categories.get_mut(&id).ok_or(RepoError::NotFound)?;
        if let Some(v) = &changes.name {
            category.name = v.clone();
        }
        if let Some(v) = &changes.description {
            category.description = v.clone();
        }
        category.updated_at = at;
        Ok(category.clone())
    }

    async fn delete(&self, id: Id) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.categories.contains_key(&id) {
            return Err(RepoError::NotFound);
        }
        if tables.posts.values().any(|p| p.category_id == id) {
            return Err(RepoError::Integrity(format!(
                "category {id} still has posts"
            )));
        }
        tables.categories.remove(&id);
        Ok(())
    }

    async fn find_by_id(&self, id: Id) -> Result<Category, RepoError> {
        self.record_find();
        let tables = self.tables.read().await;
        tables.categories.get(&id).cloned().ok_or(RepoError::NotFound)
    }

    async fn find_by_name(&self, name: &str) -> Result<Category, RepoError> {
        let tables = self.tables.read().await;
        tables
            .categories
            .values()
            .find(|c| c.name == name)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn list(&self, page: PageRequest) -> Result<Page<Category>, RepoError> {
        self.record_list();
        let tables = self.tables.read().await;
        Ok(Page::slice(tables.categories.values().cloned().collect(), page))
    }
}

#[async_trait]
impl TagStore for MemoryStore {
    async fn create(&self, tag: &Tag) -> Result<Tag, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.tags.values().any(|t| t.name == tag.name) {
            return Err(duplicate("tags_name_key"));
        }
        let id = tables.allocate();
        let stored = Tag { id, ..tag.clone() };
        tables.tags.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        id: Id,
        changes: &UpdateTag,
        at: DateTime<Utc>,
    ) -> Result<Tag, RepoError> {
        let mut tables = self.tables.write().await;
        if let Some(name) = &changes.name {
            if tables.tags.values().any(|t| t.id != id && &t.name == name) {
                return Err(duplicate("tags_name_key"));
            }
        }
        let tag = tables.tags.get_mut(&id).ok_or(RepoError::NotFound)?;
        if let Some(v) = &changes.name {
            tag.name = v.clone();
        }
        tag.updated_at = at;
        Ok(tag.clone())
    }

    async fn delete(&self, id: Id) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.tags.remove(&id).ok_or(RepoError::NotFound)?;
        for ids in tables.post_tags.values_mut() {
            ids.retain(|tag_id| *tag_id != id);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Id) -> Result<Tag, RepoError> {
        self.record_find();
        let tables = self.tables.read().await;
        tables.tags.get(&id).cloned().ok_or(RepoError::NotFound)
    }

    async fn find_by_name(&self, name: &str) -> Result<Tag, RepoError> {
        let tables = self.tables.read().await;
        tables
            .tags
            .values()
            .find(|t| t.name == name)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn list_all(&self) -> Result<Vec<Tag>, RepoError> {
        self.record_list();
        let tables = self.tables.read().await;
        Ok(tables.tags.values().cloned().collect())
    }

    async fn find_or_create_by_names(&self, names: &[String]) -> Result<Vec<Tag>, RepoError> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        let mut resolved = Vec::with_capacity(names.len());
        for name in names {
            let existing = tables.tags.values().find(|t| &t.name == name).cloned();
            let tag = match existing {
                Some(tag) => tag,
                None => {
                    let id = tables.allocate();
                    let tag = Tag {
                        id,
                        name: name.clone(),
                        created_at: now,
                        updated_at: now,
                    };
                    tables.tags.insert(id, tag.clone());
                    tag
                }
            };
            resolved.push(tag);
        }
        Ok(resolved)
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn create(&self, post: &Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        tables.ensure_category(post.category_id)?;
        tables.ensure_user(post.user_id)?;
        let id = tables.allocate();
        let stored = Post {
            id,
            view_count: 0,
            deleted_at: None,
            ..post.clone()
        };
        tables
            .post_tags
            .insert(id, post.tags.iter().map(|t| t.id).collect());
        tables.posts.insert(id, stored);
        let created = tables.live_post(id)?;
        Ok(tables.with_tags(created))
    }

    async fn update(
        &self,
        id: Id,
        changes: &UpdatePost,
        tags: Option<&[Tag]>,
        at: DateTime<Utc>,
    ) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        tables.live_post(id)?;
        if let Some(category_id) = changes.category_id {
            tables.ensure_category(category_id)?;
        }

        let post = tables.posts.get_mut(&id).ok_or(RepoError::NotFound)?;
        if let Some(v) = &changes.title {
            post.title = v.clone();
        }
        if let Some(v) = &changes.content {
            post.content = v.clone();
        }
        if let Some(v) = &changes.summary {
            post.summary = v.clone();
        }
        if let Some(v) = &changes.cover {
            post.cover = v.clone();
        }
        if let Some(v) = changes.status {
            post.status = v;
        }
        if let Some(v) = changes.pinned {
            post.pinned = v;
        }
        if let Some(v) = changes.category_id {
            post.category_id = v;
        }
        post.updated_at = at;

        if let Some(tags) = tags {
            tables
                .post_tags
                .insert(id, tags.iter().map(|t| t.id).collect());
        }
        let updated = tables.live_post(id)?;
        Ok(tables.with_tags(updated))
    }

    async fn delete(&self, id: Id, at: DateTime<Utc>) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.live_post(id)?;
        if let Some(post) = tables.posts.get_mut(&id) {
            post.deleted_at = Some(at);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Id) -> Result<Post, RepoError> {
        self.record_find();
        let tables = self.tables.read().await;
        let post = tables.live_post(id)?;
        Ok(tables.with_tags(post))
    }

    async fn list(
        &self,
        page: PageRequest,
        conditions: &Conditions,
    ) -> Result<Page<Post>, RepoError> {
        self.record_list();
        let tables = self.tables.read().await;
        let mut matched = Vec::new();
        for post in tables.posts.values().filter(|p| p.deleted_at.is_none()) {
            if tables.matches(post, conditions)? {
                matched.push(tables.with_tags(post));
            }
        }
        matched.sort_by(|a, b| {
            b.pinned
                .cmp(&a.pinned)
                .then(b.created_at.cmp(&a.created_at))
                .then(b.id.cmp(&a.id))
        });
        Ok(Page::slice(matched, page))
    }

    async fn increment_view_count(&self, id: Id, delta: u64) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.live_post(id)?;
        if let Some(post) = tables.posts.get_mut(&id) {
            post.view_count += delta;
        }
        self.view_count_updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn ids_by_tag(&self, tag_id: Id) -> Result<Vec<Id>, RepoError> {
        let tables = self.tables.read().await;
        let mut ids: Vec<Id> = tables
            .post_tags
            .iter()
            .filter(|(post_id, tag_ids)| {
                tag_ids.contains(&tag_id) && tables.live_post(**post_id).is_ok()
            })
            .map(|(post_id, _)| *post_id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn create(&self, comment: &Comment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&comment.post_id) {
            return Err(RepoError::Integrity(format!(
                "post {} does not exist",
                comment.post_id
            )));
        }
        tables.ensure_user(comment.user_id)?;
        if let Some(parent_id) = comment.parent_id {
            if !tables.comments.contains_key(&parent_id) {
                return Err(RepoError::Integrity(format!(
                    "comment {parent_id} does not exist"
                )));
            }
        }
        let id = tables.allocate();
        let stored = Comment {
            id,
            deleted_at: None,
            ..comment.clone()
        };
        tables.comments.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        id: Id,
        changes: &UpdateComment,
        at: DateTime<Utc>,
    ) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        tables.live_comment(id)?;
        let comment = tables.comments.get_mut(&id).ok_or(RepoError::NotFound)?;
        if let Some(v) = &changes.content {
            comment.content = v.clone();
        }
        if let Some(v) = changes.status {
            comment.status = v;
        }
        comment.updated_at = at;
        Ok(comment.clone())
    }

    async fn delete(&self, id: Id, at: DateTime<Utc>) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.live_comment(id)?;
        if let Some(comment) = tables.comments.get_mut(&id) {
            comment.deleted_at = Some(at);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Id) -> Result<Comment, RepoError> {
        self.record_find();
        let tables = self.tables.read().await;
        tables.live_comment(id).cloned()
    }

    async fn list_by_post(
        &self,
        post_id: Id,
        page: PageRequest,
    ) -> Result<Page<Comment>, RepoError> {
        self.record_list();
        let tables = self.tables.read().await;
        Ok(newest_first(&tables, page, |c| c.post_id == post_id))
    }

    async fn list_by_user(
        &self,
        user_id: Id,
        page: PageRequest,
    ) -> Result<Page<Comment>, RepoError> {
        self.record_list();
        let tables = self.tables.read().await;
        Ok(newest_first(&tables, page, |c| c.user_id == user_id))
    }
}

fn newest_first(
    tables: &Tables,
    page: PageRequest,
    filter: impl Fn(&Comment) -> bool,
) -> Page<Comment> {
    let mut matched: Vec<Comment> = tables
        .comments
        .values()
        .filter(|c| c.deleted_at.is_none() && filter(c))
        .cloned()
        .collect();
    matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    Page::slice(matched, page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PostStatus, Role, Scalar, UserStatus};

    fn user(name: &str) -> User {
        let now = Utc::now();
        User {
            id: 0,
            username: name.to_string(),
            password_hash: "hash".to_string(),
            email: format!("{name}@example.com"),
            nickname: String::new(),
            avatar: String::new(),
            bio: String::new(),
            role: Role::User,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    fn category(name: &str) -> Category {
        let now = Utc::now();
        Category {
            id: 0,
            name: name.to_string(),
            description: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn post(user_id: Id, category_id: Id, pinned: bool, tags: Vec<Tag>) -> Post {
        let now = Utc::now();
        Post {
            id: 0,
            title: "title".to_string(),
            content: String::new(),
            summary: String::new(),
            cover: String::new(),
            status: PostStatus::Published,
            pinned,
            view_count: 0,
            user_id,
            category_id,
            tags,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn unique_username_is_enforced() {
        let store = MemoryStore::new();
        UserStore::create(&store, &user("alice")).await.unwrap();
        let mut clash = user("alice");
        clash.email = "other@example.com".to_string();
        let err = UserStore::create(&store, &clash).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn pinned_posts_come_first_and_deleted_ones_disappear() {
        let store = MemoryStore::new();
        let author = UserStore::create(&store, &user("bob")).await.unwrap();
        let cat = CategoryStore::create(&store, &category("Tech")).await.unwrap();

        let plain = PostStore::create(&store, &post(author.id, cat.id, false, vec![]))
            .await
            .unwrap();
        let pinned = PostStore::create(&store, &post(author.id, cat.id, true, vec![]))
            .await
            .unwrap();

        let page = PostStore::list(&store, PageRequest::new(1, 10), &Conditions::new())
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].id, pinned.id);

        PostStore::delete(&store, plain.id, Utc::now()).await.unwrap();
        assert!(
            PostStore::find_by_id(&store, plain.id)
                .await
                .unwrap_err()
                .is_not_found()
        );
        let page = PostStore::list(&store, PageRequest::new(1, 10), &Conditions::new())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn tag_condition_filters_by_association() {
        let store = MemoryStore::new();
        let author = UserStore::create(&store, &user("carol")).await.unwrap();
        let cat = CategoryStore::create(&store, &category("Life")).await.unwrap();
        let tags = store
            .find_or_create_by_names(&["rust".to_string()])
            .await
            .unwrap();

        PostStore::create(&store, &post(author.id, cat.id, false, tags.clone()))
            .await
            .unwrap();
        PostStore::create(&store, &post(author.id, cat.id, false, vec![]))
            .await
            .unwrap();

        let mut conditions = Conditions::new();
        conditions.insert("tag_id".to_string(), Scalar::from(tags[0].id));
        let page = PostStore::list(&store, PageRequest::new(1, 10), &conditions)
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].tags, tags);
    }

    #[tokio::test]
    async fn find_or_create_reuses_existing_tags() {
        let store = MemoryStore::new();
        let first = store
            .find_or_create_by_names(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        let second = store
            .find_or_create_by_names(&["b".to_string(), "c".to_string()])
            .await
            .unwrap();
        assert_eq!(first[1], second[0]);
        assert_eq!(store.list_all().await.unwrap().len(), 3);
    }
}
