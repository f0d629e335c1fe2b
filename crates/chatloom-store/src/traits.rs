use crate::types::{Page, PageQuery, StoreError};
use async_trait::async_trait;
use chatloom_protocol::{Attachment, Thread, ThreadItem};

/// Per-request context threaded through every store operation.
///
/// Carries no access-control meaning here (single dev user); present so
/// backends that need tenancy can use it without changing the contract.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user_id: String,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            user_id: "dev-user".to_string(),
        }
    }
}

/// Ordered, keyed persistence for threads, their items, and attachments.
///
/// All upserts are idempotent by id. A single logical writer per thread
/// is assumed, not enforced; concurrent writers to the same thread are
/// not synchronized by this contract.
#[async_trait]
pub trait Store: Send + Sync {
    /// Load a thread. Fails with `NotFound` if absent.
    async fn load_thread(
        &self,
        thread_id: &str,
        context: &RequestContext,
    ) -> Result<Thread, StoreError>;

    /// Upsert a thread by id. First insertion also initializes the
    /// thread's empty item collection.
    async fn save_thread(
        &self,
        thread: &Thread,
        context: &RequestContext,
    ) -> Result<(), StoreError>;

    /// List threads in insertion order, cursor-paginated.
    async fn load_threads(
        &self,
        query: &PageQuery,
        context: &RequestContext,
    ) -> Result<Page<Thread>, StoreError>;

    /// List a thread's items in insertion order, cursor-paginated.
    /// An unknown thread yields an empty page.
    async fn load_thread_items(
        &self,
        thread_id: &str,
        query: &PageQuery,
        context: &RequestContext,
    ) -> Result<Page<ThreadItem>, StoreError>;

    /// Insert an item. Upsert by id; fails with `NotFound` if the thread
    /// does not exist.
    async fn add_thread_item(
        &self,
        thread_id: &str,
        item: &ThreadItem,
        context: &RequestContext,
    ) -> Result<(), StoreError>;

    /// Save an in-place mutation of an item. Functionally identical to
    /// [`Store::add_thread_item`]; kept distinct for call-site clarity.
    async fn save_item(
        &self,
        thread_id: &str,
        item: &ThreadItem,
        context: &RequestContext,
    ) -> Result<(), StoreError>;

    /// Load one item from a thread. Fails with `NotFound` if absent.
    async fn load_item(
        &self,
        thread_id: &str,
        item_id: &str,
        context: &RequestContext,
    ) -> Result<ThreadItem, StoreError>;

    /// Delete a thread and all its items. No-op if absent.
    async fn delete_thread(
        &self,
        thread_id: &str,
        context: &RequestContext,
    ) -> Result<(), StoreError>;

    /// Delete one item. No-op if absent.
    async fn delete_thread_item(
        &self,
        thread_id: &str,
        item_id: &str,
        context: &RequestContext,
    ) -> Result<(), StoreError>;

    /// Upsert an attachment by id.
    async fn save_attachment(
        &self,
        attachment: &Attachment,
        context: &RequestContext,
    ) -> Result<(), StoreError>;

    /// Load an attachment. Fails with `NotFound` if absent.
    async fn load_attachment(
        &self,
        attachment_id: &str,
        context: &RequestContext,
    ) -> Result<Attachment, StoreError>;

    /// Delete an attachment. No-op if absent.
    async fn delete_attachment(
        &self,
        attachment_id: &str,
        context: &RequestContext,
    ) -> Result<(), StoreError>;
}
