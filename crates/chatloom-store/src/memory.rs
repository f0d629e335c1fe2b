use crate::traits::{RequestContext, Store};
use crate::types::{paginate_by_cursor, Page, PageQuery, StoreError};
use async_trait::async_trait;
use chatloom_protocol::{Attachment, Thread, ThreadItem};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    /// Threads in insertion order. Upserts replace in place, so a
    /// re-saved thread keeps its original position.
    threads: Vec<Thread>,
    /// thread_id → items in insertion order.
    items: HashMap<String, Vec<ThreadItem>>,
    attachments: HashMap<String, Attachment>,
}

/// In-memory store for local development and tests. Resets on restart.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn upsert_item(items: &mut Vec<ThreadItem>, item: &ThreadItem) {
    match items.iter_mut().find(|existing| existing.id() == item.id()) {
        Some(existing) => *existing = item.clone(),
        None => items.push(item.clone()),
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load_thread(
        &self,
        thread_id: &str,
        _context: &RequestContext,
    ) -> Result<Thread, StoreError> {
        let inner = self.inner.read().await;
        inner
            .threads
            .iter()
            .find(|thread| thread.id == thread_id)
            .cloned()
            .ok_or_else(|| StoreError::thread_not_found(thread_id))
    }

    async fn save_thread(
        &self,
        thread: &Thread,
        _context: &RequestContext,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        match inner.threads.iter_mut().find(|t| t.id == thread.id) {
            Some(existing) => *existing = thread.clone(),
            None => inner.threads.push(thread.clone()),
        }
        inner.items.entry(thread.id.clone()).or_default();
        Ok(())
    }

    async fn load_threads(
        &self,
        query: &PageQuery,
        _context: &RequestContext,
    ) -> Result<Page<Thread>, StoreError> {
        let inner = self.inner.read().await;
        Ok(paginate_by_cursor(&inner.threads, query, |thread| {
            &thread.id
        }))
    }

    async fn load_thread_items(
        &self,
        thread_id: &str,
        query: &PageQuery,
        _context: &RequestContext,
    ) -> Result<Page<ThreadItem>, StoreError> {
        let inner = self.inner.read().await;
        match inner.items.get(thread_id) {
            Some(items) => Ok(paginate_by_cursor(items, query, |item| item.id())),
            None => Ok(Page::empty()),
        }
    }

    async fn add_thread_item(
        &self,
        thread_id: &str,
        item: &ThreadItem,
        _context: &RequestContext,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let items = inner
            .items
            .get_mut(thread_id)
            .ok_or_else(|| StoreError::thread_not_found(thread_id))?;
        upsert_item(items, item);
        Ok(())
    }

    async fn save_item(
        &self,
        thread_id: &str,
        item: &ThreadItem,
        _context: &RequestContext,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let items = inner
            .items
            .get_mut(thread_id)
            .ok_or_else(|| StoreError::thread_not_found(thread_id))?;
        upsert_item(items, item);
        Ok(())
    }

    async fn load_item(
        &self,
        thread_id: &str,
        item_id: &str,
        _context: &RequestContext,
    ) -> Result<ThreadItem, StoreError> {
        let inner = self.inner.read().await;
        inner
            .items
            .get(thread_id)
            .and_then(|items| items.iter().find(|item| item.id() == item_id))
            .cloned()
            .ok_or_else(|| StoreError::item_not_found(thread_id, item_id))
    }

    async fn delete_thread(
        &self,
        thread_id: &str,
        _context: &RequestContext,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.threads.retain(|thread| thread.id != thread_id);
        inner.items.remove(thread_id);
        Ok(())
    }

    async fn delete_thread_item(
        &self,
        thread_id: &str,
        item_id: &str,
        _context: &RequestContext,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(items) = inner.items.get_mut(thread_id) {
            items.retain(|item| item.id() != item_id);
        }
        Ok(())
    }

    async fn save_attachment(
        &self,
        attachment: &Attachment,
        _context: &RequestContext,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .attachments
            .insert(attachment.id.clone(), attachment.clone());
        Ok(())
    }

    async fn load_attachment(
        &self,
        attachment_id: &str,
        _context: &RequestContext,
    ) -> Result<Attachment, StoreError> {
        let inner = self.inner.read().await;
        inner
            .attachments
            .get(attachment_id)
            .cloned()
            .ok_or_else(|| StoreError::attachment_not_found(attachment_id))
    }

    async fn delete_attachment(
        &self,
        attachment_id: &str,
        _context: &RequestContext,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.attachments.remove(attachment_id);
        Ok(())
    }
}
