use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sort order for paginated queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Cursor-based pagination parameters.
#[derive(Debug, Clone)]
pub struct PageQuery {
    /// Return elements strictly after the one with this id, in the
    /// selected order. An id that matches nothing yields an empty page.
    pub after: Option<String>,
    /// Maximum number of elements to return.
    pub limit: usize,
    /// Traversal order over insertion order.
    pub order: SortOrder,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            after: None,
            limit: 50,
            order: SortOrder::Asc,
        }
    }
}

/// One page of an ordered collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub has_more: bool,
    /// Cursor for the next page: the id of the last element returned.
    /// Absent when the page is empty or nothing remains.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

impl<T> Page<T> {
    /// An empty page with no continuation.
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            has_more: false,
            after: None,
        }
    }
}

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Referenced thread, item, or attachment is absent.
    #[error("{0} not found")]
    NotFound(String),
}

impl StoreError {
    /// NotFound for a thread id.
    pub fn thread_not_found(thread_id: &str) -> Self {
        Self::NotFound(format!("thread {thread_id}"))
    }

    /// NotFound for an item id within a thread.
    pub fn item_not_found(thread_id: &str, item_id: &str) -> Self {
        Self::NotFound(format!("item {item_id} in thread {thread_id}"))
    }

    /// NotFound for an attachment id.
    pub fn attachment_not_found(attachment_id: &str) -> Self {
        Self::NotFound(format!("attachment {attachment_id}"))
    }
}

/// Paginate an insertion-ordered slice by cursor.
///
/// The collection is materialized in the requested order. If `after` is
/// set, it is linearly scanned for the matching id, keeping only
/// elements strictly after it. An `after` id that matches nothing leaves
/// the filtered list empty; that is the scan's behavior, not an error.
/// The result cursor is the id of the last element returned, present
/// only when more elements remain.
pub fn paginate_by_cursor<T, F>(elements: &[T], query: &PageQuery, id_of: F) -> Page<T>
where
    T: Clone,
    F: Fn(&T) -> &str,
{
    let mut ordered: Vec<&T> = elements.iter().collect();
    if query.order == SortOrder::Desc {
        ordered.reverse();
    }

    let filtered: Vec<&T> = match &query.after {
        Some(after) => {
            let mut found = false;
            let mut kept = Vec::new();
            for element in ordered {
                if found {
                    kept.push(element);
                }
                if id_of(element) == after {
                    found = true;
                }
            }
            kept
        }
        None => ordered,
    };

    let has_more = filtered.len() > query.limit;
    let data: Vec<T> = filtered
        .into_iter()
        .take(query.limit)
        .cloned()
        .collect();
    let after = if has_more {
        data.last().map(|element| id_of(element).to_string())
    } else {
        None
    };

    Page {
        data,
        has_more,
        after,
    }
}
