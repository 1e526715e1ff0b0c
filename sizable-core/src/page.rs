//! Page windows and cursor-bounded page materialization.
//!
//! A [`PageWindow`] names a contiguous slice of an ordered result set by page size and
//! zero-based page index. [`read_page`] walks a cursor to the start of that slice and decodes
//! at most one page worth of entities.
//!
//! Asking for a window past the end of the results is not an error; the page simply comes
//! back shorter, possibly empty.

use tracing::trace;

use crate::{
    driver::DocumentCursor,
    entity::{Entity, EntityExt},
    error::AccessorResult,
};

/// A `(size, index)` pair selecting positions `[index * size, index * size + size)`.
///
/// # Example
///
/// ```ignore
/// use sizable::page::PageWindow;
///
/// let window = PageWindow::new(6, 1);
/// assert_eq!(window.offset(), 6);
/// assert_eq!(window.next(), PageWindow::new(6, 2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Number of entities per page.
    pub size: usize,
    /// Zero-based page index.
    pub index: usize,
}

impl PageWindow {
    /// Creates a window of `size` entities at page `index`.
    pub fn new(size: usize, index: usize) -> Self {
        Self { size, index }
    }

    /// The first page of `size` entities.
    pub fn first(size: usize) -> Self {
        Self::new(size, 0)
    }

    /// Creates a new builder for constructing a window.
    pub fn builder() -> PageWindowBuilder {
        PageWindowBuilder::new()
    }

    /// Number of positions skipped before this page starts.
    pub fn offset(&self) -> usize {
        self.index.saturating_mul(self.size)
    }

    /// The window immediately after this one.
    pub fn next(&self) -> Self {
        Self::new(self.size, self.index.saturating_add(1))
    }
}

impl Default for PageWindow {
    fn default() -> Self {
        Self { size: 10, index: 0 }
    }
}

/// Builder for [`PageWindow`]. Unset values default to `size = 10`, `index = 0`.
#[derive(Debug, Default)]
pub struct PageWindowBuilder {
    size: Option<usize>,
    index: Option<usize>,
}

impl PageWindowBuilder {
    pub fn new() -> Self {
        Self { size: None, index: None }
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn build(self) -> PageWindow {
        let defaults = PageWindow::default();

        PageWindow {
            size: self.size.unwrap_or(defaults.size),
            index: self.index.unwrap_or(defaults.index),
        }
    }
}

/// Reads one page of entities from `cursor`, appending them to `out`.
///
/// Skips `window.offset()` positions without decoding them, then decodes up to
/// `window.size` entities. Running out of results at either stage ends the page early
/// without an error. The cursor is consumed and released on every return path.
///
/// # Errors
///
/// Returns [`AccessorError::Decode`](crate::error::AccessorError::Decode) if a document in
/// the window does not decode, or the driver's error if advancing fails. Entities decoded
/// before the failure stay in `out`.
pub async fn read_page<T, C>(mut cursor: C, window: PageWindow, out: &mut Vec<T>) -> AccessorResult<()>
where
    T: Entity,
    C: DocumentCursor,
{
    if window.size == 0 {
        return Ok(());
    }

    for skipped in 0..window.offset() {
        if !cursor.advance().await? {
            trace!(skipped, "cursor exhausted before page start");
            return Ok(());
        }
    }

    for read in 0..window.size {
        if !cursor.advance().await? {
            trace!(read, "cursor exhausted inside page");
            return Ok(());
        }
        out.push(T::from_document(cursor.current()?)?);
    }

    Ok(())
}

/// Decodes every remaining document of `cursor`, appending them to `out`.
///
/// Entities decoded before a failure stay in `out`.
pub async fn drain<T, C>(mut cursor: C, out: &mut Vec<T>) -> AccessorResult<()>
where
    T: Entity,
    C: DocumentCursor,
{
    while cursor.advance().await? {
        out.push(T::from_document(cursor.current()?)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use bson::{Document, doc};
    use serde::{Deserialize, Serialize};
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::error::AccessorError;

    #[derive(Debug, Serialize, Deserialize)]
    struct Thing {
        number: i32,
    }

    impl Entity for Thing {
        fn collection_name() -> &'static str {
            "things"
        }
    }

    /// Cursor over a fixed list that counts how many documents were decoded and whether
    /// it has been released.
    struct ListCursor {
        documents: Vec<Document>,
        position: Option<usize>,
        released: Arc<AtomicUsize>,
    }

    impl ListCursor {
        fn new(documents: Vec<Document>, released: Arc<AtomicUsize>) -> Self {
            Self { documents, position: None, released }
        }

        fn numbered(count: i32, released: Arc<AtomicUsize>) -> Self {
            Self::new((1..=count).map(|number| doc! { "number": number }).collect(), released)
        }
    }

    impl Drop for ListCursor {
        fn drop(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl DocumentCursor for ListCursor {
        async fn advance(&mut self) -> AccessorResult<bool> {
            let next = self.position.map_or(0, |position| position + 1);
            self.position = Some(next.min(self.documents.len()));
            Ok(next < self.documents.len())
        }

        fn current(&self) -> AccessorResult<Document> {
            self.position
                .and_then(|position| self.documents.get(position))
                .cloned()
                .ok_or_else(|| AccessorError::Query("cursor is not positioned on a document".into()))
        }
    }

    fn numbers(things: &[Thing]) -> Vec<i32> {
        things.iter().map(|thing| thing.number).collect()
    }

    async fn page(count: i32, window: PageWindow) -> Vec<i32> {
        let released = Arc::new(AtomicUsize::new(0));
        let mut out = Vec::new();

        read_page::<Thing, _>(ListCursor::numbered(count, released.clone()), window, &mut out)
            .await
            .unwrap();

        assert_eq!(released.load(Ordering::SeqCst), 1);
        numbers(&out)
    }

    #[test]
    fn window_offset_and_next() {
        let window = PageWindow::new(6, 2);

        assert_eq!(window.offset(), 12);
        assert_eq!(window.next(), PageWindow::new(6, 3));
        assert_eq!(PageWindow::first(4).offset(), 0);
        assert_eq!(PageWindow::new(usize::MAX, 2).offset(), usize::MAX);
    }

    #[test]
    fn builder_uses_defaults() {
        assert_eq!(PageWindow::builder().build(), PageWindow::new(10, 0));
        assert_eq!(PageWindow::builder().with_index(3).build(), PageWindow::new(10, 3));
        assert_eq!(PageWindow::builder().with_size(2).build(), PageWindow::new(2, 0));
    }

    #[tokio::test]
    async fn nine_things_in_pages_of_six() {
        assert_eq!(page(9, PageWindow::new(6, 0)).await, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(page(9, PageWindow::new(6, 1)).await, vec![7, 8, 9]);
        assert_eq!(page(9, PageWindow::new(6, 2)).await, Vec::<i32>::new());
    }

    #[tokio::test]
    async fn page_sizes_follow_the_counting_rule() {
        for total in 0..8 {
            for size in 1..5 {
                let mut rebuilt = Vec::new();
                for index in 0..6 {
                    let items = page(total, PageWindow::new(size, index)).await;
                    let expected = (total as usize).saturating_sub(index * size).min(size);
                    assert_eq!(items.len(), expected, "total {total} size {size} index {index}");
                    rebuilt.extend(items);
                }
                assert_eq!(rebuilt, (1..=total).collect::<Vec<_>>());
            }
        }
    }

    #[tokio::test]
    async fn zero_size_page_is_empty() {
        assert!(page(5, PageWindow::new(0, 0)).await.is_empty());
        assert!(page(5, PageWindow::new(0, 3)).await.is_empty());
    }

    #[tokio::test]
    async fn decode_failure_keeps_partial_page_and_releases_cursor() {
        let released = Arc::new(AtomicUsize::new(0));
        let cursor = ListCursor::new(
            vec![
                doc! { "number": 1 },
                doc! { "number": 2 },
                doc! { "number": "three" },
                doc! { "number": 4 },
            ],
            released.clone(),
        );
        let mut out = Vec::new();

        let result = read_page::<Thing, _>(cursor, PageWindow::new(4, 0), &mut out).await;

        assert!(matches!(result, Err(AccessorError::Decode(_))));
        assert_eq!(numbers(&out), vec![1, 2]);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn skipped_documents_are_not_decoded() {
        let released = Arc::new(AtomicUsize::new(0));
        let cursor = ListCursor::new(
            vec![doc! { "number": "bad" }, doc! { "number": 2 }],
            released.clone(),
        );
        let mut out = Vec::new();

        read_page::<Thing, _>(cursor, PageWindow::new(1, 1), &mut out).await.unwrap();

        assert_eq!(numbers(&out), vec![2]);
    }

    #[tokio::test]
    async fn pages_append_to_existing_output() {
        let released = Arc::new(AtomicUsize::new(0));
        let mut out = vec![Thing { number: 100 }];

        read_page::<Thing, _>(ListCursor::numbered(3, released.clone()), PageWindow::first(2), &mut out)
            .await
            .unwrap();
        drain::<Thing, _>(ListCursor::numbered(1, released.clone()), &mut out)
            .await
            .unwrap();

        assert_eq!(numbers(&out), vec![100, 1, 2, 1]);
        assert_eq!(released.load(Ordering::SeqCst), 2);
    }
}
