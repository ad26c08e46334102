//! Fixed-size pagination over ordered feeds.

use serde::Serialize;

/// Posts per page when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: u64,
    pub per_page: u64,
}

impl PageRequest {
    /// Missing or zero page numbers mean the first page; a zero page size
    /// falls back to [`DEFAULT_PAGE_SIZE`].
    pub fn new(number: Option<u64>, per_page: u64) -> Self {
        let per_page = if per_page == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            per_page
        };
        Self {
            number: number.filter(|n| *n > 0).unwrap_or(1),
            per_page,
        }
    }

    /// Number of items preceding this page.
    pub fn offset(&self) -> u64 {
        (self.number - 1).saturating_mul(self.per_page)
    }

    /// Cut this page out of an already ordered list.
    pub fn slice<T>(&self, items: Vec<T>) -> Page<T> {
        let total_items = items.len() as u64;
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let per_page = usize::try_from(self.per_page).unwrap_or(usize::MAX);
        let items = items.into_iter().skip(offset).take(per_page).collect();
        Page::new(items, *self, total_items)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, DEFAULT_PAGE_SIZE)
    }
}

/// One page of an ordered feed.
///
/// A page past the end has no items; it is never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub per_page: u64,
    pub total_items: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        Self {
            items,
            number: request.number,
            per_page: request.per_page,
            total_items,
        }
    }

    /// Always at least 1, so an empty feed still has a first page.
    pub fn total_pages(&self) -> u64 {
        self.total_items.div_ceil(self.per_page).max(1)
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            per_page: self.per_page,
            total_items: self.total_items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected_len(n: u64, s: u64, k: u64) -> usize {
        let remaining = n.saturating_sub((k - 1) * s);
        remaining.min(s) as usize
    }

    #[test]
    fn test_page_sizes_follow_formula() {
        for n in [0u64, 1, 9, 10, 11, 13, 20, 25] {
            let items: Vec<u64> = (0..n).collect();
            let last = n.div_ceil(10) + 1;
            for k in 1..=last {
                let page = PageRequest::new(Some(k), 10).slice(items.clone());
                assert_eq!(page.len(), expected_len(n, 10, k), "n={n} k={k}");
                assert_eq!(page.total_items, n);
            }
        }
    }

    #[test]
    fn test_thirteen_items_split_ten_and_three() {
        let items: Vec<u32> = (0..13).collect();

        let first = PageRequest::new(Some(1), 10).slice(items.clone());
        assert_eq!(first.items, (0..10).collect::<Vec<_>>());
        assert!(first.has_next());
        assert!(!first.has_previous());

        let second = PageRequest::new(Some(2), 10).slice(items.clone());
        assert_eq!(second.items, vec![10, 11, 12]);
        assert_eq!(second.total_pages(), 2);
        assert!(!second.has_next());
        assert!(second.has_previous());

        let third = PageRequest::new(Some(3), 10).slice(items);
        assert!(third.is_empty());
    }

    #[test]
    fn test_missing_or_zero_page_means_first() {
        assert_eq!(PageRequest::new(None, 10).number, 1);
        assert_eq!(PageRequest::new(Some(0), 10).number, 1);
        assert_eq!(PageRequest::new(Some(1), 0).per_page, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_huge_page_number_is_empty() {
        let page = PageRequest::new(Some(u64::MAX), 10).slice(vec![1, 2, 3]);
        assert!(page.is_empty());
        assert_eq!(page.total_pages(), 1);
    }

    #[test]
    fn test_empty_feed_has_one_page() {
        let page: Page<u8> = PageRequest::default().slice(Vec::new());
        assert_eq!(page.total_pages(), 1);
        assert!(!page.has_next());
    }
}
