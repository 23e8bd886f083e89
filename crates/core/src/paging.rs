use std::num::NonZeroUsize;
use std::ops::Range;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PagingError {
    #[error("page size must be > 0")]
    ZeroPageSize,
}

/// Fixed-size, 1-indexed pages over a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page_size: NonZeroUsize,
}

impl Paginator {
    pub const DEFAULT_PAGE_SIZE: usize = 50;

    /// # Errors
    ///
    /// Returns `PagingError::ZeroPageSize` if `page_size` is zero.
    pub fn new(page_size: usize) -> Result<Self, PagingError> {
        NonZeroUsize::new(page_size)
            .map(|page_size| Self { page_size })
            .ok_or(PagingError::ZeroPageSize)
    }

    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size.get()
    }

    /// Page holding the item at zero-based `index`.
    #[must_use]
    pub fn page_of(&self, index: usize) -> usize {
        index / self.page_size() + 1
    }

    /// Number of pages for `len` items. Never zero.
    #[must_use]
    pub fn page_count(&self, len: usize) -> usize {
        len.div_ceil(self.page_size()).max(1)
    }

    /// Clamp `page` into `[1, page_count(len)]`.
    #[must_use]
    pub fn clamp(&self, page: usize, len: usize) -> usize {
        page.clamp(1, self.page_count(len))
    }

    /// Zero-based index of the first item on `page`.
    #[must_use]
    pub fn offset(&self, page: usize) -> usize {
        page.saturating_sub(1).saturating_mul(self.page_size())
    }

    /// Half-open item range of `page`, clamped to `len`.
    #[must_use]
    pub fn range(&self, page: usize, len: usize) -> Range<usize> {
        let start = self.offset(page).min(len);
        let end = start.saturating_add(self.page_size()).min(len);
        start..end
    }

    #[must_use]
    pub fn slice<'a, T>(&self, items: &'a [T], page: usize) -> &'a [T] {
        &items[self.range(page, items.len())]
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self {
            page_size: NonZeroUsize::new(Self::DEFAULT_PAGE_SIZE).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_page_size_is_rejected() {
        assert_eq!(Paginator::new(0).unwrap_err(), PagingError::ZeroPageSize);
    }

    #[test]
    fn page_count_is_never_zero() {
        let paginator = Paginator::new(50).unwrap();
        assert_eq!(paginator.page_count(0), 1);
        assert_eq!(paginator.page_count(1), 1);
        assert_eq!(paginator.page_count(50), 1);
        assert_eq!(paginator.page_count(51), 2);
    }

    #[test]
    fn bank_of_120_with_pages_of_50() {
        let paginator = Paginator::new(50).unwrap();
        assert_eq!(paginator.page_count(120), 3);
        assert_eq!(paginator.page_of(119), 3);
        assert_eq!(paginator.range(3, 120), 100..120);
    }

    #[test]
    fn page_of_slice_contains_the_index() {
        let items: Vec<usize> = (0..137).collect();
        for size in [1, 7, 50, 200] {
            let paginator = Paginator::new(size).unwrap();
            for index in 0..items.len() {
                let page = paginator.page_of(index);
                assert!(
                    paginator.slice(&items, page).contains(&index),
                    "size={size} index={index}"
                );
            }
        }
    }

    #[test]
    fn out_of_range_pages_are_empty_or_clamped() {
        let paginator = Paginator::new(10).unwrap();
        let items = [1, 2, 3];
        assert!(paginator.slice(&items, 5).is_empty());
        assert!(paginator.slice(&items, 0).len() == 3);
        assert_eq!(paginator.clamp(0, 3), 1);
        assert_eq!(paginator.clamp(9, 25), 3);
    }
}
