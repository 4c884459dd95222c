//! Pager
//!
//! Slices a filtered collection into pages. Requested pages are clamped into
//! `[1, total_pages]`, so a stale or out-of-range cursor never shows a blank page.

/// One page of a collection
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub total_pages: usize,
    /// The page actually shown; callers store this back into their query
    pub clamped_page: usize,
    pub total_items: usize,
    pub page_size: usize,
}

impl<'a, T> Page<'a, T> {
    pub fn has_previous(&self) -> bool {
        self.clamped_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.clamped_page < self.total_pages
    }

    /// 1-based position of the first item on this page, 0 when empty
    pub fn first_index(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            (self.clamped_page - 1) * self.page_size + 1
        }
    }

    /// 1-based position of the last item on this page, 0 when empty
    pub fn last_index(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            self.first_index() + self.items.len() - 1
        }
    }
}

/// `max(1, ceil(len / page_size))`
pub fn total_pages(len: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    len.div_ceil(page_size).max(1)
}

/// Clamp any requested page, including zero or negative, into range
pub fn clamp_page(page: i64, total_pages: usize) -> usize {
    let total = i64::try_from(total_pages.max(1)).unwrap_or(i64::MAX);
    // within [1, total], which came from a usize
    page.clamp(1, total) as usize
}

pub fn paginate<T>(items: &[T], page: i64, page_size: usize) -> Page<'_, T> {
    let page_size = page_size.max(1);
    let total_pages = total_pages(items.len(), page_size);
    let clamped_page = clamp_page(page, total_pages);

    let start = (clamped_page - 1) * page_size;
    let end = (start + page_size).min(items.len());
    let slice = if start < items.len() { &items[start..end] } else { &items[0..0] };

    Page {
        items: slice,
        total_pages,
        clamped_page,
        total_items: items.len(),
        page_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_collection_has_one_page() {
        let items: Vec<u32> = Vec::new();
        let page = paginate(&items, 3, 10);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.clamped_page, 1);
        assert!(page.items.is_empty());
        assert_eq!((page.first_index(), page.last_index()), (0, 0));
    }

    #[test]
    fn test_last_partial_page() {
        let items: Vec<u32> = (1..=12).collect();
        let page = paginate(&items, 2, 10);
        assert_eq!(page.items, &[11, 12]);
        assert_eq!(page.total_pages, 2);
        assert!(page.has_previous());
        assert!(!page.has_next());
        assert_eq!((page.first_index(), page.last_index()), (11, 12));
    }

    #[test]
    fn test_out_of_range_pages_clamp() {
        let items: Vec<u32> = (1..=12).collect();
        assert_eq!(paginate(&items, 5, 10).clamped_page, 2);
        assert_eq!(paginate(&items, 0, 10).clamped_page, 1);
        assert_eq!(paginate(&items, -7, 10).items, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn test_shrinking_collection_clamps_to_last_page() {
        let mut items: Vec<u32> = (1..=21).collect();
        assert_eq!(paginate(&items, 3, 10).items, &[21]);
        items.pop();
        let page = paginate(&items, 3, 10);
        assert_eq!(page.clamped_page, 2);
        assert_eq!(page.items.len(), 10);
    }

    proptest! {
        #[test]
        fn prop_pages_cover_items_exactly_once(len in 0usize..200, page_size in 1usize..25) {
            let items: Vec<usize> = (0..len).collect();
            let total = paginate(&items, 1, page_size).total_pages;
            let mut seen = Vec::new();
            for p in 1..=total {
                seen.extend_from_slice(paginate(&items, p as i64, page_size).items);
            }
            prop_assert_eq!(seen, items);
        }

        #[test]
        fn prop_clamped_page_in_range(
            len in 0usize..200,
            page_size in 1usize..25,
            page in any::<i64>(),
        ) {
            let items: Vec<usize> = (0..len).collect();
            let result = paginate(&items, page, page_size);
            prop_assert!(result.clamped_page >= 1);
            prop_assert!(result.clamped_page <= result.total_pages);
            prop_assert_eq!(result.total_pages, std::cmp::max(1, len.div_ceil(page_size)));
        }
    }
}
