//! Page slicing over an ordered result set.

use std::fmt;

/// Allowed page sizes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ItemsPerPage {
    #[default]
    Ten,
    TwentyFive,
    Fifty,
    Hundred,
}

impl ItemsPerPage {
    pub const ALL: [ItemsPerPage; 4] = [
        ItemsPerPage::Ten,
        ItemsPerPage::TwentyFive,
        ItemsPerPage::Fifty,
        ItemsPerPage::Hundred,
    ];

    /// Rows per page as a count.
    pub fn get(self) -> usize {
        match self {
            ItemsPerPage::Ten => 10,
            ItemsPerPage::TwentyFive => 25,
            ItemsPerPage::Fifty => 50,
            ItemsPerPage::Hundred => 100,
        }
    }

    /// Map a raw number to a page size; anything else is rejected.
    pub fn from_count(n: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.get() == n)
    }

    /// Next size, wrapping from 100 back to 10.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for ItemsPerPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// One page of an ordered sequence.
#[derive(Debug, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub total_items: usize,
    pub total_pages: usize,
    /// 0-based index of the first item on this page.
    pub start_index: usize,
    /// 0-based exclusive end, clamped to `total_items`.
    pub end_index: usize,
}

impl<T> Page<'_, T> {
    /// 1-based inclusive range for display, `None` when the page is empty.
    pub fn display_range(&self) -> Option<(usize, usize)> {
        if self.items.is_empty() {
            None
        } else {
            Some((self.start_index + 1, self.end_index))
        }
    }
}

/// Number of pages needed for `total_items`; never less than 1.
pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    let size = page_size.max(1);
    total_items.div_ceil(size).max(1)
}

/// Slice page `page_number` (1-based) of `items`.
///
/// A page number outside `[1, total_pages]` yields an empty page rather than
/// an error.
pub fn paginate<T>(items: &[T], page_size: usize, page_number: usize) -> Page<'_, T> {
    let size = page_size.max(1);
    let total_items = items.len();
    let start_index = page_number.saturating_sub(1).saturating_mul(size);
    let end_index = start_index.saturating_add(size).min(total_items);
    let slice = if page_number == 0 || start_index >= total_items {
        &items[0..0]
    } else {
        &items[start_index..end_index]
    };
    Page {
        items: slice,
        total_items,
        total_pages: total_pages(total_items, size),
        start_index,
        end_index,
    }
}
