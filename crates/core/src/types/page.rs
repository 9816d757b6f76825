//! Offset pagination for record listings.

/// Number of records shown per listing page.
pub const PAGE_SIZE: u32 = 5;

/// A 1-based page number.
///
/// Bad input never fails: absent, malformed, or non-positive values all
/// become page 1. Positive values beyond `u32::MAX` saturate, so they still
/// land past the last page.
///
/// ```
/// use registry_core::PageNumber;
///
/// assert_eq!(PageNumber::from_query(Some("3")).get(), 3);
/// assert_eq!(PageNumber::from_query(Some("-2")).get(), 1);
/// assert_eq!(PageNumber::from_query(Some("abc")).get(), 1);
/// assert_eq!(PageNumber::from_query(None).get(), 1);
/// assert_eq!(PageNumber::from_query(Some("5000000000")).get(), u32::MAX);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageNumber(u32);

impl PageNumber {
    /// The first page.
    pub const FIRST: Self = Self(1);

    /// Build a page number, clamping anything below 1 to 1.
    #[must_use]
    pub const fn new(page: u32) -> Self {
        if page == 0 { Self::FIRST } else { Self(page) }
    }

    /// Interpret a raw `page` query parameter.
    #[must_use]
    pub fn from_query(raw: Option<&str>) -> Self {
        let Some(value) = raw.map(str::trim) else {
            return Self::FIRST;
        };

        match value.parse::<i64>() {
            Ok(page) if page < 1 => Self::FIRST,
            Ok(page) => Self(u32::try_from(page).unwrap_or(u32::MAX)),
            // Too many digits for i64 but still a positive integer.
            Err(_) if is_positive_integer(value) => Self(u32::MAX),
            Err(_) => Self::FIRST,
        }
    }

    /// Returns the page number.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Row offset of the first record on this page.
    #[must_use]
    pub const fn offset(self, page_size: u32) -> u64 {
        (self.0 as u64 - 1) * page_size as u64
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

fn is_positive_integer(value: &str) -> bool {
    let digits = value.strip_prefix('+').unwrap_or(value);
    !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && digits.bytes().any(|b| b != b'0')
}

/// Number of pages needed for `count` records: `ceil(count / page_size)`.
///
/// Zero records means zero pages.
#[must_use]
pub const fn total_pages(count: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    count.div_ceil(page_size as u64)
}

/// Pagination metadata for a rendered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// The requested page (may be past the last page).
    pub page: PageNumber,
    /// Total number of pages.
    pub total_pages: u64,
    /// Total number of records.
    pub total_items: u64,
}

impl Pagination {
    /// Compute pagination for `total_items` records at [`PAGE_SIZE`].
    #[must_use]
    pub const fn new(page: PageNumber, total_items: u64) -> Self {
        Self {
            page,
            total_pages: total_pages(total_items, PAGE_SIZE),
            total_items,
        }
    }

    /// Whether a previous page exists.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page.get() > 1
    }

    /// Whether a following page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        (self.page.get() as u64) < self.total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_query_clamps_bad_input() {
        for raw in [None, Some(""), Some("0"), Some("-1"), Some("x"), Some("1.5")] {
            assert_eq!(PageNumber::from_query(raw), PageNumber::FIRST, "{raw:?}");
        }
    }

    #[test]
    fn test_from_query_huge_value_saturates() {
        for raw in ["5000000000", "99999999999999999999999", "+4294967296"] {
            assert_eq!(PageNumber::from_query(Some(raw)).get(), u32::MAX, "{raw}");
        }
        assert_eq!(
            PageNumber::from_query(Some("-99999999999999999999999")),
            PageNumber::FIRST
        );
    }

    #[test]
    fn test_huge_page_is_past_the_end() {
        let page = PageNumber::from_query(Some("5000000000"));
        assert_ne!(page, PageNumber::FIRST);
        assert!(page.offset(PAGE_SIZE) > 1_000_000);

        let pagination = Pagination::new(page, 12);
        assert!(!pagination.has_next());
        assert!(pagination.has_previous());
    }

    #[test]
    fn test_from_query_valid() {
        assert_eq!(PageNumber::from_query(Some(" 4 ")).get(), 4);
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageNumber::new(1).offset(PAGE_SIZE), 0);
        assert_eq!(PageNumber::new(3).offset(PAGE_SIZE), 10);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, PAGE_SIZE), 0);
        assert_eq!(total_pages(1, PAGE_SIZE), 1);
        assert_eq!(total_pages(5, PAGE_SIZE), 1);
        assert_eq!(total_pages(6, PAGE_SIZE), 2);
        assert_eq!(total_pages(11, PAGE_SIZE), 3);
    }

    #[test]
    fn test_pagination_navigation() {
        let pagination = Pagination::new(PageNumber::new(2), 11);
        assert_eq!(pagination.total_pages, 3);
        assert!(pagination.has_previous());
        assert!(pagination.has_next());

        let last = Pagination::new(PageNumber::new(3), 11);
        assert!(!last.has_next());

        let empty = Pagination::new(PageNumber::FIRST, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_previous());
        assert!(!empty.has_next());
    }
}
