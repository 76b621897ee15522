use serde::{Deserialize, Serialize};

const DEFAULT_PER_PAGE: usize = 10;
const MAX_PER_PAGE: usize = 50;
const MAX_PAGE: usize = 100_000;

/// Requested page slice, 1-based. Out-of-range values are clamped
/// rather than rejected, matching the tolerant pagination the external
/// metadata API uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub per_page: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    pub fn new(page: Option<usize>, per_page: Option<usize>) -> Self {
        // Page comes straight off the query string; cap it so the offset
        // arithmetic stays in range.
        let page = page.unwrap_or(1).clamp(1, MAX_PAGE);
        let per_page = per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        Self { page, per_page }
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    pub fn limit(&self) -> usize {
        self.per_page
    }
}

/// Pagination envelope returned alongside any paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PageInfo {
    pub fn new(request: PageRequest, total_items: usize) -> Self {
        let total_pages = total_items.div_ceil(request.per_page).max(1);
        Self {
            current_page: request.page,
            total_pages,
            total_items,
            has_next_page: request.page < total_pages,
            has_prev_page: request.page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_clamping() {
        let req = PageRequest::new(None, None);
        assert_eq!(req, PageRequest { page: 1, per_page: 10 });

        let req = PageRequest::new(Some(0), Some(0));
        assert_eq!(req, PageRequest { page: 1, per_page: 1 });

        let req = PageRequest::new(Some(3), Some(500));
        assert_eq!(req, PageRequest { page: 3, per_page: 50 });
    }

    #[test]
    fn absurd_page_is_clamped_and_offset_stays_in_range() {
        let req = PageRequest::new(Some(usize::MAX), Some(50));
        assert_eq!(req.page, 100_000);
        assert_eq!(req.offset(), 99_999 * 50);

        // Even a hand-built request cannot overflow the offset math.
        let req = PageRequest { page: usize::MAX, per_page: 50 };
        assert_eq!(req.offset(), usize::MAX);
    }

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(PageRequest::new(Some(1), Some(10)).offset(), 0);
        assert_eq!(PageRequest::new(Some(3), Some(10)).offset(), 20);
    }

    #[test]
    fn page_info_math() {
        let info = PageInfo::new(PageRequest::new(Some(2), Some(10)), 25);
        assert_eq!(info.total_pages, 3);
        assert!(info.has_next_page);
        assert!(info.has_prev_page);

        let last = PageInfo::new(PageRequest::new(Some(3), Some(10)), 25);
        assert!(!last.has_next_page);
        assert!(last.has_prev_page);
    }

    #[test]
    fn empty_result_still_has_one_page() {
        let info = PageInfo::new(PageRequest::default(), 0);
        assert_eq!(info.total_pages, 1);
        assert!(!info.has_next_page);
        assert!(!info.has_prev_page);
    }

    #[test]
    fn envelope_serializes_camel_case() {
        let info = PageInfo::new(PageRequest::default(), 5);
        let v = serde_json::to_value(info).unwrap();
        assert!(v.get("currentPage").is_some());
        assert!(v.get("hasNextPage").is_some());
    }
}
