use chrono::{DateTime, Utc};

/// Page size used when the requested size is out of range.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page size a listing may request.
pub const MAX_PAGE_SIZE: u32 = 30;

/// A page window over a listing.
///
/// Only constructible through [`Pagination::clamped`], so stores never see
/// an out-of-range page or size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    page_size: u32,
}

impl Pagination {
    /// Clamps raw caller input: a page below 1 becomes 1, a size outside
    /// `1..=MAX_PAGE_SIZE` becomes [`DEFAULT_PAGE_SIZE`].
    pub fn clamped(page: i64, page_size: i64) -> Self {
        let page = u32::try_from(page).ok().filter(|p| *p >= 1).unwrap_or(1);
        let page_size = u32::try_from(page_size)
            .ok()
            .filter(|s| (1..=MAX_PAGE_SIZE).contains(s))
            .unwrap_or(DEFAULT_PAGE_SIZE);
        Self { page, page_size }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Filter for listing pickup points.
///
/// When either bound is set, only pickup points with at least one reception
/// inside `[from, to]` match. With no bounds every pickup point matches.
#[derive(Debug, Clone, Default)]
pub struct PvzQuery {
    /// Earliest reception timestamp (inclusive).
    pub from: Option<DateTime<Utc>>,

    /// Latest reception timestamp (inclusive).
    pub to: Option<DateTime<Utc>>,

    pub pagination: Pagination,
}

impl PvzQuery {
    /// Creates an unfiltered query for the first page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the lower reception bound.
    pub fn from(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    /// Sets the upper reception bound.
    pub fn to(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    /// Sets both bounds, either of which may be absent.
    pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn paginate(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    /// Returns true if any reception bound is set.
    pub fn has_time_filter(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    /// Returns true if `timestamp` lies within the bounds.
    pub fn covers(&self, timestamp: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| timestamp >= from) && self.to.is_none_or(|to| timestamp <= to)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn clamps_page_below_one() {
        assert_eq!(Pagination::clamped(0, 10).page(), 1);
        assert_eq!(Pagination::clamped(-4, 10).page(), 1);
        assert_eq!(Pagination::clamped(3, 10).page(), 3);
    }

    #[test]
    fn clamps_page_size_outside_range_to_default() {
        assert_eq!(Pagination::clamped(1, 0).page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(Pagination::clamped(1, 31).page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(Pagination::clamped(1, -1).page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(Pagination::clamped(1, 30).page_size(), 30);
        assert_eq!(Pagination::clamped(1, 1).page_size(), 1);
    }

    #[test]
    fn offset_skips_previous_pages() {
        assert_eq!(Pagination::clamped(1, 10).offset(), 0);
        assert_eq!(Pagination::clamped(3, 5).offset(), 10);
    }

    #[test]
    fn covers_respects_inclusive_bounds() {
        let now = Utc::now();
        let query = PvzQuery::new()
            .from(now - Duration::hours(1))
            .to(now + Duration::hours(1));

        assert!(query.covers(now));
        assert!(query.covers(now - Duration::hours(1)));
        assert!(!query.covers(now + Duration::hours(2)));
    }

    #[test]
    fn missing_bound_is_unconstrained() {
        let now = Utc::now();
        let query = PvzQuery::new().from(now);

        assert!(query.has_time_filter());
        assert!(query.covers(now + Duration::days(365)));
        assert!(!query.covers(now - Duration::seconds(1)));
        assert!(!PvzQuery::new().has_time_filter());
    }
}
