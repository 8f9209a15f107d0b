use serde::Serialize;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

/// Envelope shared by every listing endpoint.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: i64,
    pub pages: u64,
}

/// Normalized page/limit pair. Page and limit below 1 fall back to defaults.
#[derive(Debug, Clone, Copy)]
pub struct PageParams {
    pub page: i64,
    pub limit: i64,
}

impl PageParams {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(DEFAULT_PAGE);
        let limit = limit.filter(|l| *l >= 1).unwrap_or(DEFAULT_LIMIT);
        Self { page, limit }
    }

    // Saturating: page and limit come straight from the query string, so
    // extreme values must clamp instead of overflowing.
    pub fn skip(&self) -> u64 {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.limit)
            .max(0) as u64
    }

    /// pages = ceil(total / limit)
    pub fn pages(&self, total: u64) -> u64 {
        let limit = self.limit as u64;
        (total + limit - 1) / limit
    }
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: u64, params: PageParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            pages: params.pages(total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_missing_or_invalid() {
        let p = PageParams::new(None, None);
        assert_eq!((p.page, p.limit), (1, 10));

        let p = PageParams::new(Some(0), Some(-3));
        assert_eq!((p.page, p.limit), (1, 10));
    }

    #[test]
    fn skip_and_pages_math() {
        let p = PageParams::new(Some(2), Some(5));
        assert_eq!(p.skip(), 5);
        // 15 records, limit 5 -> 3 pages
        assert_eq!(p.pages(15), 3);
        // 16 records, limit 5 -> 4 pages
        assert_eq!(p.pages(16), 4);
        // empty collection -> 0 pages
        assert_eq!(p.pages(0), 0);
    }

    #[test]
    fn skip_clamps_instead_of_overflowing() {
        let p = PageParams::new(Some(i64::MAX / 2), Some(10));
        assert_eq!(p.skip(), i64::MAX as u64);

        let p = PageParams::new(Some(i64::MAX), Some(i64::MAX));
        assert_eq!(p.skip(), i64::MAX as u64);

        // Large but non-overflowing pages still compute exactly.
        let p = PageParams::new(Some(1_000_000), Some(100));
        assert_eq!(p.skip(), 99_999_900);
    }
}
