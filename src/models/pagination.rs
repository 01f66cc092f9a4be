//! Pagination window and derived page metadata

use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: usize = 200;
pub const MAX_LIMIT: usize = 500;

/// Raw paging input as received from a caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

impl PageRequest {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }
}

/// Validated window: `limit` in `1..=500`, `offset >= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationWindow {
    pub limit: usize,
    pub offset: usize,
}

impl Default for PaginationWindow {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl From<PageRequest> for PaginationWindow {
    /// Out-of-range values are clamped rather than rejected.
    fn from(request: PageRequest) -> Self {
        let limit = request
            .limit
            .map_or(DEFAULT_LIMIT, |l| l.clamp(1, MAX_LIMIT as i64) as usize);
        let offset = request.offset.map_or(0, |o| o.max(0) as usize);
        Self { limit, offset }
    }
}

impl PaginationWindow {
    /// Cuts one page out of `items` and describes it.
    pub fn paginate<T>(&self, items: Vec<T>) -> (Vec<T>, PaginationInfo) {
        let total = items.len();
        let page: Vec<T> = items
            .into_iter()
            .skip(self.offset)
            .take(self.limit)
            .collect();
        (page, PaginationInfo::new(*self, total))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub limit: usize,
    pub offset: usize,
    pub total: usize,
    pub has_more: bool,
    pub page: usize,
    pub total_pages: usize,
}

impl PaginationInfo {
    pub fn new(window: PaginationWindow, total: usize) -> Self {
        let PaginationWindow { limit, offset } = window;
        Self {
            limit,
            offset,
            total,
            has_more: offset + limit < total,
            page: offset / limit + 1,
            total_pages: total.div_ceil(limit),
        }
    }
}
