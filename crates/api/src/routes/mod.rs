//! HTTP route handlers.

pub mod auth;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;

use serde::Serialize;

/// One page of a listing.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub total_count: usize,
    pub page: u32,
    pub page_size: u32,
    pub data: Vec<T>,
}

impl<T> Page<T> {
    /// Slices `items` to the requested page; pages past the end are empty.
    pub fn from_items<U>(items: Vec<U>, page: u32, page_size: u32, map: impl Fn(U) -> T) -> Self {
        let total_count = items.len();
        let skip = (page.saturating_sub(1) as usize).saturating_mul(page_size as usize);
        let data = items
            .into_iter()
            .skip(skip)
            .take(page_size as usize)
            .map(map)
            .collect();
        Self {
            total_count,
            page,
            page_size,
            data,
        }
    }
}
