//! Table paging and chart windowing.

use serde::Serialize;
use submittal_model::CanonicalDate;

use crate::aggregate::SeriesPoint;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually returned, after clamping.
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Convert the items, keeping the page bookkeeping.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

/// Slice `items` into 1-based pages.
///
/// Out-of-range page numbers clamp to the first or last page; a zero page size yields an
/// empty page that still reports the item total.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let total_items = items.len();
    if page_size == 0 {
        return Page {
            items: Vec::new(),
            page: 1,
            page_size,
            total_items,
            total_pages: 0,
        };
    }

    let total_pages = total_items.div_ceil(page_size);
    let page = page.clamp(1, total_pages.max(1));
    let start = (page - 1) * page_size;
    let end = (start + page_size).min(total_items);
    Page {
        items: items.get(start..end).map(<[T]>::to_vec).unwrap_or_default(),
        page,
        page_size,
        total_items,
        total_pages,
    }
}

/// The points of an ascending series with `from <= date <= to`.
pub fn window(series: &[SeriesPoint], from: CanonicalDate, to: CanonicalDate) -> &[SeriesPoint] {
    if from > to {
        return &[];
    }
    let start = series.partition_point(|p| p.date < from);
    let end = series.partition_point(|p| p.date <= to);
    &series[start..end.max(start)]
}
