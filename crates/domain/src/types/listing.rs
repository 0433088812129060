//! List response shapes
//!
//! Collection endpoints answer either with a bare JSON array or with a
//! paginated envelope. `ListPayload` captures both and `normalize` turns
//! either into a `Page`.

use serde::{Deserialize, Serialize};

/// Pagination metadata nested under `meta`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Paginated envelope `{ data, total?, page?, limit?, meta? }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

/// Every shape a collection endpoint may answer with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListPayload<T> {
    RawList(Vec<T>),
    Envelope(Envelope<T>),
}

/// Normalized page of results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> ListPayload<T> {
    /// Collapse either shape into a `Page`.
    ///
    /// A raw list is a single page holding everything. Envelope fields win
    /// over `meta`; missing values fall back to the single-page reading.
    pub fn normalize(self) -> Page<T> {
        match self {
            Self::RawList(items) => {
                let count = items.len();
                Page { items, total: count as u64, page: 1, limit: saturating_u32(count) }
            }
            Self::Envelope(Envelope { data, total, page, limit, meta }) => {
                let meta = meta.unwrap_or_default();
                let count = data.len();
                Page {
                    total: total.or(meta.total).unwrap_or(count as u64),
                    page: page.or(meta.page).unwrap_or(1),
                    limit: limit.or(meta.limit).unwrap_or_else(|| saturating_u32(count)),
                    items: data,
                }
            }
        }
    }
}

impl<T> Page<T> {
    /// Number of pages implied by `total` and `limit`.
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return u64::from(self.total > 0);
        }
        self.total.div_ceil(u64::from(self.limit))
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.total_pages()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
