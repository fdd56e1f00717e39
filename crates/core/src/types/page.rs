//! Paginated search results.

use serde::{Deserialize, Deserializer, Serialize};

/// Page position and totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    /// Zero-based page index.
    pub number: u32,
    /// Requested page size.
    pub size: u32,
    /// Matching records across all pages.
    pub total_elements: u64,
    /// Number of pages.
    pub total_pages: u32,
}

impl PageMetadata {
    /// Whether a page follows this one.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.number.saturating_add(1) < self.total_pages
    }
}

/// One page of results plus its metadata.
///
/// Decodes both the flat Spring `Page` shape (`totalElements` next to
/// `content`) and the nested shape (`{"content": [..], "page": {..}}`).
/// Always serializes the nested shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: PageMetadata,
}

impl<T> Page<T> {
    /// Number of records on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Whether this page holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPage<T> {
    content: Vec<T>,
    page: Option<PageMetadata>,
    number: Option<u32>,
    size: Option<u32>,
    total_elements: Option<u64>,
    total_pages: Option<u32>,
}

impl<'de, T> Deserialize<'de> for Page<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawPage::<T>::deserialize(deserializer)?;
        let page = raw.page.unwrap_or_else(|| {
            let len = raw.content.len();
            PageMetadata {
                number: raw.number.unwrap_or(0),
                size: raw
                    .size
                    .unwrap_or_else(|| u32::try_from(len).unwrap_or(u32::MAX)),
                total_elements: raw
                    .total_elements
                    .unwrap_or_else(|| u64::try_from(len).unwrap_or(u64::MAX)),
                total_pages: raw.total_pages.unwrap_or(u32::from(len > 0)),
            }
        });
        Ok(Self {
            content: raw.content,
            page,
        })
    }
}
