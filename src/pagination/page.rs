use serde::Serialize;
use thiserror::Error;
use url::form_urlencoded;

use crate::pagination::cursor::{decode_cursor, encode_cursor, CursorDecodeError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    #[error("pageSize is required")]
    MissingPageSize,

    #[error("pageSize must be between 1 and {max}, got {requested}")]
    PageSizeOutOfRange { requested: i64, max: usize },

    #[error("pageOffset must be 1 or greater, got {0}")]
    PageOffsetOutOfRange(i64),

    #[error("requested position is beyond the addressable range")]
    OffsetOverflow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// 1-based page number of the returned slice
    pub page_offset: usize,
    pub page_size: usize,
    /// Number of items on this page, not the size of the collection
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub href: String,
    pub rel: String,
}

impl Link {
    pub fn next(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            rel: "next".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
    pub links: Vec<Link>,
}

/// Where a paged read starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    /// First page of the collection
    Initial,
    /// Continuation from a previous page.
    ///
    /// When `page_offset` is supplied it wins: the start index is
    /// `(page_offset - 1) * page_size` and the token's value is ignored.
    /// The token is still decoded so a malformed one is still rejected.
    Next {
        token: Option<String>,
        page_offset: Option<i64>,
    },
}

/// Raw paging parameters as they arrive from the query string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page_size: Option<i64>,
    pub cursor: PageCursor,
}

/// Paging parameters after validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePlan {
    pub start: usize,
    pub page_size: usize,
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Page(#[from] PaginationError),

    #[error(transparent)]
    Cursor(#[from] CursorDecodeError),
}

/// Enforce `0 < page_size <= max`
pub fn validate_page_size(requested: Option<i64>, max: usize) -> Result<usize, PaginationError> {
    let requested = requested.ok_or(PaginationError::MissingPageSize)?;
    match usize::try_from(requested) {
        Ok(size) if size > 0 && size <= max => Ok(size),
        _ => Err(PaginationError::PageSizeOutOfRange { requested, max }),
    }
}

impl PageRequest {
    /// Validate the page size first, then work out the start index
    pub fn plan(&self, max_page_size: usize) -> Result<PagePlan, PlanError> {
        let page_size = validate_page_size(self.page_size, max_page_size)?;

        let start = match &self.cursor {
            PageCursor::Initial => 0,
            PageCursor::Next { token, page_offset } => {
                let decoded = decode_cursor(token.as_deref())?;
                match page_offset {
                    Some(k) => start_for_page(*k, page_size)?,
                    None => decoded as usize,
                }
            }
        };

        Ok(PagePlan { start, page_size })
    }
}

fn start_for_page(page_offset: i64, page_size: usize) -> Result<usize, PaginationError> {
    if page_offset < 1 {
        return Err(PaginationError::PageOffsetOutOfRange(page_offset));
    }
    usize::try_from(page_offset - 1)
        .ok()
        .and_then(|k| k.checked_mul(page_size))
        .ok_or(PaginationError::OffsetOverflow)
}

impl PagePlan {
    /// Cut the page out of the full ordered collection and link to the next one.
    ///
    /// A start past the end gives an empty page. The `next` link is emitted
    /// either way; its token saturates at `u32::MAX`.
    pub fn slice<T>(&self, collection: Vec<T>, link_base: &str) -> Page<T> {
        let items: Vec<T> = collection
            .into_iter()
            .skip(self.start)
            .take(self.page_size)
            .collect();

        let next_offset = self.start.saturating_add(items.len());
        let next_token = encode_cursor(u32::try_from(next_offset).unwrap_or(u32::MAX));

        let meta = PageMeta {
            page_offset: self.start / self.page_size + 1,
            page_size: self.page_size,
            total: items.len(),
        };

        Page {
            items,
            meta,
            links: vec![next_link(link_base, &next_token, self.page_size)],
        }
    }
}

/// `<base>?token=<token>&pageSize=<size>`, query-encoded
pub fn next_link(base: &str, token: &str, page_size: usize) -> Link {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("token", token)
        .append_pair("pageSize", &page_size.to_string())
        .finish();
    Link::next(format!("{}?{}", base, query))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "/api/forecasts/page/next";

    fn records(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    fn initial(size: i64) -> PageRequest {
        PageRequest {
            page_size: Some(size),
            cursor: PageCursor::Initial,
        }
    }

    fn next(size: i64, token: Option<&str>, page_offset: Option<i64>) -> PageRequest {
        PageRequest {
            page_size: Some(size),
            cursor: PageCursor::Next {
                token: token.map(str::to_string),
                page_offset,
            },
        }
    }

    fn token_of(page: &Page<usize>) -> u32 {
        let href = &page.links[0].href;
        let query = href.split_once('?').unwrap().1;
        let token = form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == "token")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        decode_cursor(Some(&token)).unwrap()
    }

    #[test]
    fn page_size_bounds() {
        assert_eq!(validate_page_size(Some(1), 10), Ok(1));
        assert_eq!(validate_page_size(Some(10), 10), Ok(10));
        for bad in [0, -1, 11, i64::MIN] {
            assert_eq!(
                validate_page_size(Some(bad), 10),
                Err(PaginationError::PageSizeOutOfRange { requested: bad, max: 10 })
            );
        }
        assert_eq!(validate_page_size(None, 10), Err(PaginationError::MissingPageSize));
    }

    #[test]
    fn initial_page_of_hundred_records() {
        let plan = initial(10).plan(50).unwrap();
        let page = plan.slice(records(100), BASE);

        assert_eq!(page.items, (0..10).collect::<Vec<_>>());
        assert_eq!(page.meta, PageMeta { page_offset: 1, page_size: 10, total: 10 });
        assert_eq!(token_of(&page), 10);
        assert_eq!(page.links[0].rel, "next");
    }

    #[test]
    fn initial_page_smaller_than_page_size() {
        let page = initial(10).plan(50).unwrap().slice(records(4), BASE);
        assert_eq!(page.items.len(), 4);
        assert_eq!(page.meta.total, 4);
        assert_eq!(token_of(&page), 4);
    }

    #[test]
    fn page_offset_overrides_token() {
        let token = encode_cursor(70);
        let plan = next(10, Some(&token), Some(3)).plan(50).unwrap();
        assert_eq!(plan.start, 20);

        let page = plan.slice(records(100), BASE);
        assert_eq!(page.items.first(), Some(&20));
        assert_eq!(page.meta.page_offset, 3);
        assert_eq!(token_of(&page), 30);
    }

    #[test]
    fn token_is_used_without_page_offset() {
        let token = encode_cursor(40);
        let plan = next(10, Some(&token), None).plan(50).unwrap();
        assert_eq!(plan.start, 40);
        assert_eq!(plan.slice(records(100), BASE).meta.page_offset, 5);
    }

    #[test]
    fn malformed_token_fails_even_with_page_offset() {
        let err = next(10, Some("%%%"), Some(2)).plan(50).unwrap_err();
        assert!(matches!(err, PlanError::Cursor(_)));
    }

    #[test]
    fn page_size_checked_before_token() {
        let err = next(0, Some("%%%"), Some(2)).plan(50).unwrap_err();
        assert!(matches!(err, PlanError::Page(PaginationError::PageSizeOutOfRange { .. })));
    }

    #[test]
    fn past_end_gives_empty_page_with_next_link() {
        let page = next(10, None, Some(20)).plan(50).unwrap().slice(records(100), BASE);
        assert!(page.items.is_empty());
        assert_eq!(page.meta.total, 0);
        assert_eq!(page.links.len(), 1);
        assert_eq!(token_of(&page), 190);
    }

    #[test]
    fn page_offset_must_be_positive() {
        let err = next(10, None, Some(0)).plan(50).unwrap_err();
        assert!(matches!(err, PlanError::Page(PaginationError::PageOffsetOutOfRange(0))));
    }

    #[test]
    fn page_offset_past_usize_is_rejected() {
        let err = next(50, None, Some(i64::MAX)).plan(50).unwrap_err();
        assert!(matches!(err, PlanError::Page(PaginationError::OffsetOverflow)));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn start_beyond_token_range_is_empty_page() {
        let plan = next(10, None, Some(500_000_000)).plan(50).unwrap();
        assert_eq!(plan.start, 4_999_999_990);

        let page = plan.slice(records(10), BASE);
        assert!(page.items.is_empty());
        assert_eq!(page.meta.page_offset, 500_000_000);
        assert_eq!(page.links.len(), 1);
        assert_eq!(token_of(&page), u32::MAX);
    }

    #[test]
    fn next_link_is_query_encoded() {
        let link = next_link(BASE, "Cg+/AA==", 10);
        assert_eq!(link.href, "/api/forecasts/page/next?token=Cg%2B%2FAA%3D%3D&pageSize=10");
    }
}
