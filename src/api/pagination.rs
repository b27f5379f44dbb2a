//! Paging helpers for the two styles Azure DevOps list endpoints use.
//!
//! Some endpoints page with `$top`/`$skip`; others return an opaque
//! `x-ms-continuationtoken` header that is echoed back as `continuationToken`.

use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::error::{ApiError, ApiResult};

/// Response header carrying the token for the next page.
pub const CONTINUATION_TOKEN_HEADER: &str = "x-ms-continuationtoken";

pub const DEFAULT_PAGE_SIZE: i32 = 100;

/// Safety limit to prevent infinite loops against a misbehaving server.
pub const DEFAULT_MAX_PAGES: usize = 100;

/// The `{ "count": n, "value": [...] }` wrapper used by list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

/// One page of results plus the token for the next one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
}

/// Fetch `$top`/`$skip` pages until a short page comes back.
///
/// `fetch(top, skip)` returns the items of one page.
pub async fn collect_skip_paged<T, F, Fut>(
    page_size: i32,
    max_pages: usize,
    mut fetch: F,
) -> ApiResult<Vec<T>>
where
    F: FnMut(i32, i32) -> Fut,
    Fut: Future<Output = ApiResult<Vec<T>>>,
{
    let page_size = page_size.max(1);
    let mut all = Vec::new();
    let mut skip = 0;

    for _ in 0..max_pages {
        let page = fetch(page_size, skip).await?;
        let fetched = page.len();
        all.extend(page);
        if fetched < page_size as usize {
            return Ok(all);
        }
        skip += page_size;
    }

    Err(ApiError::PaginationLimitExceeded {
        max: max_pages,
        retrieved: all.len(),
    })
}

/// Follow continuation tokens until the server stops returning one.
pub async fn collect_continuation<T, F, Fut>(max_pages: usize, fetch: F) -> ApiResult<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = ApiResult<Page<T>>>,
{
    collect_continuation_up_to(None, max_pages, fetch).await
}

/// Like [`collect_continuation`], but stops once `limit` items are collected.
pub async fn collect_continuation_up_to<T, F, Fut>(
    limit: Option<usize>,
    max_pages: usize,
    mut fetch: F,
) -> ApiResult<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = ApiResult<Page<T>>>,
{
    let mut all = Vec::new();
    let mut token = None;

    for _ in 0..max_pages {
        let page = fetch(token.take()).await?;
        all.extend(page.items);
        if let Some(limit) = limit
            && all.len() >= limit
        {
            all.truncate(limit);
            return Ok(all);
        }
        match page.continuation_token {
            Some(next) => token = Some(next),
            None => return Ok(all),
        }
    }

    Err(ApiError::PaginationLimitExceeded {
        max: max_pages,
        retrieved: all.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// # Skip Pagination
    ///
    /// Tests that pages are requested until a short page arrives.
    ///
    /// ## Test Scenario
    /// - Simulates 250 items with a page size of 100
    ///
    /// ## Expected Outcome
    /// - Three requests with skip 0, 100, 200 and all items collected
    #[tokio::test]
    async fn test_collect_skip_paged() {
        let calls = RefCell::new(Vec::new());
        let items = collect_skip_paged(100, 10, |top, skip| {
            calls.borrow_mut().push((top, skip));
            async move {
                let end = (skip + top).min(250);
                Ok((skip..end).collect::<Vec<i32>>())
            }
        })
        .await
        .unwrap();

        assert_eq!(items.len(), 250);
        assert_eq!(*calls.borrow(), vec![(100, 0), (100, 100), (100, 200)]);
    }

    #[tokio::test]
    async fn test_collect_skip_paged_limit() {
        let err = collect_skip_paged(2, 3, |_, _| async { Ok(vec![1, 2]) })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::PaginationLimitExceeded { max: 3, retrieved: 6 }
        ));
    }

    /// # Continuation Pagination
    ///
    /// Tests following continuation tokens.
    ///
    /// ## Test Scenario
    /// - Serves two pages linked by a token
    ///
    /// ## Expected Outcome
    /// - The token from page one is passed to the second request
    #[tokio::test]
    async fn test_collect_continuation() {
        let seen = RefCell::new(Vec::new());
        let items = collect_continuation(10, |token| {
            seen.borrow_mut().push(token.clone());
            async move {
                Ok(match token.as_deref() {
                    None => Page {
                        items: vec!["a", "b"],
                        continuation_token: Some("t1".to_string()),
                    },
                    _ => Page {
                        items: vec!["c"],
                        continuation_token: None,
                    },
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(items, vec!["a", "b", "c"]);
        assert_eq!(*seen.borrow(), vec![None, Some("t1".to_string())]);
    }

    #[tokio::test]
    async fn test_collect_continuation_up_to_stops_early() {
        let calls = RefCell::new(0);
        let items = collect_continuation_up_to(Some(3), 10, |_| {
            *calls.borrow_mut() += 1;
            async {
                Ok(Page {
                    items: vec![1, 2],
                    continuation_token: Some("more".to_string()),
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(items, vec![1, 2, 1]);
        assert_eq!(*calls.borrow(), 2);
    }

    #[tokio::test]
    async fn test_collect_continuation_propagates_errors() {
        let err = collect_continuation::<i32, _, _>(5, |_| async {
            Err(ApiError::Unauthorized)
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[test]
    fn test_list_response_defaults() {
        let list: ListResponse<i32> = serde_json::from_str("{}").unwrap();
        assert!(list.value.is_empty());
        assert!(list.count.is_none());
    }
}
