//! Cursor pagination
//!
//! Every listing API the providers talk to is exhausted through [`Pager`]:
//! request a page with the current cursor, keep its items, and advance to
//! the cursor the backend just returned for as long as the response says it
//! was truncated.

use crate::error::{BoxError, Error, Result};
use crate::schema::{Resource, Resources};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// One page of a remote listing
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Backend reports more results after this page
    pub truncated: bool,
    /// Cursor to request the following page with
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// A page that ends the listing
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            truncated: false,
            next_cursor: None,
        }
    }

    /// A page followed by another one at `cursor`
    pub fn more(items: Vec<T>, cursor: impl Into<String>) -> Self {
        Self {
            items,
            truncated: true,
            next_cursor: Some(cursor.into()),
        }
    }
}

/// Pagination state: the cursor for the next request, or finished
#[derive(Debug, Default)]
pub struct Pager {
    cursor: Option<String>,
    done: bool,
    pages: usize,
}

impl Pager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pages fetched so far
    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Fetch the next page, `Ok(None)` once the listing is exhausted.
    ///
    /// `fetch` receives the cursor to send (`None` on the first request).
    /// Cancellation of `ctx` aborts the in-flight request.
    pub async fn next<T, F, Fut>(
        &mut self,
        ctx: &CancellationToken,
        operation: &str,
        fetch: F,
    ) -> Result<Option<Vec<T>>>
    where
        F: FnOnce(Option<String>) -> Fut,
        Fut: Future<Output = std::result::Result<Page<T>, BoxError>>,
    {
        if self.done {
            return Ok(None);
        }
        if ctx.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let request = fetch(self.cursor.take());
        let page = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(Error::Cancelled),
            page = request => page.map_err(|e| Error::backend(operation, e))?,
        };
        self.pages += 1;

        // Advance with the cursor the backend just handed back, never a stale one
        match page.next_cursor {
            Some(next) if page.truncated && !next.is_empty() => self.cursor = Some(next),
            _ => self.done = true,
        }

        Ok(Some(page.items))
    }
}

/// Exhaust a listing, normalizing each raw item into the accumulator
pub async fn collect_pages<T, F, Fut, N>(
    ctx: &CancellationToken,
    operation: &str,
    mut fetch: F,
    mut normalize: N,
) -> Result<Resources>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = std::result::Result<Page<T>, BoxError>>,
    N: FnMut(T) -> Option<Resource>,
{
    let mut pager = Pager::new();
    let mut accumulated = Resources::new();

    while let Some(items) = pager.next(ctx, operation, &mut fetch).await? {
        accumulated.extend(items.into_iter().filter_map(&mut normalize));
    }

    tracing::debug!(
        "{}: {} pages, {} resources",
        operation,
        pager.pages(),
        accumulated.len()
    );
    Ok(accumulated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn named(name: &str) -> Resource {
        Resource {
            provider: "test".to_string(),
            dns_name: name.to_string(),
            public: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_three_pages_yield_five_resources_in_order() {
        let ctx = CancellationToken::new();
        let pages = Arc::new(Mutex::new(vec![
            Page::more(vec!["a", "b"], "c2"),
            Page::more(vec!["c", "d"], "c3"),
            Page::last(vec!["e"]),
        ]));

        let resources = collect_pages(
            &ctx,
            "listing test",
            |_cursor| {
                let pages = pages.clone();
                async move { Ok::<_, BoxError>(pages.lock().unwrap().remove(0)) }
            },
            |item: &str| Some(named(item)),
        )
        .await
        .unwrap();

        let names: Vec<_> = resources.iter().map(|r| r.dns_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_advances_with_freshly_returned_cursor() {
        let ctx = CancellationToken::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let result = collect_pages(
            &ctx,
            "listing test",
            |cursor: Option<String>| {
                let seen = seen.clone();
                async move {
                    seen.lock().unwrap().push(cursor.clone());
                    let page: Page<i32> = match cursor.as_deref() {
                        None => Page::more(vec![1], "p2"),
                        Some("p2") => Page::more(vec![2], "p3"),
                        Some("p3") => Page::last(vec![3]),
                        Some(other) => return Err(BoxError::from(format!("stale cursor {other}"))),
                    };
                    Ok::<_, BoxError>(page)
                }
            },
            |n: i32| Some(named(&n.to_string())),
        )
        .await
        .unwrap();

        assert_eq!(result.len(), 3);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![None, Some("p2".to_string()), Some("p3".to_string())]
        );
    }

    #[tokio::test]
    async fn test_truncated_with_empty_cursor_stops() {
        let ctx = CancellationToken::new();
        let calls = Arc::new(Mutex::new(0));

        let result = collect_pages(
            &ctx,
            "listing test",
            |_| {
                let calls = calls.clone();
                async move {
                    *calls.lock().unwrap() += 1;
                    Ok::<_, BoxError>(Page {
                        items: vec!["only"],
                        truncated: true,
                        next_cursor: Some(String::new()),
                    })
                }
            },
            |item: &str| Some(named(item)),
        )
        .await
        .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_untruncated_page_ignores_cursor() {
        let ctx = CancellationToken::new();
        let mut pager = Pager::new();

        let first = pager
            .next(&ctx, "listing test", |_| async {
                Ok::<_, BoxError>(Page {
                    items: vec![1],
                    truncated: false,
                    next_cursor: Some("ignored".to_string()),
                })
            })
            .await
            .unwrap();
        assert_eq!(first, Some(vec![1]));

        let second = pager
            .next(&ctx, "listing test", |_| async {
                Err::<Page<i32>, BoxError>("must not be called".into())
            })
            .await
            .unwrap();
        assert_eq!(second, None);
    }

    #[tokio::test]
    async fn test_fetch_error_carries_operation() {
        let ctx = CancellationToken::new();
        let err = collect_pages(
            &ctx,
            "listing records for zone Z9",
            |_| async { Err::<Page<i32>, BoxError>("503".into()) },
            |_n: i32| None,
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "listing records for zone Z9: 503");
    }

    #[tokio::test]
    async fn test_cancellation_aborts_pending_fetch() {
        let ctx = CancellationToken::new();
        let trigger = ctx.clone();

        let err = collect_pages(
            &ctx,
            "listing test",
            move |_| {
                let trigger = trigger.clone();
                async move {
                    trigger.cancel();
                    std::future::pending::<std::result::Result<Page<i32>, BoxError>>().await
                }
            },
            |_n: i32| None,
        )
        .await
        .unwrap_err();

        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_filtered_items_are_dropped() {
        let ctx = CancellationToken::new();
        let result = collect_pages(
            &ctx,
            "listing test",
            |_| async { Ok::<_, BoxError>(Page::last(vec![1, 2, 3, 4])) },
            |n: i32| (n % 2 == 0).then(|| named(&n.to_string())),
        )
        .await
        .unwrap();

        assert_eq!(result.len(), 2);
    }
}
