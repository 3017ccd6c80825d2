/// Polling envelope for the admin order and waiter call feeds
///
/// Clients poll every `poll_interval_ms` and send the previous response's
/// `server_time` back as `since`, receiving rows with `updated_at > since`.
///
/// Without `since` a feed is a snapshot of the newest rows. With `since` it
/// pages forward in `updated_at` order: `has_more` means the page was cut at
/// `limit` and the client should poll again right away with the new cursor.
///
/// The cursor never passes a row that might still become visible:
///
/// - rows are stamped with `clock_timestamp()` when written, not when their
///   transaction began
/// - the cursor is held back to the start of the oldest transaction that is
///   still writing (see [`safe_cursor`])
/// - a page cut between rows with the same `updated_at` steps back one
///   microsecond
///
/// The price is that a row can occasionally be delivered twice. Clients key
/// rows by `id` and keep the latest `updated_at`.

use chrono::{DateTime, Duration, Utc};
use menuboard_shared::models::{order::Order, waiter_call::WaiterCall};
use serde::Serialize;
use sqlx::PgPool;

/// Client refresh interval
pub const POLL_INTERVAL_MS: u64 = 5_000;

pub const DEFAULT_FEED_LIMIT: i64 = 100;
pub const MAX_FEED_LIMIT: i64 = 500;

/// A row that can be paged by its change time
pub trait FeedItem {
    fn updated_at(&self) -> DateTime<Utc>;
}

impl FeedItem for Order {
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl FeedItem for WaiterCall {
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[derive(Debug, Serialize)]
pub struct Feed<T> {
    pub items: Vec<T>,

    /// Cursor for the next poll
    pub server_time: DateTime<Utc>,

    /// More rows changed after `since` than fit in this page
    pub has_more: bool,

    pub poll_interval_ms: u64,
}

impl<T> Feed<T> {
    /// Snapshot of the newest rows, for a client without a cursor
    pub fn new(items: Vec<T>, safe_now: DateTime<Utc>) -> Self {
        Self {
            items,
            server_time: safe_now,
            has_more: false,
            poll_interval_ms: POLL_INTERVAL_MS,
        }
    }
}

impl<T: FeedItem> Feed<T> {
    /// One forward page after `since`
    ///
    /// `items` are sorted by `updated_at` ascending and hold up to
    /// `limit + 1` rows; the extra row only tells whether the page is full.
    pub fn page(
        mut items: Vec<T>,
        since: DateTime<Utc>,
        safe_now: DateTime<Utc>,
        limit: i64,
    ) -> Self {
        let limit = usize::try_from(limit).unwrap_or(1).max(1);
        let has_more = items.len() > limit;

        let cursor = match (has_more, items.get(limit - 1), items.get(limit)) {
            (true, Some(last), Some(next)) => {
                page_cursor(since, last.updated_at(), next.updated_at(), safe_now)
            }
            _ => safe_now.max(since),
        };

        items.truncate(limit);

        Self {
            items,
            server_time: cursor,
            has_more,
            poll_interval_ms: POLL_INTERVAL_MS,
        }
    }
}

/// Cursor after a full page ending at `last`, where `next` is the first row
/// left out
fn page_cursor(
    since: DateTime<Utc>,
    last: DateTime<Utc>,
    next: DateTime<Utc>,
    safe_now: DateTime<Utc>,
) -> DateTime<Utc> {
    let mut cursor = if next == last {
        last - Duration::microseconds(1)
    } else {
        last
    };

    // A whole page sharing one timestamp; skip ahead instead of looping
    if cursor <= since {
        cursor = last;
    }

    cursor.min(safe_now).max(since)
}

/// Latest instant no uncommitted write can still land before
///
/// The database clock, held back to the start of the oldest other
/// transaction that has written something. The clock is read first: a writer
/// that stamped a row before it already holds a transaction id when the
/// second query looks.
pub async fn safe_cursor(pool: &PgPool) -> Result<DateTime<Utc>, sqlx::Error> {
    let now: DateTime<Utc> = sqlx::query_scalar("SELECT clock_timestamp()")
        .fetch_one(pool)
        .await?;

    let oldest_writer: Option<DateTime<Utc>> = sqlx::query_scalar(
        r#"
        SELECT MIN(xact_start) FROM pg_stat_activity
        WHERE backend_xid IS NOT NULL AND pid <> pg_backend_pid()
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(oldest_writer.map_or(now, |start| start.min(now)))
}

pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_FEED_LIMIT).clamp(1, MAX_FEED_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct Row(DateTime<Utc>);

    impl FeedItem for Row {
        fn updated_at(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000 + ms).unwrap()
    }

    fn rows(ms: &[i64]) -> Vec<Row> {
        ms.iter().map(|m| Row(at(*m))).collect()
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), DEFAULT_FEED_LIMIT);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(20)), 20);
        assert_eq!(clamp_limit(Some(10_000)), MAX_FEED_LIMIT);
    }

    #[test]
    fn test_feed_serialization() {
        let now = Utc::now();
        let feed = Feed::new(vec![1, 2, 3], now);
        let json = serde_json::to_value(&feed).unwrap();

        assert_eq!(json["items"], serde_json::json!([1, 2, 3]));
        assert_eq!(json["poll_interval_ms"], 5000);
        assert_eq!(json["has_more"], false);
        assert!(json["server_time"].is_string());
    }

    #[test]
    fn test_partial_page_moves_cursor_to_now() {
        let feed = Feed::page(rows(&[10, 20]), at(0), at(100), 5);

        assert_eq!(feed.items.len(), 2);
        assert!(!feed.has_more);
        assert_eq!(feed.server_time, at(100));
    }

    #[test]
    fn test_full_page_stops_at_last_row() {
        let feed = Feed::page(rows(&[10, 20, 30]), at(0), at(100), 2);

        assert_eq!(feed.items.len(), 2);
        assert!(feed.has_more);
        assert_eq!(feed.server_time, at(20));

        // Next poll starts after row 20 and picks up row 30
        let next = Feed::page(rows(&[30]), feed.server_time, at(100), 2);
        assert_eq!(next.items[0].0, at(30));
    }

    #[test]
    fn test_full_page_cut_inside_tie_steps_back() {
        let feed = Feed::page(rows(&[10, 20, 20]), at(0), at(100), 2);

        assert!(feed.has_more);
        assert!(feed.server_time < at(20));
        assert!(feed.server_time > at(10));
    }

    #[test]
    fn test_full_page_of_one_timestamp_makes_progress() {
        let since = at(20) - Duration::microseconds(1);
        let feed = Feed::page(rows(&[20, 20, 20]), since, at(100), 2);

        assert_eq!(feed.server_time, at(20));
    }

    #[test]
    fn test_cursor_held_back_by_open_writer() {
        // A transaction that began at 15 may still commit rows stamped after it
        let feed = Feed::page(rows(&[10, 20, 30]), at(0), at(15), 2);
        assert_eq!(feed.server_time, at(15));

        let quiet = Feed::page(Vec::<Row>::new(), at(5), at(15), 2);
        assert_eq!(quiet.server_time, at(15));
    }

    #[test]
    fn test_cursor_never_moves_backwards() {
        let quiet = Feed::page(Vec::<Row>::new(), at(50), at(40), 2);
        assert_eq!(quiet.server_time, at(50));
    }
}
