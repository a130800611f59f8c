use crate::types::{AggregatedSet, FeedItem};
use std::cmp::Reverse;
use std::collections::HashSet;
use tracing::debug;

/// Merge the items of every feed in a column into one ordered, link-unique set.
///
/// `items` must be in feed-processing order: feeds in configuration order,
/// entries in the order each feed delivered them. The first copy of a link
/// wins. Items without a link cannot be deduplicated and are dropped. The
/// result is sorted newest first with undated items last; the sort is stable
/// so ties keep their discovery order.
pub fn aggregate(column: &str, items: Vec<FeedItem>) -> AggregatedSet {
    let total = items.len();
    let mut seen_links = HashSet::new();
    let mut missing_link = 0;
    let mut unique = Vec::with_capacity(total);

    for item in items {
        if item.link.trim().is_empty() {
            missing_link += 1;
            continue;
        }
        if seen_links.insert(item.link.clone()) {
            unique.push(item);
        }
    }

    // Option orders None below every Some, so Reverse puts undated items last
    unique.sort_by_key(|item| Reverse(item.published_at));

    let duplicates = total - missing_link - unique.len();
    debug!(
        "Column {}: {} items in, {} without link, {} duplicates, {} kept",
        column,
        total,
        missing_link,
        duplicates,
        unique.len()
    );

    AggregatedSet {
        column: column.to_string(),
        items: unique,
    }
}
