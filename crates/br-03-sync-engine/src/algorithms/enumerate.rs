//! # Follow Enumeration
//!
//! Pages through the follow listing until the cursor runs out.

use std::collections::HashSet;
use std::time::Duration;

use shared_types::{FollowedUser, GraphApi, GraphError};
use tracing::debug;

/// Collect every account followed by `actor`.
///
/// Sleeps `page_delay` between pages. Duplicate accounts keep their first
/// occurrence. An empty page with a cursor is walked past; the walk stops on
/// a missing cursor or a cursor the listing already returned.
pub async fn enumerate_follows<G>(
    graph: &G,
    actor: &str,
    page_delay: Duration,
) -> Result<Vec<FollowedUser>, GraphError>
where
    G: GraphApi + ?Sized,
{
    let mut follows = Vec::new();
    let mut seen_dids = HashSet::new();
    let mut seen_cursors = HashSet::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = graph.list_follows(actor, cursor.as_deref()).await?;
        pages += 1;

        for user in page.follows {
            if seen_dids.insert(user.did.clone()) {
                follows.push(user);
            }
        }

        match page.cursor {
            Some(next) if seen_cursors.insert(next.clone()) => {
                cursor = Some(next);
            }
            _ => break,
        }

        if !page_delay.is_zero() {
            tokio::time::sleep(page_delay).await;
        }
    }

    debug!(actor = %actor, pages, follows = follows.len(), "Follow enumeration complete");
    Ok(follows)
}
