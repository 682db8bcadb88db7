//! Lazy enumeration of a repository subtree
//!
//! [`descendants`] walks the tree rooted at a folder reference page by
//! page, yielding entities as a [`futures::Stream`]. Laziness is the
//! central property here: no more than one page is materialized ahead of
//! the consumer, so memory and network use stay bounded for arbitrarily
//! large repositories and a consumer that stops early never forces
//! enumeration of the remaining tree.

use crate::error::{Error, Result};
use crate::retry::with_retry;
use crate::session::Session;
use crate::types::{ChildrenPage, Entity, EntityKind, EntityRef};
use futures::Stream;
use reqwest::StatusCode;
use std::collections::VecDeque;

/// Lazily enumerate all descendants of a folder
///
/// With `root` absent, traversal starts at the repository root. The order
/// is breadth-first: a folder's children are yielded in server page order
/// before any discovered subfolder is expanded, and subfolders are expanded
/// in the order they were yielded. For an unchanged tree the order is
/// stable and repeatable.
///
/// The stream visits folders and assets alike; narrow it with
/// [`crate::filter::is_asset`]. It is finite for a finite tree and not
/// restartable mid-stream — resuming after partial consumption means a new
/// `descendants` call.
///
/// Transient page-request faults are retried within the session's budget.
/// A root or folder that no longer resolves aborts the stream with
/// [`Error::Traversal`]; lost authentication aborts with [`Error::Auth`].
/// A fatal error is yielded once, after which the stream terminates,
/// preserving everything yielded before the failure.
pub fn descendants<'a>(
    session: &'a Session,
    root: Option<&EntityRef>,
) -> impl Stream<Item = Result<Entity>> + 'a {
    let state = TraversalState {
        session,
        page_size: session.page_size(),
        buffer: VecDeque::new(),
        cursor: Some(PageCursor {
            parent: root.cloned(),
            start: 0,
        }),
        queue: VecDeque::new(),
        done: false,
    };
    futures::stream::unfold(state, |mut state| async move {
        let item = state.next_item().await;
        item.map(|item| (item, state))
    })
}

/// Position inside one folder's paged child listing
struct PageCursor {
    /// Folder being listed (None = repository root)
    parent: Option<EntityRef>,
    /// Offset of the next page
    start: u64,
}

struct TraversalState<'a> {
    session: &'a Session,
    page_size: usize,
    /// Entities fetched but not yet yielded (at most one page)
    buffer: VecDeque<Entity>,
    /// Listing currently in progress, if any
    cursor: Option<PageCursor>,
    /// Folders discovered but not yet expanded, FIFO
    queue: VecDeque<EntityRef>,
    done: bool,
}

impl TraversalState<'_> {
    async fn next_item(&mut self) -> Option<Result<Entity>> {
        if self.done {
            return None;
        }
        loop {
            if let Some(entity) = self.buffer.pop_front() {
                if entity.kind == EntityKind::Folder {
                    self.queue.push_back(entity.reference.clone());
                }
                return Some(Ok(entity));
            }

            let cursor = match self.cursor.take() {
                Some(cursor) => cursor,
                None => match self.queue.pop_front() {
                    Some(parent) => PageCursor {
                        parent: Some(parent),
                        start: 0,
                    },
                    None => {
                        self.done = true;
                        return None;
                    }
                },
            };

            match fetch_page(self.session, self.page_size, &cursor).await {
                Ok(page) => {
                    let fetched = page.children.len() as u64;
                    tracing::debug!(
                        parent = cursor.parent.as_ref().map(EntityRef::as_str),
                        start = cursor.start,
                        fetched,
                        total = page.total,
                        "fetched children page"
                    );
                    let next_start = cursor.start + fetched;
                    if fetched > 0 && next_start < page.total {
                        self.cursor = Some(PageCursor {
                            parent: cursor.parent,
                            start: next_start,
                        });
                    }
                    self.buffer.extend(page.children);
                    // An empty listing loops on to the next queued folder.
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

async fn fetch_page(
    session: &Session,
    page_size: usize,
    cursor: &PageCursor,
) -> Result<ChildrenPage> {
    let path = children_path(cursor.parent.as_ref(), cursor.start, page_size);
    with_retry(session.retry(), || {
        fetch_page_once(session, &path, cursor.parent.as_ref())
    })
    .await
}

async fn fetch_page_once(
    session: &Session,
    path: &str,
    parent: Option<&EntityRef>,
) -> Result<ChildrenPage> {
    let response = session.get(path).await?;
    if response.status() == StatusCode::NOT_FOUND {
        let target = match parent {
            Some(reference) => format!("folder {reference}"),
            None => "repository root".to_string(),
        };
        return Err(Error::Traversal(format!("{target} does not resolve")));
    }
    let response = response.error_for_status()?;
    Ok(response.json::<ChildrenPage>().await?)
}

fn children_path(parent: Option<&EntityRef>, start: u64, max: usize) -> String {
    match parent {
        Some(reference) => format!(
            "/api/entity/entities/{}/children?start={start}&max={max}",
            urlencoding::encode(reference.as_str())
        ),
        None => format!("/api/entity/root/children?start={start}&max={max}"),
    }
}
