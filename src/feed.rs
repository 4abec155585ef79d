use std::sync::Mutex;

use log::{debug, warn};
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::{
    api::{ApiError, FeedSource},
    post::Post,
    query::{Query, SortOrder},
    render::{Placeholder, RenderSink},
};

/// A page load that could not complete. The underlying cause is kept for
/// reporting; the caller is free to try again.
#[derive(Debug, Error)]
#[error("failed to load posts: {0}")]
pub struct FetchFailed(pub ApiError);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Appended a page of this many records.
    Loaded(usize),
    /// Another load is already in flight, nothing was requested.
    AlreadyLoading,
    /// The previous page came up short, there is nothing further to request.
    Exhausted,
    /// The feed was refreshed while this page was in flight, page discarded.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    Idle,
    Loading,
    Exhausted,
}

/// Owns everything the feed view needs: the pagination cursor, the fetched
/// buffer, the viewer's query, and the guarantee that at most one page is
/// ever being requested at a time. Each instance is fully self-contained,
/// so several feeds on screen never share state.
pub struct FeedPipeline<R, S> {
    source: R,
    sink: S,
    page_size: usize,
    gate: Semaphore,
    state: Mutex<FeedState>,
}

#[derive(Debug)]
struct FeedState {
    cursor: u32,
    buffer: Vec<Post>,
    exhausted: bool,
    query: Query,
    generation: u64,
}

impl FeedState {
    fn new() -> Self {
        Self {
            cursor: 1,
            buffer: Vec::new(),
            exhausted: false,
            query: Query::default(),
            generation: 0,
        }
    }
}

enum FeedView {
    Posts(Vec<Post>),
    Empty(Placeholder),
}

impl<R, S> FeedPipeline<R, S>
where
    R: FeedSource + Send + Sync,
    S: RenderSink + Send + Sync,
{
    pub fn new(source: R, sink: S, page_size: usize) -> Self {
        Self {
            source,
            sink,
            page_size,
            gate: Semaphore::new(1),
            state: Mutex::new(FeedState::new()),
        }
    }

    /// Request the next page and append it to the buffer. A no-op while a
    /// page is already in flight or once the feed is exhausted.
    pub async fn load_next_page(&self) -> Result<LoadOutcome, FetchFailed> {
        // the permit is the in-flight flag: taken before the request goes
        // out, released only once the completion path has run
        let _permit = match self.gate.try_acquire() {
            Ok(permit) => permit,
            Err(_) => return Ok(LoadOutcome::AlreadyLoading),
        };

        let (page, generation) = {
            let state = self.state.lock().unwrap();
            if state.exhausted {
                return Ok(LoadOutcome::Exhausted);
            }
            (state.cursor, state.generation)
        };

        debug!("loading page {page} ({} per page)", self.page_size);
        let fetched = match self.source.fetch_page(page, self.page_size).await {
            Ok(posts) => posts,
            Err(ApiError::Malformed(err)) => {
                // a garbage payload counts as an empty page, not a fault
                warn!("page {page} was not a post list, treating as empty: {err}");
                Vec::new()
            }
            Err(err) => {
                drop(_permit);
                let first_page = self.state.lock().unwrap().buffer.is_empty();
                if first_page {
                    self.sink.placeholder(Placeholder::NoneYet);
                }
                return Err(FetchFailed(err));
            }
        };

        let count = fetched.len();
        let view = {
            let mut state = self.state.lock().unwrap();
            if state.generation != generation {
                debug!("page {page} arrived after a refresh, discarding");
                return Ok(LoadOutcome::Stale);
            }
            state.exhausted = count < self.page_size;
            state.cursor += 1;
            state.buffer.extend(fetched);
            Self::view(&state)
        };

        // clear the in-flight latch before the sink runs, a render callback
        // may immediately ask for more
        drop(_permit);
        self.dispatch(view);
        Ok(LoadOutcome::Loaded(count))
    }

    /// Throw the buffer away and start over from the first page. Any page
    /// still in flight is discarded when it lands.
    pub async fn refresh(&self) -> Result<LoadOutcome, FetchFailed> {
        {
            let mut state = self.state.lock().unwrap();
            state.cursor = 1;
            state.buffer.clear();
            state.exhausted = false;
            state.generation += 1;
        }
        self.load_next_page().await
    }

    /// Narrow the visible set to posts matching `text`. Works over the
    /// pages already in the buffer; never fetches.
    pub fn apply_filter(&self, text: &str) {
        let view = {
            let mut state = self.state.lock().unwrap();
            state.query.set_filter(text);
            Self::view(&state)
        };
        self.dispatch(view);
    }

    /// Reorder the visible set. Never fetches and never reorders the
    /// buffer itself.
    pub fn apply_sort(&self, order: SortOrder) {
        let view = {
            let mut state = self.state.lock().unwrap();
            state.query.set_order(order);
            Self::view(&state)
        };
        self.dispatch(view);
    }

    /// Snapshot of what the sink was last shown.
    pub fn visible(&self) -> Vec<Post> {
        let state = self.state.lock().unwrap();
        state.query.apply(&state.buffer)
    }

    pub fn status(&self) -> FeedStatus {
        if self.gate.available_permits() == 0 {
            return FeedStatus::Loading;
        }
        if self.state.lock().unwrap().exhausted {
            FeedStatus::Exhausted
        } else {
            FeedStatus::Idle
        }
    }

    fn view(state: &FeedState) -> FeedView {
        if state.buffer.is_empty() {
            return FeedView::Empty(Placeholder::NoneYet);
        }
        let visible = state.query.apply(&state.buffer);
        if visible.is_empty() {
            match state.query.filter() {
                Some(text) => FeedView::Empty(Placeholder::NoMatch(text.to_string())),
                None => FeedView::Empty(Placeholder::NoneYet),
            }
        } else {
            FeedView::Posts(visible)
        }
    }

    fn dispatch(&self, view: FeedView) {
        match view {
            FeedView::Posts(posts) => self.sink.render(&posts),
            FeedView::Empty(reason) => self.sink.placeholder(reason),
        }
    }
}
