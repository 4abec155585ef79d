use clap::ValueEnum;

use crate::post::Post;

/// Presentation order for the visible set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SortOrder {
    #[default]
    Unsorted,
    NewestFirst,
    OldestFirst,
}

/// What the viewer asked to see: free-text filter plus ordering.
/// Holds no posts and does no I/O.
#[derive(Debug, Clone, Default)]
pub struct Query {
    filter: String,
    order: SortOrder,
}

impl Query {
    pub fn set_filter(&mut self, text: &str) {
        self.filter = text.trim().to_string();
    }

    pub fn set_order(&mut self, order: SortOrder) {
        self.order = order;
    }

    /// The active filter text, if any. Whitespace-only input counts as none.
    pub fn filter(&self) -> Option<&str> {
        if self.filter.is_empty() {
            None
        } else {
            Some(&self.filter)
        }
    }

    /// Compute the visible set: the matching subset of `buffer`, reordered
    /// by the last-touched timestamp. The buffer itself is never reordered,
    /// and ties keep their buffer order (the sort must stay stable).
    pub fn apply(&self, buffer: &[Post]) -> Vec<Post> {
        let mut visible: Vec<Post> = buffer
            .iter()
            .filter(|post| self.matches(post))
            .cloned()
            .collect();
        match self.order {
            SortOrder::Unsorted => {}
            SortOrder::NewestFirst => visible.sort_by(|a, b| b.updated_at().cmp(&a.updated_at())),
            SortOrder::OldestFirst => visible.sort_by(|a, b| a.updated_at().cmp(&b.updated_at())),
        }
        visible
    }

    fn matches(&self, post: &Post) -> bool {
        if self.filter.is_empty() {
            return true;
        }
        let needle = self.filter.to_lowercase();
        let contains = |text: &str| text.to_lowercase().contains(&needle);
        contains(&post.title)
            || contains(&post.body)
            || contains(&post.author.name)
            || post.tags.iter().any(|tag| contains(tag))
    }
}
