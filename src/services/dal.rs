// src/services/dal.rs

//! Data access layer over a set of snapshots.
//!
//! Owns the loaded snapshots and hands out merged, typed views that borrow
//! from them.

use std::collections::HashMap;

use crate::error::Result;
use crate::models::{
    Category, Comment, Message, Multireddit, Profile, RawRecord, Save, Snapshot, Submission,
    Subreddit, Upvote, chronological,
};
use crate::pipeline::accumulate;
use crate::storage::SnapshotStorage;

/// Merged access to every category across all snapshots.
#[derive(Debug, Clone, Default)]
pub struct Dal {
    snapshots: Vec<Snapshot>,
}

impl Dal {
    /// Build from snapshots in any order; they are sorted by capture time.
    pub fn new(mut snapshots: Vec<Snapshot>) -> Self {
        snapshots.sort_by(chronological);
        Self { snapshots }
    }

    /// Load every snapshot from `storage`.
    pub async fn load(storage: &dyn SnapshotStorage) -> Result<Self> {
        Ok(Self::new(storage.load_all().await?))
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Merged raw records of a category, oldest action first.
    pub fn raw(&self, category: Category) -> Result<Vec<&RawRecord>> {
        accumulate(category, &self.snapshots)
    }

    pub fn saved(&self) -> Result<Vec<Save<'_>>> {
        self.view(Category::Saved, Save::new)
    }

    pub fn comments(&self) -> Result<Vec<Comment<'_>>> {
        self.view(Category::Comments, Comment::new)
    }

    pub fn submissions(&self) -> Result<Vec<Submission<'_>>> {
        self.view(Category::Submissions, Submission::new)
    }

    pub fn upvoted(&self) -> Result<Vec<Upvote<'_>>> {
        self.view(Category::Upvoted, Upvote::new)
    }

    pub fn downvoted(&self) -> Result<Vec<Upvote<'_>>> {
        self.view(Category::Downvoted, Upvote::new)
    }

    pub fn subreddits(&self) -> Result<Vec<Subreddit<'_>>> {
        self.view(Category::Subreddits, Subreddit::new)
    }

    pub fn multireddits(&self) -> Result<Vec<Multireddit<'_>>> {
        self.view(Category::Multireddits, Multireddit::new)
    }

    pub fn inbox(&self) -> Result<Vec<Message<'_>>> {
        self.view(Category::Inbox, Message::new)
    }

    /// Profile from the newest snapshot that has one.
    pub fn profile(&self) -> Result<Option<Profile<'_>>> {
        for snapshot in self.snapshots.iter().rev() {
            if let Some(raw) = snapshot.records(Category::Profile)?.into_iter().next() {
                return Ok(Some(Profile::new(raw)));
            }
        }
        Ok(None)
    }

    /// Subreddits with the most saved items, most frequent first.
    pub fn most_saved_subreddits(&self, limit: usize) -> Result<Vec<(String, usize)>> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for save in self.saved()? {
            *counts.entry(save.subreddit()?).or_default() += 1;
        }

        let mut ranked: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(name, count)| (name.to_string(), count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(limit);
        Ok(ranked)
    }

    fn view<'a, V>(&'a self, category: Category, wrap: fn(&'a RawRecord) -> V) -> Result<Vec<V>> {
        Ok(self.raw(category)?.into_iter().map(wrap).collect())
    }
}
