//! The lazy graph walker.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use git_hash::ObjectId;
use git_object::{Commit, Object};
use git_odb::ObjectDatabase;

use crate::RevWalkError;

/// One pending commit in the walk's priority queue.
///
/// Ordered by committer timestamp (newest first), tie-broken by id so the
/// order is deterministic across runs.
struct QueueEntry {
    oid: ObjectId,
    commit_date: i64,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.commit_date == other.commit_date && self.oid == other.oid
    }
}
impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.commit_date.cmp(&other.commit_date).then_with(|| self.oid.cmp(&other.oid))
    }
}

/// Lazy commit-ancestry walker for fetch negotiation.
///
/// Starting tips are added with [`push`](Self::push); [`next`](Self::next)
/// yields them and their ancestors in approximate reverse-chronological
/// order. Calling [`ack`](Self::ack) marks a commit (and, lazily, its
/// ancestors as they're reached) as already known to both sides, so the
/// walk stops yielding them.
pub struct GraphWalker<'a> {
    odb: &'a ObjectDatabase,
    queue: BinaryHeap<QueueEntry>,
    enqueued: HashSet<ObjectId>,
    common: HashSet<ObjectId>,
}

impl<'a> GraphWalker<'a> {
    /// Create a walker with no starting tips.
    pub fn new(odb: &'a ObjectDatabase) -> Self {
        GraphWalker {
            odb,
            queue: BinaryHeap::new(),
            enqueued: HashSet::new(),
            common: HashSet::new(),
        }
    }

    /// Add a starting tip to walk from.
    pub fn push(&mut self, oid: ObjectId) -> Result<(), RevWalkError> {
        self.enqueue(oid, false)
    }

    /// Mark `oid` and, lazily, its ancestors as common (already known to the
    /// remote). Common commits are loaded and their parents enqueued so the
    /// flag propagates down the ancestry as the walk reaches them, but `oid`
    /// itself is resolved eagerly here since it may already have left the
    /// queue.
    pub fn ack(&mut self, oid: ObjectId) -> Result<(), RevWalkError> {
        self.common.insert(oid);
        let commit = self.read_commit(&oid)?;
        for parent in commit.parents {
            self.enqueue(parent, true)?;
        }
        Ok(())
    }

    /// Yield the next non-common commit, or `None` when the walk is
    /// exhausted.
    pub fn next(&mut self) -> Result<Option<ObjectId>, RevWalkError> {
        while let Some(entry) = self.queue.pop() {
            let is_common = self.common.contains(&entry.oid);
            let commit = self.read_commit(&entry.oid)?;
            for parent in commit.parents {
                self.enqueue(parent, is_common)?;
            }
            if is_common {
                continue;
            }
            return Ok(Some(entry.oid));
        }
        Ok(None)
    }

    fn enqueue(&mut self, oid: ObjectId, common: bool) -> Result<(), RevWalkError> {
        if common {
            self.common.insert(oid);
        }
        if !self.enqueued.insert(oid) {
            return Ok(());
        }
        let commit = self.read_commit(&oid)?;
        self.queue.push(QueueEntry { oid, commit_date: commit.committer.date.timestamp });
        Ok(())
    }

    fn read_commit(&self, oid: &ObjectId) -> Result<Commit, RevWalkError> {
        let obj = self.odb.read(oid)?.ok_or(RevWalkError::CommitNotFound(*oid))?;
        match obj {
            Object::Commit(commit) => Ok(commit),
            _ => Err(RevWalkError::NotACommit(*oid)),
        }
    }
}
