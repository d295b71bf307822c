//! Lazy commit-ancestry graph walking for fetch negotiation.
//!
//! [`GraphWalker`] yields local commit ids in approximate reverse-chronological
//! order so a fetch can offer them as "have"s to a remote. When the remote
//! acknowledges one as common, [`GraphWalker::ack`] marks it and its ancestors
//! so the walk stops re-offering history both sides already share.

mod walk;

pub use walk::GraphWalker;

use git_hash::ObjectId;

/// Errors produced by graph walking operations.
#[derive(Debug, thiserror::Error)]
pub enum RevWalkError {
    #[error("commit not found: {0}")]
    CommitNotFound(ObjectId),

    #[error("object is not a commit: {0}")]
    NotACommit(ObjectId),

    #[error(transparent)]
    Odb(#[from] git_odb::OdbError),

    #[error(transparent)]
    Object(#[from] git_object::ObjectError),
}
