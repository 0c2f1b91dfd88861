//! Reddit comment listings and reply forest assembly.
//!
//! A comment listing mixes real comments (`t1`) with `more` stubs standing in
//! for replies Reddit did not send. [`CommentForest`] keeps the comments it
//! has seen, queues the stubs, and attaches later batches of comments to
//! their parents by `parent_id`.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;
use verdict_core::{Comment, Thread};

const DELETED_AUTHOR: &str = "[deleted]";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum CommentThing {
    #[serde(rename = "t1")]
    Comment(RedditCommentData),
    #[serde(rename = "more")]
    More(RedditMoreData),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentListing {
    pub kind: String,
    pub data: CommentListingData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentListingData {
    pub children: Vec<CommentThing>,
    pub after: Option<String>,
    pub before: Option<String>,
}

/// `replies` is an empty string when a comment has none.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Replies {
    Listing(Box<CommentListing>),
    Empty(String),
}

impl Default for Replies {
    fn default() -> Self {
        Replies::Empty(String::new())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditCommentData {
    pub id: String,
    pub name: String,
    pub parent_id: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub replies: Replies,
    pub depth: Option<u32>,
    pub score: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditMoreData {
    pub id: String,
    pub parent_id: String,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub children: Vec<String>,
}

impl RedditMoreData {
    /// A "continue this thread" link: Reddit lists no ids and wants the
    /// parent's subtree fetched on its own.
    pub fn is_continuation(&self) -> bool {
        self.children.is_empty()
    }
}

/// Work left after a round of expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingStub {
    /// Comment ids to fetch through `morechildren`.
    Children(Vec<String>),
    /// Fullname of a comment whose deeper replies must be fetched as a subtree.
    Continuation(String),
}

#[derive(Debug)]
struct Node {
    comment: Comment,
    children: Vec<usize>,
}

#[derive(Debug)]
pub struct CommentForest {
    link_fullname: String,
    nodes: Vec<Node>,
    roots: Vec<usize>,
    by_fullname: HashMap<String, usize>,
    pending: Vec<PendingStub>,
    queued_continuations: HashSet<String>,
}

impl CommentForest {
    pub fn new(link_id: &str) -> Self {
        Self {
            link_fullname: format!("t3_{}", link_id),
            nodes: Vec::new(),
            roots: Vec::new(),
            by_fullname: HashMap::new(),
            pending: Vec::new(),
            queued_continuations: HashSet::new(),
        }
    }

    pub fn link_fullname(&self) -> &str {
        &self.link_fullname
    }

    pub fn comment_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn take_pending(&mut self) -> Vec<PendingStub> {
        std::mem::take(&mut self.pending)
    }

    /// Adds things in listing order; nested replies follow their parent.
    pub fn insert_all(&mut self, things: Vec<CommentThing>) {
        for thing in things {
            self.insert(thing);
        }
    }

    fn insert(&mut self, thing: CommentThing) {
        match thing {
            CommentThing::Comment(data) => self.insert_comment(data),
            CommentThing::More(more) => self.queue_more(more),
        }
    }

    fn insert_comment(&mut self, data: RedditCommentData) {
        let RedditCommentData {
            id,
            name,
            parent_id,
            author,
            body,
            replies,
            ..
        } = data;

        if !self.by_fullname.contains_key(&name) {
            let author = author.filter(|a| a != DELETED_AUTHOR);
            let slot = self.nodes.len();
            self.nodes.push(Node {
                comment: Comment::new(id, author.as_deref(), body),
                children: Vec::new(),
            });
            self.by_fullname.insert(name, slot);

            match self.by_fullname.get(&parent_id) {
                Some(&parent) if parent != slot => self.nodes[parent].children.push(slot),
                _ => {
                    if parent_id != self.link_fullname {
                        debug!("Parent {} not loaded, keeping comment at top level", parent_id);
                    }
                    self.roots.push(slot);
                }
            }
        }

        // Replies of an already known comment may still carry new descendants
        if let Replies::Listing(listing) = replies {
            self.insert_all(listing.data.children);
        }
    }

    fn queue_more(&mut self, more: RedditMoreData) {
        if !more.is_continuation() {
            self.pending.push(PendingStub::Children(more.children));
        } else if more.parent_id != self.link_fullname
            && self.queued_continuations.insert(more.parent_id.clone())
        {
            self.pending.push(PendingStub::Continuation(more.parent_id));
        }
    }

    pub fn into_thread(self, title: String) -> Thread {
        let CommentForest {
            link_fullname,
            nodes,
            roots,
            ..
        } = self;

        let mut slots: Vec<Option<Node>> = nodes.into_iter().map(Some).collect();
        let comments = roots
            .into_iter()
            .filter_map(|slot| build(&mut slots, slot))
            .collect();

        Thread {
            id: link_fullname.trim_start_matches("t3_").to_string(),
            title,
            comments,
        }
    }
}

fn build(slots: &mut [Option<Node>], slot: usize) -> Option<Comment> {
    let Node { comment, children } = slots[slot].take()?;
    let replies = children
        .into_iter()
        .filter_map(|child| build(slots, child))
        .collect();
    Some(comment.with_replies(replies))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(json: &str) -> Vec<CommentThing> {
        let listing: CommentListing = serde_json::from_str(json).unwrap();
        listing.data.children
    }

    const INITIAL: &str = r#"{
        "kind": "Listing",
        "data": {
            "after": null, "before": null,
            "children": [
                {"kind": "t1", "data": {
                    "id": "c1", "name": "t1_c1", "parent_id": "t3_post",
                    "author": "alice", "body": "NTA obviously", "depth": 0,
                    "replies": {"kind": "Listing", "data": {"after": null, "before": null, "children": [
                        {"kind": "t1", "data": {
                            "id": "c2", "name": "t1_c2", "parent_id": "t1_c1",
                            "author": "[deleted]", "body": "[removed]", "depth": 1, "replies": ""
                        }},
                        {"kind": "more", "data": {
                            "id": "_", "parent_id": "t1_c2", "count": 0, "children": []
                        }}
                    ]}}
                }},
                {"kind": "t1", "data": {
                    "id": "c3", "name": "t1_c3", "parent_id": "t3_post",
                    "author": "bob", "body": "YTA", "depth": 0, "replies": ""
                }},
                {"kind": "more", "data": {
                    "id": "c4", "parent_id": "t3_post", "count": 2, "children": ["c4", "c5"]
                }}
            ]
        }
    }"#;

    #[test]
    fn test_initial_listing_builds_forest() {
        let mut forest = CommentForest::new("post");
        forest.insert_all(listing(INITIAL));

        assert_eq!(forest.comment_count(), 3);
        assert_eq!(
            forest.take_pending(),
            vec![
                PendingStub::Continuation("t1_c2".to_string()),
                PendingStub::Children(vec!["c4".to_string(), "c5".to_string()]),
            ]
        );

        let thread = forest.into_thread("AITA?".to_string());
        assert_eq!(thread.id, "post");
        assert_eq!(thread.comments.len(), 2);
        assert_eq!(thread.comments[0].replies.len(), 1);
        // Deleted accounts lose their author
        assert_eq!(thread.comments[0].replies[0].author, None);
        assert_eq!(thread.comments[1].author.as_deref(), Some("bob"));
    }

    #[test]
    fn test_more_children_attach_to_parents() {
        let mut forest = CommentForest::new("post");
        forest.insert_all(listing(INITIAL));
        forest.take_pending();

        // morechildren answers with a flat list; parents come before children
        let things: Vec<CommentThing> = serde_json::from_str(
            r#"[
                {"kind": "t1", "data": {"id": "c4", "name": "t1_c4", "parent_id": "t3_post",
                    "author": "carol", "body": "NTA", "replies": ""}},
                {"kind": "t1", "data": {"id": "c6", "name": "t1_c6", "parent_id": "t1_c4",
                    "author": "dave", "body": "agreed, NTA", "replies": ""}},
                {"kind": "t1", "data": {"id": "c5", "name": "t1_c5", "parent_id": "t3_post",
                    "author": "erin", "body": "ESH", "replies": ""}},
                {"kind": "more", "data": {"id": "c7", "parent_id": "t1_c6", "count": 1,
                    "children": ["c7"]}}
            ]"#,
        )
        .unwrap();
        forest.insert_all(things);

        assert!(forest.has_pending());
        assert_eq!(
            forest.take_pending(),
            vec![PendingStub::Children(vec!["c7".to_string()])]
        );

        let thread = forest.into_thread("AITA?".to_string());
        let top: Vec<&str> = thread.comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(top, vec!["c1", "c3", "c4", "c5"]);
        assert_eq!(thread.comments[2].replies[0].id, "c6");
        assert_eq!(thread.flatten().len(), 6);
    }

    #[test]
    fn test_duplicate_comments_are_ignored() {
        let mut forest = CommentForest::new("post");
        forest.insert_all(listing(INITIAL));
        forest.insert_all(listing(INITIAL));
        assert_eq!(forest.comment_count(), 3);

        // The same continuation is only queued once per forest
        let continuations = forest
            .take_pending()
            .into_iter()
            .filter(|p| matches!(p, PendingStub::Continuation(_)))
            .count();
        assert_eq!(continuations, 1);
    }
}
