use std::fmt;

/// A thread as it appears in a channel's hot listing, before its replies are loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadHandle {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    pub id: String,
    pub title: String,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    /// `None` when the account was deleted or the comment removed.
    pub author: Option<String>,
    pub body: String,
    pub replies: Vec<Comment>,
}

impl Comment {
    pub fn new(id: impl Into<String>, author: Option<&str>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            author: author.map(str::to_string),
            body: body.into(),
            replies: Vec::new(),
        }
    }

    pub fn with_replies(mut self, replies: Vec<Comment>) -> Self {
        self.replies = replies;
        self
    }
}

impl Thread {
    /// Every comment of the reply forest, depth-first in reply order.
    pub fn flatten(&self) -> Vec<&Comment> {
        let mut flat = Vec::new();
        let mut stack: Vec<&Comment> = self.comments.iter().rev().collect();
        while let Some(comment) = stack.pop() {
            flat.push(comment);
            stack.extend(comment.replies.iter().rev());
        }
        flat
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VerdictCategory {
    Asshole,
    NotAsshole,
}

impl VerdictCategory {
    pub const ALL: [VerdictCategory; 2] = [VerdictCategory::Asshole, VerdictCategory::NotAsshole];

    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictCategory::Asshole => "asshole",
            VerdictCategory::NotAsshole => "not_asshole",
        }
    }

    /// Upper-case label used for chart panels.
    pub fn label(&self) -> String {
        self.as_str().to_uppercase()
    }
}

impl fmt::Display for VerdictCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many rounds of "load more replies" stubs get resolved per thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionLimit {
    Rounds(u32),
    Unbounded,
}

impl ExpansionLimit {
    /// Whether another round may run after `completed` rounds.
    pub fn allows(&self, completed: u32) -> bool {
        match self {
            ExpansionLimit::Rounds(max) => completed < *max,
            ExpansionLimit::Unbounded => true,
        }
    }
}

impl fmt::Display for ExpansionLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpansionLimit::Rounds(n) => write!(f, "{} rounds", n),
            ExpansionLimit::Unbounded => f.write_str("unbounded"),
        }
    }
}
