//! Ingestion-time screening of comments.
//!
//! A comment is kept only when it has a resolvable author who is not on the
//! excluded list and its body is not media or emoji noise.

use crate::types::Comment;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Links to video and image hosts. Such comments are boilerplate, not prose.
static MEDIA_NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.gifv?\b|\bgifv?\b|v\.redd\.it|gfycat|imgur\.com/\w{5,7}").unwrap()
});

/// Colon-delimited emoji shorthand such as `:smile:`.
static EMOJI_MARKUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":\w+:").unwrap());

/// Outcome of screening a single comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screening {
    Keep,
    MissingAuthor,
    ExcludedAuthor,
    Noise,
}

pub fn is_noise(body: &str) -> bool {
    MEDIA_NOISE.is_match(body) || EMOJI_MARKUP.is_match(body)
}

#[derive(Debug, Clone, Default)]
pub struct CommentFilter {
    excluded_users: HashSet<String>,
}

impl CommentFilter {
    pub fn new<I, S>(excluded_users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded_users: excluded_users.into_iter().map(Into::into).collect(),
        }
    }

    /// Exact, case-sensitive membership.
    pub fn is_excluded(&self, author: &str) -> bool {
        self.excluded_users.contains(author)
    }

    pub fn screen(&self, comment: &Comment) -> Screening {
        let author = match comment.author.as_deref() {
            Some(name) => name,
            None => return Screening::MissingAuthor,
        };

        if self.is_excluded(author) {
            return Screening::ExcludedAuthor;
        }

        if is_noise(&comment.body) {
            return Screening::Noise;
        }

        Screening::Keep
    }
}
