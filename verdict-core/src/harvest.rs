use crate::error::{CoreError, HarvestError};
use crate::filter::{CommentFilter, Screening};
use crate::types::{ExpansionLimit, Thread, ThreadHandle, VerdictCategory};
use crate::verdict::VerdictClassifier;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Retrieval of threads and their reply trees from a forum.
#[allow(async_fn_in_trait)]
pub trait ThreadSource {
    async fn list_hot(&self, channel: &str, limit: u32) -> Result<Vec<ThreadHandle>, CoreError>;

    async fn expand_replies(
        &self,
        thread: &ThreadHandle,
        expansion: ExpansionLimit,
    ) -> Result<Thread, CoreError>;
}

#[derive(Debug, Clone)]
pub struct HarvestRequest {
    pub channel: String,
    pub post_count: u32,
    pub expansion: ExpansionLimit,
}

impl HarvestRequest {
    pub fn new(channel: impl Into<String>, post_count: u32, expansion: ExpansionLimit) -> Self {
        Self {
            channel: channel.into(),
            post_count,
            expansion,
        }
    }

    fn validate(&self) -> Result<(), HarvestError> {
        if self.channel.trim().is_empty() {
            return Err(HarvestError::InvalidRequest {
                reason: "channel name is empty".to_string(),
            });
        }
        if self.post_count == 0 {
            return Err(HarvestError::InvalidRequest {
                reason: "post count must be positive".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestOutput {
    All(Vec<String>),
    /// Every category is present, possibly with no comments.
    ByVerdict(BTreeMap<VerdictCategory, Vec<String>>),
}

impl HarvestOutput {
    fn empty(classified: bool) -> Self {
        if classified {
            HarvestOutput::ByVerdict(
                VerdictCategory::ALL
                    .iter()
                    .map(|category| (*category, Vec::new()))
                    .collect(),
            )
        } else {
            HarvestOutput::All(Vec::new())
        }
    }

    fn push(&mut self, category: Option<VerdictCategory>, body: String) {
        match (self, category) {
            (HarvestOutput::All(bodies), _) => bodies.push(body),
            (HarvestOutput::ByVerdict(groups), Some(category)) => {
                groups.entry(category).or_default().push(body)
            }
            (HarvestOutput::ByVerdict(_), None) => {}
        }
    }

    /// Number of comments across all groups.
    pub fn comment_count(&self) -> usize {
        match self {
            HarvestOutput::All(bodies) => bodies.len(),
            HarvestOutput::ByVerdict(groups) => groups.values().map(Vec::len).sum(),
        }
    }

    pub fn is_classified(&self) -> bool {
        matches!(self, HarvestOutput::ByVerdict(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestStats {
    pub threads: usize,
    pub comments_seen: usize,
    pub missing_author: usize,
    pub excluded_author: usize,
    pub noise: usize,
    pub unclassified: usize,
    pub kept: usize,
}

#[derive(Debug, Clone)]
pub struct Harvest {
    pub output: HarvestOutput,
    pub stats: HarvestStats,
}

/// Collects comment bodies from the `post_count` hottest threads of a channel.
///
/// Comments without an author, by an excluded author or consisting of media
/// or emoji noise are skipped. With a classifier, each remaining comment goes
/// to the category of its first verdict marker and is dropped when it has
/// none. Any retrieval failure aborts the whole run.
pub async fn harvest<S: ThreadSource>(
    source: &S,
    request: &HarvestRequest,
    filter: &CommentFilter,
    classifier: Option<&VerdictClassifier>,
) -> Result<Harvest, HarvestError> {
    request.validate()?;

    let channel = request.channel.as_str();
    let handles = source
        .list_hot(channel, request.post_count)
        .await
        .map_err(|e| HarvestError::from_collaborator(channel, e))?;
    info!("Fetched {} hot threads from r/{}", handles.len(), channel);

    let mut output = HarvestOutput::empty(classifier.is_some());
    let mut stats = HarvestStats::default();

    for handle in handles.iter().take(request.post_count as usize) {
        let thread = source
            .expand_replies(handle, request.expansion)
            .await
            .map_err(|e| HarvestError::from_collaborator(channel, e))?;
        stats.threads += 1;

        let comments = thread.flatten();
        debug!("Thread {} has {} comments", thread.id, comments.len());

        for comment in comments {
            stats.comments_seen += 1;
            match filter.screen(comment) {
                Screening::Keep => {}
                Screening::MissingAuthor => {
                    stats.missing_author += 1;
                    continue;
                }
                Screening::ExcludedAuthor => {
                    stats.excluded_author += 1;
                    continue;
                }
                Screening::Noise => {
                    stats.noise += 1;
                    continue;
                }
            }

            let category = match classifier {
                Some(classifier) => match classifier.classify(&comment.body) {
                    Some(category) => Some(category),
                    None => {
                        stats.unclassified += 1;
                        continue;
                    }
                },
                None => None,
            };

            stats.kept += 1;
            output.push(category, comment.body.clone());
        }
    }

    match &output {
        HarvestOutput::All(bodies) => {
            info!("Number of comments collected: {}", bodies.len());
        }
        HarvestOutput::ByVerdict(groups) => {
            let summary: Vec<String> = groups
                .iter()
                .map(|(category, bodies)| format!("{} ({})", bodies.len(), category))
                .collect();
            info!("Number of comments in each category: {}", summary.join(", "));
        }
    }
    debug!("Harvest stats: {:?}", stats);

    Ok(Harvest { output, stats })
}
