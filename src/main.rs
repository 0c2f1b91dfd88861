use phrase_chart::{ChartPanel, ChartRenderer};
use reddit_client::{RedditCredentials, RedditSession};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use verdict_core::{
    count_phrases, harvest, select_top, AppConfig, ConfigError, CoreError, ErrorExt,
    HarvestOutput, HarvestRequest, StopWords,
};

const DEFAULT_LOG_FILTER: &str =
    "verdict_phrases=info,verdict_core=info,reddit_client=info,phrase_chart=info";

#[tokio::main]
async fn main() -> ExitCode {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting verdict-phrases");

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    match run(config_path.as_deref()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.log_error();
            eprintln!("{}", e.user_friendly_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(config_path: Option<&Path>) -> Result<(), CoreError> {
    let config = AppConfig::load(config_path)?;
    let session = RedditSession::connect(credentials(&config)?).await?;

    let request = HarvestRequest::new(
        config.source_channel.clone(),
        config.post_count,
        config.expansion_limit()?,
    );
    let classifier = if config.classify {
        Some(config.classifier()?)
    } else {
        None
    };

    let harvested = harvest(
        &session,
        &request,
        &config.comment_filter(),
        classifier.as_ref(),
    )
    .await?;

    let panels = build_panels(&harvested.output, &config.stop_word_set(), config.bar_count);
    if panels.is_empty() {
        return Err(CoreError::EmptyResultSet {
            channel: config.source_channel.clone(),
        });
    }

    let chart = ChartRenderer::new().render(&panels)?;
    chart.save_png(&config.output_path)?;

    let title = post_title(&harvested.output, config.post_count, &config.source_channel);
    if config.dry_run {
        info!("Dry run, not posting \"{}\"", title);
        return Ok(());
    }

    let file_name = config
        .output_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("top_phrases_combined.png");
    let post = session
        .submit_image(&config.destination_channel, &title, file_name, chart.png)
        .await?;

    match post.url.or(post.user_submitted_page) {
        Some(url) => info!("Posted to r/{}: {}", config.destination_channel, url),
        None => info!("Posted to r/{}", config.destination_channel),
    }
    Ok(())
}

fn credentials(config: &AppConfig) -> Result<RedditCredentials, ConfigError> {
    let field = |name: &str, value: &Option<String>| {
        value.clone().ok_or_else(|| ConfigError::MissingField {
            field: name.to_string(),
        })
    };

    Ok(RedditCredentials::new(
        field("reddit.client_id", &config.reddit.client_id)?,
        field("reddit.client_secret", &config.reddit.client_secret)?,
        field("reddit.refresh_token", &config.reddit.refresh_token)?,
        config.reddit.user_agent.clone(),
    ))
}

/// One panel per group that produced at least one phrase.
fn build_panels(output: &HarvestOutput, stop_words: &StopWords, bar_count: usize) -> Vec<ChartPanel> {
    let groups: Vec<(Option<String>, &[String])> = match output {
        HarvestOutput::All(bodies) => vec![(None, bodies.as_slice())],
        HarvestOutput::ByVerdict(groups) => groups
            .iter()
            .map(|(category, bodies)| (Some(category.label()), bodies.as_slice()))
            .collect(),
    };

    let mut panels = Vec::new();
    for (label, bodies) in groups {
        let name = label.as_deref().unwrap_or("all comments");
        info!("Processing {} ({} comments)", name, bodies.len());

        let table = count_phrases(bodies, stop_words);
        if table.is_empty() {
            warn!("No phrases found for {}", name);
            continue;
        }
        panels.push(ChartPanel::from_phrases(label, &select_top(&table, bar_count)));
    }
    panels
}

fn post_title(output: &HarvestOutput, post_count: u32, channel: &str) -> String {
    let lead = format!(
        "I've Analyzed {} comments from the current top {} hot posts of r/{}.",
        output.comment_count(),
        post_count,
        channel
    );
    if output.is_classified() {
        format!(
            "{} Here are the most frequently used 2-word phrases by NTA or YTA category [OC]",
            lead
        )
    } else {
        format!("{} Here are the most frequently used 2-word phrases [OC]", lead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use verdict_core::VerdictCategory;

    fn by_verdict(asshole: &[&str], not_asshole: &[&str]) -> HarvestOutput {
        let mut groups = BTreeMap::new();
        groups.insert(
            VerdictCategory::Asshole,
            asshole.iter().map(|s| s.to_string()).collect(),
        );
        groups.insert(
            VerdictCategory::NotAsshole,
            not_asshole.iter().map(|s| s.to_string()).collect(),
        );
        HarvestOutput::ByVerdict(groups)
    }

    #[test]
    fn test_titles() {
        let output = by_verdict(&["YTA here"], &["NTA", "NTA too"]);
        assert_eq!(
            post_title(&output, 200, "amitheasshole"),
            "I've Analyzed 3 comments from the current top 200 hot posts of r/amitheasshole. \
             Here are the most frequently used 2-word phrases by NTA or YTA category [OC]"
        );

        let all = HarvestOutput::All(vec!["one two".to_string()]);
        assert_eq!(
            post_title(&all, 100, "conservative"),
            "I've Analyzed 1 comments from the current top 100 hot posts of r/conservative. \
             Here are the most frequently used 2-word phrases [OC]"
        );
    }

    #[test]
    fn test_empty_groups_are_skipped() {
        let output = by_verdict(&["you are the asshole for sure"], &["NTA"]);
        let panels = build_panels(&output, &StopWords::empty(), 10);

        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].label.as_deref(), Some("ASSHOLE"));
        assert_eq!(panels[0].bars[0], ("you are".to_string(), 1));
    }

    #[test]
    fn test_single_group_has_no_label() {
        let output = HarvestOutput::All(vec![
            "you are the asshole for sure".to_string(),
            "you are kind".to_string(),
        ]);
        let panels = build_panels(&output, &StopWords::empty(), 1);

        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].label, None);
        assert_eq!(panels[0].bars, vec![("you are".to_string(), 2)]);
    }

    #[test]
    fn test_nothing_to_chart() {
        let output = by_verdict(&[], &["NTA"]);
        assert!(build_panels(&output, &StopWords::empty(), 10).is_empty());
    }

    #[test]
    fn test_credentials_require_all_fields() {
        let config = AppConfig::default();
        assert!(matches!(
            credentials(&config),
            Err(ConfigError::MissingField { .. })
        ));
    }
}
