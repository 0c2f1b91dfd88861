use reddit_client::{RedditCredentials, RedditSession};
use std::env;
use verdict_core::{ExpansionLimit, ThreadSource};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("=== Reddit thread preview ===\n");

    let read = |name: &str| env::var(name).unwrap_or_default();
    let credentials = RedditCredentials::new(
        read("REDDIT_CLIENT_ID"),
        read("REDDIT_CLIENT_SECRET"),
        read("REDDIT_REFRESH_TOKEN"),
        "rust:verdict-phrases-preview:v0.1.0".to_string(),
    );
    if credentials.refresh_token.secret().is_empty() {
        println!("Set REDDIT_CLIENT_ID, REDDIT_CLIENT_SECRET and REDDIT_REFRESH_TOKEN first.");
        return Ok(());
    }

    let subreddit = env::args().nth(1).unwrap_or_else(|| "amitheasshole".to_string());
    let session = RedditSession::connect(credentials).await?;
    println!("Connected, reading r/{}\n", subreddit);

    let handles = session.list_hot(&subreddit, 3).await?;
    for handle in &handles {
        let thread = session
            .expand_replies(handle, ExpansionLimit::Rounds(1))
            .await?;
        let comments = thread.flatten();
        println!("{} ({} comments)", thread.title, comments.len());
        for comment in comments.iter().take(3) {
            let author = comment.author.as_deref().unwrap_or("[deleted]");
            let preview: String = comment.body.chars().take(80).collect();
            println!("  {}: {}", author, preview.replace('\n', " "));
        }
        println!();
    }

    let status = session.api().get_rate_limit_status().await;
    println!(
        "Requests made: {}, server budget left: {:?}",
        status.requests_made, status.server_remaining
    );
    Ok(())
}
