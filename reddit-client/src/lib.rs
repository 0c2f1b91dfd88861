pub mod api;
pub mod auth;
pub mod comments;
pub mod rate_limiter;
pub mod session;

pub use api::{RedditApiClient, SubmittedPost};
pub use auth::{RedditCredentials, RedditToken};
pub use session::{RedditEndpoints, RedditSession};

#[cfg(test)]
mod tests;
