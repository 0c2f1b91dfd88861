use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub time_window: Duration,
    pub burst_allowance: u32,
}

impl RateLimitConfig {
    pub fn reddit_oauth() -> Self {
        Self {
            max_requests: 100, // Reddit allows 100 requests per minute for OAuth2
            time_window: Duration::from_secs(60),
            burst_allowance: 10,
        }
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

#[derive(Debug)]
pub struct TokenBucket {
    state: Mutex<BucketState>,
    capacity: f64,
    refill_rate: f64, // tokens per second
}

impl TokenBucket {
    pub fn new(config: &RateLimitConfig) -> Self {
        let capacity = config.burst_allowance as f64;
        let refill_rate = config.max_requests as f64 / config.time_window.as_secs_f64();

        Self {
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
            capacity,
            refill_rate,
        }
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill);
        state.tokens = (state.tokens + elapsed.as_secs_f64() * self.refill_rate).min(self.capacity);
        state.last_refill = now;
    }

    /// Takes `tokens_needed` tokens, or reports how long until they are available.
    pub async fn acquire(&self, tokens_needed: f64) -> Result<(), Duration> {
        let mut state = self.state.lock().await;
        self.refill(&mut state);

        if state.tokens >= tokens_needed {
            state.tokens -= tokens_needed;
            Ok(())
        } else {
            let missing = tokens_needed - state.tokens;
            Err(Duration::from_secs_f64(missing / self.refill_rate))
        }
    }

    pub async fn get_available_tokens(&self) -> f64 {
        let mut state = self.state.lock().await;
        self.refill(&mut state);
        state.tokens
    }
}

/// Budget reported by Reddit in the `x-ratelimit-*` response headers.
#[derive(Debug, Clone, Copy)]
struct ServerBudget {
    remaining: f64,
    resets_at: Instant,
}

#[derive(Debug, Default)]
struct Counters {
    requests: u64,
    total_wait: Duration,
}

/// Paces requests to stay inside Reddit's OAuth quota. Requests are made one
/// at a time, so the limiter only ever delays; it never rejects.
#[derive(Debug)]
pub struct RateLimiter {
    token_bucket: TokenBucket,
    config: RateLimitConfig,
    server_budget: Mutex<Option<ServerBudget>>,
    counters: Mutex<Counters>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            token_bucket: TokenBucket::new(&config),
            config,
            server_budget: Mutex::new(None),
            counters: Mutex::new(Counters::default()),
        }
    }

    pub async fn acquire_permit(&self) -> RateLimitPermit {
        let start_time = Instant::now();

        let server_wait = {
            let budget = self.server_budget.lock().await;
            match *budget {
                Some(b) if b.remaining < 1.0 => b.resets_at.checked_duration_since(Instant::now()),
                _ => None,
            }
        };
        if let Some(wait) = server_wait {
            tracing::warn!("Reddit request budget exhausted, waiting {:?} for reset", wait);
            sleep(wait).await;
        }

        loop {
            match self.token_bucket.acquire(1.0).await {
                Ok(()) => break,
                Err(wait_time) => {
                    tracing::debug!("Rate limit reached, waiting {:?}", wait_time);
                    sleep(wait_time).await;
                }
            }
        }

        let queue_wait_time = start_time.elapsed();
        let mut counters = self.counters.lock().await;
        counters.requests += 1;
        counters.total_wait += queue_wait_time;

        RateLimitPermit { queue_wait_time }
    }

    /// Records the remaining request budget and seconds until reset reported by Reddit.
    pub async fn record_server_budget(&self, remaining: f64, reset_in: Duration) {
        let mut budget = self.server_budget.lock().await;
        *budget = Some(ServerBudget {
            remaining,
            resets_at: Instant::now() + reset_in,
        });
    }

    pub async fn get_rate_limit_status(&self) -> RateLimitStatus {
        let available_tokens = self.token_bucket.get_available_tokens().await;
        let counters = self.counters.lock().await;
        let server_remaining = (*self.server_budget.lock().await).map(|b| b.remaining as u32);

        RateLimitStatus {
            available_tokens: available_tokens as u32,
            max_tokens: self.config.burst_allowance,
            requests_per_minute: self.config.max_requests,
            requests_made: counters.requests,
            total_wait_time: counters.total_wait,
            server_remaining,
        }
    }
}

#[derive(Debug)]
pub struct RateLimitPermit {
    pub queue_wait_time: Duration,
}

#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    pub available_tokens: u32,
    pub max_tokens: u32,
    pub requests_per_minute: u32,
    pub requests_made: u64,
    pub total_wait_time: Duration,
    pub server_remaining: Option<u32>,
}
