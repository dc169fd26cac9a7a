//! Simple in-memory rate limiter for the unauthenticated credential
//! endpoints. Deployments with multiple replicas would need a shared store
//! instead.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct RateLimiter {
    requests: Arc<RwLock<HashMap<String, Vec<Instant>>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window_secs: u64) -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Check if a request is allowed for the given identifier (client IP).
    pub async fn check(&self, identifier: &str) -> bool {
        let now = Instant::now();
        let mut requests = self.requests.write().await;

        let history = requests
            .entry(identifier.to_string())
            .or_insert_with(Vec::new);

        history.retain(|&timestamp| now.duration_since(timestamp) < self.window);

        if history.len() < self.max_requests {
            history.push(now);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blocks_after_limit_within_window() {
        let limiter = RateLimiter::new(3, 60);

        assert!(limiter.check("10.0.0.1").await);
        assert!(limiter.check("10.0.0.1").await);
        assert!(limiter.check("10.0.0.1").await);

        assert!(!limiter.check("10.0.0.1").await);

        // A different client is unaffected
        assert!(limiter.check("10.0.0.2").await);
    }

    #[tokio::test]
    async fn window_expiry_allows_requests_again() {
        let limiter = RateLimiter::new(1, 1);

        assert!(limiter.check("10.0.0.1").await);
        assert!(!limiter.check("10.0.0.1").await);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(limiter.check("10.0.0.1").await);
    }
}
