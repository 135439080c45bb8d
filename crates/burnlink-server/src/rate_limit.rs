//! Per-IP token bucket limiter applied to every route.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use tracing::warn;

use crate::config::ServerConfig;
use crate::error::ServerError;

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_seen: Instant,
}

impl Bucket {
    fn full(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_seen: now,
        }
    }

    fn try_take(&mut self, rate: f64, capacity: f64, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_seen).as_secs_f64();
        self.last_seen = now;
        self.tokens = (self.tokens + elapsed * rate).min(capacity);

        if self.tokens < 1.0 {
            return false;
        }
        self.tokens -= 1.0;
        true
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<Mutex<HashMap<IpAddr, Bucket>>>,
    per_sec: f64,
    burst: f64,
}

impl RateLimiter {
    pub fn new(per_sec: f64, burst: f64) -> Self {
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            per_sec,
            burst,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.rate_limit_per_sec, config.rate_limit_burst)
    }

    /// Whether `ip` may make another request right now.
    pub async fn check(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;
        buckets
            .entry(ip)
            .or_insert_with(|| Bucket::full(self.burst, now))
            .try_take(self.per_sec, self.burst, now)
    }

    /// Drop buckets idle for at least `max_idle`. Returns how many went.
    pub async fn purge_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;
        let before = buckets.len();
        buckets.retain(|_, bucket| now.saturating_duration_since(bucket.last_seen) < max_idle);
        before - buckets.len()
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    req: Request,
    next: Next,
) -> Response {
    if let Some(ip) = client_ip(&req) {
        if !limiter.check(ip).await {
            warn!(%ip, "Rate limit exceeded");
            return ServerError::RateLimited.into_response();
        }
    }

    next.run(req).await
}

/// ConnectInfo first, then `X-Forwarded-For`, then `X-Real-IP`.
fn client_ip(req: &Request) -> Option<IpAddr> {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return Some(addr.ip());
    }

    let header_ip = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    };

    header_ip("x-forwarded-for").or_else(|| header_ip("x-real-ip"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[tokio::test]
    async fn test_burst_then_reject() {
        let limiter = RateLimiter::new(1.0, 3.0);
        let ip: IpAddr = "127.0.0.1".parse().unwrap();

        for _ in 0..3 {
            assert!(limiter.check(ip).await);
        }
        assert!(!limiter.check(ip).await);
    }

    #[tokio::test]
    async fn test_buckets_are_per_ip() {
        let limiter = RateLimiter::new(1.0, 1.0);
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(limiter.check(a).await);
        assert!(!limiter.check(a).await);
        assert!(limiter.check(b).await);
    }

    #[tokio::test]
    async fn test_purge_idle() {
        let limiter = RateLimiter::new(10.0, 5.0);
        limiter.check("192.168.1.1".parse().unwrap()).await;

        assert_eq!(limiter.purge_idle(Duration::from_secs(600)).await, 0);
        assert_eq!(limiter.purge_idle(Duration::ZERO).await, 1);
        assert!(limiter.buckets.lock().await.is_empty());
    }

    #[test]
    fn test_client_ip_from_headers() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&req), Some("203.0.113.7".parse().unwrap()));

        let req = Request::builder()
            .header("x-real-ip", "198.51.100.2")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&req), Some("198.51.100.2".parse().unwrap()));

        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_ip(&req), None);
    }
}
