use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
    Extension,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Fixed-window request counter keyed by client address.
#[derive(Clone)]
pub struct RateLimiter {
    // client -> (requests in window, window start)
    clients: Arc<Mutex<HashMap<String, (u32, Instant)>>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_seconds: u64) -> Self {
        Self {
            clients: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window: Duration::from_secs(window_seconds),
        }
    }

    /// Count one request from `client`. False once the window's budget is spent.
    pub fn check(&self, client: &str) -> bool {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> bool {
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());

        let (count, window_start) = clients.entry(client.to_string()).or_insert((0, now));
        if now.duration_since(*window_start) > self.window {
            *count = 0;
            *window_start = now;
        }
        if *count >= self.max_requests {
            return false;
        }
        *count += 1;
        true
    }

    pub fn cleanup_expired(&self) {
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        clients.retain(|_, (_, window_start)| now.duration_since(*window_start) <= self.window);
    }
}

/// Limits admin login attempts per client IP.
pub async fn login_rate_limit_middleware(
    Extension(state): Extension<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client_ip = connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if !state.login_limiter.check(&client_ip) {
        tracing::warn!("Login rate limit exceeded for IP: {}", client_ip);
        return Err(AppError::RateLimited);
    }

    if rand::random::<u8>() < 10 {
        state.login_limiter.cleanup_expired();
    }

    Ok(next.run(request).await)
}
