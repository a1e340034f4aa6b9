// SPDX-License-Identifier: MIT OR Apache-2.0
//! Readiness wait between server spawn and browser open.
//!
//! A fixed sleep here is race-prone: the server may not be listening when
//! the browser opens. The default strategy therefore probes the target
//! address with a connect loop until it accepts or a deadline passes. The
//! fixed delay remains available for callers that want it, and makes no
//! connection attempt at all.

use crate::error::LaunchError;
use crate::plan::WaitStrategy;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tracing::{debug, warn};

/// Outcome of the wait step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WaitOutcome {
    /// The target accepted a TCP connection.
    Ready {
        /// Milliseconds from the start of the wait to the first successful
        /// connect.
        after_ms: u64,
    },
    /// The probe deadline passed without a successful connect. The launcher
    /// still opens the browser afterwards; this is a warning, not a failure.
    TimedOut,
    /// A fixed delay elapsed; no probe was made.
    Waited,
}

/// Extract host and port from an `http://` URL.
///
/// Only plain `http://` targets are supported; the default port is 80 when
/// the authority carries none.
pub fn host_port(url: &str) -> Result<(String, u16), LaunchError> {
    let bad = |reason: &str| LaunchError::BadUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    let rest = url
        .strip_prefix("http://")
        .ok_or_else(|| bad("only http:// targets are supported"))?;
    let authority = rest.split(['/', '?', '#']).next().unwrap_or("");
    if authority.is_empty() {
        return Err(bad("missing host"));
    }

    match authority.rsplit_once(':') {
        Some((host, port)) => {
            if host.is_empty() {
                return Err(bad("missing host"));
            }
            let port = port
                .parse::<u16>()
                .map_err(|_| bad(&format!("invalid port '{port}'")))?;
            Ok((host.to_string(), port))
        }
        None => Ok((authority.to_string(), 80)),
    }
}

/// Probe the target once with a short timeout.
pub async fn probe_once(url: &str) -> Result<bool, LaunchError> {
    let (host, port) = host_port(url)?;
    let addr = format!("{host}:{port}");
    let attempt = tokio::time::timeout(Duration::from_secs(1), TcpStream::connect(&addr)).await;
    Ok(matches!(attempt, Ok(Ok(_))))
}

/// Wait according to `strategy`.
///
/// A probe that never succeeds yields [`WaitOutcome::TimedOut`], not an
/// error: the browser is opened regardless.
pub async fn wait_until_ready(
    url: &str,
    strategy: &WaitStrategy,
) -> Result<WaitOutcome, LaunchError> {
    match strategy {
        WaitStrategy::Delay { duration } => {
            debug!(target: "lp", "fixed delay of {duration:?} before opening the browser");
            tokio::time::sleep(*duration).await;
            Ok(WaitOutcome::Waited)
        }
        WaitStrategy::Probe { timeout, interval } => {
            let (host, port) = host_port(url)?;
            let addr = format!("{host}:{port}");
            let started = Instant::now();
            let deadline = started + *timeout;

            loop {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    warn!(
                        target: "lp",
                        "{addr} not accepting connections after {timeout:?}"
                    );
                    return Ok(WaitOutcome::TimedOut);
                }

                // Cap each attempt so a black-holed connect cannot overrun
                // the deadline.
                let attempt_cap = remaining.min(*interval).max(Duration::from_millis(10));
                match tokio::time::timeout(attempt_cap, TcpStream::connect(&addr)).await {
                    Ok(Ok(_)) => {
                        let after_ms = started.elapsed().as_millis() as u64;
                        debug!(target: "lp", "{addr} ready after {after_ms} ms");
                        return Ok(WaitOutcome::Ready { after_ms });
                    }
                    Ok(Err(err)) => {
                        debug!(target: "lp", "connect {addr}: {err}");
                        tokio::time::sleep(*interval).await;
                    }
                    Err(_) => {
                        // Attempt timed out; the loop re-checks the deadline.
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn host_port_with_explicit_port() {
        assert_eq!(
            host_port("http://127.0.0.1:5000").unwrap(),
            ("127.0.0.1".to_string(), 5000)
        );
    }

    #[test]
    fn host_port_defaults_to_80() {
        assert_eq!(
            host_port("http://localhost").unwrap(),
            ("localhost".to_string(), 80)
        );
    }

    #[test]
    fn host_port_ignores_path_query_and_fragment() {
        assert_eq!(
            host_port("http://127.0.0.1:5000/labels?x=1#top").unwrap(),
            ("127.0.0.1".to_string(), 5000)
        );
    }

    #[test]
    fn https_is_rejected() {
        let err = host_port("https://127.0.0.1:5000").unwrap_err();
        assert!(matches!(err, LaunchError::BadUrl { .. }));
    }

    #[test]
    fn missing_host_is_rejected() {
        assert!(host_port("http://").is_err());
        assert!(host_port("http://:5000").is_err());
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = host_port("http://127.0.0.1:notaport").unwrap_err();
        assert!(err.to_string().contains("notaport"));
    }

    #[tokio::test]
    async fn probe_succeeds_against_a_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}");

        let strategy = WaitStrategy::Probe {
            timeout: Duration::from_secs(5),
            interval: Duration::from_millis(20),
        };
        let outcome = wait_until_ready(&url, &strategy).await.unwrap();
        assert!(matches!(outcome, WaitOutcome::Ready { .. }));
    }

    #[tokio::test]
    async fn probe_picks_up_a_late_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let url = format!("http://127.0.0.1:{port}");

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            let _hold = TcpListener::bind(("127.0.0.1", port)).await;
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let strategy = WaitStrategy::Probe {
            timeout: Duration::from_secs(5),
            interval: Duration::from_millis(20),
        };
        let outcome = wait_until_ready(&url, &strategy).await.unwrap();
        assert!(matches!(outcome, WaitOutcome::Ready { .. }));
    }

    #[tokio::test]
    async fn probe_times_out_when_nothing_listens() {
        // Bind-then-drop to get a port that is almost certainly closed.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let url = format!("http://127.0.0.1:{port}");

        let strategy = WaitStrategy::Probe {
            timeout: Duration::from_millis(300),
            interval: Duration::from_millis(50),
        };
        let outcome = wait_until_ready(&url, &strategy).await.unwrap();
        assert_eq!(outcome, WaitOutcome::TimedOut);
    }

    #[tokio::test]
    async fn delay_sleeps_and_makes_no_probe() {
        // An unparseable URL proves no probe happens in delay mode.
        let strategy = WaitStrategy::delay(Duration::from_millis(50));
        let started = Instant::now();
        let outcome = wait_until_ready("not-a-url", &strategy).await.unwrap();
        assert_eq!(outcome, WaitOutcome::Waited);
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn probe_once_reflects_listener_state() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}");
        assert!(probe_once(&url).await.unwrap());

        drop(listener);
        assert!(!probe_once(&url).await.unwrap());
    }
}
