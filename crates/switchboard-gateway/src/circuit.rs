// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Per-session circuit breaker: a session that racks up more than
//! `max_session_errors` non-fatal errors inside `error_window_ms` trips, and
//! the gateway closes it with `CircuitBreakerTripped` rather than letting a
//! misbehaving agent or client spin forever.

use std::time::{Duration, Instant};

/// Tracks one session's recent error timestamps.
pub struct SessionCircuit {
    max_errors: u32,
    window: Duration,
    errors: Vec<Instant>,
}

impl SessionCircuit {
    pub fn new(max_errors: u32, window_ms: u64) -> Self {
        Self {
            max_errors,
            window: Duration::from_millis(window_ms),
            errors: Vec::new(),
        }
    }

    /// Records a non-fatal error and reports whether the breaker has
    /// tripped as a result.
    pub fn record_error(&mut self) -> bool {
        let now = Instant::now();
        self.errors.retain(|t| now.duration_since(*t) <= self.window);
        self.errors.push(now);
        self.errors.len() as u32 > self.max_errors
    }
}
