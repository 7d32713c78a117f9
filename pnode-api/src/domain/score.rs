// This file is part of pnode-dashboard.
// Copyright (C) 2025 pNode Dashboard Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::domain::NodeStatus;

/// Nodes seen within this window are online.
pub const ONLINE_WITHIN_SECS: u64 = 5 * 60;

/// Nodes seen within this window, but outside the online window, are warning.
pub const WARNING_WITHIN_SECS: u64 = 30 * 60;

// X-Score weights. Policy constants: only monotonicity and boundedness are contractual.
const W_STATUS: f64 = 0.35;
const W_UPTIME: f64 = 0.25;
const W_STORAGE: f64 = 0.20;
const W_CREDITS: f64 = 0.20;

/// Uptime at which the uptime component reaches one half.
const UPTIME_SATURATION_SECS: f64 = 30.0 * 24.0 * 3600.0;

/// Credit balance at which the credits component reaches one half.
const CREDITS_SATURATION: f64 = 10_000.0;

/// Liveness category from last-seen recency.
pub fn status_for(now: u64, last_seen: u64) -> NodeStatus {
    let age = now.saturating_sub(last_seen);
    if age <= ONLINE_WITHIN_SECS {
        NodeStatus::Online
    } else if age <= WARNING_WITHIN_SECS {
        NodeStatus::Warning
    } else {
        NodeStatus::Offline
    }
}

/// Composite performance score in [0, 100], the "X-Score".
///
/// Monotone non-decreasing in uptime, in credits and along offline → warning → online, all
/// else equal.
pub fn x_score(
    status: NodeStatus,
    uptime_secs: u64,
    storage_usage_percent: f64,
    credits: f64,
) -> f64 {
    let status_component = match status {
        NodeStatus::Online => 1.0,
        NodeStatus::Warning => 0.5,
        NodeStatus::Offline => 0.0,
    };

    let uptime = uptime_secs as f64;
    let uptime_component = uptime / (uptime + UPTIME_SATURATION_SECS);

    let storage_component = if storage_usage_percent.is_finite() {
        (storage_usage_percent / 100.0).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let credits = if credits.is_finite() { credits.max(0.0) } else { 0.0 };
    let credits_component = credits / (credits + CREDITS_SATURATION);

    let score = 100.0
        * (W_STATUS * status_component
            + W_UPTIME * uptime_component
            + W_STORAGE * storage_component
            + W_CREDITS * credits_component);

    score.clamp(0.0, 100.0)
}
