// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Pistin Scanner Library
 * Adaptive SQL injection scanning engine
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod adaptive_concurrency;
pub mod config;
pub mod crawler;
pub mod fingerprint;
pub mod http_client;
pub mod payloads;
pub mod rate_limiter;
pub mod types;

// Scanner modules
pub mod scanners;

// Production error handling
pub mod errors;

// Reporting and consolidation
pub mod reporting;
