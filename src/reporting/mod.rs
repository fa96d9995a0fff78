// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

pub mod consolidation;

pub use consolidation::FindingConsolidator;
