// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// doc2any-stats — Persistent counters of successful conversions.

pub mod counters;

pub use counters::{ConversionStats, StatsTotals, format_size};
