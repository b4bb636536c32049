// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Doc2Any — Core types, format registry and error definitions shared across all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod registry;
pub mod types;

pub use config::ConverterConfig;
pub use error::Doc2AnyError;
pub use types::*;
