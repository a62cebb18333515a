// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod cli;
pub mod compose;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod health;
pub mod kubernetes;
pub mod packages;
pub mod preflight;
pub mod prompt;
pub mod readiness;
pub mod shell;
pub mod strategy;
pub mod types;

#[cfg(test)]
pub mod test_utils;
