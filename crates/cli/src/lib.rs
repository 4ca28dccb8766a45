// SPDX-License-Identifier: MIT

//! Library surface shared between the `lightsched` binary and its tests.

pub mod client;
pub mod commands;
pub mod output;

pub use client::ApiClient;
