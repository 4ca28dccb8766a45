// SPDX-License-Identifier: MIT

//! Helpers for folding this crate's I/O errors into the shared domain
//! error type so callers only ever see `lightsched_core::error::StoreError`.

use lightsched_core::StoreError;

pub fn persistence_err<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Persistence(e.to_string())
}
