// src/lib.rs

//! rexport: reconciling incremental Reddit data exports.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
