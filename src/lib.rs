// src/lib.rs

//! webcorpus: per-language news corpus builder

pub mod error;
pub mod language;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
