//! Correctness validation for computed flows
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod correctness;

#[cfg(test)]
mod integration;

pub use self::correctness::{FlowValidator, ValidationError};
