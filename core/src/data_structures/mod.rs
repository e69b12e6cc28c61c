//! Graph and residual-network data structures
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod graph;
pub mod residual;
pub mod current_arc;
pub mod levels;
