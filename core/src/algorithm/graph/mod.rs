//! Maximum flow over residual networks
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod max_flow;
pub mod preflow_push;
pub mod relabel_budget;

pub use self::max_flow::{MaxFlowSolver, PreflowPushConfig, FlowResult, MinimumCut};
pub use self::preflow_push::PreflowPush;
pub use self::relabel_budget::GlobalRelabelBudget;
