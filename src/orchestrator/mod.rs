//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `context` - 能力上下文
//! - 显式持有配置和所有协作者（求解器、提交器）
//!
//! ### `chain_controller` - 答题链控制器
//! - 对单个会话循环执行"求解 → 提交"
//! - 决定前进、重试还是停止
//!
//! ### `supervisor` - 答题链调度器
//! - 为每个请求启动后台任务，返回 `JoinHandle`
//! - 统计运行中的答题链数量
//!
//! ## 层次关系
//!
//! ```text
//! supervisor (处理多个请求)
//!     ↓
//! chain_controller (处理一条答题链)
//!     ↓
//! workflow::QuizFlow (处理单道题)
//!     ↓
//! services (能力层：analyze / extract / compute)
//!     ↓
//! infrastructure (基础设施：PageFetcher)
//! ```

pub mod chain_controller;
pub mod context;
pub mod supervisor;

pub use chain_controller::{ChainController, ChainOutcome, ChainReport};
pub use context::QuizContext;
pub use supervisor::ChainSupervisor;
