//! # Quiz Chain Solver
//!
//! 接收答题请求，用浏览器渲染题目页面，借助 LLM 分析并计算答案，
//! 提交后沿着服务器给出的下一题地址继续，直到完成、超时或重试耗尽
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Browser），只暴露能力
//! - `PageFetcher` - 渲染页面、下载文件
//!
//! ### ② 客户端（Clients）
//! - `LlmClient` - 文本补全
//! - `SubmitClient` - 提交答案
//!
//! ### ③ 业务能力层（Services）
//! - `QuestionAnalyzer` - 读懂题目，解析失败时降级
//! - `ContentExtractor` - 把下载文件变成结构化数据
//! - `AnswerComputer` - 计算答案并按形态转换
//!
//! ### ④ 流程层（Workflow）
//! - `QuizFlow` - 一道题的完整流程（fetch → analyze → extract → compute）
//! - `QuizSession` - 一条答题链的会话状态
//!
//! ### ⑤ 编排层（Orchestration）
//! - `ChainController` - 答题链循环（前进 / 重试 / 停止）
//! - `ChainSupervisor` - 后台调度答题链，返回 `JoinHandle`
//!
//! ### ⑥ HTTP 边界（Api）
//! - `POST /quiz`、`GET /health`、`GET /`

pub mod api;
pub mod app;
pub mod browser;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use orchestrator::{ChainController, ChainOutcome, ChainReport, ChainSupervisor, QuizContext};
pub use workflow::{QuizFlow, QuizSession, QuizSolver};
