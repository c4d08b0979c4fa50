//! PromptShare 后端服务：prompt 信息流、嵌套回复、用户档案与社区。

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
