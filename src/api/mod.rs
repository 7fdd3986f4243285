//! API 模块
//!
//! 对外暴露的题库操作入口

pub mod portal;

pub use portal::PortalApi;
