// 核心数据结构和类型定义

pub mod types;
pub mod timer;
pub mod config;
pub mod error;

pub use types::*;
pub use timer::*;
pub use config::*;
pub use error::*;
