use thiserror::Error;

use super::types::Generation;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("原生播放失败: {0}")]
    SourceUnplayableNative(String),

    #[error("嵌入播放失败: {0}")]
    SourceUnplayableEmbedded(String),

    #[error("平台不支持全屏")]
    FullscreenUnsupported,

    #[error("屏幕方向锁定被拒绝: {0}")]
    OrientationLockRejected(String),

    /// 来自已被替换的播放面的过期事件
    #[error("过期事件: 事件代数 {event_generation}, 当前代数 {current_generation}")]
    StaleEvent {
        event_generation: Generation,
        current_generation: Generation,
    },

    #[error("未知的播放源: {0}")]
    UnknownSource(String),

    #[error("播放源列表为空")]
    NoSources,

    #[error("无效的播放速度: {0}")]
    InvalidPlaybackRate(f64),

    #[error("存储错误: {0}")]
    Storage(String),

    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON 错误: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl EngineError {
    /// 是否值得告警；过期事件属于正常的重建竞态，不算
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, EngineError::StaleEvent { .. })
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
