//! 自适应播放引擎
//!
//! 驱动单一视频播放面：直链优先交给原生媒体元素，失败回退为嵌入框架；
//! 按内容键持久化并续播观看进度；切换清晰度/服务器时重建播放面；
//! 全屏时尽量锁定横屏。引擎本身不发网络请求，平台能力全部由宿主注入。

pub mod core;
pub mod player;

#[cfg(feature = "egui-host")]
pub mod app;

pub use crate::core::{
    EngineConfig, EngineError, EngineNotice, Generation, MediaSource, NavigationAvailability,
    PlaybackMode, PlaybackSession, ProgressRecord, Result, SurfaceEvent,
};
pub use crate::player::{
    FullscreenPlatform, KeyValueStore, PlaybackManager, PlaybackRequest, ProgressStore, SurfaceHost,
};
