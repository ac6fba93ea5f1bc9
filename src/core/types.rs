use serde::{Deserialize, Serialize};
use std::fmt;

/// 媒体源（服务器 + 清晰度）
///
/// 构造后不可变，唯一性由 `(url, quality)` 决定
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaSource {
    pub url: String,
    pub quality: String,
}

impl MediaSource {
    pub fn new(url: impl Into<String>, quality: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            quality: quality.into(),
        }
    }
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.quality, self.url)
    }
}

/// 投递类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryKind {
    /// 原生媒体元素可直接播放
    DirectMedia,
    /// 第三方播放页，只能放进嵌入框架
    OpaqueEmbed,
}

/// 播放面模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    Idle,
    Native,
    Embedded,
    Failed,
}

impl PlaybackMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackMode::Idle => "Idle",
            PlaybackMode::Native => "Native",
            PlaybackMode::Embedded => "Embedded",
            PlaybackMode::Failed => "Failed",
        }
    }
}

/// 播放面代数，每次重建播放面时递增
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 宿主平台回调的生命周期事件
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    Play,
    Pause,
    TimeUpdate {
        current_time: f64,
        /// 最后一段缓冲区间的结束位置（秒）
        buffered_end: Option<f64>,
    },
    LoadedMetadata {
        duration: f64,
    },
    Ended,
    /// 原生媒体元素报错（解码/网络）
    Error,
    /// 嵌入框架报错
    EmbedError,
}

impl SurfaceEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SurfaceEvent::Play => "play",
            SurfaceEvent::Pause => "pause",
            SurfaceEvent::TimeUpdate { .. } => "timeupdate",
            SurfaceEvent::LoadedMetadata { .. } => "loadedmetadata",
            SurfaceEvent::Ended => "ended",
            SurfaceEvent::Error => "error",
            SurfaceEvent::EmbedError => "embed-error",
        }
    }
}

/// 播放会话（每次切换播放源时重建）
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    pub mode: PlaybackMode,
    pub is_playing: bool,
    pub current_time: f64,
    /// 时长（秒），元数据加载前未知
    pub duration: Option<f64>,
    pub buffered_end: f64,
    pub playback_rate: f64,
    pub active_source: Option<MediaSource>,
    pub generation: Generation,
}

impl PlaybackSession {
    pub fn new(active_source: Option<MediaSource>, generation: Generation) -> Self {
        Self {
            mode: PlaybackMode::Idle,
            is_playing: false,
            current_time: 0.0,
            duration: None,
            buffered_end: 0.0,
            playback_rate: 1.0,
            active_source,
            generation,
        }
    }

    /// 已播放比例 (0.0 - 1.0)
    pub fn played_fraction(&self) -> f32 {
        fraction(self.current_time, self.duration)
    }

    /// 已缓冲比例 (0.0 - 1.0)
    pub fn buffered_fraction(&self) -> f32 {
        fraction(self.buffered_end, self.duration)
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new(None, Generation::default())
    }
}

fn fraction(value: f64, duration: Option<f64>) -> f32 {
    match duration {
        Some(d) if d > 0.0 && d.is_finite() => (value / d).clamp(0.0, 1.0) as f32,
        _ => 0.0,
    }
}

/// 观看进度记录（跨会话持久化）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub content_key: String,
    pub position_seconds: f64,
    /// 0 - 100
    pub percentage: u8,
}

/// 对外通知（宿主通过通道接收）
#[derive(Debug, Clone, PartialEq)]
pub enum EngineNotice {
    SourceChanged(MediaSource),
    RequestNext,
    RequestPrev,
    ModeChanged(PlaybackMode),
    /// 已恢复到上次的观看位置
    ResumeFrom { position: f64 },
    /// 直链与嵌入均失败
    PlaybackFailed { url: String },
    OpenExternally { url: String },
}

/// 上一集/下一集是否可用（由宿主的剧集列表决定）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NavigationAvailability {
    pub has_prev: bool,
    pub has_next: bool,
}

/// 播放时间文字：不足一小时为 `mm:ss`，否则 `hh:mm:ss`
pub fn format_time(seconds: f64) -> String {
    let whole = if seconds.is_finite() && seconds > 0.0 { seconds.floor() as u64 } else { 0 };
    match (whole / 3600, whole / 60 % 60, whole % 60) {
        (0, m, s) => format!("{m:02}:{s:02}"),
        (h, m, s) => format!("{h:02}:{m:02}:{s:02}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(65.9), "01:05");
        assert_eq!(format_time(3725.0), "01:02:05");
        assert_eq!(format_time(f64::NAN), "00:00");
    }

    #[test]
    fn test_fractions_without_duration() {
        let mut session = PlaybackSession::default();
        session.current_time = 30.0;
        assert_eq!(session.played_fraction(), 0.0);

        session.duration = Some(120.0);
        session.buffered_end = 60.0;
        assert_eq!(session.played_fraction(), 0.25);
        assert_eq!(session.buffered_fraction(), 0.5);
    }
}
