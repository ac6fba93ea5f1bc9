//! 播放面状态机
//!
//! 状态：`Idle` → `Native` / `Embedded` → `Failed`
//! - 直链先交给原生媒体元素，原生出错回退为嵌入框架播放同一 URL
//! - 嵌入也失败则进入终态 `Failed`，只提供“外部打开”
//! - 每次重建播放面代数加一，旧播放面的回调按代数识别并丢弃

use crate::core::{
    DeliveryKind, EngineConfig, EngineError, Generation, MediaSource, PlaybackMode,
    PlaybackSession, Result, SurfaceEvent,
};
use crate::player::mode_detector;
use crate::player::progress_store::{watched_percentage, ProgressStore};
use log::{debug, error, info, warn};

/// 宿主平台的渲染面（原生媒体元素或嵌入框架）
///
/// 宿主挂载元素后，把该元素的回调连同挂载时的代数一起交回引擎
pub trait SurfaceHost {
    fn mount_native(&mut self, generation: Generation, url: &str, poster: Option<&str>);
    fn mount_embed(&mut self, generation: Generation, url: &str);
    /// 彻底销毁元素并解除所有事件监听（不是隐藏）
    fn teardown(&mut self, generation: Generation);
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, position: f64);
    fn set_playback_rate(&mut self, rate: f64);
    fn open_externally(&mut self, url: &str);
}

/// 状态机输入
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceInput {
    Classified(DeliveryKind),
    NativeError,
    EmbedError,
    Reset,
}

/// 状态转移表，`None` 表示该输入在当前状态下不产生转移
pub fn transition(mode: PlaybackMode, input: SurfaceInput) -> Option<PlaybackMode> {
    use PlaybackMode::*;
    match (mode, input) {
        (_, SurfaceInput::Reset) => Some(Idle),
        (Idle, SurfaceInput::Classified(DeliveryKind::DirectMedia)) => Some(Native),
        (Idle, SurfaceInput::Classified(DeliveryKind::OpaqueEmbed)) => Some(Embedded),
        (Native, SurfaceInput::NativeError) => Some(Embedded),
        (Embedded, SurfaceInput::EmbedError) => Some(Failed),
        _ => None,
    }
}

/// 事件处理后需要上层（控制层/通知）响应的结果
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEffect {
    None,
    Started,
    Paused,
    /// 已跳转到上次观看位置
    Resumed { position: f64 },
    Ended,
    /// 原生播放出错，按重试策略重新挂载原生元素
    NativeRetry { attempt: u32 },
    ModeChanged(PlaybackMode),
}

/// 播放面 - 持有渲染面并执行回退状态机
pub struct PlaybackSurface {
    host: Box<dyn SurfaceHost>,
    session: PlaybackSession,
    content_key: String,
    poster: Option<String>,
    /// 宿主中当前存活的元素
    mounted: Option<Generation>,
    native_retries: u32,
    resume_checked: bool,
    native_retry_limit: u32,
    progress_min_position: f64,
    resume_threshold: f64,
}

impl PlaybackSurface {
    pub fn new(
        host: Box<dyn SurfaceHost>,
        content_key: impl Into<String>,
        poster: Option<String>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            host,
            session: PlaybackSession::default(),
            content_key: content_key.into(),
            poster,
            mounted: None,
            native_retries: 0,
            resume_checked: false,
            native_retry_limit: config.native_retry_limit,
            progress_min_position: config.progress_min_position,
            resume_threshold: config.resume_threshold,
        }
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn mode(&self) -> PlaybackMode {
        self.session.mode
    }

    pub fn generation(&self) -> Generation {
        self.session.generation
    }

    pub fn content_key(&self) -> &str {
        &self.content_key
    }

    pub fn poster(&self) -> Option<&str> {
        self.poster.as_deref()
    }

    /// 加载播放源：销毁旧播放面，重建会话，按投递类型挂载新元素
    pub fn load(&mut self, source: MediaSource) -> PlaybackMode {
        self.teardown_current();
        self.apply(SurfaceInput::Reset);

        let generation = self.session.generation.next();
        self.session = PlaybackSession::new(Some(source.clone()), generation);
        self.native_retries = 0;
        self.resume_checked = false;

        let kind = mode_detector::classify(&source.url);
        self.apply(SurfaceInput::Classified(kind));
        info!(
            "🎬 加载播放源 {} -> {} (代数 {})",
            source,
            self.session.mode.as_str(),
            generation
        );
        self.mount_current();
        self.session.mode
    }

    /// 处理宿主回调的生命周期事件
    ///
    /// `seek_dragging` 为 true 时忽略时间更新，避免覆盖用户正在拖动的进度
    pub fn handle_event(
        &mut self,
        generation: Generation,
        event: SurfaceEvent,
        store: &ProgressStore,
        seek_dragging: bool,
    ) -> Result<SurfaceEffect> {
        if generation != self.session.generation || self.mounted != Some(generation) {
            debug!(
                "🗑️ 丢弃过期事件 {} (事件代数 {}, 当前代数 {})",
                event.name(),
                generation,
                self.session.generation
            );
            return Err(EngineError::StaleEvent {
                event_generation: generation,
                current_generation: self.session.generation,
            });
        }

        match self.session.mode {
            PlaybackMode::Native => Ok(self.handle_native_event(event, store, seek_dragging)),
            PlaybackMode::Embedded => Ok(self.handle_embedded_event(event)),
            PlaybackMode::Idle | PlaybackMode::Failed => {
                debug!("{} 状态下忽略事件 {}", self.session.mode.as_str(), event.name());
                Ok(SurfaceEffect::None)
            }
        }
    }

    fn handle_native_event(
        &mut self,
        event: SurfaceEvent,
        store: &ProgressStore,
        seek_dragging: bool,
    ) -> SurfaceEffect {
        match event {
            SurfaceEvent::Play => {
                self.session.is_playing = true;
                SurfaceEffect::Started
            }
            SurfaceEvent::Pause => {
                self.session.is_playing = false;
                SurfaceEffect::Paused
            }
            SurfaceEvent::TimeUpdate {
                current_time,
                buffered_end,
            } => {
                if seek_dragging {
                    return SurfaceEffect::None;
                }
                self.session.current_time = self.clamp_to_duration(current_time);
                if let Some(end) = buffered_end {
                    self.session.buffered_end = self.clamp_to_duration(end);
                }
                self.persist_progress(store);
                SurfaceEffect::None
            }
            SurfaceEvent::LoadedMetadata { duration } => self.on_loaded_metadata(duration, store),
            SurfaceEvent::Ended => {
                if let Err(e) = store.clear(&self.content_key) {
                    warn!("⚠️ 清除进度失败: {}", e);
                }
                self.session.is_playing = false;
                info!("🏁 播放结束: {}", self.content_key);
                SurfaceEffect::Ended
            }
            SurfaceEvent::Error => self.on_native_error(),
            SurfaceEvent::EmbedError => {
                debug!("原生模式下收到嵌入错误，忽略");
                SurfaceEffect::None
            }
        }
    }

    fn handle_embedded_event(&mut self, event: SurfaceEvent) -> SurfaceEffect {
        match event {
            // 嵌入播放器自带 UI，宿主无法区分错误来源，统一按嵌入失败处理
            SurfaceEvent::Error | SurfaceEvent::EmbedError => {
                let url = self.active_url();
                error!("❌ 直链与嵌入均失败: {}", EngineError::SourceUnplayableEmbedded(url));
                self.apply(SurfaceInput::EmbedError);
                self.teardown_current();
                SurfaceEffect::ModeChanged(self.session.mode)
            }
            other => {
                debug!("嵌入模式下忽略事件 {}", other.name());
                SurfaceEffect::None
            }
        }
    }

    fn on_loaded_metadata(&mut self, duration: f64, store: &ProgressStore) -> SurfaceEffect {
        if !(duration.is_finite() && duration > 0.0) {
            debug!("时长未知（直播流？）: {}", duration);
            self.session.duration = None;
            return SurfaceEffect::None;
        }
        self.session.duration = Some(duration);
        self.session.current_time = self.clamp_to_duration(self.session.current_time);

        if self.resume_checked {
            return SurfaceEffect::None;
        }
        self.resume_checked = true;

        let record = match store.read(&self.content_key) {
            Ok(record) => record,
            Err(e) => {
                warn!("⚠️ 读取进度失败: {}", e);
                None
            }
        };
        match record {
            Some(record)
                if record.position_seconds > 0.0
                    && record.position_seconds < duration * self.resume_threshold =>
            {
                let position = record.position_seconds;
                self.host.seek(position);
                self.session.current_time = position;
                info!("⏩ 续播 {} 于 {:.1}s / {:.1}s", self.content_key, position, duration);
                SurfaceEffect::Resumed { position }
            }
            Some(record) => {
                debug!(
                    "进度 {:.1}s 已接近结尾（时长 {:.1}s），不续播",
                    record.position_seconds, duration
                );
                SurfaceEffect::None
            }
            None => SurfaceEffect::None,
        }
    }

    fn on_native_error(&mut self) -> SurfaceEffect {
        let url = self.active_url();
        warn!("⚠️ {}", EngineError::SourceUnplayableNative(url.clone()));

        if self.native_retries < self.native_retry_limit {
            self.native_retries += 1;
            let attempt = self.native_retries;
            info!("🔄 重试原生播放 ({}/{}): {}", attempt, self.native_retry_limit, url);
            self.remount(PlaybackMode::Native);
            return SurfaceEffect::NativeRetry { attempt };
        }

        info!("↪️ 原生播放失败，回退到嵌入框架: {}", url);
        if self.apply(SurfaceInput::NativeError) {
            self.remount(self.session.mode);
            SurfaceEffect::ModeChanged(self.session.mode)
        } else {
            SurfaceEffect::None
        }
    }

    /// 同一播放源换一个新元素（新代数），会话位置状态清零
    fn remount(&mut self, mode: PlaybackMode) {
        self.teardown_current();
        let source = self.session.active_source.clone();
        let generation = self.session.generation.next();
        self.session = PlaybackSession::new(source, generation);
        self.session.mode = mode;
        self.resume_checked = false;
        self.mount_current();
    }

    fn mount_current(&mut self) {
        let Some(source) = self.session.active_source.as_ref() else {
            return;
        };
        let generation = self.session.generation;
        match self.session.mode {
            PlaybackMode::Native => {
                self.host
                    .mount_native(generation, &source.url, self.poster.as_deref());
                self.mounted = Some(generation);
            }
            PlaybackMode::Embedded => {
                self.host.mount_embed(generation, &source.url);
                self.mounted = Some(generation);
            }
            PlaybackMode::Idle | PlaybackMode::Failed => {}
        }
    }

    /// 卸载：销毁元素并丢弃会话，回到 `Idle`
    ///
    /// 代数加一，之后到达的旧回调一律按过期处理
    pub fn unmount(&mut self) {
        self.teardown_current();
        if self.session.mode == PlaybackMode::Idle && self.session.active_source.is_none() {
            return;
        }
        self.apply(SurfaceInput::Reset);
        let generation = self.session.generation.next();
        self.session = PlaybackSession::new(None, generation);
    }

    /// 销毁宿主中的当前元素
    fn teardown_current(&mut self) {
        if let Some(generation) = self.mounted.take() {
            debug!("🧹 销毁播放面 (代数 {})", generation);
            self.host.teardown(generation);
        }
    }

    /// 应用状态转移，返回是否发生了转移
    fn apply(&mut self, input: SurfaceInput) -> bool {
        match transition(self.session.mode, input) {
            Some(next) => {
                if next != self.session.mode {
                    debug!("状态转移 {} -> {} ({:?})", self.session.mode.as_str(), next.as_str(), input);
                }
                self.session.mode = next;
                true
            }
            None => {
                debug!("状态 {} 不接受输入 {:?}", self.session.mode.as_str(), input);
                false
            }
        }
    }

    fn persist_progress(&self, store: &ProgressStore) {
        let position = self.session.current_time;
        let Some(duration) = self.session.duration else {
            return;
        };
        if position <= self.progress_min_position {
            return;
        }
        let percentage = watched_percentage(position, duration);
        if let Err(e) = store.write(&self.content_key, position, percentage) {
            warn!("⚠️ 写入进度失败: {}", e);
        }
    }

    fn clamp_to_duration(&self, value: f64) -> f64 {
        let value = if value.is_finite() { value.max(0.0) } else { 0.0 };
        match self.session.duration {
            Some(duration) => value.min(duration),
            None => value,
        }
    }

    fn active_url(&self) -> String {
        self.session
            .active_source
            .as_ref()
            .map(|s| s.url.clone())
            .unwrap_or_default()
    }

    // ===== 直接媒体控制（调用方保证处于 Native 模式）=====

    pub fn play(&mut self) {
        self.host.play();
        self.session.is_playing = true;
    }

    pub fn pause(&mut self) {
        self.host.pause();
        self.session.is_playing = false;
    }

    /// 跳转，目标限制在 `[0, duration]`，返回实际位置
    pub fn seek_to(&mut self, position: f64) -> f64 {
        let target = self.clamp_to_duration(position);
        self.host.seek(target);
        self.session.current_time = target;
        target
    }

    pub fn set_playback_rate(&mut self, rate: f64) {
        self.host.set_playback_rate(rate);
        self.session.playback_rate = rate;
    }

    /// 交给宿主在外部打开当前播放源（不自动重试）
    pub fn open_externally(&mut self) -> Option<String> {
        let url = self.session.active_source.as_ref()?.url.clone();
        info!("🌐 外部打开: {}", url);
        self.host.open_externally(&url);
        Some(url)
    }
}

impl Drop for PlaybackSurface {
    fn drop(&mut self) {
        self.unmount();
    }
}
