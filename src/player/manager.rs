use crate::core::{
    EngineConfig, EngineError, EngineNotice, Generation, MediaSource, NavigationAvailability,
    PlaybackMode, PlaybackSession, Result, SurfaceEvent,
};
use crate::player::fullscreen::{FullscreenOrientationManager, FullscreenOutcome, FullscreenPlatform};
use crate::player::overlay::{Chrome, ControlsOverlay, Menu};
use crate::player::progress_store::ProgressStore;
use crate::player::registry::ServerQualityRegistry;
use crate::player::surface::{PlaybackSurface, SurfaceEffect, SurfaceHost};
use crossbeam::queue::SegQueue;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Instant;

/// 对外通知队列容量，满了丢弃最旧的通知
const NOTICE_CAPACITY: usize = 64;

/// 宿主提供的播放请求（作品维度的输入）
#[derive(Debug, Clone, Default)]
pub struct PlaybackRequest {
    pub sources: Vec<MediaSource>,
    /// 进度持久化使用的内容键（如剧集 id）
    pub content_key: String,
    pub poster_url: Option<String>,
    pub title: String,
    pub navigation: NavigationAvailability,
}

/// 事件收件箱
///
/// 宿主在平台回调里只负责入队，由 [`PlaybackManager::pump`] 在主循环中统一处理
#[derive(Clone, Default)]
pub struct EventInbox {
    queue: Arc<SegQueue<(Generation, SurfaceEvent)>>,
}

impl EventInbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, generation: Generation, event: SurfaceEvent) {
        self.queue.push((generation, event));
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn pop(&self) -> Option<(Generation, SurfaceEvent)> {
        self.queue.pop()
    }
}

/// 播放管理器 - 组合播放面、控制层、全屏管理、进度存储，是宿主唯一需要交互的对象
pub struct PlaybackManager {
    config: EngineConfig,
    registry: ServerQualityRegistry,
    surface: PlaybackSurface,
    overlay: ControlsOverlay,
    fullscreen: FullscreenOrientationManager,
    store: ProgressStore,
    title: String,
    navigation: NavigationAvailability,
    inbox: EventInbox,
    notice_tx: Sender<EngineNotice>,
    notice_rx: Receiver<EngineNotice>,
}

impl PlaybackManager {
    pub fn new(
        request: PlaybackRequest,
        host: Box<dyn SurfaceHost>,
        platform: Box<dyn FullscreenPlatform>,
        store: ProgressStore,
        config: EngineConfig,
    ) -> Result<Self> {
        info!("🎮 创建播放管理器: {} ({})", request.title, request.content_key);
        let registry = ServerQualityRegistry::new(request.sources, &config.preferred_qualities)?;
        let surface = PlaybackSurface::new(host, request.content_key, request.poster_url, &config);
        let overlay = ControlsOverlay::new(config.controls_hide_delay(), config.resume_toast_duration());
        let fullscreen = FullscreenOrientationManager::new(platform, config.layout_refresh_delay());
        let (notice_tx, notice_rx) = bounded(NOTICE_CAPACITY);

        let mut manager = Self {
            config,
            registry,
            surface,
            overlay,
            fullscreen,
            store,
            title: request.title,
            navigation: request.navigation,
            inbox: EventInbox::new(),
            notice_tx,
            notice_rx,
        };
        let initial = manager.registry.active().clone();
        let mode = manager.surface.load(initial);
        manager.notify(EngineNotice::ModeChanged(mode));
        info!("✅ 播放管理器创建完成");
        Ok(manager)
    }

    // ===== 状态查询 =====

    pub fn session(&self) -> &PlaybackSession {
        self.surface.session()
    }

    pub fn mode(&self) -> PlaybackMode {
        self.surface.mode()
    }

    pub fn generation(&self) -> Generation {
        self.surface.generation()
    }

    pub fn chrome(&self) -> Chrome {
        ControlsOverlay::chrome(self.mode())
    }

    pub fn overlay(&self) -> &ControlsOverlay {
        &self.overlay
    }

    pub fn registry(&self) -> &ServerQualityRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content_key(&self) -> &str {
        self.surface.content_key()
    }

    pub fn poster(&self) -> Option<&str> {
        self.surface.poster()
    }

    pub fn navigation(&self) -> NavigationAvailability {
        self.navigation
    }

    pub fn set_navigation(&mut self, navigation: NavigationAvailability) {
        self.navigation = navigation;
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen.is_fullscreen()
    }

    /// 事件收件箱（可克隆后交给平台回调）
    pub fn inbox(&self) -> EventInbox {
        self.inbox.clone()
    }

    /// 对外通知接收端
    ///
    /// 宿主应在每帧用 `try_iter` 取走通知；队列容量有限，积压时最旧的通知被丢弃
    pub fn notices(&self) -> Receiver<EngineNotice> {
        self.notice_rx.clone()
    }

    fn notify(&self, notice: EngineNotice) {
        // 接收端由自身持有，通道不会断开，只可能已满
        if let Err(TrySendError::Full(notice)) = self.notice_tx.try_send(notice) {
            let dropped = self.notice_rx.try_recv().ok();
            warn!("⚠️ 通知队列已满，丢弃最旧的通知: {:?}", dropped);
            let _ = self.notice_tx.try_send(notice);
        }
    }

    fn is_native(&self) -> bool {
        self.mode() == PlaybackMode::Native
    }

    fn reconcile(&mut self, now: Instant) {
        let mode = self.mode();
        let is_playing = self.session().is_playing;
        self.overlay.reconcile(now, mode, is_playing);
    }

    // ===== 生命周期事件 =====

    /// 处理平台回调的事件，过期事件返回 [`EngineError::StaleEvent`]
    pub fn handle_event(&mut self, generation: Generation, event: SurfaceEvent, now: Instant) -> Result<()> {
        let dragging = self.overlay.is_seek_dragging();
        let effect = self.surface.handle_event(generation, event, &self.store, dragging)?;

        match effect {
            SurfaceEffect::None | SurfaceEffect::Started | SurfaceEffect::Paused => {}
            SurfaceEffect::Resumed { position } => {
                self.overlay.show_resume_toast(now, position);
                self.notify(EngineNotice::ResumeFrom { position });
            }
            SurfaceEffect::Ended => {
                self.overlay.interact();
            }
            SurfaceEffect::NativeRetry { attempt } => {
                debug!("原生播放重试第 {} 次", attempt);
                self.overlay.reset();
            }
            SurfaceEffect::ModeChanged(mode) => {
                self.overlay.reset();
                self.notify(EngineNotice::ModeChanged(mode));
                if mode == PlaybackMode::Failed {
                    let url = self.registry.active().url.clone();
                    self.notify(EngineNotice::PlaybackFailed { url });
                }
            }
        }

        self.reconcile(now);
        Ok(())
    }

    /// 处理收件箱中排队的事件，返回成功应用的数量
    pub fn pump(&mut self, now: Instant) -> usize {
        let queued = self.inbox.len();
        if queued > 0 {
            debug!("📥 处理 {} 个排队事件", queued);
        }
        let mut applied = 0;
        while let Some((generation, event)) = self.inbox.pop() {
            match self.handle_event(generation, event, now) {
                Ok(()) => applied += 1,
                Err(e) if e.is_user_visible() => warn!("⚠️ 事件处理失败: {}", e),
                Err(e) => debug!("事件未应用: {}", e),
            }
        }
        applied
    }

    /// 轮询所有计时器（控制层隐藏、续播提示、布局刷新），返回是否需要重绘
    pub fn tick(&mut self, now: Instant) -> bool {
        let mode = self.mode();
        let is_playing = self.session().is_playing;
        let overlay_changed = self.overlay.tick(now, mode, is_playing);
        let layout_refreshed = self.fullscreen.tick(now);
        overlay_changed || layout_refreshed
    }

    /// 最近一个计时器到期时间
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.overlay.next_deadline(), self.fullscreen.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // ===== 用户命令 =====

    /// 播放/暂停切换，仅原生模式有效
    pub fn toggle_play(&mut self, now: Instant) -> bool {
        if !self.is_native() {
            return false;
        }
        if self.session().is_playing {
            self.surface.pause();
            self.overlay.interact();
        } else {
            self.surface.play();
        }
        self.reconcile(now);
        true
    }

    /// 跳转到指定位置，仅原生模式有效，返回实际位置
    pub fn seek_to(&mut self, position: f64, now: Instant) -> Option<f64> {
        if !self.is_native() {
            return None;
        }
        self.overlay.interact();
        let target = self.surface.seek_to(position);
        self.reconcile(now);
        Some(target)
    }

    /// 快进/快退（秒，可为负）
    pub fn skip(&mut self, seconds: f64, now: Instant) -> Option<f64> {
        if !self.is_native() {
            return None;
        }
        let target = self.session().current_time + seconds;
        self.seek_to(target, now)
    }

    pub fn skip_forward(&mut self, now: Instant) -> Option<f64> {
        self.skip(self.config.skip_seconds, now)
    }

    pub fn skip_backward(&mut self, now: Instant) -> Option<f64> {
        self.skip(-self.config.skip_seconds, now)
    }

    /// 设置倍速，仅原生模式有效；选择后关闭倍速菜单
    pub fn set_playback_rate(&mut self, rate: f64, now: Instant) -> Result<bool> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(EngineError::InvalidPlaybackRate(rate));
        }
        if !self.is_native() {
            return Ok(false);
        }
        self.surface.set_playback_rate(rate);
        self.overlay.close_menus();
        self.reconcile(now);
        info!("⏱️ 播放速度: {}x", rate);
        Ok(true)
    }

    /// 切换播放源（任意模式有效）
    ///
    /// 销毁当前播放面，仅保留内容键与海报重新初始化；播放位置不保留
    pub fn switch_source(&mut self, source: &MediaSource, now: Instant) -> Result<bool> {
        self.overlay.close_menus();
        if !self.registry.switch_to(source)? {
            self.reconcile(now);
            return Ok(false);
        }

        info!("🔀 切换播放源: {}", source);
        self.overlay.reset();
        let mode = self.surface.load(source.clone());
        self.notify(EngineNotice::SourceChanged(source.clone()));
        self.notify(EngineNotice::ModeChanged(mode));
        self.reconcile(now);
        Ok(true)
    }

    /// 全屏切换（任意模式有效）
    pub fn request_fullscreen(&mut self, now: Instant) -> FullscreenOutcome {
        self.overlay.interact();
        let outcome = self.fullscreen.toggle(self.is_native(), now);
        self.reconcile(now);
        outcome
    }

    /// 平台通知全屏状态变化
    pub fn on_fullscreen_change(&mut self, is_fullscreen: bool, now: Instant) {
        self.fullscreen.on_platform_change(is_fullscreen, now);
    }

    pub fn request_next(&mut self) -> bool {
        if !self.navigation.has_next {
            return false;
        }
        self.notify(EngineNotice::RequestNext);
        true
    }

    pub fn request_prev(&mut self) -> bool {
        if !self.navigation.has_prev {
            return false;
        }
        self.notify(EngineNotice::RequestPrev);
        true
    }

    /// 外部打开当前播放源（失败面板上的操作）
    pub fn open_externally(&mut self) -> Option<String> {
        let url = self.surface.open_externally()?;
        self.notify(EngineNotice::OpenExternally { url: url.clone() });
        Some(url)
    }

    // ===== 控制层交互 =====

    pub fn tap_container(&mut self, now: Instant) {
        let mode = self.mode();
        self.overlay.tap_container(mode);
        self.reconcile(now);
    }

    pub fn toggle_menu(&mut self, menu: Menu, now: Instant) {
        self.overlay.toggle_menu(menu);
        self.reconcile(now);
    }

    /// 点击菜单外部区域
    pub fn close_menus(&mut self, now: Instant) {
        self.overlay.close_menus();
        self.reconcile(now);
    }

    pub fn begin_seek_drag(&mut self, position: f64, now: Instant) {
        if !self.is_native() {
            return;
        }
        self.overlay.begin_seek_drag(position);
        self.reconcile(now);
    }

    pub fn update_seek_drag(&mut self, position: f64) {
        self.overlay.update_seek_drag(position);
    }

    /// 结束拖动并跳转
    pub fn end_seek_drag(&mut self, now: Instant) -> Option<f64> {
        let position = self.overlay.end_seek_drag()?;
        let target = self.seek_to(position, now);
        self.reconcile(now);
        target
    }

    /// 卸载：销毁播放面并取消所有计时
    pub fn unmount(&mut self) {
        info!("⏹️ 卸载播放器: {}", self.content_key());
        self.surface.unmount();
        self.overlay.reset();
        self.fullscreen.cancel_pending();
    }
}
