use crate::core::{EngineError, OneShotTimer, Result};
use log::{debug, info, warn};
use std::time::{Duration, Instant};

/// 进入全屏的目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceHandle {
    /// 播放器外层容器（通用全屏）
    Container,
    /// 原生媒体元素（部分移动端只支持媒体元素自身全屏）
    MediaElement,
}

/// 平台全屏/屏幕方向能力接口
///
/// 各平台差异很大，缺省实现全部视为“不支持”，适配器只覆盖真正具备的能力
pub trait FullscreenPlatform {
    fn supports_fullscreen(&self) -> bool {
        false
    }

    fn is_fullscreen(&self) -> bool {
        false
    }

    fn request_fullscreen(&mut self, _target: SurfaceHandle) -> Result<()> {
        Err(EngineError::FullscreenUnsupported)
    }

    fn exit_fullscreen(&mut self) -> Result<()> {
        Err(EngineError::FullscreenUnsupported)
    }

    fn supports_native_media_fullscreen(&self) -> bool {
        false
    }

    fn enter_native_media_fullscreen(&mut self) -> Result<()> {
        Err(EngineError::FullscreenUnsupported)
    }

    fn supports_orientation_lock(&self) -> bool {
        false
    }

    fn lock_landscape(&mut self) -> Result<()> {
        Err(EngineError::OrientationLockRejected("不支持屏幕方向锁定".to_string()))
    }

    fn unlock_orientation(&mut self) {}

    /// 触发一次布局重算（相当于派发 resize）
    fn request_layout_refresh(&mut self) {}
}

/// 无任何全屏能力的平台（无头环境）
#[derive(Debug, Default)]
pub struct NoFullscreen;

impl FullscreenPlatform for NoFullscreen {}

/// 全屏结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullscreenOutcome {
    /// 容器进入全屏
    Entered { orientation_locked: bool },
    /// 退回到媒体元素原生全屏
    NativeMedia,
    Exited,
    /// 平台不具备能力，静默忽略
    Unavailable,
}

/// 全屏与屏幕方向管理器
pub struct FullscreenOrientationManager {
    platform: Box<dyn FullscreenPlatform>,
    layout_refresh: OneShotTimer,
    layout_refresh_delay: Duration,
}

impl FullscreenOrientationManager {
    pub fn new(platform: Box<dyn FullscreenPlatform>, layout_refresh_delay: Duration) -> Self {
        Self {
            platform,
            layout_refresh: OneShotTimer::new(),
            layout_refresh_delay,
        }
    }

    pub fn is_fullscreen(&self) -> bool {
        self.platform.is_fullscreen()
    }

    /// 进入全屏
    ///
    /// `native_media_available` 表示当前是否存在原生媒体元素（仅 Native 模式）
    pub fn enter(&mut self, native_media_available: bool) -> FullscreenOutcome {
        if self.platform.supports_fullscreen() {
            return match self.platform.request_fullscreen(SurfaceHandle::Container) {
                Ok(()) => {
                    self.layout_refresh.cancel();
                    let orientation_locked = self.try_lock_landscape();
                    info!("🖥️ 已进入全屏 (横屏锁定: {})", orientation_locked);
                    FullscreenOutcome::Entered { orientation_locked }
                }
                Err(e) => {
                    debug!("全屏请求被拒绝，忽略: {}", e);
                    FullscreenOutcome::Unavailable
                }
            };
        }

        if native_media_available && self.platform.supports_native_media_fullscreen() {
            return match self.platform.enter_native_media_fullscreen() {
                Ok(()) => {
                    info!("📱 使用媒体元素原生全屏");
                    FullscreenOutcome::NativeMedia
                }
                Err(e) => {
                    debug!("媒体元素原生全屏失败，忽略: {}", e);
                    FullscreenOutcome::Unavailable
                }
            };
        }

        debug!("平台不支持全屏，忽略请求");
        FullscreenOutcome::Unavailable
    }

    /// 退出全屏，解除方向锁定，并在稍后强制刷新一次布局
    pub fn exit(&mut self, now: Instant) -> FullscreenOutcome {
        if !self.platform.supports_fullscreen() {
            return FullscreenOutcome::Unavailable;
        }
        if let Err(e) = self.platform.exit_fullscreen() {
            debug!("退出全屏失败，忽略: {}", e);
        }
        self.after_exit(now);
        info!("🖥️ 已退出全屏");
        FullscreenOutcome::Exited
    }

    /// 全屏切换
    pub fn toggle(&mut self, native_media_available: bool, now: Instant) -> FullscreenOutcome {
        if self.platform.supports_fullscreen() && self.platform.is_fullscreen() {
            self.exit(now)
        } else {
            self.enter(native_media_available)
        }
    }

    /// 平台侧全屏状态变化（例如用户按 Esc 退出）
    pub fn on_platform_change(&mut self, is_fullscreen: bool, now: Instant) {
        if is_fullscreen {
            self.layout_refresh.cancel();
            self.try_lock_landscape();
        } else {
            self.after_exit(now);
        }
    }

    /// 轮询布局刷新计时器，到期返回 true
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.layout_refresh.fire(now) {
            debug!("🔄 退出全屏后刷新布局");
            self.platform.request_layout_refresh();
            true
        } else {
            false
        }
    }

    /// 播放器卸载时取消待执行的布局刷新
    pub fn cancel_pending(&mut self) {
        if self.layout_refresh.is_pending() {
            debug!("取消待执行的布局刷新");
        }
        self.layout_refresh.cancel();
    }

    pub fn layout_refresh_pending(&self) -> bool {
        self.layout_refresh.is_pending()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.layout_refresh.deadline()
    }

    fn after_exit(&mut self, now: Instant) {
        if self.platform.supports_orientation_lock() {
            self.platform.unlock_orientation();
        }
        self.layout_refresh.arm(now, self.layout_refresh_delay);
    }

    fn try_lock_landscape(&mut self) -> bool {
        if !self.platform.supports_orientation_lock() {
            return false;
        }
        match self.platform.lock_landscape() {
            Ok(()) => true,
            Err(e) => {
                warn!("横屏锁定被拒绝，忽略: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// 可配置能力的平台替身，调用记录写入共享日志
    #[derive(Clone, Default)]
    pub(crate) struct FakePlatform {
        pub fullscreen_api: bool,
        pub native_media_api: bool,
        pub orientation_api: bool,
        pub reject_lock: bool,
        pub state: Arc<Mutex<FakeState>>,
    }

    #[derive(Default)]
    pub(crate) struct FakeState {
        pub fullscreen: bool,
        pub calls: Vec<&'static str>,
    }

    impl FakePlatform {
        pub fn calls(&self) -> Vec<&'static str> {
            self.state.lock().calls.clone()
        }
    }

    impl FullscreenPlatform for FakePlatform {
        fn supports_fullscreen(&self) -> bool {
            self.fullscreen_api
        }
        fn is_fullscreen(&self) -> bool {
            self.state.lock().fullscreen
        }
        fn request_fullscreen(&mut self, _target: SurfaceHandle) -> Result<()> {
            let mut state = self.state.lock();
            state.calls.push("request_fullscreen");
            state.fullscreen = true;
            Ok(())
        }
        fn exit_fullscreen(&mut self) -> Result<()> {
            let mut state = self.state.lock();
            state.calls.push("exit_fullscreen");
            state.fullscreen = false;
            Ok(())
        }
        fn supports_native_media_fullscreen(&self) -> bool {
            self.native_media_api
        }
        fn enter_native_media_fullscreen(&mut self) -> Result<()> {
            self.state.lock().calls.push("native_media_fullscreen");
            Ok(())
        }
        fn supports_orientation_lock(&self) -> bool {
            self.orientation_api
        }
        fn lock_landscape(&mut self) -> Result<()> {
            self.state.lock().calls.push("lock_landscape");
            if self.reject_lock {
                Err(EngineError::OrientationLockRejected("NotAllowedError".into()))
            } else {
                Ok(())
            }
        }
        fn unlock_orientation(&mut self) {
            self.state.lock().calls.push("unlock_orientation");
        }
        fn request_layout_refresh(&mut self) {
            self.state.lock().calls.push("layout_refresh");
        }
    }

    fn manager(platform: &FakePlatform) -> FullscreenOrientationManager {
        FullscreenOrientationManager::new(Box::new(platform.clone()), Duration::from_millis(100))
    }

    #[test]
    fn test_enter_locks_landscape() {
        let platform = FakePlatform {
            fullscreen_api: true,
            orientation_api: true,
            ..Default::default()
        };
        let mut fs = manager(&platform);
        assert_eq!(fs.enter(true), FullscreenOutcome::Entered { orientation_locked: true });
        assert_eq!(platform.calls(), vec!["request_fullscreen", "lock_landscape"]);
    }

    #[test]
    fn test_rejected_lock_is_swallowed() {
        let platform = FakePlatform {
            fullscreen_api: true,
            orientation_api: true,
            reject_lock: true,
            ..Default::default()
        };
        let mut fs = manager(&platform);
        assert_eq!(fs.enter(true), FullscreenOutcome::Entered { orientation_locked: false });
        assert!(fs.is_fullscreen());
    }

    #[test]
    fn test_falls_back_to_native_media_fullscreen() {
        let platform = FakePlatform {
            native_media_api: true,
            ..Default::default()
        };
        let mut fs = manager(&platform);
        assert_eq!(fs.enter(true), FullscreenOutcome::NativeMedia);
        // 嵌入模式下没有原生媒体元素
        assert_eq!(fs.enter(false), FullscreenOutcome::Unavailable);
        assert_eq!(platform.calls(), vec!["native_media_fullscreen"]);
    }

    #[test]
    fn test_no_capabilities_is_silent() {
        let mut fs = FullscreenOrientationManager::new(Box::new(NoFullscreen), Duration::from_millis(100));
        let t0 = Instant::now();
        assert_eq!(fs.toggle(true, t0), FullscreenOutcome::Unavailable);
        assert_eq!(fs.exit(t0), FullscreenOutcome::Unavailable);
        assert!(!fs.tick(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn test_exit_schedules_single_layout_refresh() {
        let platform = FakePlatform {
            fullscreen_api: true,
            orientation_api: true,
            ..Default::default()
        };
        let mut fs = manager(&platform);
        let t0 = Instant::now();
        fs.toggle(true, t0);
        assert_eq!(fs.toggle(true, t0), FullscreenOutcome::Exited);
        assert!(fs.layout_refresh_pending());

        assert!(!fs.tick(t0 + Duration::from_millis(50)));
        assert!(fs.tick(t0 + Duration::from_millis(100)));
        assert!(!fs.tick(t0 + Duration::from_millis(500)));

        let calls = platform.calls();
        assert_eq!(calls.iter().filter(|c| **c == "layout_refresh").count(), 1);
        assert!(calls.contains(&"unlock_orientation"));
    }

    #[test]
    fn test_platform_exit_still_refreshes_layout() {
        let platform = FakePlatform {
            fullscreen_api: true,
            ..Default::default()
        };
        let mut fs = manager(&platform);
        let t0 = Instant::now();
        fs.on_platform_change(false, t0);
        assert!(fs.tick(t0 + Duration::from_millis(100)));
    }
}
