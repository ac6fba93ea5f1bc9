use crate::core::{OneShotTimer, PlaybackMode};
use log::debug;
use std::time::{Duration, Instant};

/// 控制层上的弹出菜单
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Menu {
    Quality,
    Speed,
}

/// 当前模式下控制层展示的外壳
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chrome {
    /// 尚未加载播放源
    Loading,
    /// 完整控制（播放、进度条、菜单）
    Full,
    /// 嵌入播放器自带 UI，只保留标题栏
    TitleBar,
    /// 播放失败面板（外部打开）
    FailedPanel,
}

/// 控制层 - 只保存展示状态，不持有播放状态
#[derive(Debug)]
pub struct ControlsOverlay {
    visible: bool,
    active_menu: Option<Menu>,
    seek_dragging: bool,
    drag_position: f64,
    hide_timer: OneShotTimer,
    hide_delay: Duration,
    /// 续播提示（显示续播位置）
    resume_toast: Option<f64>,
    toast_timer: OneShotTimer,
    toast_duration: Duration,
}

impl ControlsOverlay {
    pub fn new(hide_delay: Duration, toast_duration: Duration) -> Self {
        Self {
            visible: true,
            active_menu: None,
            seek_dragging: false,
            drag_position: 0.0,
            hide_timer: OneShotTimer::new(),
            hide_delay,
            resume_toast: None,
            toast_timer: OneShotTimer::new(),
            toast_duration,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn active_menu(&self) -> Option<Menu> {
        self.active_menu
    }

    pub fn is_seek_dragging(&self) -> bool {
        self.seek_dragging
    }

    pub fn drag_position(&self) -> f64 {
        self.drag_position
    }

    pub fn hide_pending(&self) -> bool {
        self.hide_timer.is_pending()
    }

    pub fn resume_toast(&self) -> Option<f64> {
        self.resume_toast
    }

    pub fn chrome(mode: PlaybackMode) -> Chrome {
        match mode {
            PlaybackMode::Idle => Chrome::Loading,
            PlaybackMode::Native => Chrome::Full,
            PlaybackMode::Embedded => Chrome::TitleBar,
            PlaybackMode::Failed => Chrome::FailedPanel,
        }
    }

    /// 切换播放源时重置：显示控制层、关闭菜单、取消所有计时
    pub fn reset(&mut self) {
        self.visible = true;
        self.active_menu = None;
        self.seek_dragging = false;
        self.drag_position = 0.0;
        self.hide_timer.cancel();
        self.resume_toast = None;
        self.toast_timer.cancel();
    }

    /// 用户交互：重新显示控制层并取消待执行的隐藏
    pub fn interact(&mut self) {
        self.visible = true;
        if self.hide_timer.is_pending() {
            debug!("交互取消自动隐藏");
        }
        self.hide_timer.cancel();
    }

    /// 点击播放区域：原生模式下切换显示/隐藏
    pub fn tap_container(&mut self, mode: PlaybackMode) {
        if mode != PlaybackMode::Native {
            return;
        }
        if self.visible {
            self.visible = false;
            self.active_menu = None;
            self.hide_timer.cancel();
        } else {
            self.interact();
        }
    }

    /// 打开/关闭菜单（打开一个会关闭另一个）
    pub fn toggle_menu(&mut self, menu: Menu) {
        self.interact();
        self.active_menu = if self.active_menu == Some(menu) {
            None
        } else {
            Some(menu)
        };
    }

    pub fn close_menus(&mut self) {
        self.active_menu = None;
    }

    pub fn begin_seek_drag(&mut self, position: f64) {
        self.interact();
        self.seek_dragging = true;
        self.drag_position = position;
    }

    pub fn update_seek_drag(&mut self, position: f64) {
        if self.seek_dragging {
            self.drag_position = position;
        }
    }

    /// 结束拖动，返回需要跳转的位置
    pub fn end_seek_drag(&mut self) -> Option<f64> {
        if !self.seek_dragging {
            return None;
        }
        self.seek_dragging = false;
        Some(self.drag_position)
    }

    /// 显示续播提示，到期自动消失
    pub fn show_resume_toast(&mut self, now: Instant, position: f64) {
        self.resume_toast = Some(position);
        self.toast_timer.arm(now, self.toast_duration);
    }

    fn can_auto_hide(&self, mode: PlaybackMode, is_playing: bool) -> bool {
        mode == PlaybackMode::Native
            && is_playing
            && self.visible
            && self.active_menu.is_none()
            && !self.seek_dragging
    }

    /// 根据当前条件安排或取消自动隐藏
    ///
    /// 条件满足且尚未计时则开始计时，任一条件不满足立即取消
    pub fn reconcile(&mut self, now: Instant, mode: PlaybackMode, is_playing: bool) {
        if self.can_auto_hide(mode, is_playing) {
            self.hide_timer.arm_if_idle(now, self.hide_delay);
        } else {
            self.hide_timer.cancel();
            if mode != PlaybackMode::Native {
                self.visible = true;
            }
        }
    }

    /// 轮询计时器，返回状态是否有变化
    pub fn tick(&mut self, now: Instant, mode: PlaybackMode, is_playing: bool) -> bool {
        let mut changed = false;
        if self.hide_timer.fire(now) && self.can_auto_hide(mode, is_playing) {
            debug!("🙈 自动隐藏控制层");
            self.visible = false;
            changed = true;
        }
        if self.toast_timer.fire(now) {
            self.resume_toast = None;
            changed = true;
        }
        changed
    }

    /// 最近的计时器到期时间（宿主据此安排重绘）
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.hide_timer.deadline(), self.toast_timer.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

/// 倍速按钮文字
pub fn rate_button_label(rate: f64) -> String {
    if rate == 1.0 {
        "1x".to_string()
    } else {
        format!("{}x", rate)
    }
}

/// 倍速菜单项文字
pub fn rate_option_label(rate: f64) -> String {
    if rate == 1.0 {
        "Normal".to_string()
    } else {
        format!("{}x", rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NATIVE: PlaybackMode = PlaybackMode::Native;

    fn overlay() -> ControlsOverlay {
        ControlsOverlay::new(Duration::from_secs(3), Duration::from_secs(3))
    }

    #[test]
    fn test_hides_after_quiet_period_while_playing() {
        let t0 = Instant::now();
        let mut overlay = overlay();
        overlay.reconcile(t0, NATIVE, true);
        assert!(overlay.hide_pending());

        assert!(!overlay.tick(t0 + Duration::from_millis(2900), NATIVE, true));
        assert!(overlay.is_visible());
        assert!(overlay.tick(t0 + Duration::from_secs(3), NATIVE, true));
        assert!(!overlay.is_visible());
    }

    #[test]
    fn test_conditions_block_auto_hide() {
        let t0 = Instant::now();
        let later = t0 + Duration::from_secs(10);

        // 暂停
        let mut paused = overlay();
        paused.reconcile(t0, NATIVE, false);
        assert!(!paused.hide_pending());
        paused.tick(later, NATIVE, false);
        assert!(paused.is_visible());

        // 菜单打开
        let mut menu = overlay();
        menu.toggle_menu(Menu::Speed);
        menu.reconcile(t0, NATIVE, true);
        menu.tick(later, NATIVE, true);
        assert!(menu.is_visible());

        // 拖动进度条
        let mut dragging = overlay();
        dragging.begin_seek_drag(12.0);
        dragging.reconcile(t0, NATIVE, true);
        dragging.tick(later, NATIVE, true);
        assert!(dragging.is_visible());

        // 嵌入模式从不自动隐藏
        let mut embedded = overlay();
        embedded.reconcile(t0, PlaybackMode::Embedded, true);
        embedded.tick(later, PlaybackMode::Embedded, true);
        assert!(embedded.is_visible());
    }

    #[test]
    fn test_condition_flip_after_arming_prevents_hide() {
        let t0 = Instant::now();
        let mut overlay = overlay();
        overlay.reconcile(t0, NATIVE, true);
        // 计时到期时已暂停，即便计时器仍在也不隐藏
        overlay.tick(t0 + Duration::from_secs(3), NATIVE, false);
        assert!(overlay.is_visible());
    }

    #[test]
    fn test_interaction_cancels_pending_hide() {
        let t0 = Instant::now();
        let mut overlay = overlay();
        overlay.reconcile(t0, NATIVE, true);

        let t1 = t0 + Duration::from_secs(2);
        overlay.interact();
        assert!(!overlay.hide_pending());
        overlay.reconcile(t1, NATIVE, true);

        // 原计时点不再隐藏，从交互时刻重新计时
        assert!(!overlay.tick(t0 + Duration::from_secs(3), NATIVE, true));
        assert!(overlay.is_visible());
        assert!(overlay.tick(t1 + Duration::from_secs(3), NATIVE, true));
        assert!(!overlay.is_visible());
    }

    #[test]
    fn test_menus_are_exclusive() {
        let mut overlay = overlay();
        overlay.toggle_menu(Menu::Quality);
        overlay.toggle_menu(Menu::Speed);
        assert_eq!(overlay.active_menu(), Some(Menu::Speed));
        overlay.toggle_menu(Menu::Speed);
        assert_eq!(overlay.active_menu(), None);
    }

    #[test]
    fn test_tap_container_toggles_only_in_native() {
        let mut overlay = overlay();
        overlay.tap_container(PlaybackMode::Embedded);
        assert!(overlay.is_visible());
        overlay.tap_container(NATIVE);
        assert!(!overlay.is_visible());
        overlay.tap_container(NATIVE);
        assert!(overlay.is_visible());
    }

    #[test]
    fn test_resume_toast_auto_dismisses() {
        let t0 = Instant::now();
        let mut overlay = overlay();
        overlay.show_resume_toast(t0, 42.0);
        assert_eq!(overlay.resume_toast(), Some(42.0));
        assert_eq!(overlay.next_deadline(), Some(t0 + Duration::from_secs(3)));
        overlay.tick(t0 + Duration::from_secs(3), PlaybackMode::Native, false);
        assert_eq!(overlay.resume_toast(), None);
    }

    #[test]
    fn test_seek_drag_returns_final_position() {
        let mut overlay = overlay();
        assert_eq!(overlay.end_seek_drag(), None);
        overlay.begin_seek_drag(10.0);
        overlay.update_seek_drag(55.5);
        assert_eq!(overlay.end_seek_drag(), Some(55.5));
        assert!(!overlay.is_seek_dragging());
    }

    #[test]
    fn test_rate_labels() {
        assert_eq!(rate_button_label(1.0), "1x");
        assert_eq!(rate_button_label(1.25), "1.25x");
        assert_eq!(rate_option_label(1.0), "Normal");
        assert_eq!(rate_option_label(2.0), "2x");
    }
}
