//! egui 宿主适配：在视频画面上绘制控制层
//!
//! 视频帧/嵌入页本身由宿主绘制，这里只负责叠加的控制层、菜单、提示与失败面板

pub mod icons;
pub mod viewport;

pub use icons::ControlIcons;
pub use viewport::EguiFullscreen;

use crate::core::{format_time, MediaSource};
use crate::player::overlay::{rate_button_label, rate_option_label, Chrome, Menu};
use crate::player::registry::quality_label;
use crate::player::PlaybackManager;
use egui::{pos2, vec2, Align2, Color32, Context, CursorIcon, FontId, Rect, Response, Sense, TextureHandle, Ui};
use log::{debug, warn};
use std::time::Instant;

const ACCENT: Color32 = Color32::from_rgb(139, 92, 246);
const PANEL_BG: Color32 = Color32::from_rgb(24, 24, 27);
const BOTTOM_BAR_HEIGHT: f32 = 64.0;
const TITLE_BAR_HEIGHT: f32 = 44.0;
const MENU_ROW_HEIGHT: f32 = 30.0;
const MENU_WIDTH: f32 = 140.0;

/// 控制层视图
pub struct OverlayView {
    icons: ControlIcons,
    /// 上一帧观察到的视口全屏状态（用于发现 Esc 等平台侧退出）
    viewport_fullscreen: Option<bool>,
}

impl OverlayView {
    pub fn new(ctx: &Context) -> Self {
        Self {
            icons: ControlIcons::load(ctx),
            viewport_fullscreen: None,
        }
    }

    /// 每帧调用：处理排队事件与计时器，然后在 `rect` 上绘制控制层
    pub fn show(&mut self, ui: &mut Ui, manager: &mut PlaybackManager, rect: Rect) {
        let ctx = ui.ctx().clone();
        let now = Instant::now();
        manager.pump(now);
        manager.tick(now);
        self.sync_fullscreen(&ctx, manager, now);

        match manager.chrome() {
            Chrome::Loading => render_message(ui, rect, "正在加载播放源..."),
            Chrome::FailedPanel => self.render_failed_panel(ui, manager, rect, now),
            Chrome::TitleBar => render_title_bar(ui, manager.title(), rect),
            Chrome::Full => self.render_full(ui, manager, rect, now),
        }

        if let Some(deadline) = manager.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(now));
        }
    }

    fn sync_fullscreen(&mut self, ctx: &Context, manager: &mut PlaybackManager, now: Instant) {
        let Some(current) = ctx.input(|i| i.viewport().fullscreen) else {
            return;
        };
        if self.viewport_fullscreen != Some(current) {
            if self.viewport_fullscreen.is_some() {
                debug!("视口全屏状态变化: {}", current);
                manager.on_fullscreen_change(current, now);
            }
            self.viewport_fullscreen = Some(current);
        }
    }

    fn render_full(&mut self, ui: &mut Ui, manager: &mut PlaybackManager, rect: Rect, now: Instant) {
        // 点击画面：有菜单时先关菜单，否则切换控制层显示
        let container = ui.interact(rect, ui.id().with("player_container"), Sense::click());
        if container.clicked() {
            if manager.overlay().active_menu().is_some() {
                manager.close_menus(now);
            } else {
                manager.tap_container(now);
            }
        }

        if !manager.overlay().is_visible() {
            return;
        }

        render_title_bar(ui, manager.title(), rect);
        if let Some(position) = manager.overlay().resume_toast() {
            render_resume_toast(ui, rect, position);
        }
        self.render_center_controls(ui, manager, rect, now);
        let bottom = Rect::from_min_max(pos2(rect.left(), rect.bottom() - BOTTOM_BAR_HEIGHT), rect.max);
        self.render_bottom_bar(ui, manager, bottom, now);
    }

    fn render_center_controls(&self, ui: &mut Ui, manager: &mut PlaybackManager, rect: Rect, now: Instant) {
        let center = rect.center();
        let play_icon = if manager.session().is_playing {
            &self.icons.pause
        } else {
            &self.icons.play
        };

        let back = Rect::from_center_size(center - vec2(96.0, 0.0), vec2(32.0, 32.0));
        let play = Rect::from_center_size(center, vec2(64.0, 64.0));
        let forward = Rect::from_center_size(center + vec2(96.0, 0.0), vec2(32.0, 32.0));

        if icon_button(ui, "skip_back", back, &self.icons.skip_back, true).clicked() {
            manager.skip_backward(now);
        }
        if icon_button(ui, "toggle_play", play, play_icon, true).clicked() {
            manager.toggle_play(now);
        }
        if icon_button(ui, "skip_forward", forward, &self.icons.skip_forward, true).clicked() {
            manager.skip_forward(now);
        }
    }

    fn render_bottom_bar(&self, ui: &mut Ui, manager: &mut PlaybackManager, bar: Rect, now: Instant) {
        let painter = ui.painter().clone();
        painter.rect_filled(bar, 0.0, Color32::from_black_alpha(170));

        // 进度条
        let track = Rect::from_min_max(
            pos2(bar.left() + 16.0, bar.top() + 10.0),
            pos2(bar.right() - 16.0, bar.top() + 22.0),
        );
        self.render_progress_bar(ui, manager, track, now);

        let row_y = bar.top() + 44.0;
        let mut x = bar.left() + 16.0;

        // 上一集/下一集
        let navigation = manager.navigation();
        let prev = Rect::from_center_size(pos2(x + 10.0, row_y), vec2(20.0, 20.0));
        if icon_button(ui, "prev", prev, &self.icons.prev, navigation.has_prev).clicked() {
            manager.request_prev();
        }
        x += 30.0;
        let next = Rect::from_center_size(pos2(x + 10.0, row_y), vec2(20.0, 20.0));
        if icon_button(ui, "next", next, &self.icons.next, navigation.has_next).clicked() {
            manager.request_next();
        }
        x += 36.0;

        let session = manager.session();
        let shown_time = if manager.overlay().is_seek_dragging() {
            manager.overlay().drag_position()
        } else {
            session.current_time
        };
        painter.text(
            pos2(x, row_y),
            Align2::LEFT_CENTER,
            format_time(shown_time),
            FontId::proportional(13.0),
            Color32::WHITE,
        );

        // 右侧：时长、清晰度、倍速、全屏
        let mut right = bar.right() - 16.0;
        let fullscreen = Rect::from_center_size(pos2(right - 10.0, row_y), vec2(20.0, 20.0));
        if icon_button(ui, "fullscreen", fullscreen, &self.icons.fullscreen, true).clicked() {
            let outcome = manager.request_fullscreen(now);
            debug!("全屏请求结果: {:?}", outcome);
        }
        right -= 36.0;

        let rate_label = rate_button_label(manager.session().playback_rate);
        let rate_rect = Rect::from_min_max(pos2(right - 40.0, row_y - 10.0), pos2(right, row_y + 10.0));
        if text_button(ui, "speed_button", rate_rect, &rate_label).clicked() {
            manager.toggle_menu(Menu::Speed, now);
        }
        let speed_anchor = rate_rect.right_top();
        right -= 52.0;

        let mut quality_anchor = None;
        if !manager.registry().sources().is_empty() {
            let settings = Rect::from_center_size(pos2(right - 10.0, row_y), vec2(20.0, 20.0));
            if icon_button(ui, "quality_button", settings, &self.icons.settings, true).clicked() {
                manager.toggle_menu(Menu::Quality, now);
            }
            quality_anchor = Some(settings.right_top());
            right -= 36.0;
        }

        painter.text(
            pos2(right, row_y),
            Align2::RIGHT_CENTER,
            format_time(manager.session().duration.unwrap_or(0.0)),
            FontId::proportional(13.0),
            Color32::WHITE,
        );

        match manager.overlay().active_menu() {
            Some(Menu::Speed) => render_speed_menu(ui, manager, speed_anchor, now),
            Some(Menu::Quality) => {
                if let Some(anchor) = quality_anchor {
                    render_quality_menu(ui, manager, anchor, now);
                }
            }
            None => {}
        }
    }

    fn render_progress_bar(&self, ui: &mut Ui, manager: &mut PlaybackManager, track: Rect, now: Instant) {
        let Some(duration) = manager.session().duration else {
            ui.painter().rect_filled(shrink_to_line(track), 2.0, Color32::from_gray(80));
            return;
        };

        let response = ui.interact(track, ui.id().with("progress_bar"), Sense::click_and_drag());
        if response.hovered() || response.dragged() {
            ui.ctx().set_cursor_icon(CursorIcon::PointingHand);
        }
        let pointer_time = response
            .interact_pointer_pos()
            .map(|p| ((p.x - track.left()) / track.width()).clamp(0.0, 1.0) as f64 * duration);

        if response.drag_started() {
            if let Some(t) = pointer_time {
                manager.begin_seek_drag(t, now);
            }
        } else if response.dragged() {
            if let Some(t) = pointer_time {
                manager.update_seek_drag(t);
            }
        }
        if response.drag_stopped() {
            if let Some(t) = manager.end_seek_drag(now) {
                debug!("拖拽结束，跳转到 {:.2}s", t);
            }
        } else if response.clicked() {
            if let Some(t) = pointer_time {
                manager.seek_to(t, now);
            }
        }

        let session = manager.session();
        let played = if manager.overlay().is_seek_dragging() {
            (manager.overlay().drag_position() / duration).clamp(0.0, 1.0) as f32
        } else {
            session.played_fraction()
        };
        let line = shrink_to_line(track);
        let painter = ui.painter();
        painter.rect_filled(line, 2.0, Color32::from_gray(80));
        painter.rect_filled(
            Rect::from_min_size(line.min, vec2(line.width() * session.buffered_fraction(), line.height())),
            2.0,
            Color32::from_gray(160),
        );
        painter.rect_filled(
            Rect::from_min_size(line.min, vec2(line.width() * played, line.height())),
            2.0,
            ACCENT,
        );
        painter.circle_filled(pos2(line.left() + line.width() * played, line.center().y), 6.0, ACCENT);
    }

    fn render_failed_panel(&self, ui: &mut Ui, manager: &mut PlaybackManager, rect: Rect, now: Instant) {
        ui.painter().rect_filled(rect, 0.0, PANEL_BG);
        ui.painter().text(
            rect.center() - vec2(0.0, 40.0),
            Align2::CENTER_CENTER,
            "无法从该服务器加载视频",
            FontId::proportional(15.0),
            Color32::from_rgb(248, 113, 113),
        );

        let button = Rect::from_center_size(rect.center(), vec2(160.0, 32.0));
        if ui.put(button, egui::Button::new("在外部打开")).clicked() {
            manager.open_externally();
        }

        // 终态不自动重试，但仍可手动换服务器
        let sources: Vec<MediaSource> = manager.registry().sources().to_vec();
        let count = sources.len() as f32;
        let mut x = rect.center().x - (count * 90.0 - 10.0) / 2.0;
        for (idx, source) in sources.iter().enumerate() {
            let cell = Rect::from_min_size(pos2(x, rect.center().y + 32.0), vec2(80.0, 26.0));
            let label = quality_label(&source.quality);
            let enabled = !manager.registry().is_active(source);
            let clicked = ui
                .push_id(("failed_source", idx), |ui| ui.put(cell, egui::Button::new(label)).clicked())
                .inner;
            if enabled && clicked {
                switch_source(manager, source, now);
            }
            x += 90.0;
        }
    }
}

fn render_message(ui: &mut Ui, rect: Rect, message: &str) {
    ui.painter().rect_filled(rect, 0.0, Color32::BLACK);
    ui.painter().text(
        rect.center(),
        Align2::CENTER_CENTER,
        message,
        FontId::proportional(14.0),
        Color32::GRAY,
    );
}

fn render_title_bar(ui: &mut Ui, title: &str, rect: Rect) {
    let bar = Rect::from_min_size(rect.min, vec2(rect.width(), TITLE_BAR_HEIGHT));
    let painter = ui.painter();
    painter.rect_filled(bar, 0.0, Color32::from_black_alpha(170));
    painter.text(
        pos2(bar.left() + 16.0, bar.center().y),
        Align2::LEFT_CENTER,
        title,
        FontId::proportional(16.0),
        Color32::WHITE,
    );
}

fn render_resume_toast(ui: &mut Ui, rect: Rect, position: f64) {
    let toast = Rect::from_center_size(pos2(rect.center().x, rect.top() + 24.0), vec2(200.0, 28.0));
    let painter = ui.painter();
    painter.rect_filled(toast, 14.0, Color32::from_black_alpha(210));
    painter.rect_stroke(toast, 14.0, egui::Stroke::new(1.0, ACCENT.gamma_multiply(0.5)));
    painter.text(
        toast.center(),
        Align2::CENTER_CENTER,
        format!("继续播放 {}", format_time(position)),
        FontId::proportional(12.0),
        Color32::WHITE,
    );
}

fn render_speed_menu(ui: &mut Ui, manager: &mut PlaybackManager, anchor: egui::Pos2, now: Instant) {
    let options = manager.config().speed_options.clone();
    let current = manager.session().playback_rate;
    let menu = menu_rect(anchor, options.len(), 80.0);
    ui.painter().rect_filled(menu, 8.0, Color32::from_black_alpha(230));

    for (idx, rate) in options.into_iter().enumerate() {
        let row = menu_row(menu, idx);
        let color = if rate == current { ACCENT } else { Color32::WHITE };
        if menu_item(ui, ("speed_item", idx), row, &rate_option_label(rate), color).clicked() {
            if let Err(e) = manager.set_playback_rate(rate, now) {
                warn!("⚠️ 设置倍速失败: {}", e);
            }
        }
    }
}

fn render_quality_menu(ui: &mut Ui, manager: &mut PlaybackManager, anchor: egui::Pos2, now: Instant) {
    let sources: Vec<MediaSource> = manager.registry().sources().to_vec();
    // 第一行是标题
    let menu = menu_rect(anchor, sources.len() + 1, MENU_WIDTH);
    let painter = ui.painter();
    painter.rect_filled(menu, 8.0, Color32::from_black_alpha(230));
    painter.text(
        menu_row(menu, 0).left_center() + vec2(12.0, 0.0),
        Align2::LEFT_CENTER,
        "选择清晰度",
        FontId::proportional(11.0),
        Color32::GRAY,
    );

    for (idx, source) in sources.iter().enumerate() {
        let row = menu_row(menu, idx + 1);
        let active = manager.registry().is_active(source);
        let color = if active { ACCENT } else { Color32::WHITE };
        if menu_item(ui, ("quality_item", idx), row, &source.quality, color).clicked() {
            switch_source(manager, source, now);
        }
    }
}

fn switch_source(manager: &mut PlaybackManager, source: &MediaSource, now: Instant) {
    if let Err(e) = manager.switch_source(source, now) {
        warn!("⚠️ 切换播放源失败: {}", e);
    }
}

/// 菜单在锚点上方展开，右对齐
fn menu_rect(anchor: egui::Pos2, rows: usize, width: f32) -> Rect {
    let height = rows as f32 * MENU_ROW_HEIGHT;
    Rect::from_min_max(pos2(anchor.x - width, anchor.y - 8.0 - height), pos2(anchor.x, anchor.y - 8.0))
}

fn menu_row(menu: Rect, idx: usize) -> Rect {
    Rect::from_min_size(
        pos2(menu.left(), menu.top() + idx as f32 * MENU_ROW_HEIGHT),
        vec2(menu.width(), MENU_ROW_HEIGHT),
    )
}

fn menu_item(ui: &mut Ui, id: impl std::hash::Hash, row: Rect, label: &str, color: Color32) -> Response {
    let response = ui.interact(row, ui.id().with(id), Sense::click());
    if response.hovered() {
        ui.painter().rect_filled(row, 0.0, Color32::from_white_alpha(30));
        ui.ctx().set_cursor_icon(CursorIcon::PointingHand);
    }
    ui.painter().text(
        row.left_center() + vec2(12.0, 0.0),
        Align2::LEFT_CENTER,
        label,
        FontId::proportional(13.0),
        color,
    );
    response
}

fn text_button(ui: &mut Ui, id: &str, rect: Rect, label: &str) -> Response {
    let response = ui.interact(rect, ui.id().with(id), Sense::click());
    let color = if response.hovered() { ACCENT } else { Color32::WHITE };
    if response.hovered() {
        ui.ctx().set_cursor_icon(CursorIcon::PointingHand);
    }
    ui.painter()
        .text(rect.center(), Align2::CENTER_CENTER, label, FontId::proportional(13.0), color);
    response
}

fn icon_button(ui: &mut Ui, id: &str, rect: Rect, texture: &TextureHandle, enabled: bool) -> Response {
    let sense = if enabled { Sense::click() } else { Sense::hover() };
    let response = ui.interact(rect, ui.id().with(id), sense);
    if enabled && response.hovered() {
        ui.ctx().set_cursor_icon(CursorIcon::PointingHand);
    }
    let tint = if !enabled {
        Color32::DARK_GRAY
    } else if response.hovered() {
        ACCENT
    } else {
        Color32::WHITE
    };
    ui.painter().image(
        texture.id(),
        rect,
        Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
        tint,
    );
    response
}

fn shrink_to_line(track: Rect) -> Rect {
    Rect::from_center_size(track.center(), vec2(track.width(), 4.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EngineConfig, NavigationAvailability, PlaybackMode, SurfaceEvent};
    use crate::player::fullscreen::FullscreenOutcome;
    use crate::player::surface::tests::RecordingHost;
    use crate::player::{PlaybackRequest, ProgressStore};

    fn manager(ctx: &Context) -> PlaybackManager {
        PlaybackManager::new(
            PlaybackRequest {
                sources: vec![
                    MediaSource::new("https://cdn.example.com/ep1.mp4", "720p"),
                    MediaSource::new("https://player.example.com/embed/1", "480p"),
                ],
                content_key: "ep-1".to_string(),
                poster_url: None,
                title: "Episode 1".to_string(),
                navigation: NavigationAvailability {
                    has_prev: true,
                    has_next: false,
                },
            },
            Box::new(RecordingHost::default()),
            Box::new(EguiFullscreen::new(ctx.clone())),
            ProgressStore::in_memory(),
            EngineConfig::default(),
        )
        .unwrap()
    }

    fn frame(ctx: &Context, view: &mut OverlayView, manager: &mut PlaybackManager) -> egui::FullOutput {
        ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                let rect = ui.max_rect();
                view.show(ui, manager, rect);
            });
        })
    }

    #[test]
    fn test_renders_every_chrome_headless() {
        let ctx = Context::default();
        let mut manager = manager(&ctx);
        let mut view = OverlayView::new(&ctx);

        let output = frame(&ctx, &mut view, &mut manager);
        assert!(!output.shapes.is_empty());
        assert_eq!(manager.chrome(), Chrome::Full);

        let inbox = manager.inbox();
        inbox.push(manager.generation(), SurfaceEvent::LoadedMetadata { duration: 120.0 });
        inbox.push(manager.generation(), SurfaceEvent::Play);
        frame(&ctx, &mut view, &mut manager);
        assert!(inbox.is_empty());
        assert!(manager.session().is_playing);

        manager.toggle_menu(Menu::Quality, Instant::now());
        frame(&ctx, &mut view, &mut manager);

        inbox.push(manager.generation(), SurfaceEvent::Error);
        frame(&ctx, &mut view, &mut manager);
        assert_eq!(manager.mode(), PlaybackMode::Embedded);

        inbox.push(manager.generation(), SurfaceEvent::EmbedError);
        let output = frame(&ctx, &mut view, &mut manager);
        assert_eq!(manager.chrome(), Chrome::FailedPanel);
        assert!(!output.shapes.is_empty());
    }

    #[test]
    fn test_viewport_fullscreen_adapter() {
        let ctx = Context::default();
        let mut manager = manager(&ctx);
        assert_eq!(
            manager.request_fullscreen(Instant::now()),
            FullscreenOutcome::Entered { orientation_locked: false }
        );
    }
}
