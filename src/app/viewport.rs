use crate::core::Result;
use crate::player::fullscreen::{FullscreenPlatform, SurfaceHandle};
use egui::{Context, ViewportCommand};
use log::debug;

/// egui 视口全屏适配器
///
/// 桌面端只有窗口全屏，没有屏幕方向锁定与媒体元素原生全屏
pub struct EguiFullscreen {
    ctx: Context,
}

impl EguiFullscreen {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }
}

impl FullscreenPlatform for EguiFullscreen {
    fn supports_fullscreen(&self) -> bool {
        true
    }

    fn is_fullscreen(&self) -> bool {
        self.ctx.input(|i| i.viewport().fullscreen.unwrap_or(false))
    }

    fn request_fullscreen(&mut self, target: SurfaceHandle) -> Result<()> {
        debug!("请求窗口全屏 ({:?})", target);
        self.ctx.send_viewport_cmd(ViewportCommand::Fullscreen(true));
        // 全屏时隐藏标题栏
        self.ctx.send_viewport_cmd(ViewportCommand::Decorations(false));
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<()> {
        self.ctx.send_viewport_cmd(ViewportCommand::Fullscreen(false));
        self.ctx.send_viewport_cmd(ViewportCommand::Decorations(true));
        Ok(())
    }

    fn request_layout_refresh(&mut self) {
        self.ctx.request_repaint();
    }
}
