use egui::{Color32, ColorImage, Context, TextureHandle, TextureOptions};
use log::{error, info};

/// 控制按钮图标
pub struct ControlIcons {
    pub play: TextureHandle,
    pub pause: TextureHandle,
    pub skip_back: TextureHandle,
    pub skip_forward: TextureHandle,
    pub prev: TextureHandle,
    pub next: TextureHandle,
    pub settings: TextureHandle,
    pub fullscreen: TextureHandle,
}

// VS Code Codicons 路径（白色填充）
const PLAY_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 16 16"><path d="M3 3v10l10-5z" fill="white"/></svg>"#;
const PAUSE_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 16 16"><path d="M4.5 3C4.22 3 4 3.22 4 3.5v9c0 .28.22.5.5.5h3c.28 0 .5-.22.5-.5v-9C8 3.22 7.78 3 7.5 3h-3zm5 0C9.22 3 9 3.22 9 3.5v9c0 .28.22.5.5.5h3c.28 0 .5-.22.5-.5v-9c0-.28-.22-.5-.5-.5h-3z" fill="white"/></svg>"#;
const SKIP_BACK_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 16 16"><path d="M3.5 2v3.5H7V4.6H5.1A5 5 0 1 1 3 8H2a6 6 0 1 0 2.5-4.9V2h-1z" fill="white"/></svg>"#;
const SKIP_FORWARD_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 16 16"><path d="M12.5 2v3.5H9V4.6h1.9A5 5 0 1 0 13 8h1a6 6 0 1 1-2.5-4.9V2h1z" fill="white"/></svg>"#;
const PREV_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 16 16"><path d="M3 3h1.5v10H3zM13 3v10L5.5 8z" fill="white"/></svg>"#;
const NEXT_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 16 16"><path d="M11.5 3H13v10h-1.5zM3 3v10l7.5-5z" fill="white"/></svg>"#;
const SETTINGS_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 16 16"><path d="M9.1 1l.4 1.8 1.2.5 1.6-1 1.4 1.4-1 1.6.5 1.2 1.8.4v2l-1.8.4-.5 1.2 1 1.6-1.4 1.4-1.6-1-1.2.5L9.1 15H6.9l-.4-1.8-1.2-.5-1.6 1-1.4-1.4 1-1.6-.5-1.2L1 9.1V6.9l1.8-.4.5-1.2-1-1.6 1.4-1.4 1.6 1 1.2-.5L6.9 1h2.2zM8 5.5a2.5 2.5 0 1 0 0 5 2.5 2.5 0 0 0 0-5z" fill="white"/></svg>"#;
const FULLSCREEN_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 16 16"><path d="M2 2h4v1.5H3.5V6H2V2zm8 0h4v4h-1.5V3.5H10V2zM2 10h1.5v2.5H6V14H2v-4zm10.5 0H14v4h-4v-1.5h2.5V10z" fill="white"/></svg>"#;

impl ControlIcons {
    /// 创建控制按钮图标（SVG 通过 resvg 渲染为纹理）
    pub fn load(ctx: &Context) -> Self {
        // 使用高分辨率渲染以获得更好的显示效果
        let icon_size = 96;
        info!("🎨 创建控制按钮图标（分辨率: {}x{}）", icon_size, icon_size);

        let load = |name: &str, svg: &str| {
            ctx.load_texture(name, svg_to_image(svg, icon_size), TextureOptions::LINEAR)
        };

        Self {
            play: load("play_icon", PLAY_SVG),
            pause: load("pause_icon", PAUSE_SVG),
            skip_back: load("skip_back_icon", SKIP_BACK_SVG),
            skip_forward: load("skip_forward_icon", SKIP_FORWARD_SVG),
            prev: load("prev_icon", PREV_SVG),
            next: load("next_icon", NEXT_SVG),
            settings: load("settings_icon", SETTINGS_SVG),
            fullscreen: load("fullscreen_icon", FULLSCREEN_SVG),
        }
    }
}

/// 把图标 SVG 栅格化为 `size`×`size` 的 egui 图像，失败时返回灰色占位
pub fn svg_to_image(svg: &str, size: usize) -> ColorImage {
    let Some(pixmap) = rasterize(svg, size as u32) else {
        return placeholder_image(size);
    };
    let rgba: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|px| {
            let c = px.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    ColorImage::from_rgba_unmultiplied([size, size], &rgba)
}

/// 按视图框的长边适配到正方形画布并居中
fn rasterize(svg: &str, side: u32) -> Option<tiny_skia::Pixmap> {
    use usvg::TreeParsing;

    let tree = usvg::Tree::from_str(svg, &usvg::Options::default())
        .map_err(|e| error!("图标 SVG 无法解析: {}", e))
        .ok()?;
    let Some(mut pixmap) = tiny_skia::Pixmap::new(side, side) else {
        error!("无法分配 {}x{} 的图标画布", side, side);
        return None;
    };

    let view = tree.view_box.rect;
    let fit = side as f32 / view.width().max(view.height());
    let center = |extent: f32| (side as f32 - extent * fit) / 2.0;
    let transform = tiny_skia::Transform::from_scale(fit, fit)
        .post_translate(center(view.width()), center(view.height()));

    resvg::Tree::from_usvg(&tree).render(transform, &mut pixmap.as_mut());
    Some(pixmap)
}

/// 占位图标（SVG 渲染失败时使用）
fn placeholder_image(size: usize) -> ColorImage {
    ColorImage::new([size, size], Color32::from_gray(200))
}
