use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 播放引擎配置
///
/// 所有字段都有默认值，配置文件里只需写要覆盖的项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 控制层无操作后自动隐藏的延迟（毫秒）
    pub controls_hide_delay_ms: u64,
    /// “继续播放”提示显示时长（毫秒）
    pub resume_toast_duration_ms: u64,
    /// 退出全屏后强制刷新布局的延迟（毫秒）
    pub layout_refresh_delay_ms: u64,
    /// 低于该位置（秒）不写入进度，避免误拖动被记录
    pub progress_min_position: f64,
    /// 已看比例达到该值视为看完，不再续播
    pub resume_threshold: f64,
    /// 快进/快退步长（秒）
    pub skip_seconds: f64,
    /// 默认清晰度优先级，按顺序匹配
    pub preferred_qualities: Vec<String>,
    /// 倍速菜单选项
    pub speed_options: Vec<f64>,
    /// 原生播放出错后、回退到嵌入前的重试次数
    pub native_retry_limit: u32,
    pub storage_prefix_position: String,
    pub storage_prefix_percentage: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            controls_hide_delay_ms: 3000,
            resume_toast_duration_ms: 3000,
            layout_refresh_delay_ms: 100,
            progress_min_position: 5.0,
            resume_threshold: 0.95,
            skip_seconds: 10.0,
            preferred_qualities: vec!["720p".to_string(), "480p".to_string()],
            speed_options: vec![2.0, 1.5, 1.25, 1.0, 0.75, 0.5],
            native_retry_limit: 0,
            storage_prefix_position: "vid_prog_".to_string(),
            storage_prefix_percentage: "vid_pct_".to_string(),
        }
    }
}

impl EngineConfig {
    /// 从 JSON 文件加载配置
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("配置文件格式错误: {}", path.display()))
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn controls_hide_delay(&self) -> Duration {
        Duration::from_millis(self.controls_hide_delay_ms)
    }

    pub fn resume_toast_duration(&self) -> Duration {
        Duration::from_millis(self.resume_toast_duration_ms)
    }

    pub fn layout_refresh_delay(&self) -> Duration {
        Duration::from_millis(self.layout_refresh_delay_ms)
    }
}
