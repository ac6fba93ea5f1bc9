use crate::core::{EngineError, MediaSource, Result};
use log::{debug, info};

/// 服务器/清晰度注册表 - 同一作品可互相替换的播放源
#[derive(Debug, Clone)]
pub struct ServerQualityRegistry {
    sources: Vec<MediaSource>,
    active: usize,
}

impl ServerQualityRegistry {
    /// 创建注册表，按 `(url, quality)` 去重（保留首次出现），并选出默认播放源
    pub fn new(sources: Vec<MediaSource>, preferred_qualities: &[String]) -> Result<Self> {
        let mut unique: Vec<MediaSource> = Vec::with_capacity(sources.len());
        for source in sources {
            if !unique.contains(&source) {
                unique.push(source);
            }
        }
        if unique.is_empty() {
            return Err(EngineError::NoSources);
        }

        let active = Self::preferred_index(&unique, preferred_qualities);
        info!(
            "📋 播放源注册表: {} 个源，默认 {}",
            unique.len(),
            unique[active]
        );
        Ok(Self {
            sources: unique,
            active,
        })
    }

    /// 默认选择：依次匹配偏好清晰度，都没有则取第一个
    fn preferred_index(sources: &[MediaSource], preferred_qualities: &[String]) -> usize {
        preferred_qualities
            .iter()
            .find_map(|tier| sources.iter().position(|s| &s.quality == tier))
            .unwrap_or(0)
    }

    pub fn sources(&self) -> &[MediaSource] {
        &self.sources
    }

    pub fn preferred<'a>(&'a self, preferred_qualities: &[String]) -> &'a MediaSource {
        &self.sources[Self::preferred_index(&self.sources, preferred_qualities)]
    }

    pub fn active(&self) -> &MediaSource {
        &self.sources[self.active]
    }

    pub fn is_active(&self, source: &MediaSource) -> bool {
        self.active() == source
    }

    /// 切换活动播放源，返回是否真的发生了变化
    pub fn switch_to(&mut self, source: &MediaSource) -> Result<bool> {
        let index = self
            .sources
            .iter()
            .position(|s| s == source)
            .ok_or_else(|| EngineError::UnknownSource(source.to_string()))?;
        if index == self.active {
            debug!("播放源未变化: {}", source);
            return Ok(false);
        }
        self.active = index;
        Ok(true)
    }
}

/// 清晰度展示名称
pub fn quality_label(quality: &str) -> &str {
    match quality {
        "360p" | "480p" => "SD",
        "720p" | "1080p" => "HD",
        "FHD" => "Full HD",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiers() -> Vec<String> {
        vec!["720p".to_string(), "480p".to_string()]
    }

    #[test]
    fn test_prefers_standard_tier() {
        let registry = ServerQualityRegistry::new(
            vec![
                MediaSource::new("https://a/360.mp4", "360p"),
                MediaSource::new("https://a/480.mp4", "480p"),
                MediaSource::new("https://a/720.mp4", "720p"),
            ],
            &tiers(),
        )
        .unwrap();
        assert_eq!(registry.active().quality, "720p");

        let registry = ServerQualityRegistry::new(
            vec![
                MediaSource::new("https://a/360.mp4", "360p"),
                MediaSource::new("https://a/480.mp4", "480p"),
            ],
            &tiers(),
        )
        .unwrap();
        assert_eq!(registry.active().quality, "480p");
    }

    #[test]
    fn test_falls_back_to_first_entry() {
        let registry = ServerQualityRegistry::new(
            vec![
                MediaSource::new("https://a/embed/1", "FHD"),
                MediaSource::new("https://a/360.mp4", "360p"),
            ],
            &tiers(),
        )
        .unwrap();
        assert_eq!(registry.active().quality, "FHD");
    }

    #[test]
    fn test_dedup_and_empty() {
        let registry = ServerQualityRegistry::new(
            vec![
                MediaSource::new("https://a/720.mp4", "720p"),
                MediaSource::new("https://a/720.mp4", "720p"),
                MediaSource::new("https://b/720.mp4", "720p"),
            ],
            &tiers(),
        )
        .unwrap();
        assert_eq!(registry.sources().len(), 2);

        assert!(matches!(
            ServerQualityRegistry::new(vec![], &tiers()),
            Err(EngineError::NoSources)
        ));
    }

    #[test]
    fn test_switch_to() {
        let a = MediaSource::new("https://a/720.mp4", "720p");
        let b = MediaSource::new("https://b/embed", "480p");
        let mut registry = ServerQualityRegistry::new(vec![a.clone(), b.clone()], &tiers()).unwrap();

        assert!(!registry.switch_to(&a).unwrap());
        assert!(registry.switch_to(&b).unwrap());
        assert!(registry.is_active(&b));

        let unknown = MediaSource::new("https://c/x.mp4", "1080p");
        assert!(matches!(registry.switch_to(&unknown), Err(EngineError::UnknownSource(_))));
        assert!(registry.is_active(&b));
    }

    #[test]
    fn test_quality_label() {
        assert_eq!(quality_label("480p"), "SD");
        assert_eq!(quality_label("1080p"), "HD");
        assert_eq!(quality_label("FHD"), "Full HD");
        assert_eq!(quality_label("Server VIP"), "Server VIP");
    }
}
