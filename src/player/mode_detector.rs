use crate::core::DeliveryKind;

/// 原生媒体元素可直接播放的扩展名
const DIRECT_MEDIA_EXTENSIONS: [&str; 4] = ["mp4", "m3u8", "webm", "ogg"];

/// 根据 URL 判断投递类型（只看扩展名，不探测 Content-Type）
///
/// `.mp4` / `.m3u8` / `.webm` / `.ogg`（不区分大小写）后面紧跟字符串结尾或 `?`
/// 即视为直链，其余一律当作嵌入播放页
pub fn classify(url: &str) -> DeliveryKind {
    let lower = url.to_ascii_lowercase();
    let bytes = lower.as_bytes();

    for (dot, _) in lower.match_indices('.') {
        let rest = &lower[dot + 1..];
        for ext in DIRECT_MEDIA_EXTENSIONS {
            if !rest.starts_with(ext) {
                continue;
            }
            match bytes.get(dot + 1 + ext.len()) {
                None | Some(b'?') => return DeliveryKind::DirectMedia,
                _ => {}
            }
        }
    }

    DeliveryKind::OpaqueEmbed
}

pub fn is_direct_media(url: &str) -> bool {
    classify(url) == DeliveryKind::DirectMedia
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_media_extensions() {
        for url in [
            "https://cdn.example.com/ep1.mp4",
            "https://cdn.example.com/live/index.m3u8",
            "https://cdn.example.com/clip.webm",
            "https://cdn.example.com/clip.ogg",
            "https://cdn.example.com/EP1.MP4",
            "https://cdn.example.com/ep1.mp4?token=abc&exp=1",
            "https://cdn.example.com/Index.M3u8?x=1",
        ] {
            assert_eq!(classify(url), DeliveryKind::DirectMedia, "{}", url);
        }
    }

    #[test]
    fn test_opaque_embeds() {
        for url in [
            "https://player.example.com/embed/12345",
            "https://cdn.example.com/ep1.mp4/page",
            "https://cdn.example.com/ep1.mp4#t=10",
            "https://cdn.example.com/ep1.mkv",
            "https://cdn.example.com/ep1.mp45",
            "https://cdn.example.com/ep1.oggx?x=1",
            "https://cdn.example.com/mp4",
            "",
        ] {
            assert_eq!(classify(url), DeliveryKind::OpaqueEmbed, "{}", url);
        }
    }

    #[test]
    fn test_extension_anywhere_before_query() {
        // 扩展名不要求出现在路径末段，只要后面紧跟 `?` 或结尾
        assert!(is_direct_media("https://proxy.example.com/get?u=video.mp4"));
        assert!(is_direct_media("https://a.example.com/x.webm?redirect=embed.html"));
    }
}
