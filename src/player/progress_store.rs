use crate::core::{EngineConfig, EngineError, ProgressRecord, Result};
use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// 键值存储抽象接口
///
/// 引擎不关心具体存储介质，宿主注入实现（浏览器本地存储、文件、内存等）
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// 内存键值存储（测试替身，也可作为无持久化时的默认实现）
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// JSON 文件键值存储
///
/// 整个文件是一个扁平的 JSON 对象，每次修改后整体重写
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// 打开存储文件，文件不存在时从空开始
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let text = std::fs::read_to_string(&path)?;
            if text.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&text)?
            }
        } else {
            BTreeMap::new()
        };
        debug!("📂 打开进度存储文件: {} ({} 条)", path.display(), entries.len());
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let text = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

/// 观看进度存储
///
/// 每个内容键对应两条记录：位置（浮点秒）与百分比（0-100 整数），
/// 均以内容键作命名空间，不同作品互不干扰
pub struct ProgressStore {
    backend: Box<dyn KeyValueStore>,
    position_prefix: String,
    percentage_prefix: String,
}

impl ProgressStore {
    pub fn new(backend: Box<dyn KeyValueStore>) -> Self {
        Self::with_config(backend, &EngineConfig::default())
    }

    pub fn with_config(backend: Box<dyn KeyValueStore>, config: &EngineConfig) -> Self {
        Self {
            backend,
            position_prefix: config.storage_prefix_position.clone(),
            percentage_prefix: config.storage_prefix_percentage.clone(),
        }
    }

    /// 纯内存存储（无持久化）
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    fn position_key(&self, content_key: &str) -> String {
        format!("{}{}", self.position_prefix, content_key)
    }

    fn percentage_key(&self, content_key: &str) -> String {
        format!("{}{}", self.percentage_prefix, content_key)
    }

    /// 读取进度，没有位置记录或记录无法解析时返回 None
    pub fn read(&self, content_key: &str) -> Result<Option<ProgressRecord>> {
        let Some(raw_position) = self.backend.get(&self.position_key(content_key))? else {
            return Ok(None);
        };
        let position_seconds = match raw_position.trim().parse::<f64>() {
            Ok(p) if p.is_finite() => p,
            _ => {
                warn!("⚠️ 进度记录无法解析，忽略: {} = {:?}", content_key, raw_position);
                return Ok(None);
            }
        };
        let percentage = self
            .backend
            .get(&self.percentage_key(content_key))?
            .and_then(|raw| raw.trim().parse::<u8>().ok())
            .unwrap_or(0)
            .min(100);

        Ok(Some(ProgressRecord {
            content_key: content_key.to_string(),
            position_seconds,
            percentage,
        }))
    }

    pub fn write(&self, content_key: &str, position_seconds: f64, percentage: u8) -> Result<()> {
        if !position_seconds.is_finite() {
            return Err(EngineError::Storage(format!(
                "非法进度位置: {}",
                position_seconds
            )));
        }
        self.backend
            .set(&self.position_key(content_key), &position_seconds.to_string())?;
        self.backend
            .set(&self.percentage_key(content_key), &percentage.min(100).to_string())?;
        Ok(())
    }

    pub fn clear(&self, content_key: &str) -> Result<()> {
        self.backend.remove(&self.position_key(content_key))?;
        self.backend.remove(&self.percentage_key(content_key))?;
        debug!("🧹 已清除进度记录: {}", content_key);
        Ok(())
    }
}

/// 计算观看百分比（向下取整，限制在 0-100）
pub fn watched_percentage(position_seconds: f64, duration: f64) -> u8 {
    if duration <= 0.0 || !duration.is_finite() {
        return 0;
    }
    ((position_seconds / duration) * 100.0).floor().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct SharedStore(Arc<MemoryStore>);

    impl KeyValueStore for SharedStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.0.get(key)
        }
        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.0.set(key, value)
        }
        fn remove(&self, key: &str) -> Result<()> {
            self.0.remove(key)
        }
    }

    #[test]
    fn test_write_read_clear() {
        let store = ProgressStore::in_memory();
        assert_eq!(store.read("ep-1").unwrap(), None);

        store.write("ep-1", 42.5, 35).unwrap();
        store.write("ep-1", 60.0, 50).unwrap();
        let record = store.read("ep-1").unwrap().unwrap();
        assert_eq!(record.position_seconds, 60.0);
        assert_eq!(record.percentage, 50);

        store.clear("ep-1").unwrap();
        assert_eq!(store.read("ep-1").unwrap(), None);
    }

    #[test]
    fn test_keys_are_namespaced() {
        let backend = Arc::new(MemoryStore::new());
        let store = ProgressStore::new(Box::new(SharedStore(backend.clone())));
        store.write("ep-1", 10.0, 8).unwrap();
        store.write("ep-2", 20.0, 16).unwrap();

        assert_eq!(backend.get("vid_prog_ep-1").unwrap().as_deref(), Some("10"));
        assert_eq!(backend.get("vid_pct_ep-2").unwrap().as_deref(), Some("16"));
        assert_eq!(store.read("ep-2").unwrap().unwrap().position_seconds, 20.0);

        store.clear("ep-1").unwrap();
        assert!(store.read("ep-2").unwrap().is_some());
        assert_eq!(backend.len(), 2);
    }

    #[test]
    fn test_garbage_value_is_absent() {
        let backend = Arc::new(MemoryStore::new());
        backend.set("vid_prog_ep-9", "NaN-ish").unwrap();
        let store = ProgressStore::new(Box::new(SharedStore(backend)));
        assert_eq!(store.read("ep-9").unwrap(), None);
    }

    #[test]
    fn test_json_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");

        {
            let store = ProgressStore::new(Box::new(JsonFileStore::open(&path).unwrap()));
            store.write("ep-1", 42.0, 35).unwrap();
        }

        let store = ProgressStore::new(Box::new(JsonFileStore::open(&path).unwrap()));
        let record = store.read("ep-1").unwrap().unwrap();
        assert_eq!(record.position_seconds, 42.0);
        assert_eq!(record.percentage, 35);
    }

    #[test]
    fn test_watched_percentage() {
        assert_eq!(watched_percentage(42.0, 120.0), 35);
        assert_eq!(watched_percentage(130.0, 120.0), 100);
        assert_eq!(watched_percentage(10.0, 0.0), 0);
    }
}
