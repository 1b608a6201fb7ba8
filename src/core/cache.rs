//! 会话图缓存（TTL + LRU）
//!
//! 按 session_id 缓存编译好的编排图，避免每条消息都重建。访问即刷新 last_used（滑动过期）；
//! 满容量插入新键时淘汰 last_used 最早的一条。所有修改在同一把互斥锁内完成。
//! 缓存关闭时 get 总是未命中、set 不做任何事，调用方无需区分。

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::react::RunConfig;

/// 缓存参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl: Duration,
    pub max_size: usize,
    pub cleanup_interval: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(15 * 60),
            max_size: 20,
            cleanup_interval: Duration::from_secs(5 * 60),
        }
    }
}

/// 缓存条目
pub struct CachedGraph<G> {
    pub graph: Arc<G>,
    pub config: RunConfig,
    pub created_at: Instant,
    pub last_used: Instant,
}

impl<G> CachedGraph<G> {
    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.duration_since(self.last_used) > ttl
    }
}

/// 统计快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub enabled: bool,
    pub size: usize,
    pub max_size: usize,
    pub ttl_secs: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub hit_rate: f64,
}

struct Inner<G> {
    entries: HashMap<String, CachedGraph<G>>,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

impl<G> Default for Inner<G> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
            evictions: 0,
            expirations: 0,
        }
    }
}

pub struct GraphCache<G> {
    settings: CacheSettings,
    inner: Mutex<Inner<G>>,
}

impl<G> GraphCache<G> {
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            settings,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    fn lock(&self) -> MutexGuard<'_, Inner<G>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 命中返回图并刷新 last_used；过期条目会被移除并计为过期 + 未命中
    pub fn get(&self, session_id: &str) -> Option<Arc<G>> {
        if !self.settings.enabled {
            return None;
        }
        let mut inner = self.lock();
        Self::lookup(&mut inner, session_id, self.settings.ttl, None)
    }

    fn lookup(
        inner: &mut Inner<G>,
        session_id: &str,
        ttl: Duration,
        expected: Option<&RunConfig>,
    ) -> Option<Arc<G>> {
        let now = Instant::now();
        let expired = match inner.entries.get(session_id) {
            None => {
                inner.misses += 1;
                return None;
            }
            Some(entry) => entry.is_expired(ttl, now),
        };
        if expired {
            inner.entries.remove(session_id);
            inner.expirations += 1;
            inner.misses += 1;
            tracing::debug!(session = %session_id, "graph cache entry expired");
            return None;
        }
        let entry = inner.entries.get_mut(session_id)?;
        if expected.map(|c| *c != entry.config).unwrap_or(false) {
            inner.misses += 1;
            return None;
        }
        entry.last_used = now;
        let graph = entry.graph.clone();
        inner.hits += 1;
        Some(graph)
    }

    /// 插入；容量已满且是新键时先淘汰最久未使用的一条
    pub fn set(&self, session_id: &str, graph: Arc<G>, config: RunConfig) {
        if !self.settings.enabled {
            return;
        }
        let mut inner = self.lock();
        self.insert_locked(&mut inner, session_id, graph, config);
    }

    fn insert_locked(&self, inner: &mut Inner<G>, session_id: &str, graph: Arc<G>, config: RunConfig) {
        if self.settings.max_size == 0 {
            return;
        }
        if !inner.entries.contains_key(session_id) && inner.entries.len() >= self.settings.max_size {
            let lru = inner
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone());
            if let Some(key) = lru {
                inner.entries.remove(&key);
                inner.evictions += 1;
                tracing::debug!(session = %key, "graph cache evicted least recently used entry");
            }
        }
        let now = Instant::now();
        inner.entries.insert(
            session_id.to_string(),
            CachedGraph {
                graph,
                config,
                created_at: now,
                last_used: now,
            },
        );
    }

    /// 取缓存，未命中（或运行配置不同）时用 factory 构建并放入缓存
    pub fn get_or_create<F>(&self, session_id: &str, config: &RunConfig, factory: F) -> Arc<G>
    where
        F: FnOnce(&RunConfig) -> G,
    {
        if !self.settings.enabled {
            return Arc::new(factory(config));
        }
        let mut inner = self.lock();
        if let Some(graph) = Self::lookup(&mut inner, session_id, self.settings.ttl, Some(config)) {
            return graph;
        }
        let graph = Arc::new(factory(config));
        self.insert_locked(&mut inner, session_id, graph.clone(), config.clone());
        graph
    }

    pub fn remove(&self, session_id: &str) -> bool {
        self.lock().entries.remove(session_id).is_some()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.lock().entries.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 清掉所有过期条目，返回清理数量
    pub fn cleanup_expired(&self) -> usize {
        let ttl = self.settings.ttl;
        let now = Instant::now();
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner.entries.retain(|_, e| !e.is_expired(ttl, now));
        let removed = before - inner.entries.len();
        inner.expirations += removed as u64;
        if removed > 0 {
            tracing::info!(removed, remaining = inner.entries.len(), "graph cache cleanup");
        }
        removed
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        let total = inner.hits + inner.misses;
        CacheStats {
            enabled: self.settings.enabled,
            size: inner.entries.len(),
            max_size: self.settings.max_size,
            ttl_secs: self.settings.ttl.as_secs(),
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            expirations: inner.expirations,
            hit_rate: if total == 0 { 0.0 } else { inner.hits as f64 / total as f64 },
        }
    }
}

impl<G: Send + Sync + 'static> GraphCache<G> {
    /// 后台定期清理；缓存被释放后任务自动结束
    pub fn spawn_cleanup(self: &Arc<Self>) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        let period = self.settings.cleanup_interval.max(Duration::from_millis(10));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match weak.upgrade() {
                    Some(cache) => {
                        cache.cleanup_expired();
                    }
                    None => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(max_size: usize, ttl: Duration) -> CacheSettings {
        CacheSettings {
            enabled: true,
            ttl,
            max_size,
            cleanup_interval: Duration::from_millis(20),
        }
    }

    fn cache(max_size: usize) -> GraphCache<String> {
        GraphCache::new(settings(max_size, Duration::from_secs(60)))
    }

    fn put(c: &GraphCache<String>, id: &str) {
        c.set(id, Arc::new(format!("graph-{id}")), RunConfig::default());
    }

    #[test]
    fn test_hit_and_miss_counters() {
        let c = cache(5);
        assert!(c.get("a").is_none());
        put(&c, "a");
        assert_eq!(c.get("a").as_deref().map(String::as_str), Some("graph-a"));
        let s = c.stats();
        assert_eq!((s.hits, s.misses), (1, 1));
        assert_eq!(s.hit_rate, 0.5);
    }

    #[test]
    fn test_overflow_evicts_lru() {
        let c = cache(3);
        put(&c, "s1");
        std::thread::sleep(Duration::from_millis(2));
        put(&c, "s2");
        std::thread::sleep(Duration::from_millis(2));
        put(&c, "s3");
        std::thread::sleep(Duration::from_millis(2));
        // 访问 s1 让 s2 变成最久未使用
        assert!(c.get("s1").is_some());
        std::thread::sleep(Duration::from_millis(2));
        put(&c, "s4");
        assert_eq!(c.len(), 3);
        assert!(!c.contains("s2"));
        assert!(c.contains("s1"));
        assert_eq!(c.stats().evictions, 1);
    }

    #[test]
    fn test_max_size_plus_one_keeps_max_size() {
        let c = cache(20);
        for i in 0..21 {
            put(&c, &format!("s{i}"));
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(c.len(), 20);
        assert!(!c.contains("s0"));
        assert!(c.contains("s20"));
    }

    #[test]
    fn test_updating_existing_key_does_not_evict() {
        let c = cache(2);
        put(&c, "a");
        put(&c, "b");
        put(&c, "a");
        assert_eq!(c.len(), 2);
        assert_eq!(c.stats().evictions, 0);
    }

    #[test]
    fn test_expired_entry_counts_expiration_and_miss() {
        let c = GraphCache::new(settings(5, Duration::from_millis(10)));
        c.set("a", Arc::new(1u8), RunConfig::default());
        std::thread::sleep(Duration::from_millis(25));
        assert!(c.get("a").is_none());
        let s = c.stats();
        assert_eq!((s.expirations, s.misses, s.size), (1, 1, 0));
    }

    #[test]
    fn test_cleanup_expired() {
        let c = GraphCache::new(settings(5, Duration::from_millis(10)));
        c.set("a", Arc::new(1u8), RunConfig::default());
        c.set("b", Arc::new(2u8), RunConfig::default());
        std::thread::sleep(Duration::from_millis(25));
        c.set("c", Arc::new(3u8), RunConfig::default());
        assert_eq!(c.cleanup_expired(), 2);
        assert!(c.contains("c"));
        assert_eq!(c.stats().expirations, 2);
    }

    #[test]
    fn test_disabled_cache_is_transparent() {
        let c: GraphCache<u8> = GraphCache::new(CacheSettings {
            enabled: false,
            ..CacheSettings::default()
        });
        c.set("a", Arc::new(1), RunConfig::default());
        assert!(c.get("a").is_none());
        assert!(c.is_empty());
        let mut built = 0;
        let g = c.get_or_create("a", &RunConfig::default(), |_| {
            built += 1;
            7
        });
        assert_eq!(*g, 7);
        assert_eq!(built, 1);
    }

    #[test]
    fn test_get_or_create_reuses_and_rebuilds_on_config_change() {
        let c: GraphCache<u32> = GraphCache::new(settings(5, Duration::from_secs(60)));
        let cfg = RunConfig::default();
        let a = c.get_or_create("s", &cfg, |_| 1);
        let b = c.get_or_create("s", &cfg, |_| 2);
        assert!(Arc::ptr_eq(&a, &b));

        let other = RunConfig {
            max_iterations: 3,
            ..RunConfig::default()
        };
        let d = c.get_or_create("s", &other, |_| 3);
        assert_eq!(*d, 3);
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_remove() {
        let c = cache(5);
        put(&c, "a");
        assert!(c.remove("a"));
        assert!(!c.remove("a"));
    }

    #[tokio::test]
    async fn test_background_cleanup() {
        let c = Arc::new(GraphCache::new(settings(5, Duration::from_millis(5))));
        c.set("a", Arc::new(1u8), RunConfig::default());
        let handle = c.spawn_cleanup();
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(c.is_empty());
        drop(c);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.is_finished());
    }
}
