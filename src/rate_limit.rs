// src/rate_limit.rs

use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Ключ окна: (клиент, организация, эндпоинт)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateLimitKey {
    pub client: String,
    pub organization_id: String,
    pub endpoint: String,
}

impl RateLimitKey {
    pub fn new(
        client: impl Into<String>,
        organization_id: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            client: client.into(),
            organization_id: organization_id.into(),
            endpoint: endpoint.into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    count: u32,
}

/// Решение по запросу
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Denied { retry_after: Duration },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }
}

/// Фиксированное окно: не больше `max_requests` запросов на ключ за `window`.
///
/// Окна хранятся в шардированной карте; чтение-изменение-запись одного ключа
/// выполняется под блокировкой его шарда.
#[derive(Debug)]
pub struct AdmissionController {
    windows: DashMap<RateLimitKey, Window>,
    window: Duration,
    max_requests: u32,
    max_keys: usize,
    grace: Duration,
}

impl AdmissionController {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            windows: DashMap::new(),
            window,
            max_requests,
            max_keys: usize::MAX,
            grace: Duration::ZERO,
        }
    }

    /// Порог числа ключей, выше которого `check` сам запускает очистку
    pub fn with_max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = max_keys.max(1);
        self
    }

    /// Сколько ещё держать истёкшее окно перед удалением
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }

    pub fn allow(&self, key: &RateLimitKey, now: Instant) -> bool {
        self.check(key, now).is_allowed()
    }

    pub fn check(&self, key: &RateLimitKey, now: Instant) -> Decision {
        let decision = {
            let mut slot = self.windows.entry(key.clone()).or_insert(Window {
                started_at: now,
                count: 0,
            });

            if now.saturating_duration_since(slot.started_at) >= self.window {
                slot.started_at = now;
                slot.count = 0;
            }
            slot.count = slot.count.saturating_add(1);

            if slot.count <= self.max_requests {
                Decision::Allowed {
                    remaining: self.max_requests - slot.count,
                }
            } else {
                let elapsed = now.saturating_duration_since(slot.started_at);
                Decision::Denied {
                    retry_after: self.window.saturating_sub(elapsed),
                }
            }
        };

        if self.windows.len() > self.max_keys {
            self.sweep(now);
            self.evict_oldest(key);
        }

        decision
    }

    /// Жёсткий предел числа ключей: вытесняем самые старые окна до 90% от `max_keys`,
    /// чтобы следующий проход случился не раньше чем через `max_keys / 10` новых ключей.
    /// Окно текущего ключа не трогаем.
    fn evict_oldest(&self, keep: &RateLimitKey) {
        let tracked = self.windows.len();
        if tracked <= self.max_keys {
            return;
        }
        let target = self.max_keys - self.max_keys / 10;

        let mut candidates: Vec<(Instant, RateLimitKey)> = self
            .windows
            .iter()
            .filter(|entry| entry.key() != keep)
            .map(|entry| (entry.value().started_at, entry.key().clone()))
            .collect();
        candidates.sort_by_key(|(started_at, _)| *started_at);

        let evicted = candidates
            .into_iter()
            .take(tracked.saturating_sub(target))
            .filter(|(_, key)| self.windows.remove(key).is_some())
            .count();
        debug!(evicted, remaining = self.windows.len(), "rate limit key cap enforced");
    }

    /// Удалить окна, закончившиеся раньше чем `grace` назад. Возвращает число удалённых.
    pub fn sweep(&self, now: Instant) -> usize {
        let before = self.windows.len();
        let ttl = self.window.saturating_add(self.grace);
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started_at) < ttl);
        let evicted = before.saturating_sub(self.windows.len());
        if evicted > 0 {
            debug!(evicted, remaining = self.windows.len(), "rate limit windows swept");
        }
        evicted
    }
}
