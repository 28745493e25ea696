use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use coinq_domain::query::NormalizedQuery;
use coinq_domain::result::PlanResult;
use coinq_domain::session::{MessageRole, SessionContext};
use coinq_domain::trace::TraceEvent;
use parking_lot::RwLock;

struct Entry {
    context: SessionContext,
    expires_at: DateTime<Utc>,
}

/// Shallow-merge patch applied by `update_context`. A `None` field
/// leaves the existing value untouched; `Some` replaces it.
#[derive(Debug, Clone, Default)]
pub struct ContextPatch {
    pub last_normalized_query: Option<Option<NormalizedQuery>>,
    pub last_plan_result: Option<Option<PlanResult>>,
    pub coins: Option<Vec<String>>,
}

/// Per-session key -> `SessionContext`, the only mutable state that
/// lives between turns. The outer lock guards the map's shape (insert
/// / remove); each session's own state lives behind its own inner
/// lock so concurrent turns on different sessions never contend, and
/// a concurrent read of one session never tears.
pub struct SessionCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, Arc<RwLock<Entry>>>>,
}

impl SessionCache {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            ttl: Duration::seconds(ttl_seconds as i64),
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn get_or_create(&self, session_id: &str) -> Arc<RwLock<Entry>> {
        if let Some(slot) = self.entries.read().get(session_id) {
            return Arc::clone(slot);
        }
        let mut entries = self.entries.write();
        Arc::clone(
            entries
                .entry(session_id.to_string())
                .or_insert_with(|| {
                    Arc::new(RwLock::new(Entry {
                        context: SessionContext::fresh(),
                        expires_at: DateTime::<Utc>::MIN_UTC,
                    }))
                }),
        )
    }

    /// Returns the session's context, or a fresh empty one if absent
    /// or expired. Every call refreshes the expiry.
    pub fn load(&self, session_id: &str, now: DateTime<Utc>) -> SessionContext {
        let slot = self.get_or_create(session_id);
        let mut entry = slot.write();

        if entry.expires_at <= now && entry.context.message_count > 0 {
            let idle = (now - entry.expires_at + self.ttl).num_seconds().max(0) as u64;
            TraceEvent::SessionExpired {
                session_key: session_id.to_string(),
                idle_seconds: idle,
            }
            .emit();
            entry.context = SessionContext::fresh();
        }

        entry.expires_at = now + self.ttl;
        entry.context.clone()
    }

    pub fn append_message(&self, session_id: &str, role: MessageRole, content: String, now: DateTime<Utc>) {
        let slot = self.get_or_create(session_id);
        let mut entry = slot.write();
        entry.context.append_message(role, content, now);
        entry.expires_at = now + self.ttl;
    }

    pub fn update_context(&self, session_id: &str, patch: ContextPatch, now: DateTime<Utc>) {
        let slot = self.get_or_create(session_id);
        let mut entry = slot.write();

        if let Some(q) = patch.last_normalized_query {
            entry.context.last_normalized_query = q;
        }
        if let Some(r) = patch.last_plan_result {
            entry.context.last_plan_result = r;
        }
        if let Some(coins) = patch.coins {
            entry.context.coins = coins;
        }
        entry.expires_at = now + self.ttl;
    }

    /// Drop whichever entries have passed their expiry without a
    /// touch. Not required for correctness (`load` self-heals lazily)
    /// but bounds memory for long-running processes.
    pub fn sweep_expired(&self, now: DateTime<Utc>) {
        let expired: Vec<String> = self
            .entries
            .read()
            .iter()
            .filter(|(_, slot)| slot.read().expires_at <= now)
            .map(|(k, _)| k.clone())
            .collect();

        if expired.is_empty() {
            return;
        }
        let mut entries = self.entries.write();
        for key in expired {
            entries.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn fresh_session_is_empty() {
        let cache = SessionCache::new(60);
        let ctx = cache.load("s1", t(0));
        assert_eq!(ctx.message_count, 0);
        assert!(ctx.last_normalized_query.is_none());
    }

    #[test]
    fn touch_refreshes_expiry_across_loads() {
        let cache = SessionCache::new(60);
        cache.append_message("s1", MessageRole::User, "hi".into(), t(0));
        // within TTL: still present
        let ctx = cache.load("s1", t(30));
        assert_eq!(ctx.message_count, 1);
    }

    #[test]
    fn ttl_expiry_returns_fresh_context() {
        let cache = SessionCache::new(60);
        cache.append_message("s1", MessageRole::User, "hi".into(), t(0));
        // past TTL with no further touch between t(0) and t(100)
        let ctx = cache.load("s1", t(100));
        assert_eq!(ctx.message_count, 0);
    }

    #[test]
    fn update_context_is_a_shallow_merge() {
        let cache = SessionCache::new(60);
        cache.update_context(
            "s1",
            ContextPatch {
                coins: Some(vec!["BTC".into()]),
                ..Default::default()
            },
            t(0),
        );
        cache.update_context(
            "s1",
            ContextPatch {
                last_plan_result: None,
                ..Default::default()
            },
            t(1),
        );
        let ctx = cache.load("s1", t(2));
        assert_eq!(ctx.coins, vec!["BTC".to_string()]);
    }
}
