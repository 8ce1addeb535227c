// Fixed window counters in Redis

use crate::errors::Result;
use crate::rate_limit::store::CounterStore;
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Script};
use std::time::Duration;

/// Increment and set the expiry on first hit, as one server-side step
const INCREMENT_SCRIPT: &str = r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
return count
"#;

/// Counter store backed by a shared Redis instance
#[derive(Clone)]
pub struct RedisCounterStore {
    manager: ConnectionManager,
    increment: Script,
}

impl RedisCounterStore {
    pub fn new(manager: ConnectionManager) -> Self {
        Self {
            manager,
            increment: Script::new(INCREMENT_SCRIPT),
        }
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn increment(&self, key: &str, ttl: Duration) -> Result<u64> {
        let mut conn = self.manager.clone();

        let count: u64 = self
            .increment
            .key(key)
            .arg(ttl.as_millis() as u64)
            .invoke_async(&mut conn)
            .await?;

        Ok(count)
    }

    async fn get(&self, key: &str) -> Result<u64> {
        let mut conn = self.manager.clone();
        let count: Option<u64> = conn.get(key).await?;
        Ok(count.unwrap_or(0))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }
}
