// src/lock/redis.rs

//! Distributed lock on a redis key.
//!
//! Acquisition is `SET <key> <token> NX [PX <lease>]`. The token is unique
//! per lock handle and release only deletes the key while it still holds
//! our token, so a lease that expired and was taken over by another host is
//! left alone.

use std::fmt;
use std::time::Duration;

use redis::aio::MultiplexedConnection;
use redis::{Client, Script};
use tokio::time::sleep;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::Result;
use crate::lock::Lock;
use crate::types::BoxFuture;

const RELEASE_SCRIPT: &str = r#"
if redis.call("get", KEYS[1]) == ARGV[1] then
    return redis.call("del", KEYS[1])
else
    return 0
end
"#;

pub const DEFAULT_PREFIX: &str = "lock:";

/// Builds [`RedisLock`]s that share one client and key prefix.
#[derive(Debug, Clone)]
pub struct RedisLockFactory {
    client: Client,
    prefix: String,
    lease: Option<Duration>,
    sleep: Duration,
    blocking: bool,
}

impl RedisLockFactory {
    pub fn new(
        client: Client,
        prefix: impl Into<String>,
        lease: Option<Duration>,
        sleep: Duration,
        blocking: bool,
    ) -> Self {
        Self {
            client,
            prefix: prefix.into(),
            lease,
            sleep,
            blocking,
        }
    }

    pub fn build(&self, name: &str) -> RedisLock {
        RedisLock {
            client: self.client.clone(),
            key: format!("{}{}", self.prefix, name),
            token: Uuid::new_v4().to_string(),
            lease: self.lease,
            sleep: self.sleep,
            blocking: self.blocking,
            conn: None,
            held: false,
        }
    }
}

pub struct RedisLock {
    client: Client,
    key: String,
    token: String,
    lease: Option<Duration>,
    sleep: Duration,
    blocking: bool,
    conn: Option<MultiplexedConnection>,
    held: bool,
}

impl RedisLock {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    async fn connection(&mut self) -> Result<MultiplexedConnection> {
        if let Some(conn) = &self.conn {
            return Ok(conn.clone());
        }
        let conn = self.client.get_multiplexed_async_connection().await?;
        self.conn = Some(conn.clone());
        Ok(conn)
    }

    async fn acquire_inner(&mut self) -> Result<bool> {
        let mut conn = self.connection().await?;

        loop {
            let mut cmd = redis::cmd("SET");
            cmd.arg(&self.key).arg(&self.token).arg("NX");
            if let Some(lease) = self.lease {
                cmd.arg("PX").arg(lease.as_millis() as u64);
            }

            let reply: Option<String> = cmd.query_async(&mut conn).await?;
            if reply.is_some() {
                self.held = true;
                return Ok(true);
            }
            if !self.blocking {
                return Ok(false);
            }

            debug!(key = %self.key, "lock busy; waiting");
            sleep(self.sleep).await;
        }
    }

    async fn release_inner(&mut self) -> Result<()> {
        let mut conn = self.connection().await?;
        let script = Script::new(RELEASE_SCRIPT);
        let deleted: i64 = script
            .key(&self.key)
            .arg(&self.token)
            .invoke_async(&mut conn)
            .await?;
        if deleted == 0 {
            warn!(key = %self.key, "lock expired before release");
        }
        Ok(())
    }
}

impl Lock for RedisLock {
    fn acquire(&mut self) -> BoxFuture<'_, Result<bool>> {
        Box::pin(self.acquire_inner())
    }

    fn release(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            if !self.held {
                debug!(key = %self.key, "release without a held lock; nothing to do");
                return;
            }
            if let Err(e) = self.release_inner().await {
                warn!(key = %self.key, error = %e, "failed to release redis lock");
            }
            self.held = false;
        })
    }
}

impl fmt::Display for RedisLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "redis lock {}", self.key)
    }
}
