// src/report/redis.rs

use redis::{AsyncCommands, Client};

use crate::config::RedisSettings;
use crate::errors::Result;
use crate::report::{Record, Reporter, deliver_best_effort};
use crate::types::BoxFuture;

/// `LPUSH`es JSON records onto a list, typically drained by logstash.
///
/// A fresh connection is opened per record: a run produces two records, so
/// there is nothing to gain from keeping one around.
#[derive(Debug, Clone)]
pub struct RedisReporter {
    client: Client,
    key: String,
}

impl RedisReporter {
    pub fn new(settings: &RedisSettings, key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: Client::open(settings.url())?,
            key: key.into(),
        })
    }

    async fn push(&self, payload: String) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _len: i64 = conn.lpush(&self.key, payload).await?;
        Ok(())
    }
}

impl Reporter for RedisReporter {
    fn record<'a>(&'a self, record: &'a Record) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let attempt = async {
                let payload = record.to_json()?;
                self.push(payload).await
            };
            deliver_best_effort("redis", record, attempt).await;
        })
    }
}
