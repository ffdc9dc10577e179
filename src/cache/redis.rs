//! Redis cache implementation using bb8 connection pool.

use std::collections::HashMap;

use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError};

use crate::cache::key::KeyMaker;
use crate::cache::{AppCache, CacheError};
use crate::config::settings::RedisCacheConfig;

type RedisPool = Pool<Client>;

/// Redis-based cache with bb8 connection pool.
///
/// Every key lives under the [`KeyMaker`] prefix, which also scopes `clear`.
pub struct RedisCache {
    pool: RedisPool,
    keys: KeyMaker,
    default_ttl: u64,
}

impl RedisCache {
    /// Fails with [`CacheError::Configuration`] for a zero pool size.
    pub async fn new(
        config: &RedisCacheConfig,
        keys: KeyMaker,
        default_ttl: u64,
    ) -> Result<Self, CacheError> {
        if config.pool_size == 0 {
            return Err(CacheError::configuration("redis pool size must be greater than 0"));
        }

        let client =
            Client::open(config.url.as_str()).map_err(|e| CacheError::Connection(e.to_string()))?;

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(std::time::Duration::from_secs(config.connection_timeout))
            .build(client)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        Ok(Self {
            pool,
            keys,
            default_ttl,
        })
    }

    async fn get_conn(&self) -> Result<PooledConnection<'_, Client>, CacheError> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))
    }

    fn ttl(&self, ttl_seconds: Option<u64>) -> u64 {
        ttl_seconds.unwrap_or(self.default_ttl)
    }
}

fn op_err(e: RedisError) -> CacheError {
    CacheError::Operation(e.to_string())
}

#[async_trait]
impl AppCache for RedisCache {
    async fn get(&self, key: &str, version: Option<u32>) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;
        let key = self.keys.make_key(key, version);

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        conn_ref.get(&key).await.map_err(op_err)
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl_seconds: Option<u64>,
        version: Option<u32>,
    ) -> Result<(), CacheError> {
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;
        let key = self.keys.make_key(key, version);
        let ttl = self.ttl(ttl_seconds);

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        if ttl == 0 {
            return conn_ref.del::<_, ()>(&key).await.map_err(op_err);
        }
        conn_ref
            .set_ex::<_, _, ()>(&key, value, ttl)
            .await
            .map_err(op_err)
    }

    async fn add(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl_seconds: Option<u64>,
        version: Option<u32>,
    ) -> Result<bool, CacheError> {
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;
        let key = self.keys.make_key(key, version);
        let ttl = self.ttl(ttl_seconds);

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        if ttl == 0 {
            let exists: bool = conn_ref.exists(&key).await.map_err(op_err)?;
            return Ok(!exists);
        }

        // SET NX replies OK when stored and nil when the key already exists
        let reply: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl)
            .query_async(conn_ref)
            .await
            .map_err(op_err)?;
        Ok(reply.is_some())
    }

    async fn delete(&self, key: &str, version: Option<u32>) -> Result<(), CacheError> {
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;
        let key = self.keys.make_key(key, version);

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        conn_ref.del::<_, ()>(&key).await.map_err(op_err)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;
        let pattern = format!("{}:*", self.keys.prefix());

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        let keys: Vec<String> = redis::cmd("KEYS")
            .arg(&pattern)
            .query_async(conn_ref)
            .await
            .map_err(op_err)?;

        if !keys.is_empty() {
            let conn_ref: &mut MultiplexedConnection = &mut conn;
            conn_ref.del::<_, ()>(keys).await.map_err(op_err)?;
        }

        Ok(())
    }

    async fn has_key(&self, key: &str, version: Option<u32>) -> Result<bool, CacheError> {
        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;
        let key = self.keys.make_key(key, version);

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        conn_ref.exists(&key).await.map_err(op_err)
    }

    async fn get_many(
        &self,
        keys: &[&str],
        version: Option<u32>,
    ) -> Result<HashMap<String, Vec<u8>>, CacheError> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;
        let full_keys: Vec<String> = keys
            .iter()
            .map(|key| self.keys.make_key(key, version))
            .collect();

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        let values: Vec<Option<Vec<u8>>> = redis::cmd("MGET")
            .arg(&full_keys)
            .query_async(conn_ref)
            .await
            .map_err(op_err)?;

        Ok(keys
            .iter()
            .zip(values)
            .filter_map(|(key, value)| value.map(|v| ((*key).to_string(), v)))
            .collect())
    }

    async fn set_many(
        &self,
        data: &HashMap<String, Vec<u8>>,
        ttl_seconds: Option<u64>,
        version: Option<u32>,
    ) -> Result<(), CacheError> {
        if data.is_empty() {
            return Ok(());
        }

        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;
        let ttl = self.ttl(ttl_seconds);

        let mut pipe = redis::pipe();
        for (key, value) in data {
            let key = self.keys.make_key(key, version);
            if ttl == 0 {
                pipe.cmd("DEL").arg(key).ignore();
            } else {
                pipe.cmd("SET")
                    .arg(key)
                    .arg(value.as_slice())
                    .arg("EX")
                    .arg(ttl)
                    .ignore();
            }
        }

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        pipe.query_async::<()>(conn_ref).await.map_err(op_err)
    }

    async fn delete_many(&self, keys: &[&str], version: Option<u32>) -> Result<(), CacheError> {
        if keys.is_empty() {
            return Ok(());
        }

        let mut conn: PooledConnection<'_, Client> = self.get_conn().await?;
        let full_keys: Vec<String> = keys
            .iter()
            .map(|key| self.keys.make_key(key, version))
            .collect();

        let conn_ref: &mut MultiplexedConnection = &mut conn;
        conn_ref.del::<_, ()>(full_keys).await.map_err(op_err)
    }
}
