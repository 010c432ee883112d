use redis::{Client, aio::MultiplexedConnection};
use tracing::info;

#[derive(Clone)]
pub struct RedisService {
    client: Client,
}

impl RedisService {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let service = Self::from_url(connection_string)?;

        // Test connection
        let _conn = service.client.get_multiplexed_async_connection().await?;

        info!("✅ Connected to Redis");
        Ok(service)
    }

    /// Builds the client without opening a connection.
    pub fn from_url(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = Client::open(connection_string)?;
        Ok(Self { client })
    }

    pub async fn get_conn(&self) -> Result<MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }
}
