use std::collections::HashMap;
use std::fmt;

use redis::AsyncCommands;

use crate::snapshot::{store_key, ProcessSnapshot};

/// Errors from the snapshot store.
#[derive(Debug)]
pub enum StoreError {
	/// Redis connectivity or command failure.
	Redis(redis::RedisError),
	/// A stored record could not be decoded into a snapshot.
	Decode(String),
}

impl fmt::Display for StoreError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			StoreError::Redis(e) => write!(f, "store error: {}", e),
			StoreError::Decode(e) => write!(f, "store decode error: {}", e),
		}
	}
}

impl std::error::Error for StoreError {}

impl From<redis::RedisError> for StoreError {
	fn from(e: redis::RedisError) -> Self {
		StoreError::Redis(e)
	}
}

/// Key-value store holding one hash record per tracked process.
///
/// Every write replaces the whole prior record; fields with no value are
/// omitted entirely rather than written as null.
#[allow(async_fn_in_trait)]
pub trait SnapshotStore {
	async fn ping(&mut self) -> Result<(), StoreError>;
	async fn put(&mut self, snapshot: &ProcessSnapshot) -> Result<(), StoreError>;
	async fn fetch(&mut self, name: &str) -> Result<Option<ProcessSnapshot>, StoreError>;
}

/// Redis-backed [`SnapshotStore`].
pub struct RedisStore {
	con: redis::aio::MultiplexedConnection,
}

impl RedisStore {
	/// Connect and ping. A failure here should abort the caller before its
	/// first cycle; mid-cycle failures are per-write and non-fatal.
	pub async fn connect(host: &str, port: u16) -> Result<Self, StoreError> {
		let client = redis::Client::open(format!("redis://{}:{}/", host, port))?;
		let con = client.get_multiplexed_async_connection().await?;
		let mut store = Self { con };
		store.ping().await?;
		Ok(store)
	}
}

impl SnapshotStore for RedisStore {
	async fn ping(&mut self) -> Result<(), StoreError> {
		let _: String = redis::cmd("PING").query_async(&mut self.con).await?;
		Ok(())
	}

	async fn put(&mut self, snapshot: &ProcessSnapshot) -> Result<(), StoreError> {
		let key = snapshot.key();
		let fields = snapshot.to_fields();
		// DEL + HSET as one round trip, no transaction. Replacing the key
		// outright keeps stale pid/cmdline fields from surviving an UP -> DOWN
		// transition.
		let mut pipe = redis::pipe();
		pipe.del(&key).ignore().hset_multiple(&key, &fields).ignore();
		let _: () = pipe.query_async(&mut self.con).await?;
		Ok(())
	}

	async fn fetch(&mut self, name: &str) -> Result<Option<ProcessSnapshot>, StoreError> {
		let map: HashMap<String, String> = self.con.hgetall(store_key(name)).await?;
		if map.is_empty() {
			return Ok(None);
		}
		ProcessSnapshot::from_fields(&map)
			.map(Some)
			.map_err(StoreError::Decode)
	}
}

/// In-memory [`SnapshotStore`] mirroring Redis hash semantics, for tests and
/// offline use.
#[derive(Debug, Default)]
pub struct MemoryStore {
	pub entries: HashMap<String, HashMap<String, String>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn fields(&self, key: &str) -> Option<&HashMap<String, String>> {
		self.entries.get(key)
	}
}

impl SnapshotStore for MemoryStore {
	async fn ping(&mut self) -> Result<(), StoreError> {
		Ok(())
	}

	async fn put(&mut self, snapshot: &ProcessSnapshot) -> Result<(), StoreError> {
		let fields = snapshot
			.to_fields()
			.into_iter()
			.map(|(k, v)| (k.to_string(), v))
			.collect();
		self.entries.insert(snapshot.key(), fields);
		Ok(())
	}

	async fn fetch(&mut self, name: &str) -> Result<Option<ProcessSnapshot>, StoreError> {
		match self.entries.get(&store_key(name)) {
			Some(map) => ProcessSnapshot::from_fields(map)
				.map(Some)
				.map_err(StoreError::Decode),
			None => Ok(None),
		}
	}
}
