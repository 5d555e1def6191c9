//! Connection pool implementation.
//!
//! The pool is generic over the connection type: the caller supplies an
//! async factory and the pool handles slot accounting, reuse, and
//! waiter wakeup. An idle pop, a new creation slot, and the closed flag
//! are all decided under one lock, so the number of outstanding
//! connections can never exceed `max_connections`, not even
//! transiently.

use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::{sleep, Instant};

use crate::config::PoolConfig;
use crate::error::PoolError;

/// Future returned by a connection factory, with the error already
/// rendered to text.
pub type ConnectionFuture<C> = Pin<Box<dyn Future<Output = Result<C, String>> + Send>>;

type Factory<C> = Box<dyn Fn() -> ConnectionFuture<C> + Send + Sync>;

/// A bounded async connection pool.
///
/// Acquisition order: reuse an idle connection, else create a new one if
/// a slot is free, else wait for a release up to the acquire timeout.
/// Connections return to the pool when their guard drops; a guard can
/// instead [`discard`](PooledConnection::discard) its connection, which
/// frees the slot for a lazily created replacement.
///
/// # Example
///
/// ```rust,ignore
/// use sqlgate_pool::{Pool, PoolConfig};
///
/// let pool = Pool::new(PoolConfig::default(), || async {
///     PgConnector::connect().await
/// })
/// .await?;
///
/// let conn = pool.acquire().await?;
/// // Use connection; returned to the pool on drop.
/// ```
pub struct Pool<C> {
    config: PoolConfig,
    inner: Arc<PoolInner<C>>,
}

struct PoolInner<C> {
    /// Hard capacity, copied out of the config.
    max_connections: u32,

    /// Connection factory.
    factory: Factory<C>,

    /// Idle connections plus the accounting that bounds them.
    state: Mutex<PoolState<C>>,

    /// Wakes one waiter per release, discard, or freed slot.
    available: Notify,

    /// Counter for generating connection IDs.
    next_connection_id: AtomicU64,

    /// When the pool was created.
    created_at: std::time::Instant,

    /// Pool metrics.
    metrics: Mutex<PoolMetricsInner>,
}

struct PoolState<C> {
    /// Connections ready for checkout, most recently returned last.
    idle: Vec<IdleConn<C>>,
    /// Live connections plus reserved creation slots. Never exceeds
    /// `max_connections`.
    total: u32,
    /// Once set, acquisitions fail and returned connections are dropped.
    closed: bool,
}

struct IdleConn<C> {
    id: u64,
    conn: C,
}

/// Internal metrics tracking.
#[derive(Debug, Default)]
struct PoolMetricsInner {
    /// Total connections created.
    connections_created: u64,
    /// Total connections closed (pool shutdown or post-close returns).
    connections_closed: u64,
    /// Total connections discarded as unhealthy.
    connections_discarded: u64,
    /// Total successful checkouts.
    checkouts_successful: u64,
    /// Total failed checkouts (timeouts, factory errors, closed pool).
    checkouts_failed: u64,
}

/// What one pass over the pool state decided.
enum Plan<C> {
    Ready(IdleConn<C>),
    Create,
    Wait,
}

impl<C: Send + 'static> Pool<C> {
    /// Create a pool builder.
    #[must_use]
    pub fn builder() -> PoolBuilder {
        PoolBuilder::new()
    }

    /// Create a pool and eagerly establish `min_connections`.
    ///
    /// Fails if the configuration is inconsistent or any of the initial
    /// connections cannot be established.
    pub async fn new<F, Fut, E>(config: PoolConfig, factory: F) -> Result<Self, PoolError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<C, E>> + Send + 'static,
        E: std::fmt::Display,
    {
        config.validate()?;

        let factory: Factory<C> = Box::new(move || {
            let fut = factory();
            Box::pin(async move { fut.await.map_err(|err| err.to_string()) })
                as ConnectionFuture<C>
        });

        let inner = Arc::new(PoolInner {
            max_connections: config.max_connections,
            factory,
            state: Mutex::new(PoolState {
                idle: Vec::new(),
                total: 0,
                closed: false,
            }),
            available: Notify::new(),
            next_connection_id: AtomicU64::new(1),
            created_at: std::time::Instant::now(),
            metrics: Mutex::new(PoolMetricsInner::default()),
        });

        let pool = Self { config, inner };
        for _ in 0..pool.config.min_connections {
            pool.establish_idle().await?;
        }

        tracing::info!(
            min = pool.config.min_connections,
            max = pool.config.max_connections,
            "connection pool created"
        );

        Ok(pool)
    }

    /// Get a connection, waiting up to the configured acquire timeout.
    pub async fn acquire(&self) -> Result<PooledConnection<C>, PoolError> {
        self.acquire_timeout(self.config.acquire_timeout).await
    }

    /// Get a connection, waiting up to an explicit timeout.
    ///
    /// Reuses an idle connection when one is available, creates a new
    /// connection when the pool is under capacity, and otherwise waits
    /// for a release. Elapsing the timeout yields
    /// [`PoolError::Exhausted`].
    pub async fn acquire_timeout(
        &self,
        timeout: Duration,
    ) -> Result<PooledConnection<C>, PoolError> {
        let deadline = Instant::now() + timeout;
        loop {
            let decision = {
                let mut state = self.inner.state.lock();
                if state.closed {
                    Err(PoolError::Closed)
                } else if let Some(idle) = state.idle.pop() {
                    // Leave a wakeup behind when more connections remain,
                    // for waiters that registered after the releases.
                    if !state.idle.is_empty() {
                        self.inner.available.notify_one();
                    }
                    Ok(Plan::Ready(idle))
                } else if state.total < self.inner.max_connections {
                    // Reserve the slot before the factory runs so a
                    // concurrent acquirer cannot overshoot capacity.
                    state.total += 1;
                    Ok(Plan::Create)
                } else {
                    Ok(Plan::Wait)
                }
            };

            match decision {
                Err(err) => {
                    self.inner.note_checkout_failed();
                    return Err(err);
                }
                Ok(Plan::Ready(idle)) => {
                    self.inner.metrics.lock().checkouts_successful += 1;
                    tracing::trace!(connection_id = idle.id, "connection checked out");
                    return Ok(PooledConnection::new(
                        idle.id,
                        idle.conn,
                        Arc::clone(&self.inner),
                    ));
                }
                Ok(Plan::Create) => match (self.inner.factory)().await {
                    Ok(conn) => {
                        let id = self.inner.next_id();
                        self.inner.note_created_checkout();
                        tracing::debug!(connection_id = id, "connection established");
                        return Ok(PooledConnection::new(id, conn, Arc::clone(&self.inner)));
                    }
                    Err(message) => {
                        self.inner.free_slot();
                        self.inner.note_checkout_failed();
                        tracing::warn!(error = %message, "connection establishment failed");
                        return Err(PoolError::Connect { message });
                    }
                },
                Ok(Plan::Wait) => {
                    let now = Instant::now();
                    if now >= deadline {
                        self.inner.note_checkout_failed();
                        tracing::warn!(
                            waited_ms = timeout.as_millis() as u64,
                            "connection pool exhausted"
                        );
                        return Err(PoolError::Exhausted { waited: timeout });
                    }
                    tokio::select! {
                        () = self.inner.available.notified() => {}
                        () = sleep(deadline - now) => {
                            self.inner.note_checkout_failed();
                            tracing::warn!(
                                waited_ms = timeout.as_millis() as u64,
                                "connection pool exhausted"
                            );
                            return Err(PoolError::Exhausted { waited: timeout });
                        }
                    }
                }
            }
        }
    }

    /// Get the current pool status.
    #[must_use]
    pub fn status(&self) -> PoolStatus {
        let state = self.inner.state.lock();
        let available = state.idle.len() as u32;
        PoolStatus {
            available,
            in_use: state.total - available,
            total: state.total,
            max: self.config.max_connections,
        }
    }

    /// Get pool metrics.
    #[must_use]
    pub fn metrics(&self) -> PoolMetrics {
        let inner = self.inner.metrics.lock();
        PoolMetrics {
            connections_created: inner.connections_created,
            connections_closed: inner.connections_closed,
            connections_discarded: inner.connections_discarded,
            checkouts_successful: inner.checkouts_successful,
            checkouts_failed: inner.checkouts_failed,
            uptime: self.inner.created_at.elapsed(),
        }
    }

    /// Close the pool: drop idle connections, wake waiters, and fail
    /// all further acquisitions with [`PoolError::Closed`].
    ///
    /// Connections currently checked out are dropped when their guards
    /// release them.
    pub async fn close(&self) {
        let drained = {
            let mut state = self.inner.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            let drained = std::mem::take(&mut state.idle);
            state.total -= drained.len() as u32;
            drained
        };
        self.inner.metrics.lock().connections_closed += drained.len() as u64;
        drop(drained);
        self.inner.available.notify_waiters();
        tracing::info!("connection pool closed");
    }

    /// Check if the pool is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    /// Get the pool configuration.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    async fn establish_idle(&self) -> Result<(), PoolError> {
        let conn = (self.inner.factory)()
            .await
            .map_err(|message| PoolError::Connect { message })?;
        let id = self.inner.next_id();
        {
            let mut state = self.inner.state.lock();
            state.idle.push(IdleConn { id, conn });
            state.total += 1;
        }
        self.inner.metrics.lock().connections_created += 1;
        tracing::debug!(connection_id = id, "connection established");
        Ok(())
    }
}

impl<C> PoolInner<C> {
    fn next_id(&self) -> u64 {
        self.next_connection_id.fetch_add(1, Ordering::Relaxed)
    }

    fn note_checkout_failed(&self) {
        self.metrics.lock().checkouts_failed += 1;
    }

    fn note_created_checkout(&self) {
        let mut metrics = self.metrics.lock();
        metrics.connections_created += 1;
        metrics.checkouts_successful += 1;
    }

    /// Give back a reserved slot whose connection never materialized or
    /// was discarded.
    fn free_slot(&self) {
        {
            let mut state = self.state.lock();
            state.total -= 1;
        }
        self.available.notify_one();
    }

    fn release(&self, id: u64, conn: C) {
        let closed = {
            let mut state = self.state.lock();
            if state.closed {
                state.total -= 1;
                true
            } else {
                state.idle.push(IdleConn { id, conn });
                false
            }
        };
        if closed {
            self.metrics.lock().connections_closed += 1;
        }
        self.available.notify_one();
        tracing::trace!(connection_id = id, "connection returned to pool");
    }

    fn discard_slot(&self, id: u64) {
        {
            let mut state = self.state.lock();
            state.total -= 1;
        }
        self.metrics.lock().connections_discarded += 1;
        self.available.notify_one();
        tracing::debug!(connection_id = id, "connection discarded");
    }
}

/// Builder for creating a connection pool.
///
/// # Example
///
/// ```rust,ignore
/// let pool = Pool::builder()
///     .min_connections(2)
///     .max_connections(20)
///     .build(|| async { connect().await })
///     .await?;
/// ```
#[derive(Debug, Default)]
pub struct PoolBuilder {
    config: PoolConfig,
}

impl PoolBuilder {
    /// Create a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: PoolConfig::default(),
        }
    }

    /// Set the pool configuration wholesale.
    #[must_use]
    pub fn pool_config(mut self, config: PoolConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the number of connections established at startup.
    #[must_use]
    pub fn min_connections(mut self, count: u32) -> Self {
        self.config.min_connections = count;
        self
    }

    /// Set the maximum number of connections.
    #[must_use]
    pub fn max_connections(mut self, count: u32) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the acquisition timeout.
    #[must_use]
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.config.acquire_timeout = timeout;
        self
    }

    /// Build the pool with the given connection factory.
    pub async fn build<C, F, Fut, E>(self, factory: F) -> Result<Pool<C>, PoolError>
    where
        C: Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<C, E>> + Send + 'static,
        E: std::fmt::Display,
    {
        Pool::new(self.config, factory).await
    }
}

/// Status information about the pool.
#[derive(Debug, Clone, Copy)]
pub struct PoolStatus {
    /// Number of idle connections available.
    pub available: u32,
    /// Number of connections currently checked out (or being created).
    pub in_use: u32,
    /// Total number of connections (idle + in use).
    pub total: u32,
    /// Maximum allowed connections.
    pub max: u32,
}

impl PoolStatus {
    /// Calculate the utilization percentage.
    #[must_use]
    pub fn utilization(&self) -> f64 {
        if self.max == 0 {
            return 0.0;
        }
        (f64::from(self.in_use) / f64::from(self.max)) * 100.0
    }

    /// Check if the pool is at capacity.
    #[must_use]
    pub fn is_at_capacity(&self) -> bool {
        self.total >= self.max
    }
}

/// Metrics collected from the pool.
#[derive(Debug, Clone)]
pub struct PoolMetrics {
    /// Total connections created since pool start.
    pub connections_created: u64,
    /// Total connections closed (pool shutdown or post-close returns).
    pub connections_closed: u64,
    /// Total connections discarded as unhealthy.
    pub connections_discarded: u64,
    /// Successful connection checkouts.
    pub checkouts_successful: u64,
    /// Failed connection checkouts (timeouts, factory errors, closed pool).
    pub checkouts_failed: u64,
    /// Time since pool creation.
    pub uptime: Duration,
}

impl PoolMetrics {
    /// Calculate checkout success rate (0.0 to 1.0).
    #[must_use]
    pub fn checkout_success_rate(&self) -> f64 {
        let total = self.checkouts_successful + self.checkouts_failed;
        if total == 0 {
            return 1.0;
        }
        self.checkouts_successful as f64 / total as f64
    }
}

/// A connection checked out from the pool.
///
/// Dereferences to the connection. When dropped, the connection returns
/// to the idle set; use [`discard()`](PooledConnection::discard) instead
/// when the connection should not be reused.
pub struct PooledConnection<C> {
    id: u64,
    conn: Option<C>,
    pool: Arc<PoolInner<C>>,
}

impl<C> PooledConnection<C> {
    fn new(id: u64, conn: C, pool: Arc<PoolInner<C>>) -> Self {
        Self {
            id,
            conn: Some(conn),
            pool,
        }
    }

    /// Identifier of the underlying connection, for log correlation.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Drop the connection instead of returning it to the pool.
    ///
    /// The slot is freed immediately; a replacement connection is
    /// created lazily on a later acquisition. Use this when the
    /// connection may be unhealthy or still busy server-side.
    pub fn discard(mut self) {
        if let Some(conn) = self.conn.take() {
            drop(conn);
            self.pool.discard_slot(self.id);
        }
    }
}

impl<C> std::fmt::Debug for PooledConnection<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl<C> Deref for PooledConnection<C> {
    type Target = C;

    fn deref(&self) -> &C {
        match &self.conn {
            Some(conn) => conn,
            // Only drop and discard take the connection, and both
            // consume the guard.
            None => unreachable!(),
        }
    }
}

impl<C> DerefMut for PooledConnection<C> {
    fn deref_mut(&mut self) -> &mut C {
        match &mut self.conn {
            Some(conn) => conn,
            None => unreachable!(),
        }
    }
}

impl<C> Drop for PooledConnection<C> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(self.id, conn);
        }
    }
}
