#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::ConnectInfo;
use chrono::Utc;
use shorty::domain::entities::{ClickRecord, NewClickRecord, NewShortLink, ShortLink};
use shorty::domain::repositories::{ClickRepository, LinkRepository};
use shorty::error::{StoreError, UniqueField};
use shorty::infrastructure::broker::{
    BrokerError, BrokerMessage, BrokerResult, EventBroker, MessageStream,
};
use shorty::infrastructure::cache::{CacheError, CacheResult, CacheService};
use shorty::state::AppState;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tower::Layer;

pub const CLICK_QUEUE: &str = "clicks";
pub const CLIENT_ADDR: &str = "127.0.0.1:12345";

/// Link store that enforces both unique constraints under one lock.
#[derive(Default)]
pub struct InMemoryLinkStore {
    links: Mutex<Vec<ShortLink>>,
    next_id: AtomicI64,
    create_calls: AtomicUsize,
    down: AtomicBool,
}

impl InMemoryLinkStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn rows(&self) -> Vec<ShortLink> {
        self.links.lock().unwrap().clone()
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn exists(&self, id: i64) -> bool {
        self.links.lock().unwrap().iter().any(|l| l.id == id)
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.down.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinkStore {
    async fn create(&self, new_link: NewShortLink) -> Result<ShortLink, StoreError> {
        self.check()?;
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        let mut links = self.links.lock().unwrap();
        if links.iter().any(|l| l.short_code == new_link.short_code) {
            return Err(StoreError::UniqueViolation(UniqueField::ShortCode));
        }
        if links
            .iter()
            .any(|l| l.is_owned_link_for(new_link.user_id, &new_link.original_url))
        {
            return Err(StoreError::UniqueViolation(UniqueField::OwnerAndUrl));
        }

        let link = ShortLink::new(
            self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            new_link.user_id,
            new_link.original_url,
            new_link.short_code,
            Utc::now(),
        );
        links.push(link.clone());
        Ok(link)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ShortLink>, StoreError> {
        self.check()?;
        Ok(self.links.lock().unwrap().iter().find(|l| l.id == id).cloned())
    }

    async fn find_by_code(&self, short_code: &str) -> Result<Option<ShortLink>, StoreError> {
        self.check()?;
        Ok(self
            .links
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.short_code == short_code)
            .cloned())
    }

    async fn find_by_owner_and_url(
        &self,
        user_id: Option<i64>,
        original_url: &str,
    ) -> Result<Option<ShortLink>, StoreError> {
        self.check()?;
        Ok(self
            .links
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.is_owned_link_for(user_id, original_url))
            .cloned())
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<ShortLink>, StoreError> {
        self.check()?;
        let mut owned: Vec<ShortLink> = self
            .links
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.user_id == Some(user_id))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(owned)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        self.check()?;
        let mut links = self.links.lock().unwrap();
        let before = links.len();
        links.retain(|l| l.id != id);
        Ok(links.len() != before)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }
}

/// Click store that checks the referenced link like a foreign key would.
pub struct InMemoryClickStore {
    links: Arc<InMemoryLinkStore>,
    clicks: Mutex<Vec<ClickRecord>>,
    next_id: AtomicI64,
    failures_left: AtomicUsize,
    held: watch::Sender<bool>,
}

impl InMemoryClickStore {
    pub fn new(links: Arc<InMemoryLinkStore>) -> Arc<Self> {
        Arc::new(Self {
            links,
            clicks: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(0),
            failures_left: AtomicUsize::new(0),
            held: watch::channel(false).0,
        })
    }

    /// While held, inserts wait instead of completing.
    pub fn set_held(&self, held: bool) {
        self.held.send_replace(held);
    }

    /// Makes the next `n` inserts fail as if the store were down.
    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<ClickRecord> {
        self.clicks.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.clicks.lock().unwrap().len()
    }
}

#[async_trait]
impl ClickRepository for InMemoryClickStore {
    async fn create_click_record(
        &self,
        new_click: NewClickRecord,
    ) -> Result<ClickRecord, StoreError> {
        let mut held = self.held.subscribe();
        let _ = held.wait_for(|held| !*held).await;

        let injected = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }

        if !self.links.exists(new_click.short_link_id) {
            return Err(StoreError::MissingReference(format!(
                "short link {} does not exist",
                new_click.short_link_id
            )));
        }

        let record = ClickRecord::new(
            self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            new_click.short_link_id,
            new_click.ip_address,
            new_click.user_agent,
            new_click.created_at,
        );
        self.clicks.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn list_by_short_link(
        &self,
        short_link_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ClickRecord>, StoreError> {
        let mut clicks: Vec<ClickRecord> = self
            .clicks
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.short_link_id == short_link_id)
            .cloned()
            .collect();
        clicks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(clicks
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_by_short_link(&self, short_link_id: i64) -> Result<i64, StoreError> {
        Ok(self
            .clicks
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.short_link_id == short_link_id)
            .count() as i64)
    }
}

/// Cache without expiry; `set_failing` turns every call into an error.
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
}

impl InMemoryCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    fn check(&self) -> CacheResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(CacheError::Connection("cache offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheService for InMemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.check()?;
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str, _ttl: Duration) -> CacheResult<()> {
        self.check()?;
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.check()?;
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        !self.failing.load(Ordering::SeqCst)
    }
}

type Subscriber = mpsc::Sender<Box<dyn BrokerMessage>>;

#[derive(Default)]
struct BrokerInner {
    down: AtomicBool,
    pending: Mutex<HashMap<String, VecDeque<Vec<u8>>>>,
    subscribers: Mutex<HashMap<String, Subscriber>>,
    unacked: Mutex<HashMap<u64, (String, Vec<u8>)>>,
    next_delivery: AtomicU64,
    publish_attempts: AtomicUsize,
    published: AtomicUsize,
    delivered: AtomicUsize,
    consume_calls: AtomicUsize,
    acked: AtomicUsize,
    nacked: AtomicUsize,
}

impl BrokerInner {
    /// Hands `body` to the live subscriber or parks it until one arrives.
    ///
    /// A handed-over message stays unacked until settled; if its subscriber
    /// goes away first it is handed to the next one.
    fn deliver(self: &Arc<Self>, queue: &str, body: Vec<u8>) {
        let mut subscribers = self.subscribers.lock().unwrap();
        if let Some(tx) = subscribers.get(queue) {
            if !tx.is_closed() {
                let delivery = self.next_delivery.fetch_add(1, Ordering::SeqCst);
                self.unacked
                    .lock()
                    .unwrap()
                    .insert(delivery, (queue.to_string(), body.clone()));

                let message = InMemoryMessage {
                    delivery,
                    queue: queue.to_string(),
                    body: body.clone(),
                    broker: Arc::clone(self),
                };
                if tx.try_send(Box::new(message)).is_ok() {
                    self.delivered.fetch_add(1, Ordering::SeqCst);
                    return;
                }
                self.unacked.lock().unwrap().remove(&delivery);
            }
            subscribers.remove(queue);
        }
        drop(subscribers);

        self.pending
            .lock()
            .unwrap()
            .entry(queue.to_string())
            .or_default()
            .push_back(body);
    }
}

struct InMemoryMessage {
    delivery: u64,
    queue: String,
    body: Vec<u8>,
    broker: Arc<BrokerInner>,
}

#[async_trait]
impl BrokerMessage for InMemoryMessage {
    fn body(&self) -> &[u8] {
        &self.body
    }

    async fn ack(&self) -> BrokerResult<()> {
        self.broker.unacked.lock().unwrap().remove(&self.delivery);
        self.broker.acked.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn nack(&self) -> BrokerResult<()> {
        self.broker.unacked.lock().unwrap().remove(&self.delivery);
        self.broker.nacked.fetch_add(1, Ordering::SeqCst);
        self.broker.deliver(&self.queue, self.body.clone());
        Ok(())
    }
}

/// Single-process broker with one subscriber per queue.
///
/// Messages published while nobody is subscribed are kept and handed to the
/// next subscriber, like a durable queue would. So are messages a previous
/// subscriber received but never settled.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    inner: Arc<BrokerInner>,
}

impl InMemoryBroker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// While down, publish and consume fail with a connection error.
    pub fn set_down(&self, down: bool) {
        self.inner.down.store(down, Ordering::SeqCst);
    }

    /// Drops every live subscription, ending the consumers' streams.
    pub fn disconnect(&self) {
        self.inner.subscribers.lock().unwrap().clear();
    }

    /// Queues a raw payload without going through `publish`.
    pub fn inject(&self, queue: &str, body: &[u8]) {
        self.inner.deliver(queue, body.to_vec());
    }

    pub fn publish_attempts(&self) -> usize {
        self.inner.publish_attempts.load(Ordering::SeqCst)
    }

    pub fn published(&self) -> usize {
        self.inner.published.load(Ordering::SeqCst)
    }

    pub fn delivered(&self) -> usize {
        self.inner.delivered.load(Ordering::SeqCst)
    }

    pub fn unacked(&self) -> usize {
        self.inner.unacked.lock().unwrap().len()
    }

    pub fn consume_calls(&self) -> usize {
        self.inner.consume_calls.load(Ordering::SeqCst)
    }

    pub fn acked(&self) -> usize {
        self.inner.acked.load(Ordering::SeqCst)
    }

    pub fn nacked(&self) -> usize {
        self.inner.nacked.load(Ordering::SeqCst)
    }

    fn check(&self) -> BrokerResult<()> {
        if self.inner.down.load(Ordering::SeqCst) {
            Err(BrokerError::Connection("broker unreachable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl EventBroker for InMemoryBroker {
    async fn declare_queue(&self, _name: &str) -> BrokerResult<()> {
        self.check()
    }

    async fn publish(&self, queue: &str, payload: &[u8]) -> BrokerResult<()> {
        self.inner.publish_attempts.fetch_add(1, Ordering::SeqCst);
        if self.inner.down.load(Ordering::SeqCst) {
            return Err(BrokerError::Publish("broker unreachable".to_string()));
        }
        self.inner.deliver(queue, payload.to_vec());
        self.inner.published.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn consume(
        &self,
        queue: &str,
        _consumer_id: &str,
        _auto_ack: bool,
    ) -> BrokerResult<MessageStream> {
        self.check()?;
        self.inner.consume_calls.fetch_add(1, Ordering::SeqCst);

        let (tx, stream) = MessageStream::channel(1024);
        self.inner
            .subscribers
            .lock()
            .unwrap()
            .insert(queue.to_string(), tx);

        let mut stranded: Vec<(u64, Vec<u8>)> = {
            let mut unacked = self.inner.unacked.lock().unwrap();
            let ids: Vec<u64> = unacked
                .iter()
                .filter(|(_, (q, _))| q == queue)
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| unacked.remove(&id).map(|(_, body)| (id, body)))
                .collect()
        };
        stranded.sort_by_key(|(id, _)| *id);

        let parked: Vec<Vec<u8>> = self
            .inner
            .pending
            .lock()
            .unwrap()
            .remove(queue)
            .map(Vec::from)
            .unwrap_or_default();

        for body in stranded.into_iter().map(|(_, body)| body).chain(parked) {
            self.inner.deliver(queue, body);
        }

        Ok(stream)
    }

    async fn close(&self) {
        self.disconnect();
    }
}

/// Backends behind an [`AppState`], kept around for assertions.
pub struct TestBackends {
    pub links: Arc<InMemoryLinkStore>,
    pub clicks: Arc<InMemoryClickStore>,
    pub cache: Arc<InMemoryCache>,
    pub broker: Arc<InMemoryBroker>,
}

impl TestBackends {
    pub fn new() -> Self {
        let links = InMemoryLinkStore::new();
        Self {
            clicks: InMemoryClickStore::new(Arc::clone(&links)),
            links,
            cache: InMemoryCache::new(),
            broker: InMemoryBroker::new(),
        }
    }

    pub fn state(&self) -> AppState {
        AppState::new(
            self.links.clone(),
            self.clicks.clone(),
            self.cache.clone(),
            self.broker.clone(),
            Duration::from_secs(300),
            CLICK_QUEUE,
        )
    }
}

/// Polls `condition` every 10ms until it holds or two seconds pass.
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Injects the client address `axum::serve` would normally provide.
#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = CLIENT_ADDR.parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}
