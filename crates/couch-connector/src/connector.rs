//! Routing and failover policy.

use crate::ConnectorError;
use couch_client::{
    ClientOptions, CouchNodeClient, Document, DocumentStore, NodeAddress, RangeQuery, StoreError,
    ViewRow,
};
use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A single logical store endpoint backed by N physical nodes.
///
/// - Writes (`create`, `update`, `delete`) always start at node 0 and move to
///   node 1, 2, ... only on transient failure.
/// - Reads (`read`, `range_query`) start at a rotating cursor that advances
///   once per dispatch. A call walks the ring from its start position, so
///   its retries never hit the same node twice.
///
/// `NotFound` and `Conflict` are authoritative and end the call on the node
/// that reported them.
pub struct LoadBalancedConnector<S = CouchNodeClient> {
    stores: Vec<S>,
    next_read: AtomicUsize,
}

impl LoadBalancedConnector<CouchNodeClient> {
    /// Build one HTTP client per distinct node and make sure `database`
    /// exists on each of them.
    ///
    /// A node that cannot be reached at this point is kept; failover deals
    /// with it at call time.
    pub async fn connect(
        nodes: &[NodeAddress],
        database: &str,
        options: ClientOptions,
    ) -> Result<Self, ConnectorError> {
        if nodes.is_empty() {
            return Err(ConnectorError::NoNodes);
        }

        let mut seen = HashSet::new();
        let mut stores = Vec::with_capacity(nodes.len());
        for node in nodes.iter().filter(|node| seen.insert(*node)) {
            let client = CouchNodeClient::new(node.clone(), database, options.clone()).map_err(
                |source| ConnectorError::Client {
                    node: node.clone(),
                    source,
                },
            )?;
            if let Err(e) = client.ensure_database().await {
                tracing::warn!("Could not ensure database '{database}' on {node}: {e}");
            }
            stores.push(client);
        }

        tracing::info!(
            "Connected to {} node(s) for database '{}'",
            stores.len(),
            database
        );
        Self::new(stores)
    }

    /// Addresses of the configured nodes, primary first.
    pub fn nodes(&self) -> Vec<&NodeAddress> {
        self.stores.iter().map(CouchNodeClient::node).collect()
    }
}

impl<S: DocumentStore> LoadBalancedConnector<S> {
    /// Wrap an ordered list of stores. The first one is the write primary.
    pub fn new(stores: Vec<S>) -> Result<Self, ConnectorError> {
        if stores.is_empty() {
            return Err(ConnectorError::NoNodes);
        }
        Ok(Self {
            stores,
            next_read: AtomicUsize::new(0),
        })
    }

    pub fn node_count(&self) -> usize {
        self.stores.len()
    }

    pub fn stores(&self) -> &[S] {
        &self.stores
    }

    pub async fn create(&self, document: &Document) -> Result<String, ConnectorError> {
        self.write("create", &document.id, |store| store.create(document))
            .await
    }

    pub async fn update(&self, document: &Document) -> Result<String, ConnectorError> {
        self.write("update", &document.id, |store| store.update(document))
            .await
    }

    /// Delete `document` at its current revision.
    ///
    /// A document without a revision cannot be deleted and yields `Conflict`
    /// without contacting any node.
    pub async fn delete(&self, document: &Document) -> Result<String, ConnectorError> {
        let Some(revision) = document.revision.as_deref() else {
            return Err(ConnectorError::Conflict(document.id.clone()));
        };
        self.write("delete", &document.id, |store| {
            store.delete(&document.id, revision)
        })
        .await
    }

    pub async fn read(&self, id: &str) -> Result<Document, ConnectorError> {
        self.read_rotating("read", id, |store| store.read(id)).await
    }

    pub async fn range_query(&self, query: &RangeQuery) -> Result<Vec<ViewRow>, ConnectorError> {
        self.read_rotating("range query", &query.start_key, |store| {
            store.range_query(query)
        })
        .await
    }

    /// Try node 0, then 1, ... until one answers.
    async fn write<'a, T, F, Fut>(
        &'a self,
        operation: &'static str,
        id: &str,
        call: F,
    ) -> Result<T, ConnectorError>
    where
        F: Fn(&'a S) -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut last_error = None;
        for (index, store) in self.stores.iter().enumerate() {
            tracing::trace!("Dispatching {operation} of '{id}' to node {index}");
            match call(store).await {
                Ok(value) => {
                    if index > 0 {
                        tracing::debug!("{operation} of '{id}' succeeded on node {index}");
                    }
                    return Ok(value);
                }
                Err(e) if e.is_transient() => {
                    tracing::warn!("{operation} of '{id}' failed on node {index}: {e}");
                    last_error = Some(e);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(self.unreachable(operation, last_error))
    }

    /// Start at the read cursor and walk the ring until one node answers.
    async fn read_rotating<'a, T, F, Fut>(
        &'a self,
        operation: &'static str,
        id: &str,
        call: F,
    ) -> Result<T, ConnectorError>
    where
        F: Fn(&'a S) -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let node_count = self.stores.len();
        let start = self.next_read.fetch_add(1, Ordering::Relaxed);

        let mut last_error = None;
        for attempt in 0..node_count {
            let index = start.wrapping_add(attempt) % node_count;
            tracing::trace!("Dispatching {operation} of '{id}' to node {index}");
            match call(&self.stores[index]).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => {
                    tracing::warn!("{operation} of '{id}' failed on node {index}: {e}");
                    // The cursor counts dispatches, so the next call starts
                    // past the node that just failed.
                    self.next_read.fetch_add(1, Ordering::Relaxed);
                    last_error = Some(e);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(self.unreachable(operation, last_error))
    }

    fn unreachable(&self, operation: &'static str, last_error: Option<StoreError>) -> ConnectorError {
        ConnectorError::Unreachable {
            operation,
            attempts: self.stores.len(),
            last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
        }
    }
}
