//! CRUD + scan surface used by the workload driver.

use crate::{AdapterConfig, ConfigError, OpResult};
use couch_client::{CouchNodeClient, DocumentStore, RangeQuery};
use couch_connector::LoadBalancedConnector;
use record_mapper::{FieldSet, Record, RecordMapper};

/// Benchmark adapter over a load-balanced cluster.
///
/// The `table` argument of every operation is informational only: the
/// logical database is fixed when the connector is built.
pub struct CouchBenchAdapter<S = CouchNodeClient> {
    connector: LoadBalancedConnector<S>,
    mapper: RecordMapper,
}

impl CouchBenchAdapter<CouchNodeClient> {
    /// Connect to every configured node.
    pub async fn from_config(config: &AdapterConfig) -> Result<Self, ConfigError> {
        let nodes = config.nodes()?;
        let connector =
            LoadBalancedConnector::connect(&nodes, &config.database, config.client_options())
                .await?;
        Ok(Self::new(connector, RecordMapper::new(config.projection())))
    }
}

impl<S: DocumentStore> CouchBenchAdapter<S> {
    pub fn new(connector: LoadBalancedConnector<S>, mapper: RecordMapper) -> Self {
        Self { connector, mapper }
    }

    pub fn connector(&self) -> &LoadBalancedConnector<S> {
        &self.connector
    }

    /// Read one record. `fields: None` returns every stored field.
    pub async fn read(&self, table: &str, key: &str, fields: Option<&FieldSet>) -> OpResult<Record> {
        tracing::debug!("read {table}/{key}");
        let document = self.connector.read(key).await?;
        Ok(self.mapper.project(&document, fields))
    }

    /// Insert a new record under `key`. An existing key yields `Conflict`.
    pub async fn insert(&self, table: &str, key: &str, record: &Record) -> OpResult<()> {
        tracing::debug!("insert {table}/{key} ({} fields)", record.len());
        let document = self.mapper.to_document(key, record);
        self.connector.create(&document).await?;
        Ok(())
    }

    /// Overwrite the given fields of an existing record, keeping the rest.
    pub async fn update(&self, table: &str, key: &str, values: &Record) -> OpResult<()> {
        tracing::debug!("update {table}/{key} ({} fields)", values.len());
        let current = self.connector.read(key).await?;
        let merged = self.mapper.merge(current, values);
        self.connector.update(&merged).await?;
        Ok(())
    }

    pub async fn delete(&self, table: &str, key: &str) -> OpResult<()> {
        tracing::debug!("delete {table}/{key}");
        let current = self.connector.read(key).await?;
        self.connector.delete(&current).await?;
        Ok(())
    }

    /// Up to `count` records in key order, starting at `start_key`.
    pub async fn scan(
        &self,
        table: &str,
        start_key: &str,
        count: usize,
        fields: Option<&FieldSet>,
    ) -> OpResult<Vec<Record>> {
        tracing::debug!("scan {table} from {start_key} ({count} records)");
        let query = RangeQuery::from_key(start_key)
            .limit(count)
            .include_docs(true);
        let rows = self.connector.range_query(&query).await?;
        Ok(self.mapper.scan_records(rows, fields)?)
    }
}
