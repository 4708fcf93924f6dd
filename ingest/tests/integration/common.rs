use ingest::pipeline::Ingestion;
use ingest::source::SourceConnector;
use ingest::store::bookmark::MemoryBookmarkStore;
use ingest::test_utils::{MemoryObjectStore, MemorySource, MemoryWarehouse, work_dir};
use ingest::types::{ColumnDescriptor, QualifiedTable};
use ingest_config::shared::IngestionConfig;

/// In-memory connectors shared between a test and the ingestion it runs.
pub struct TestConnectors {
    pub source: MemorySource,
    pub object_store: MemoryObjectStore,
    pub warehouse: MemoryWarehouse,
    pub bookmarks: MemoryBookmarkStore,
}

impl TestConnectors {
    pub fn new() -> Self {
        let object_store = MemoryObjectStore::new();

        Self {
            source: MemorySource::new(),
            warehouse: MemoryWarehouse::new(object_store.clone()),
            object_store,
            bookmarks: MemoryBookmarkStore::new(),
        }
    }

    /// Builds an ingestion reading from the memory source.
    pub fn ingestion(
        &self,
        config: IngestionConfig,
    ) -> Ingestion<MemorySource, MemoryWarehouse, MemoryObjectStore, MemoryBookmarkStore> {
        self.ingestion_with_source(config, self.source.clone())
    }

    /// Builds an ingestion reading from `source`.
    pub fn ingestion_with_source<S>(
        &self,
        config: IngestionConfig,
        source: S,
    ) -> Ingestion<S, MemoryWarehouse, MemoryObjectStore, MemoryBookmarkStore>
    where
        S: SourceConnector,
    {
        Ingestion::new(
            config,
            source,
            self.warehouse.clone(),
            self.object_store.clone(),
            self.bookmarks.clone(),
        )
        .expect("failed to create the ingestion")
        .with_work_dir(work_dir())
    }
}

pub fn source_table(table: &str) -> QualifiedTable {
    QualifiedTable::new("shop", table)
}

pub fn destination_table(table: &str) -> QualifiedTable {
    QualifiedTable::new("crm", table)
}

pub fn staging_table(table: &str) -> QualifiedTable {
    QualifiedTable::new("staging", format!("crm_{table}"))
}

pub fn customer_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("id", "integer", 1),
        ColumnDescriptor::new("email", "character varying", 2).with_length(256),
    ]
}

pub fn orders_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("id", "integer", 1),
        ColumnDescriptor::new("amount", "numeric", 2).with_precision(10, 2),
        ColumnDescriptor::new("updated_at", "timestamp without time zone", 3),
    ]
}
