//! Database - tables, their heap files and the shared buffer pool.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use heapdb_catalog::{Catalog, TableId, TableSchema};
use tracing::info;

use crate::{
    buffer::BufferPool,
    config::StorageConfig,
    heap_file::HeapFile,
    scan::{HeapScan, ScanProvider, SchemaProvider, SequentialScan},
    StorageError,
};

/// In-process database: a catalog plus one heap file per table.
#[derive(Debug)]
pub struct Database {
    catalog: Catalog,
    files: HashMap<TableId, Arc<HeapFile>>,
    buffer_pool: Arc<BufferPool>,
}

impl Database {
    pub fn new(config: &StorageConfig) -> Self {
        Database {
            catalog: Catalog::new(),
            files: HashMap::new(),
            buffer_pool: Arc::new(BufferPool::new(config.buffer_pool_pages)),
        }
    }

    /// Open every table declared in a catalog schema file.
    ///
    /// Table `name` is stored in `name.dat` next to the schema file; missing
    /// data files are created empty.
    pub fn open_catalog<P: AsRef<Path>>(path: P, config: &StorageConfig) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| StorageError::Io(format!("{}: {}", path.display(), e)))?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));

        let mut db = Database::new(config);
        for schema in heapdb_catalog::parse_schema_file(&contents)? {
            let file = HeapFile::open(base_dir.join(format!("{}.dat", schema.name)))?;
            let name = schema.name.clone();
            let id = db.add_table(schema, file)?;
            info!(table = %name, table_id = %id, "added table");
        }
        Ok(db)
    }

    /// Register a table stored in `file`.
    pub fn add_table(&mut self, schema: TableSchema, file: HeapFile) -> Result<TableId, StorageError> {
        let id = self.catalog.add_table(schema)?;
        self.files.insert(id, Arc::new(file));
        self.buffer_pool.discard_table(id);
        Ok(id)
    }

    /// Create a table with an empty heap file `<dir>/<name>.dat`.
    pub fn create_table<P: AsRef<Path>>(
        &mut self,
        dir: P,
        schema: TableSchema,
    ) -> Result<TableId, StorageError> {
        let file = HeapFile::create(dir.as_ref().join(format!("{}.dat", schema.name)))?;
        self.add_table(schema, file)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPool> {
        &self.buffer_pool
    }
}

impl SchemaProvider for Database {
    fn schema_of(&self, table_id: TableId) -> Result<Arc<TableSchema>, StorageError> {
        self.catalog.schema(table_id).map_err(|_| StorageError::UnknownTable(table_id))
    }

    fn page_count(&self, table_id: TableId) -> Result<usize, StorageError> {
        self.database_file_of(table_id)?.num_pages()
    }

    fn database_file_of(&self, table_id: TableId) -> Result<Arc<HeapFile>, StorageError> {
        self.files.get(&table_id).cloned().ok_or(StorageError::UnknownTable(table_id))
    }

    fn table_name(&self, table_id: TableId) -> Result<String, StorageError> {
        self.catalog
            .table_name(table_id)
            .map(str::to_string)
            .map_err(|_| StorageError::UnknownTable(table_id))
    }

    fn table_ids(&self) -> Vec<TableId> {
        self.catalog.table_ids()
    }
}

impl ScanProvider for Database {
    fn open_scan(&self, table_id: TableId) -> Result<Box<dyn SequentialScan + '_>, StorageError> {
        let scan = HeapScan::open(
            table_id,
            self.schema_of(table_id)?,
            self.database_file_of(table_id)?,
            Arc::clone(&self.buffer_pool),
        )?;
        Ok(Box::new(scan))
    }
}
