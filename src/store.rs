use crate::{
    Binding, CachePolicy, Error, Expr, GenericScriptWriter, Record, Result, ScriptWriter,
    StoreBinding, Value, View, col, truncate_long,
};
use async_stream::try_stream;
use futures::{Stream, StreamExt, future::BoxFuture, stream::BoxStream};
use std::{collections::HashMap, pin::pin, sync::Arc};

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;
/// Owned row value slice matching `RowNames` length.
pub type Row = Box<[Value]>;

/// A result row with its corresponding column labels.
#[derive(Debug, Clone)]
pub struct RowLabeled {
    /// Column names, from the result's schema metadata.
    pub labels: RowNames,
    /// Data values aligned by index with `labels`; `NULL` cells are
    /// [`Value::Null`].
    pub values: Row,
}

impl RowLabeled {
    pub fn new(labels: RowNames, values: Row) -> Self {
        Self { labels, values }
    }

    pub fn names(&self) -> &[String] {
        &self.labels
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|v| v == name)
            .map(|i| &self.values[i])
    }
}

/// Heterogeneous items produced by running a script: rows and modify counts.
#[derive(Debug)]
pub enum QueryResult {
    Row(RowLabeled),
    Affected(u64),
}

/// A live connection to the backing store.
pub trait Connection: Send {
    fn run(&mut self, script: String) -> BoxStream<'_, Result<QueryResult>>;
}

/// Opaque connection factory. Every store operation acquires its own
/// connection through it and releases it when done.
pub trait Connector: Send + Sync {
    fn connect(&self) -> BoxFuture<'_, Result<Box<dyn Connection>>>;
}

/// Queryable/bindable handle over a backing store: a connection factory, a
/// per-table primary-key registry and a script writer.
///
/// Cloning is cheap and shares the three parts. No connection state is ever
/// exposed to callers.
#[derive(Clone)]
pub struct Store {
    connector: Arc<dyn Connector>,
    primary_keys: Arc<HashMap<String, String>>,
    writer: Arc<dyn ScriptWriter>,
}

impl Store {
    pub fn new(connector: Arc<dyn Connector>, primary_keys: HashMap<String, String>) -> Self {
        Self::with_writer(connector, primary_keys, Arc::new(GenericScriptWriter::new()))
    }

    pub fn with_writer(
        connector: Arc<dyn Connector>,
        primary_keys: HashMap<String, String>,
        writer: Arc<dyn ScriptWriter>,
    ) -> Self {
        Self {
            connector,
            primary_keys: Arc::new(primary_keys),
            writer,
        }
    }

    pub fn writer(&self) -> &dyn ScriptWriter {
        self.writer.as_ref()
    }

    /// Primary key column of the table; `None` means the table has no
    /// registered primary key and cannot be updated or deleted by key.
    pub fn primary_key(&self, table: &str) -> Option<&str> {
        self.primary_keys.get(table).map(String::as_str)
    }

    /// Runs a script on a fresh connection, streaming result rows as
    /// [`Record`]s. Modify counts are skipped; the connection is released
    /// when the stream is dropped.
    pub fn execute(&self, script: String) -> impl Stream<Item = Result<Record>> + Send + '_ {
        try_stream! {
            log::debug!("executing {}", truncate_long(&script));
            let mut connection = self.connector.connect().await?;
            let mut results = pin!(connection.run(script));
            while let Some(result) = results.next().await {
                match result? {
                    QueryResult::Row(row) => yield Record::from_row(row),
                    QueryResult::Affected(..) => {}
                }
            }
        }
    }

    /// Runs a script and collects every produced record.
    pub async fn fetch(&self, script: String) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        let mut stream = pin!(self.execute(script));
        while let Some(record) = stream.next().await {
            records.push(record?);
        }
        Ok(records)
    }

    /// Runs a modify script, returning the total number of rows affected.
    pub(crate) async fn run_script(&self, script: String) -> Result<u64> {
        log::debug!("executing {}", truncate_long(&script));
        let mut connection = self.connector.connect().await?;
        let mut results = pin!(connection.run(script));
        let mut affected = 0;
        while let Some(result) = results.next().await {
            if let QueryResult::Affected(n) = result? {
                affected += n;
            }
        }
        Ok(affected)
    }

    pub fn table(&self, name: impl Into<String>) -> Table {
        Table {
            store: self.clone(),
            name: name.into(),
        }
    }

    /// Creates a binding for one row of `table`, addressed by its primary
    /// key. Fails with [`Error::KeyNotFound`] when the table has no
    /// registered primary key.
    pub fn binding(&self, table: &str, key_value: Value) -> Result<Arc<dyn Binding>> {
        let key_column = self
            .primary_key(table)
            .ok_or_else(|| Error::KeyNotFound(table.to_owned()))?
            .to_owned();
        Ok(Arc::new(StoreBinding::new(
            self.clone(),
            table.to_owned(),
            key_column,
            key_value,
        )))
    }
}

/// Single-table handle for querying and appending.
pub struct Table {
    store: Store,
    name: String,
}

impl Table {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `select * from <table> where <predicate>`, wrapped into a cached
    /// [`View`].
    pub async fn select(&self, predicate: &Expr) -> Result<View> {
        let mut script = String::new();
        self.store
            .writer()
            .write_select(&mut script, &self.name, predicate)?;
        let records = self.store.fetch(script).await?;
        Ok(View::new(records, CachePolicy::Materialize))
    }

    /// Multi-row insert; returns the number of rows affected.
    pub async fn append(&self, records: &[Record]) -> Result<u64> {
        let mut script = String::new();
        self.store
            .writer()
            .write_insert(&mut script, &self.name, records)?;
        self.store.run_script(script).await
    }

    /// Predicate delete; returns the number of rows affected.
    pub async fn delete_where(&self, predicate: &Expr) -> Result<u64> {
        let mut script = String::new();
        self.store
            .writer()
            .write_delete_where(&mut script, &self.name, predicate)?;
        self.store.run_script(script).await
    }

    /// Fetches the row with the given primary key value and binds it, so
    /// further mutations are pushed back to the store.
    pub async fn find(&self, key_value: impl Into<Value>) -> Result<Option<Record>> {
        let key_value = key_value.into();
        let key_column = self
            .store
            .primary_key(&self.name)
            .ok_or_else(|| Error::KeyNotFound(self.name.clone()))?
            .to_owned();
        let mut script = String::new();
        self.store.writer().write_select(
            &mut script,
            &self.name,
            &col(key_column).eq(key_value.clone()),
        )?;
        let mut records = self.store.fetch(script).await?;
        if records.is_empty() {
            return Ok(None);
        }
        let record = records.swap_remove(0);
        record.bind(self.store.binding(&self.name, key_value)?);
        Ok(Some(record))
    }
}
