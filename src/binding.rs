use crate::{Result, Store, Value};
use futures::{FutureExt, future::BoxFuture};
use tokio::sync::broadcast;

/// A field change pushed from the backing store to a bound record.
#[derive(Debug, Clone)]
pub struct SourceChange {
    pub column: String,
    pub value: Value,
}

/// Bidirectional synchronization contract between a [`Record`](crate::Record)
/// and a backing store location.
///
/// Outbound pushes are explicit awaitable operations; the fire-and-forget
/// behavior lives in `Record::set`, which spawns them and logs failures.
/// Inbound channels must always be subscribable: an adapter without inbound
/// support hands out live but never-firing receivers instead of failing,
/// because a record subscribes to both unconditionally on bind.
pub trait Binding: Send + Sync {
    /// Writes one column of the bound row back to the store.
    fn push_update(&self, column: String, value: Value) -> BoxFuture<'static, Result<()>>;

    /// Deletes the bound row from the store.
    fn push_delete(&self) -> BoxFuture<'static, Result<()>>;

    fn source_updates(&self) -> broadcast::Receiver<SourceChange>;

    fn source_deletes(&self) -> broadcast::Receiver<()>;
}

/// Store-backed [`Binding`] for a single row addressed by primary key.
///
/// Update and delete scripts are produced by the store's
/// [`ScriptWriter`](crate::ScriptWriter) and run on a fresh connection per
/// push. Push notification from the store is out of scope, so both inbound
/// channels are of the never-firing kind.
pub struct StoreBinding {
    store: Store,
    table: String,
    key_column: String,
    key_value: Value,
    updates: broadcast::Sender<SourceChange>,
    deletes: broadcast::Sender<()>,
}

impl StoreBinding {
    pub(crate) fn new(store: Store, table: String, key_column: String, key_value: Value) -> Self {
        Self {
            store,
            table,
            key_column,
            key_value,
            updates: broadcast::channel(1).0,
            deletes: broadcast::channel(1).0,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    pub fn key_value(&self) -> &Value {
        &self.key_value
    }
}

impl Binding for StoreBinding {
    fn push_update(&self, column: String, value: Value) -> BoxFuture<'static, Result<()>> {
        let store = self.store.clone();
        let table = self.table.clone();
        let key_column = self.key_column.clone();
        let key_value = self.key_value.clone();
        async move {
            let mut script = String::new();
            store
                .writer()
                .write_update(&mut script, &table, &column, &value, &key_column, &key_value)?;
            store.run_script(script).await.map(|_| ())
        }
        .boxed()
    }

    fn push_delete(&self) -> BoxFuture<'static, Result<()>> {
        let store = self.store.clone();
        let table = self.table.clone();
        let key_column = self.key_column.clone();
        let key_value = self.key_value.clone();
        async move {
            let mut script = String::new();
            store
                .writer()
                .write_delete_by_key(&mut script, &table, &key_column, &key_value)?;
            store.run_script(script).await.map(|_| ())
        }
        .boxed()
    }

    fn source_updates(&self) -> broadcast::Receiver<SourceChange> {
        // The sender side stays alive with the binding but never fires.
        self.updates.subscribe()
    }

    fn source_deletes(&self) -> broadcast::Receiver<()> {
        self.deletes.subscribe()
    }
}
