use crate::{Binding, Error, Result, RowLabeled, Schema, Value};
use std::{
    fmt::{self, Debug, Formatter},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use tokio::{runtime::Handle, sync::broadcast, task::JoinHandle};

const EVENT_CAPACITY: usize = 64;

/// Notification raised by a [`Record`] on mutation.
#[derive(Debug, Clone)]
pub enum RecordEvent {
    /// A single field received a new value.
    Changed { field: String, value: Value },
    /// All fields should be considered changed.
    Refreshed,
    /// The record went through its terminal transition.
    Deleted,
}

struct RecordInner {
    fields: Vec<(String, Value)>,
    schema: Option<Schema>,
    binding: Option<Arc<dyn Binding>>,
    runtime: Option<Handle>,
    deleted: bool,
    events: broadcast::Sender<RecordEvent>,
    watchers: Vec<JoinHandle<()>>,
}

impl Drop for RecordInner {
    fn drop(&mut self) {
        for watcher in self.watchers.drain(..) {
            watcher.abort();
        }
    }
}

/// Mutable, ordered, uniquely-keyed field bag with change notification.
///
/// `Record` is a handle: cloning it shares the underlying row, the way a row
/// reference behaves in a backing store. Use [`Record::copy`] for a detached
/// duplicate. A record may hold at most one [`Binding`]; while bound, every
/// successful [`Record::set`] pushes the new value to the backing store on a
/// task spawned onto the runtime captured at bind time, fire-and-forget
/// (failures are logged, not surfaced — await [`Binding::push_update`]
/// directly when confirmation matters). Mutation itself runs synchronously
/// on the calling thread, runtime or not.
#[derive(Clone)]
pub struct Record {
    inner: Arc<RwLock<RecordInner>>,
}

impl Record {
    pub fn new() -> Self {
        Self::build(Vec::new(), None)
    }

    /// Builds a record from ordered `(name, value)` pairs. Names must be
    /// unique (case-sensitive).
    pub fn from_fields(fields: impl IntoIterator<Item = (String, Value)>) -> Result<Self> {
        let fields = fields.into_iter().collect::<Vec<_>>();
        for (i, (name, _)) in fields.iter().enumerate() {
            if fields[..i].iter().any(|(n, _)| n == name) {
                return Err(Error::msg(format!("duplicate field `{}`", name)));
            }
        }
        Ok(Self::build(fields, None))
    }

    /// Builds a record from a labeled result row, `NULL` cells included.
    pub fn from_row(row: RowLabeled) -> Self {
        Self::build(
            row.labels
                .iter()
                .cloned()
                .zip(row.values.into_vec())
                .collect(),
            None,
        )
    }

    fn build(fields: Vec<(String, Value)>, schema: Option<Schema>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(RecordInner {
                fields,
                schema,
                binding: None,
                runtime: None,
                deleted: false,
                events: broadcast::channel(EVENT_CAPACITY).0,
                watchers: Vec::new(),
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, RecordInner> {
        self.inner.read().expect("record lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, RecordInner> {
        self.inner.write().expect("record lock poisoned")
    }

    /// Current value of the field, cloned.
    pub fn get(&self, name: &str) -> Result<Value> {
        self.read()
            .fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| Error::FieldNotFound(name.to_owned()))
    }

    /// Writes a field, notifying subscribers and, when bound, pushing the
    /// change to the backing store fire-and-forget.
    ///
    /// On a record without an explicit schema an unknown name creates a new
    /// field; with a fixed schema it fails with
    /// [`Error::FieldNotFound`].
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let binding = self.store_field(name, &value)?;
        self.notify(RecordEvent::Changed {
            field: name.to_owned(),
            value: value.clone(),
        });
        if let Some((binding, runtime)) = binding {
            let column = name.to_owned();
            runtime.spawn(async move {
                if let Err(e) = binding.push_update(column.clone(), value).await {
                    log::error!("store push for column {} failed: {:#}", column, e);
                }
            });
        }
        Ok(())
    }

    /// Same write as [`Record::set`] but without the store push. Used when the
    /// change originated from the store itself.
    pub(crate) fn set_silent(&self, name: &str, value: Value) -> Result<()> {
        self.store_field(name, &value)?;
        self.notify(RecordEvent::Changed {
            field: name.to_owned(),
            value,
        });
        Ok(())
    }

    fn store_field(&self, name: &str, value: &Value) -> Result<Option<(Arc<dyn Binding>, Handle)>> {
        let mut inner = self.write();
        if inner.deleted {
            return Err(Error::Unsupported("mutating a deleted record".into()));
        }
        match inner.fields.iter().position(|(n, _)| n == name) {
            Some(i) => inner.fields[i].1 = value.clone(),
            None => {
                if inner.schema.is_some() {
                    return Err(Error::FieldNotFound(name.to_owned()));
                }
                inner.fields.push((name.to_owned(), value.clone()));
            }
        }
        Ok(inner.binding.clone().zip(inner.runtime.clone()))
    }

    fn notify(&self, event: RecordEvent) {
        // Send only fails when nobody subscribed.
        let _ = self.read().events.send(event);
    }

    /// Detached duplicate: same field names, optionally same values, no
    /// binding, same explicit schema if any.
    pub fn copy(&self, copy_values: bool) -> Record {
        let inner = self.read();
        Self::build(
            inner
                .fields
                .iter()
                .map(|(n, v)| {
                    (
                        n.clone(),
                        if copy_values { v.clone() } else { v.prototype() },
                    )
                })
                .collect(),
            inner.schema.clone(),
        )
    }

    /// Copy plus batch set, returning the new detached record.
    pub fn with(&self, modifications: impl IntoIterator<Item = (String, Value)>) -> Result<Record> {
        let copy = self.copy(true);
        for (name, value) in modifications {
            copy.set(&name, value)?;
        }
        Ok(copy)
    }

    /// Terminal transition: notifies subscribers once, pushes a store delete
    /// when bound, clears the binding and suppresses all further
    /// notification. Calling it again is a no-op.
    pub fn delete(&self) -> Result<()> {
        let Some((binding, runtime)) = self.delete_local() else {
            return Ok(());
        };
        runtime.spawn(async move {
            if let Err(e) = binding.push_delete().await {
                log::error!("store delete push failed: {:#}", e);
            }
        });
        Ok(())
    }

    /// Marks the record deleted without echoing the delete to the store.
    /// `None` when the record was already deleted or carried no binding.
    fn delete_local(&self) -> Option<(Arc<dyn Binding>, Handle)> {
        let (events, binding) = {
            let mut inner = self.write();
            if inner.deleted {
                return None;
            }
            inner.deleted = true;
            for watcher in inner.watchers.drain(..) {
                watcher.abort();
            }
            (
                inner.events.clone(),
                inner.binding.take().zip(inner.runtime.take()),
            )
        };
        let _ = events.send(RecordEvent::Deleted);
        binding
    }

    /// Re-raises "all fields changed". Suppressed after deletion.
    pub fn refresh(&self) {
        let inner = self.read();
        if inner.deleted {
            return;
        }
        let _ = inner.events.send(RecordEvent::Refreshed);
    }

    pub fn is_deleted(&self) -> bool {
        self.read().deleted
    }

    /// Attaches a binding, replacing (and unregistering) any previous one.
    ///
    /// The record unconditionally subscribes to both inbound channels, so an
    /// adapter without inbound support must hand out never-firing receivers
    /// rather than failing. Must run inside a tokio runtime; its handle is
    /// kept so that later pushes from plain threads spawn onto it.
    pub fn bind(&self, binding: Arc<dyn Binding>) {
        let runtime = Handle::current();
        let mut updates = binding.source_updates();
        let mut deletes = binding.source_deletes();
        let mut inner = self.write();
        for watcher in inner.watchers.drain(..) {
            watcher.abort();
        }
        inner.binding = Some(binding);
        let weak = Arc::downgrade(&self.inner);
        inner.watchers.push(runtime.spawn(async move {
            loop {
                match updates.recv().await {
                    Ok(change) => {
                        let Some(strong) = weak.upgrade() else { break };
                        let record = Record { inner: strong };
                        if let Err(e) = record.set_silent(&change.column, change.value) {
                            log::error!("source update for {} dropped: {:#}", change.column, e);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
        let weak = Arc::downgrade(&self.inner);
        inner.watchers.push(runtime.spawn(async move {
            loop {
                match deletes.recv().await {
                    Ok(()) => {
                        let Some(strong) = weak.upgrade() else { break };
                        Record { inner: strong }.delete_local();
                        break;
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
        inner.runtime = Some(runtime);
    }

    pub fn unbind(&self) {
        let mut inner = self.write();
        for watcher in inner.watchers.drain(..) {
            watcher.abort();
        }
        inner.binding = None;
        inner.runtime = None;
    }

    pub fn binding(&self) -> Option<Arc<dyn Binding>> {
        self.read().binding.clone()
    }

    pub fn is_bound(&self) -> bool {
        self.read().binding.is_some()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RecordEvent> {
        self.read().events.subscribe()
    }

    /// The explicit schema when one was assigned, otherwise a schema inferred
    /// from the current field values.
    pub fn schema(&self) -> Schema {
        let inner = self.read();
        inner.schema.clone().unwrap_or_else(|| {
            Schema::new(inner.fields.iter().map(|(n, v)| (n.clone(), v.prototype())))
        })
    }

    pub fn explicit_schema(&self) -> Option<Schema> {
        self.read().schema.clone()
    }

    /// Fixes the record's schema. The current fields must be compatible;
    /// an empty record is populated with empty values for every declared
    /// field.
    pub fn adopt_schema(&self, schema: Schema) -> Result<()> {
        let mut inner = self.write();
        if inner.fields.is_empty() {
            inner.fields = schema
                .fields()
                .iter()
                .map(|(n, kind)| (n.clone(), kind.prototype()))
                .collect();
        } else {
            let inferred = Schema::new(inner.fields.iter().map(|(n, v)| (n.clone(), v.prototype())));
            if !schema.compatible(&inferred) {
                return Err(Error::SchemaMismatch(format!(
                    "record fields [{}] do not fit schema [{}]",
                    inferred.names().collect::<Vec<_>>().join(", "),
                    schema.names().collect::<Vec<_>>().join(", "),
                )));
            }
        }
        inner.schema = Some(schema);
        Ok(())
    }

    pub fn names(&self) -> Vec<String> {
        self.read().fields.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn fields(&self) -> Vec<(String, Value)> {
        self.read().fields.clone()
    }

    pub fn len(&self) -> usize {
        self.read().fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().fields.is_empty()
    }

    /// Whether the two handles share the same underlying row.
    pub fn same_record(&self, other: &Record) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Record {
    /// Field-by-field comparison. Locks are taken in address order so that
    /// `a == b` and `b == a` racing on different threads cannot deadlock.
    /// A record graph containing itself through a nested [`Value::Record`]
    /// recurses unboundedly.
    fn eq(&self, other: &Self) -> bool {
        if self.same_record(other) {
            return true;
        }
        let (first, second) = if Arc::as_ptr(&self.inner) < Arc::as_ptr(&other.inner) {
            (self, other)
        } else {
            (other, self)
        };
        let first = first.read();
        let second = second.read();
        first.fields == second.fields
    }
}

impl Debug for Record {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let inner = self.read();
        let mut map = f.debug_map();
        for (name, value) in &inner.fields {
            map.entry(name, value);
        }
        map.finish()
    }
}
