use crate::{Error, Record, Result, Schema};
use std::sync::Mutex;

/// When a [`View`] makes its single-pass source re-iterable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Drain the whole source on the first pull, then discard it.
    Materialize,
    /// Append each pulled element to a durable list as it is produced; once
    /// the source is exhausted the list takes its place.
    Incremental,
}

struct ViewState {
    source: Option<Box<dyn Iterator<Item = Record> + Send>>,
    cache: Vec<Record>,
    schema: Option<Schema>,
}

/// Lazily iterated, schema-validated, cacheable sequence of [`Record`]s.
///
/// All elements must be pairwise schema-compatible; the schema is resolved
/// from the first element unless supplied with [`View::with_schema`], and
/// checking can be turned off with [`View::unchecked`] when the caller
/// guarantees consistency. Whatever the [`CachePolicy`], re-iteration never
/// re-touches the original (possibly single-pass, side-effecting) source.
///
/// The cache fills under an internal mutex held per pull; racing first
/// iterations from different threads stay memory-safe but their interleaving
/// is unspecified, so either synchronize externally or materialize eagerly
/// first.
pub struct View {
    state: Mutex<ViewState>,
    policy: CachePolicy,
    checked: bool,
}

impl View {
    pub fn new<I>(source: I, policy: CachePolicy) -> Self
    where
        I: IntoIterator<Item = Record>,
        I::IntoIter: Send + 'static,
    {
        Self {
            state: Mutex::new(ViewState {
                source: Some(Box::new(source.into_iter())),
                cache: Vec::new(),
                schema: None,
            }),
            policy,
            checked: true,
        }
    }

    /// Fixes the schema instead of deriving it from the first element.
    pub fn with_schema(self, schema: Schema) -> Self {
        self.state.lock().expect("view lock poisoned").schema = Some(schema);
        self
    }

    /// Disables compatibility checking.
    pub fn unchecked(mut self) -> Self {
        self.checked = false;
        self
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// The view's schema, if already resolved.
    pub fn schema(&self) -> Option<Schema> {
        self.state.lock().expect("view lock poisoned").schema.clone()
    }

    pub fn iter(&self) -> ViewIter<'_> {
        ViewIter {
            view: self,
            index: 0,
            done: false,
        }
    }

    /// Validates and collects the whole sequence.
    pub fn to_vec(&self) -> Result<Vec<Record>> {
        self.iter().collect()
    }

    /// Pulls the element at `index` into the cache if not yet there, and
    /// returns it validated. `Ok(None)` past the end.
    fn pull(&self, index: usize) -> Result<Option<Record>> {
        let mut state = self.state.lock().expect("view lock poisoned");
        while state.cache.len() <= index {
            if state.source.is_none() {
                return Ok(None);
            }
            match self.policy {
                CachePolicy::Materialize => {
                    if let Some(source) = state.source.take() {
                        state.cache.extend(source);
                    }
                }
                CachePolicy::Incremental => match state.source.as_mut().and_then(|s| s.next()) {
                    Some(record) => state.cache.push(record),
                    None => {
                        state.source = None;
                        return Ok(None);
                    }
                },
            }
        }
        let record = state.cache[index].clone();
        if self.checked {
            Self::validate(&mut state.schema, &record)?;
        }
        Ok(Some(record))
    }

    /// First element fixes the view schema; later elements either adopt it
    /// (when they have none of their own) or must be compatible with it.
    fn validate(view_schema: &mut Option<Schema>, record: &Record) -> Result<()> {
        let Some(schema) = view_schema else {
            *view_schema = Some(record.schema());
            return Ok(());
        };
        match record.explicit_schema() {
            Some(own) => {
                if !schema.compatible(&own) {
                    return Err(Error::SchemaMismatch(format!(
                        "record schema [{}] is incompatible with view schema [{}]",
                        own.names().collect::<Vec<_>>().join(", "),
                        schema.names().collect::<Vec<_>>().join(", "),
                    )));
                }
                Ok(())
            }
            None => record.adopt_schema(schema.clone()),
        }
    }
}

pub struct ViewIter<'a> {
    view: &'a View,
    index: usize,
    done: bool,
}

impl Iterator for ViewIter<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.view.pull(self.index) {
            Ok(Some(record)) => {
                self.index += 1;
                Some(Ok(record))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<'a> IntoIterator for &'a View {
    type Item = Result<Record>;
    type IntoIter = ViewIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
