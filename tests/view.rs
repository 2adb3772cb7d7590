#[cfg(test)]
mod tests {
    use sheaf::{CachePolicy, Error, Record, Value, View};
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    fn record(fields: &[(&str, Value)]) -> Record {
        Record::from_fields(fields.iter().map(|(n, v)| (n.to_string(), v.clone())))
            .expect("unique field names")
    }

    /// Single-pass, side-effecting source counting every pull.
    fn counting_source(
        count: usize,
        pulls: Arc<AtomicUsize>,
    ) -> impl Iterator<Item = Record> + Send + 'static {
        (0..count).map(move |i| {
            pulls.fetch_add(1, Ordering::SeqCst);
            record(&[("Id", (i as i64).into())])
        })
    }

    #[test]
    fn materialize_pulls_the_source_exactly_once() {
        let pulls = Arc::new(AtomicUsize::new(0));
        let view = View::new(counting_source(3, pulls.clone()), CachePolicy::Materialize);
        let first = view.to_vec().unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(pulls.load(Ordering::SeqCst), 3);
        let second = view.to_vec().unwrap();
        assert_eq!(second.len(), 3);
        assert_eq!(pulls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn incremental_caches_only_what_was_pulled() {
        let pulls = Arc::new(AtomicUsize::new(0));
        let view = View::new(counting_source(3, pulls.clone()), CachePolicy::Incremental);
        let partial = view.iter().take(2).collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(partial.len(), 2);
        assert_eq!(pulls.load(Ordering::SeqCst), 2);
        let full = view.to_vec().unwrap();
        assert_eq!(full.len(), 3);
        assert_eq!(pulls.load(Ordering::SeqCst), 3);
        // Exhausted source is discarded, re-iteration reads the cache.
        let again = view.to_vec().unwrap();
        assert_eq!(again.len(), 3);
        assert_eq!(pulls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn schema_is_resolved_from_the_first_element() {
        let view = View::new(
            vec![
                record(&[("Id", 1.into())]),
                record(&[("Id", 2.into())]),
            ],
            CachePolicy::Incremental,
        );
        assert!(view.schema().is_none());
        view.to_vec().unwrap();
        let schema = view.schema().expect("resolved on iteration");
        assert_eq!(schema.names().collect::<Vec<_>>(), ["Id"]);
    }

    #[test]
    fn mismatched_records_fail_when_checked() {
        let view = View::new(
            vec![
                record(&[("Id", 1.into())]),
                record(&[("Name", "Ada".into())]),
            ],
            CachePolicy::Incremental,
        );
        let mut iter = view.iter();
        assert!(iter.next().unwrap().is_ok());
        assert!(matches!(
            iter.next().unwrap(),
            Err(Error::SchemaMismatch(..))
        ));
        // The iterator stops after the failure.
        assert!(iter.next().is_none());
    }

    #[test]
    fn mismatched_records_pass_when_unchecked() {
        let view = View::new(
            vec![
                record(&[("Id", 1.into())]),
                record(&[("Name", "Ada".into())]),
            ],
            CachePolicy::Incremental,
        )
        .unchecked();
        assert_eq!(view.to_vec().unwrap().len(), 2);
    }

    #[test]
    fn explicit_schema_validates_every_element() {
        let reference = record(&[("Name", "Ada".into())]);
        let view = View::new(
            vec![record(&[("Id", 1.into())])],
            CachePolicy::Materialize,
        )
        .with_schema(reference.schema());
        assert!(matches!(
            view.iter().next().unwrap(),
            Err(Error::SchemaMismatch(..))
        ));
    }
}
