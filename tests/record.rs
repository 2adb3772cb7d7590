#[cfg(test)]
mod tests {
    use sheaf::{Error, Record, RecordEvent, Value};
    use tokio::sync::broadcast::error::TryRecvError;

    fn record(fields: &[(&str, Value)]) -> Record {
        Record::from_fields(fields.iter().map(|(n, v)| (n.to_string(), v.clone())))
            .expect("unique field names")
    }

    #[test]
    fn copy_is_detached_and_equal() {
        let original = record(&[("Id", 7.into()), ("Name", "Ada".into())]);
        let copy = original.copy(true);
        assert_eq!(copy, original);
        assert!(!copy.same_record(&original));
        assert!(!copy.is_bound());
        copy.set("Name", "Grace").unwrap();
        assert_eq!(
            original.get("Name").unwrap(),
            Value::Varchar(Some("Ada".into()))
        );
        assert_eq!(copy.get("Name").unwrap(), Value::Varchar(Some("Grace".into())));
    }

    #[test]
    fn copy_without_values_keeps_names_and_kinds() {
        let original = record(&[("Id", 7.into()), ("Name", "Ada".into())]);
        let copy = original.copy(false);
        assert_eq!(copy.names(), original.names());
        assert_eq!(copy.get("Id").unwrap(), Value::Int64(None));
        assert_eq!(copy.get("Name").unwrap(), Value::Varchar(None));
        assert_eq!(copy.schema(), original.schema());
    }

    #[test]
    fn clone_shares_the_row() {
        let record = record(&[("Id", 7.into())]);
        let alias = record.clone();
        alias.set("Id", 8).unwrap();
        assert_eq!(record.get("Id").unwrap(), Value::Int64(Some(8)));
        assert!(alias.same_record(&record));
    }

    #[test]
    fn set_notifies_subscribers() {
        let record = record(&[("Id", 7.into())]);
        let mut events = record.subscribe();
        record.set("Id", 8).unwrap();
        match events.try_recv().unwrap() {
            RecordEvent::Changed { field, value } => {
                assert_eq!(field, "Id");
                assert_eq!(value, Value::Int64(Some(8)));
            }
            other => panic!("unexpected event {:?}", other),
        }
        record.refresh();
        assert!(matches!(events.try_recv().unwrap(), RecordEvent::Refreshed));
    }

    #[test]
    fn delete_twice_is_a_no_op() {
        let record = record(&[("Id", 7.into())]);
        let mut events = record.subscribe();
        record.delete().unwrap();
        assert!(record.is_deleted());
        record.delete().unwrap();
        assert!(matches!(events.try_recv().unwrap(), RecordEvent::Deleted));
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
        assert!(matches!(
            record.set("Id", 8),
            Err(Error::Unsupported(..))
        ));
        record.refresh();
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn fixed_schema_rejects_unknown_fields() {
        let record = record(&[("Id", 7.into())]);
        record.adopt_schema(record.schema()).unwrap();
        assert!(matches!(
            record.set("Nope", 1),
            Err(Error::FieldNotFound(..))
        ));
        assert!(matches!(record.get("Nope"), Err(Error::FieldNotFound(..))));
        // Without a fixed schema a new name creates the field.
        let loose = Record::new();
        loose.set("Anything", 1).unwrap();
        assert_eq!(loose.get("Anything").unwrap(), Value::Int64(Some(1)));
    }

    #[test]
    fn adopt_schema_requires_compatibility() {
        let narrow = record(&[("Id", 7.into())]);
        let wide = record(&[("Id", 7.into()), ("Name", "Ada".into())]);
        assert!(matches!(
            narrow.adopt_schema(wide.schema()),
            Err(Error::SchemaMismatch(..))
        ));
        assert!(narrow.adopt_schema(narrow.schema()).is_ok());
    }

    #[test]
    fn with_batches_modifications_into_a_detached_copy() {
        let original = record(&[("Id", 7.into()), ("Name", "Ada".into())]);
        let modified = original
            .with([("Name".to_string(), "Grace".into())])
            .unwrap();
        assert_eq!(modified.get("Name").unwrap(), Value::Varchar(Some("Grace".into())));
        assert_eq!(modified.get("Id").unwrap(), Value::Int64(Some(7)));
        assert_eq!(original.get("Name").unwrap(), Value::Varchar(Some("Ada".into())));
        assert!(!modified.same_record(&original));
    }

    #[test]
    fn symmetric_comparison_from_two_threads_terminates() {
        let a = record(&[("Id", 1.into())]);
        let b = record(&[("Id", 1.into())]);
        let forward = {
            let (a, b) = (a.clone(), b.clone());
            std::thread::spawn(move || {
                for _ in 0..10_000 {
                    assert!(a == b);
                }
            })
        };
        let backward = std::thread::spawn(move || {
            for _ in 0..10_000 {
                assert!(b == a);
            }
        });
        forward.join().unwrap();
        backward.join().unwrap();
    }

    #[test]
    fn duplicate_field_names_are_rejected() {
        let result = Record::from_fields([
            ("Id".to_string(), Value::Int64(Some(1))),
            ("Id".to_string(), Value::Int64(Some(2))),
        ]);
        assert!(result.is_err());
    }
}
