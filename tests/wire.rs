#[cfg(test)]
mod tests {
    use sheaf::{
        EncoderSet, Error, Record, Result, Token, TokenEncoder, TokenReader, TokenSink,
        TokenWriter, Value, decode_record, decode_value, encode_record, encode_value,
    };
    use std::{
        io::Cursor,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
    };
    use time::macros::{date, datetime};
    use uuid::Uuid;

    fn record(fields: &[(&str, Value)]) -> Record {
        Record::from_fields(fields.iter().map(|(n, v)| (n.to_string(), v.clone())))
            .expect("unique field names")
    }

    #[test]
    fn primitives_round_trip() {
        let original = record(&[
            ("Age", 30.into()),
            ("Weight", 72.5.into()),
            ("Active", true.into()),
            ("Name", "Ada".into()),
            ("Born", date!(2024 - 05 - 01).into()),
            ("Seen", datetime!(2024-05-01 10:30:00).into()),
            (
                "Tag",
                Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8")
                    .unwrap()
                    .into(),
            ),
            ("Note", Value::Null),
        ]);
        let mut buffer = Vec::new();
        encode_record(&original, &mut buffer).unwrap();
        let decoded = decode_record(&mut TokenReader::new(Cursor::new(buffer))).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn nested_records_and_lists_round_trip() {
        let inner = record(&[("City", "Pushkin".into())]);
        let original = record(&[
            ("Address", inner.into()),
            ("Scores", vec![1, 2, 3].into()),
        ]);
        let mut buffer = Vec::new();
        encode_record(&original, &mut buffer).unwrap();
        let decoded = decode_record(&mut TokenReader::new(Cursor::new(buffer))).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn subsecond_timestamps_round_trip() {
        let original = Value::Timestamp(Some(datetime!(2024-05-01 10:30:00.250)));
        let mut buffer = Vec::new();
        encode_value(&original, &mut buffer).unwrap();
        let decoded =
            decode_value(&mut TokenReader::new(Cursor::new(buffer))).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn unterminated_record_fails_instead_of_hanging() {
        let mut buffer = Vec::new();
        encode_record(&record(&[("Id", 1.into())]), &mut buffer).unwrap();
        buffer.pop(); // chop the record end
        let result = decode_record(&mut TokenReader::new(Cursor::new(buffer)));
        assert!(matches!(result, Err(Error::Format(..))));

        // A lone record start with nothing behind it.
        let mut buffer = Vec::new();
        let mut writer = TokenWriter::new(&mut buffer);
        writer.write_token(&Token::RecordStart).unwrap();
        let result = decode_record(&mut TokenReader::new(Cursor::new(buffer)));
        assert!(matches!(result, Err(Error::Format(..))));
    }

    #[test]
    fn truncated_payload_fails() {
        let mut buffer = Vec::new();
        encode_value(&Value::Varchar(Some("hello".into())), &mut buffer).unwrap();
        buffer.truncate(buffer.len() - 2);
        let result = decode_value(&mut TokenReader::new(Cursor::new(buffer)));
        assert!(matches!(result, Err(Error::Format(..))));
    }

    #[test]
    fn forged_length_prefix_fails_without_reserving() {
        // String tag plus a 4 GiB length and no payload behind it.
        let mut input = vec![0x04u8];
        input.extend_from_slice(&u32::MAX.to_le_bytes());
        let result = decode_value(&mut TokenReader::new(Cursor::new(input)));
        assert!(matches!(result, Err(Error::Format(..))));
    }

    #[test]
    fn unknown_tag_fails() {
        let result = decode_value(&mut TokenReader::new(Cursor::new(vec![0xffu8])));
        assert!(matches!(result, Err(Error::Format(..))));
    }

    /// Claims every value and delegates it generically, the shape that loops
    /// forever unless the configuration handed down excludes the delegating
    /// handler.
    struct Passthrough {
        calls: AtomicUsize,
    }

    impl TokenEncoder for Passthrough {
        fn can_encode(&self, _value: &Value) -> bool {
            true
        }

        fn encode(
            &self,
            value: &Value,
            sink: &mut dyn TokenSink,
            set: &EncoderSet,
        ) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            set.without(self).encode(value, sink)
        }
    }

    #[test]
    fn self_referential_configuration_stays_bounded() {
        let passthrough = Arc::new(Passthrough {
            calls: AtomicUsize::new(0),
        });
        let set = EncoderSet::standard().with(passthrough.clone());
        let original = record(&[
            ("Id", 1.into()),
            ("Nested", record(&[("Name", "Ada".into())]).into()),
        ]);
        let mut buffer = Vec::new();
        let mut writer = TokenWriter::new(&mut buffer);
        set.encode(&Value::Record(Some(original.clone())), &mut writer)
            .unwrap();
        // Claimed once at the top, then excluded for the whole subtree.
        assert_eq!(passthrough.calls.load(Ordering::SeqCst), 1);
        let decoded = decode_record(&mut TokenReader::new(Cursor::new(buffer))).unwrap();
        assert_eq!(decoded, original);
    }
}
