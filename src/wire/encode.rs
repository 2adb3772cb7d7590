use super::decode::{DATE_FORMAT, TIMESTAMP_FORMAT, TIMESTAMP_SUBSECOND_FORMAT};
use crate::{Error, Record, Result, Token, TokenSink, TokenWriter, Value};
use std::{io::Write, sync::Arc};

/// One handler in an [`EncoderSet`]: claims values through
/// [`TokenEncoder::can_encode`] and emits their token form.
///
/// `set` is the configuration the dispatch ran against; a handler recursing
/// into child values dispatches through it, while a handler that wants the
/// *same* value re-dispatched generically must use
/// [`EncoderSet::without`] on itself first — the exclusion is threaded
/// through the call rather than mutating shared configuration, so a set that
/// still contains the active handler cannot recurse unboundedly.
pub trait TokenEncoder: Send + Sync {
    fn can_encode(&self, value: &Value) -> bool;
    fn encode(&self, value: &Value, sink: &mut dyn TokenSink, set: &EncoderSet) -> Result<()>;
}

/// Ordered handler configuration for streaming encode.
#[derive(Clone, Default)]
pub struct EncoderSet {
    encoders: Vec<Arc<dyn TokenEncoder>>,
}

impl EncoderSet {
    /// Record, list and scalar handlers, in claim order.
    pub fn standard() -> Self {
        Self {
            encoders: vec![
                Arc::new(RecordEncoder),
                Arc::new(ListEncoder),
                Arc::new(ScalarEncoder),
            ],
        }
    }

    /// Adds a handler in front, so it claims values before the standard
    /// ones.
    pub fn with(mut self, encoder: Arc<dyn TokenEncoder>) -> Self {
        self.encoders.insert(0, encoder);
        self
    }

    /// The same configuration with every occurrence of `encoder` removed.
    pub fn without(&self, encoder: &dyn TokenEncoder) -> EncoderSet {
        let target = encoder as *const dyn TokenEncoder as *const ();
        Self {
            encoders: self
                .encoders
                .iter()
                .filter(|e| Arc::as_ptr(e) as *const () != target)
                .cloned()
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }

    /// Dispatches `value` to the first handler claiming it.
    pub fn encode(&self, value: &Value, sink: &mut dyn TokenSink) -> Result<()> {
        let encoder = self
            .encoders
            .iter()
            .find(|e| e.can_encode(value))
            .ok_or_else(|| {
                Error::Unsupported(format!("no encoder claims a {} value", value.kind_name()))
            })?;
        encoder.encode(value, sink, self)
    }
}

/// Encodes a record to the byte pipe with the standard configuration.
pub fn encode_record(record: &Record, output: impl Write) -> Result<()> {
    encode_value(&Value::Record(Some(record.clone())), output)
}

/// Encodes any value graph to the byte pipe with the standard configuration.
pub fn encode_value(value: &Value, output: impl Write) -> Result<()> {
    let mut writer = TokenWriter::new(output);
    EncoderSet::standard().encode(value, &mut writer)?;
    writer.flush()
}

struct RecordEncoder;

impl TokenEncoder for RecordEncoder {
    fn can_encode(&self, value: &Value) -> bool {
        matches!(value, Value::Record(Some(..)))
    }

    fn encode(&self, value: &Value, sink: &mut dyn TokenSink, set: &EncoderSet) -> Result<()> {
        let Value::Record(Some(record)) = value else {
            return Err(Error::Unsupported("record encoder on a non-record".into()));
        };
        sink.write_token(&Token::RecordStart)?;
        for (name, value) in record.fields() {
            sink.write_token(&Token::FieldName(name))?;
            set.encode(&value, sink)?;
        }
        sink.write_token(&Token::RecordEnd)
    }
}

struct ListEncoder;

impl TokenEncoder for ListEncoder {
    fn can_encode(&self, value: &Value) -> bool {
        matches!(value, Value::List(Some(..)))
    }

    fn encode(&self, value: &Value, sink: &mut dyn TokenSink, set: &EncoderSet) -> Result<()> {
        let Value::List(Some(elements)) = value else {
            return Err(Error::Unsupported("list encoder on a non-list".into()));
        };
        sink.write_token(&Token::ListStart)?;
        for element in elements {
            set.encode(element, sink)?;
        }
        sink.write_token(&Token::ListEnd)
    }
}

struct ScalarEncoder;

impl TokenEncoder for ScalarEncoder {
    fn can_encode(&self, value: &Value) -> bool {
        !matches!(value, Value::Record(Some(..)) | Value::List(Some(..)))
    }

    fn encode(&self, value: &Value, sink: &mut dyn TokenSink, _set: &EncoderSet) -> Result<()> {
        let token = match value {
            v if v.is_null() => Token::Null,
            Value::Boolean(Some(v)) => Token::Bool(*v),
            Value::Int64(Some(v)) => Token::Int(*v),
            Value::Float64(Some(v)) => Token::Float(*v),
            Value::Decimal(Some(v)) => Token::Str(v.to_string()),
            Value::Varchar(Some(v)) => Token::Str(v.clone()),
            Value::Date(Some(v)) => Token::Str(
                v.format(DATE_FORMAT)
                    .map_err(|e| Error::Format(e.to_string()))?,
            ),
            Value::Timestamp(Some(v)) => {
                let format = if v.nanosecond() == 0 {
                    TIMESTAMP_FORMAT
                } else {
                    TIMESTAMP_SUBSECOND_FORMAT
                };
                Token::Str(v.format(format).map_err(|e| Error::Format(e.to_string()))?)
            }
            Value::Uuid(Some(v)) => Token::Str(v.to_string()),
            _ => return Err(Error::Unsupported("scalar encoder on a nested value".into())),
        };
        sink.write_token(&token)
    }
}
