use crate::{Error, Record, Result, Token, TokenReader, Value};
use std::io::Read;
use time::{Date, PrimitiveDateTime, format_description::BorrowedFormatItem, macros::format_description};

pub(crate) const DATE_FORMAT: &'static [BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");
pub(crate) const TIMESTAMP_FORMAT: &'static [BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
pub(crate) const TIMESTAMP_SUBSECOND_FORMAT: &'static [BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");

/// Decodes one record from the stream. The stream must open with a record.
pub fn decode_record(reader: &mut TokenReader<impl Read>) -> Result<Record> {
    match decode_value(reader)? {
        Value::Record(Some(record)) => Ok(record),
        other => Err(Error::Format(format!(
            "expected a record, found {}",
            other.kind_name()
        ))),
    }
}

/// Decodes the next value from the stream, recursively for records and
/// lists. Every repeat-until-terminator loop escapes with
/// [`Error::Format`] when the stream ends early, so truncated or adversarial
/// input terminates instead of hanging.
pub fn decode_value(reader: &mut TokenReader<impl Read>) -> Result<Value> {
    let token = required(reader, "a value")?;
    decode_from(reader, token)
}

fn required(reader: &mut TokenReader<impl Read>, expected: &str) -> Result<Token> {
    reader
        .next_token()?
        .ok_or_else(|| Error::Format(format!("input ended while expecting {}", expected)))
}

fn decode_from(reader: &mut TokenReader<impl Read>, token: Token) -> Result<Value> {
    Ok(match token {
        Token::Null => Value::Null,
        Token::Bool(v) => Value::Boolean(Some(v)),
        Token::Int(v) => Value::Int64(Some(v)),
        Token::Float(v) => Value::Float64(Some(v)),
        Token::Str(v) => decode_text(v),
        Token::RecordStart => {
            let mut fields = Vec::new();
            loop {
                match required(reader, "a field name or a record end")? {
                    Token::RecordEnd => break,
                    Token::FieldName(name) => {
                        let value = decode_value(reader)?;
                        if fields.iter().any(|(n, _)| *n == name) {
                            return Err(Error::Format(format!("duplicate field `{}`", name)));
                        }
                        fields.push((name, value));
                    }
                    other => {
                        return Err(Error::Format(format!(
                            "expected a field name inside a record, found {:?}",
                            other
                        )));
                    }
                }
            }
            Value::Record(Some(Record::from_fields(fields)?))
        }
        Token::ListStart => {
            let mut elements = Vec::new();
            loop {
                match required(reader, "a list element or a list end")? {
                    Token::ListEnd => break,
                    token => elements.push(decode_from(reader, token)?),
                }
            }
            Value::List(Some(elements))
        }
        Token::RecordEnd | Token::ListEnd | Token::FieldName(..) => {
            return Err(Error::Format(format!("unexpected token {:?}", token)));
        }
    })
}

/// Scalar text decodes to the narrowest matching kind: date, then timestamp,
/// then uuid, otherwise it stays text.
fn decode_text(text: String) -> Value {
    if let Ok(date) = Date::parse(&text, DATE_FORMAT) {
        return Value::Date(Some(date));
    }
    if let Ok(timestamp) = PrimitiveDateTime::parse(&text, TIMESTAMP_SUBSECOND_FORMAT)
        .or_else(|_| PrimitiveDateTime::parse(&text, TIMESTAMP_FORMAT))
    {
        return Value::Timestamp(Some(timestamp));
    }
    if let Ok(uuid) = uuid::Uuid::parse_str(&text) {
        return Value::Uuid(Some(uuid));
    }
    Value::Varchar(Some(text))
}
