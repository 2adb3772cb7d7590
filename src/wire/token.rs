use crate::{Error, Result};
use std::io::{self, Read, Write};

/// One element of the self-describing wire stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Field label inside a record body.
    FieldName(String),
    RecordStart,
    RecordEnd,
    ListStart,
    ListEnd,
}

mod tag {
    pub const NULL: u8 = 0x00;
    pub const BOOL: u8 = 0x01;
    pub const INT: u8 = 0x02;
    pub const FLOAT: u8 = 0x03;
    pub const STR: u8 = 0x04;
    pub const FIELD_NAME: u8 = 0x05;
    pub const RECORD_START: u8 = 0x06;
    pub const RECORD_END: u8 = 0x07;
    pub const LIST_START: u8 = 0x08;
    pub const LIST_END: u8 = 0x09;
}

/// Streaming token reader over a byte pipe.
///
/// Clean end of input at a token boundary yields `None`; end of input in the
/// middle of a token is a [`Error::Format`].
pub struct TokenReader<R: Read> {
    input: R,
}

impl<R: Read> TokenReader<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    pub fn next_token(&mut self) -> Result<Option<Token>> {
        let mut tag = [0u8; 1];
        if self.input.read(&mut tag)? == 0 {
            return Ok(None);
        }
        Ok(Some(match tag[0] {
            tag::NULL => Token::Null,
            tag::BOOL => match self.payload::<1>()?[0] {
                0 => Token::Bool(false),
                1 => Token::Bool(true),
                other => return Err(Error::Format(format!("invalid boolean byte {}", other))),
            },
            tag::INT => Token::Int(i64::from_le_bytes(self.payload()?)),
            tag::FLOAT => Token::Float(f64::from_le_bytes(self.payload()?)),
            tag::STR => Token::Str(self.read_string()?),
            tag::FIELD_NAME => Token::FieldName(self.read_string()?),
            tag::RECORD_START => Token::RecordStart,
            tag::RECORD_END => Token::RecordEnd,
            tag::LIST_START => Token::ListStart,
            tag::LIST_END => Token::ListEnd,
            other => return Err(Error::Format(format!("unknown token tag 0x{:02x}", other))),
        }))
    }

    fn payload<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buffer = [0u8; N];
        self.input.read_exact(&mut buffer).map_err(truncated)?;
        Ok(buffer)
    }

    /// The length prefix is untrusted: bytes are read through a bounded
    /// `take` so a forged huge length cannot reserve memory up front.
    fn read_string(&mut self) -> Result<String> {
        let len = u64::from(u32::from_le_bytes(self.payload()?));
        let mut buffer = Vec::new();
        let read = (&mut self.input).take(len).read_to_end(&mut buffer)?;
        if (read as u64) < len {
            return Err(Error::Format("input ends in the middle of a token".into()));
        }
        String::from_utf8(buffer)
            .map_err(|e| Error::Format(format!("invalid UTF-8 in string token: {}", e)))
    }
}

fn truncated(e: io::Error) -> Error {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        Error::Format("input ends in the middle of a token".into())
    } else {
        Error::Io(e)
    }
}

/// Streaming token writer, the encode side of [`TokenReader`].
pub struct TokenWriter<W: Write> {
    output: W,
}

/// Object-safe token output used by [`TokenEncoder`](crate::TokenEncoder)
/// implementations.
pub trait TokenSink {
    fn write_token(&mut self, token: &Token) -> Result<()>;
}

impl<W: Write> TokenWriter<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }

    pub fn flush(&mut self) -> Result<()> {
        self.output.flush()?;
        Ok(())
    }

    fn write_string(&mut self, tag: u8, value: &str) -> Result<()> {
        self.output.write_all(&[tag])?;
        self.output
            .write_all(&(value.len() as u32).to_le_bytes())?;
        self.output.write_all(value.as_bytes())?;
        Ok(())
    }
}

impl<W: Write> TokenSink for TokenWriter<W> {
    fn write_token(&mut self, token: &Token) -> Result<()> {
        match token {
            Token::Null => self.output.write_all(&[tag::NULL])?,
            Token::Bool(v) => self.output.write_all(&[tag::BOOL, *v as u8])?,
            Token::Int(v) => {
                self.output.write_all(&[tag::INT])?;
                self.output.write_all(&v.to_le_bytes())?;
            }
            Token::Float(v) => {
                self.output.write_all(&[tag::FLOAT])?;
                self.output.write_all(&v.to_le_bytes())?;
            }
            Token::Str(v) => self.write_string(tag::STR, v)?,
            Token::FieldName(v) => self.write_string(tag::FIELD_NAME, v)?,
            Token::RecordStart => self.output.write_all(&[tag::RECORD_START])?,
            Token::RecordEnd => self.output.write_all(&[tag::RECORD_END])?,
            Token::ListStart => self.output.write_all(&[tag::LIST_START])?,
            Token::ListEnd => self.output.write_all(&[tag::LIST_END])?,
        }
        Ok(())
    }
}
