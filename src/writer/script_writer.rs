use crate::{
    BinaryOpType, Error, Expr, Record, Result, UnaryOpType, Value, possibly_parenthesized,
    separated_by,
};
use std::fmt::Write;
use time::{Date, PrimitiveDateTime, Time};

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}

/// Pure translator from expression trees and records to backend script text.
///
/// Every method is synchronous and side-effect-free, so a single shared
/// writer is safe for unsynchronized concurrent use. Literal rendering
/// ([`ScriptWriter::write_value`]) is the injection-safety boundary: values
/// whose textual form could break out of their literal context are escaped,
/// kinds with no safe literal form fail with [`Error::LiteralUnsupported`].
pub trait ScriptWriter: Send + Sync {
    /// `select * from <table> where <predicate>`
    fn write_select(&self, out: &mut String, table: &str, predicate: &Expr) -> Result<()> {
        out.reserve(32 + table.len());
        out.push_str("select * from ");
        out.push_str(table);
        out.push_str(" where ");
        self.write_expression(out, predicate)
    }

    /// `insert into <table> (<c1>,<c2>) values (<v1>,<v2>),(<v3>,<v4>)`
    ///
    /// Column order is taken from the first record; every following record
    /// must carry the same fields.
    fn write_insert(&self, out: &mut String, table: &str, records: &[Record]) -> Result<()> {
        let Some(first) = records.first() else {
            return Err(Error::msg("no records to insert"));
        };
        let columns = first.names();
        out.reserve(64 + records.len() * columns.len() * 16);
        out.push_str("insert into ");
        out.push_str(table);
        out.push_str(" (");
        separated_by(out, &columns, |out, name| out.push_str(name), ",");
        out.push_str(") values ");
        let mut result = Ok(());
        separated_by(
            out,
            records,
            |out, record| {
                if result.is_err() {
                    return;
                }
                out.push('(');
                for (i, name) in columns.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    result = record
                        .get(name)
                        .and_then(|value| self.write_value(out, &value));
                    if result.is_err() {
                        return;
                    }
                }
                out.push(')');
            },
            ",",
        );
        result
    }

    /// `update <table> set <column>=<literal> where <pk>=<literal>`
    fn write_update(
        &self,
        out: &mut String,
        table: &str,
        column: &str,
        value: &Value,
        key_column: &str,
        key_value: &Value,
    ) -> Result<()> {
        out.reserve(32 + table.len() + column.len() + key_column.len());
        out.push_str("update ");
        out.push_str(table);
        out.push_str(" set ");
        out.push_str(column);
        out.push('=');
        self.write_value(out, value)?;
        out.push_str(" where ");
        out.push_str(key_column);
        out.push('=');
        self.write_value(out, key_value)
    }

    /// `delete from <table> where <pk>=<literal>`
    fn write_delete_by_key(
        &self,
        out: &mut String,
        table: &str,
        key_column: &str,
        key_value: &Value,
    ) -> Result<()> {
        out.reserve(24 + table.len() + key_column.len());
        out.push_str("delete from ");
        out.push_str(table);
        out.push_str(" where ");
        out.push_str(key_column);
        out.push('=');
        self.write_value(out, key_value)
    }

    /// `delete from <table> where <predicate>`
    fn write_delete_where(&self, out: &mut String, table: &str, predicate: &Expr) -> Result<()> {
        out.reserve(24 + table.len());
        out.push_str("delete from ");
        out.push_str(table);
        out.push_str(" where ");
        self.write_expression(out, predicate)
    }

    /// Renders an expression node, parenthesizing by operator precedence.
    /// Column nodes emit the bare identifier with no quoting.
    fn write_expression(&self, out: &mut String, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Column(name) => {
                out.push_str(name);
                Ok(())
            }
            Expr::Literal(value) => self.write_value(out, value),
            Expr::Unary { op, arg } => self.write_expression_unary(out, *op, arg),
            Expr::Binary { op, lhs, rhs } => self.write_expression_binary(out, *op, lhs, rhs),
        }
    }

    fn write_expression_unary(&self, out: &mut String, op: UnaryOpType, arg: &Expr) -> Result<()> {
        let precedence = self.unary_op_precedence(op);
        let parenthesize = self.expression_precedence(arg) <= precedence;
        match op {
            UnaryOpType::Negative => out.push('-'),
            UnaryOpType::Not => out.push_str("not "),
            UnaryOpType::IsNull => {}
        }
        possibly_parenthesized!(out, parenthesize, self.write_expression(out, arg)?);
        if op == UnaryOpType::IsNull {
            out.push_str(" is null");
        }
        Ok(())
    }

    fn write_expression_binary(
        &self,
        out: &mut String,
        op: BinaryOpType,
        lhs: &Expr,
        rhs: &Expr,
    ) -> Result<()> {
        let infix = match op {
            BinaryOpType::Multiplication => "*",
            BinaryOpType::Division => "/",
            BinaryOpType::Remainder => "%",
            BinaryOpType::Addition => "+",
            BinaryOpType::Subtraction => "-",
            BinaryOpType::Equal => "=",
            BinaryOpType::NotEqual => "<>",
            BinaryOpType::Less => "<",
            BinaryOpType::Greater => ">",
            BinaryOpType::LessEqual => "<=",
            BinaryOpType::GreaterEqual => ">=",
            BinaryOpType::And => " and ",
            BinaryOpType::Or => " or ",
        };
        let precedence = self.binary_op_precedence(op);
        possibly_parenthesized!(
            out,
            self.expression_precedence(lhs) < precedence,
            self.write_expression(out, lhs)?
        );
        out.push_str(infix);
        possibly_parenthesized!(
            out,
            self.expression_precedence(rhs) <= precedence,
            self.write_expression(out, rhs)?
        );
        Ok(())
    }

    fn expression_precedence(&self, expr: &Expr) -> i32 {
        match expr {
            Expr::Column(..) | Expr::Literal(..) => 1_000_000_000,
            Expr::Unary { op, .. } => self.unary_op_precedence(*op),
            Expr::Binary { op, .. } => self.binary_op_precedence(*op),
        }
    }

    /// Precedence table for binary operators.
    fn binary_op_precedence(&self, op: BinaryOpType) -> i32 {
        match op {
            BinaryOpType::Or => 100,
            BinaryOpType::And => 200,
            BinaryOpType::Equal
            | BinaryOpType::NotEqual
            | BinaryOpType::Less
            | BinaryOpType::Greater
            | BinaryOpType::LessEqual
            | BinaryOpType::GreaterEqual => 300,
            BinaryOpType::Subtraction | BinaryOpType::Addition => 800,
            BinaryOpType::Multiplication | BinaryOpType::Division | BinaryOpType::Remainder => 900,
        }
    }

    /// Precedence table for unary operators.
    fn unary_op_precedence(&self, op: UnaryOpType) -> i32 {
        match op {
            UnaryOpType::Negative => 1250,
            UnaryOpType::IsNull => 400,
            UnaryOpType::Not => 250,
        }
    }

    /// Type-directed literal rendering.
    fn write_value(&self, out: &mut String, value: &Value) -> Result<()> {
        match value {
            v if v.is_null() => self.write_value_none(out),
            Value::Boolean(Some(v)) => out.push_str(["false", "true"][*v as usize]),
            Value::Int64(Some(v)) => write_integer!(out, *v),
            Value::Float64(Some(v)) => {
                if !v.is_finite() {
                    return Err(Error::LiteralUnsupported("non-finite float64"));
                }
                let mut buffer = ryu::Buffer::new();
                out.push_str(buffer.format(*v));
            }
            Value::Decimal(Some(v)) => drop(write!(out, "{}", v)),
            Value::Varchar(Some(v)) => self.write_value_string(out, v),
            Value::Date(Some(v)) => self.write_value_date(out, v, false),
            Value::Timestamp(Some(v)) => self.write_value_timestamp(out, v),
            Value::Uuid(Some(v)) => drop(write!(out, "'{}'", v)),
            Value::Record(Some(..)) | Value::List(Some(..)) => {
                return Err(Error::LiteralUnsupported(value.kind_name()));
            }
            _ => unreachable!("null payloads are handled above"),
        };
        Ok(())
    }

    /// The `NULL` literal, uppercase.
    fn write_value_none(&self, out: &mut String) {
        out.push_str("NULL");
    }

    /// Renders a string literal, single-quoted with inner quotes doubled.
    fn write_value_string(&self, out: &mut String, value: &str) {
        out.push('\'');
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == '\'' {
                out.push_str(&value[position..i]);
                out.push_str("''");
                position = i + 1;
            }
        }
        out.push_str(&value[position..]);
        out.push('\'');
    }

    /// `'YYYY-MM-DD'` (bare when part of a timestamp).
    fn write_value_date(&self, out: &mut String, value: &Date, timestamp: bool) {
        let b = if timestamp { "" } else { "'" };
        let _ = write!(
            out,
            "{b}{:04}-{:02}-{:02}{b}",
            value.year(),
            value.month() as u8,
            value.day()
        );
    }

    /// `HH:MM:SS` with the subsecond part trimmed to its shortest form.
    fn write_value_time(&self, out: &mut String, value: &Time) {
        let _ = write!(
            out,
            "{:02}:{:02}:{:02}",
            value.hour(),
            value.minute(),
            value.second()
        );
        let mut subsecond = value.nanosecond();
        if subsecond != 0 {
            let mut width = 9;
            while width > 1 && subsecond % 10 == 0 {
                subsecond /= 10;
                width -= 1;
            }
            let _ = write!(out, ".{:0width$}", subsecond);
        }
    }

    /// `'YYYY-MM-DDTHH:MM:SS'`
    fn write_value_timestamp(&self, out: &mut String, value: &PrimitiveDateTime) {
        out.push('\'');
        self.write_value_date(out, &value.date(), true);
        out.push('T');
        self.write_value_time(out, &value.time());
        out.push('\'');
    }
}

/// Fallback generic script writer.
pub struct GenericScriptWriter;

impl GenericScriptWriter {
    pub const fn new() -> Self {
        Self {}
    }
}

impl Default for GenericScriptWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptWriter for GenericScriptWriter {}
