use std::fmt::{self, Display, Formatter};

/// Writes `values` through `f` into `out`, inserting `separator` between any
/// two items that produced output.
pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Caps a script at 497 bytes when formatting it for the log, cutting back
/// to the nearest character boundary.
pub fn truncate_long(script: &str) -> TruncatedScript<'_> {
    TruncatedScript(script)
}

pub struct TruncatedScript<'a>(&'a str);

impl Display for TruncatedScript<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        const LIMIT: usize = 497;
        if self.0.len() <= LIMIT {
            return f.write_str(self.0);
        }
        let mut cut = LIMIT;
        while !self.0.is_char_boundary(cut) {
            cut -= 1;
        }
        write!(f, "{}...", self.0[..cut].trim_end())
    }
}

#[macro_export]
macro_rules! possibly_parenthesized {
    ($buff:ident, $cond:expr, $v:expr) => {
        if $cond {
            $buff.push('(');
            $v;
            $buff.push(')');
        } else {
            $v;
        }
    };
}
