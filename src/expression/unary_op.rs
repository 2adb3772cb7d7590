use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOpType {
    Negative,
    Not,
    IsNull,
}

impl Display for UnaryOpType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOpType::Negative => "Negative",
            UnaryOpType::Not => "Not",
            UnaryOpType::IsNull => "IsNull",
        })
    }
}
