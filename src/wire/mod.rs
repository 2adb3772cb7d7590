mod decode;
mod encode;
mod token;

pub use decode::{decode_record, decode_value};
pub use encode::*;
pub use token::*;
