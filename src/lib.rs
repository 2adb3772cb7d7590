mod binding;
mod error;
mod expression;
mod record;
mod schema;
mod store;
mod util;
mod value;
mod view;
mod wire;
mod writer;

pub use binding::*;
pub use error::*;
pub use expression::*;
pub use record::*;
pub use schema::*;
pub use store::*;
pub use util::*;
pub use value::*;
pub use view::*;
pub use wire::*;
pub use writer::*;

pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;
