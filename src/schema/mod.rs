//! Schema model, document loading and fail-fast validation.

mod load;
mod types;
mod validate;

pub use load::{from_value, load_schema};
pub use types::{SchemaNode, StringFormat};
pub use validate::validate;
