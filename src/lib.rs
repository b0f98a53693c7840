pub mod api;
pub mod canonical;
pub mod context;
pub mod error;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod utils;
pub mod value;
mod serialization;

pub use api::{parse, parse_file, parse_into};
pub use canonical::PrintOptions;
pub use error::{AclError, ParseLocation, ParserError};
pub use node::Node;
pub use serialization::ExportValue;
pub use value::Value;
