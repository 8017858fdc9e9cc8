pub mod config;
pub mod convert;
pub mod error;
pub mod include;
pub mod json;
pub mod parser;
pub mod path;
pub mod printer;
pub mod setting;
pub mod tokenizer;
pub mod tree;

pub use config::{parse_file, parse_str, Config};
pub use convert::FromScalar;
pub use error::{ConfigError, Position, Result, SyntaxError};
pub use include::MAX_INCLUDE_DEPTH;
pub use setting::{Setting, SettingMut};
pub use tree::{Format, Scalar, SettingType};

#[cfg(test)]
mod tests;
