mod defaults;
mod flatten;
mod format;
mod parser;
pub mod validator;

pub use defaults::default_tree;
pub use flatten::flatten;
pub use format::format_key;
pub use parser::{parse_tree_input, parse_tree_text, TreeParseError};
pub use validator::{validate, TreeError};
