pub mod apply;
pub mod ast;
pub mod parser;
pub mod window;

pub use apply::{apply_filters, matches_filter};
pub use ast::{Condition, FilterExpr, Join, Presence};
pub use parser::parse_filter;
pub use window::{FilterMode, MessageWindow};
