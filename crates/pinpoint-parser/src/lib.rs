pub mod parser;
pub mod vocab;

pub use parser::parse;
