pub mod resolver;
pub mod result;

pub use resolver::Resolver;
pub use result::{ElementNotFoundError, Resolution};
