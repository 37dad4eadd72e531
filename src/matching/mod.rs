pub mod keywords;
pub mod resolver;

pub use keywords::{KeywordRule, KeywordTable};
pub use resolver::{resolve, FieldSignals};
