pub mod answers;
pub mod catalog;
pub mod position;
pub mod quote;
