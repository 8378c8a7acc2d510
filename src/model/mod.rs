pub mod attribute;
pub mod document;
pub mod issue;
