pub mod brapi;
pub mod common;
pub mod dto;
pub mod ontology;

pub use brapi::*;
pub use common::*;
pub use dto::*;
pub use ontology::*;
