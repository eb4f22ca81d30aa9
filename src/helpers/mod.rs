//! Low-level helpers shared by the document, resolver and query modules

pub mod process;
pub mod xml;
pub(crate) mod zip;
