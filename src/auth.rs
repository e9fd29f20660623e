//! Identity primitives: validated identifiers, scope sets, and access-token records.

pub mod id;
pub mod scope;
pub mod token;

pub use id::*;
pub use scope::*;
pub use token::{record::*, secret::*};
