//! Permission-aware, multi-tenant To-Do store.
//!
//! A [`TodoStore`] is constructed explicitly and cloned into whatever hosts it; there is no
//! process-wide instance. Every operation takes the [`Caller`] on whose behalf it runs:
//! application callers see and mutate everything, delegated callers only the records whose
//! `user_id` equals their own identifier. Access-control failures come back as outcome values,
//! never as errors, and a record owned by someone else is indistinguishable from an absent one.

pub mod caller;
pub mod model;
pub mod store;

pub use caller::*;
pub use model::*;
pub use store::*;
