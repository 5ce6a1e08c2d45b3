//! Whole editing sessions driven through [`Editor`](crate::Editor).
//!
//! Unlike the unit tests next to each tool, these go through event routing,
//! commit flushing and the backend in one pass.
