//! Base types and error handling.
//!
//! - [`NetError`](neterror::NetError): the single error taxonomy, with
//!   Chromium `net_error_list.h` codes where one exists
//! - [`IoResultExt`](context::IoResultExt): IO error context helpers

pub mod context;
pub mod neterror;
