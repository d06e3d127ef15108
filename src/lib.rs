#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

#[macro_use]
extern crate rust_i18n;

i18n!("locales", fallback = "en");

pub mod config;
#[doc(hidden)]
pub mod diagnostics;
pub mod error;
pub mod guard;
#[doc(hidden)]
pub mod platform;
pub mod policy;
pub mod runtime;
pub mod screen;

pub use config::Config;
pub use error::{GuardError, Result};
