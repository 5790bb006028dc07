//! # hostbind-macros
//!
//! Derive macros for `hostbind` extension modules.
//!
//! - `#[derive(Throwable)]` maps an error type onto a host exception class
//!   so it can cross the call boundary with a deterministic class name,
//!   code and message.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod throwable;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derive `hostbind::error::Throwable`.
///
/// Container attributes:
/// - `#[throwable_class(expr)]` names the host exception class; defaults to
///   `"Exception"`.
/// - `#[throwable_code(expr)]` sets the exception code; defaults to `0`.
///
/// On enums, a single-field variant marked `#[throwable(transparent)]`
/// forwards class, code and message to the wrapped error.
///
/// ```ignore
/// #[derive(Debug, thiserror::Error, hostbind::Throwable)]
/// #[throwable_class("RuntimeException")]
/// pub enum MyError {
///     #[error("bad input: {0}")]
///     BadInput(String),
///
///     #[error(transparent)]
///     #[throwable(transparent)]
///     Engine(hostbind::Error),
/// }
/// ```
#[proc_macro_derive(Throwable, attributes(throwable, throwable_class, throwable_code))]
pub fn derive_throwable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    throwable::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
