//! Procedural macros for the [`binaa`](https://docs.rs/binaa) crate.
//!
//! # Macros
//!
//! - `#[derive(In)]` - a struct whose fields are constructor parameters
//! - `#[derive(Out)]` - a struct whose fields are constructor results

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod fields;
mod param_object;
mod result_object;

/// Implements `ParamObject` for a struct with named fields.
///
/// Field attributes:
/// - `#[binaa(name = "primary")]` - depend on the value registered under a name
/// - `#[binaa(optional)]` - the field is `Option<T>` and may be absent
/// - `#[binaa(group = "handlers")]` - the field is `Vec<T>` holding every group value
/// - `#[binaa(nested)]` - the field is itself an `In` struct
///
/// ```ignore
/// #[derive(In)]
/// struct ServerParams {
///     config: Arc<Config>,
///     #[binaa(name = "primary")]
///     db: Arc<Database>,
///     #[binaa(optional)]
///     metrics: Option<Arc<Metrics>>,
///     #[binaa(group = "routes")]
///     routes: Vec<Route>,
/// }
/// ```
#[proc_macro_derive(In, attributes(binaa))]
pub fn derive_in(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    param_object::expand(&input).into()
}

/// Implements `ResultObject` for a struct with named fields.
///
/// Field attributes:
/// - `#[binaa(name = "replica")]` - provide the value under a name
/// - `#[binaa(group = "routes")]` - append the value to a group
/// - `#[binaa(nested)]` - the field is itself an `Out` struct
#[proc_macro_derive(Out, attributes(binaa))]
pub fn derive_out(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    result_object::expand(&input).into()
}
