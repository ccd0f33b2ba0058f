mod view_model;

use proc_macro::TokenStream;

// ============================================================================
// #[derive(ViewModel)] derive macro
// ============================================================================

/// Derive macro for the `ViewModel` trait.
///
/// The namespace defaults to the fully qualified path of the type
/// (`module_path!()` + `::` + type name), which keeps it unique per type and
/// stable across builds as long as the type does not move.
///
/// Generic types are rejected: all their instantiations would share one
/// namespace. Implement `ViewModel` by hand for each concrete type instead.
///
/// # Usage
///
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize, ViewModel)]
/// struct OrderSummary {
///     pub id: String,
///     pub total: u64,
/// }
/// ```
///
/// Pin the namespace explicitly when a type may be moved or renamed but
/// its stored documents must stay addressable:
///
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize, ViewModel)]
/// #[viewmodel(namespace = "shop.order_summary")]
/// struct OrderSummary {
///     pub id: String,
/// }
/// ```
#[proc_macro_derive(ViewModel, attributes(viewmodel))]
pub fn derive_view_model(input: TokenStream) -> TokenStream {
    view_model::derive_view_model(input)
}
