use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, LitStr};

pub fn derive_view_model(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;

    // Every instantiation of a generic type would share one namespace.
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "ViewModel cannot be derived for generic types; implement it by hand for each \
             concrete type with its own NAMESPACE",
        ));
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let namespace = match extract_namespace(input)? {
        Some(explicit) => quote! { #explicit },
        None => {
            let type_name = name.to_string();
            quote! { concat!(module_path!(), "::", #type_name) }
        }
    };

    Ok(quote! {
        impl #impl_generics ::viewmodels::ViewModel for #name #ty_generics #where_clause {
            const NAMESPACE: &'static str = #namespace;
        }
    })
}

/// Reads `#[viewmodel(namespace = "...")]` from the struct-level attributes.
fn extract_namespace(input: &DeriveInput) -> syn::Result<Option<LitStr>> {
    let mut namespace = None;

    for attr in &input.attrs {
        if !attr.path().is_ident("viewmodel") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("namespace") {
                let value: LitStr = meta.value()?.parse()?;
                validate_namespace(&value)?;
                namespace = Some(value);
                Ok(())
            } else {
                Err(meta.error("unsupported viewmodel attribute, expected `namespace`"))
            }
        })?;
    }

    Ok(namespace)
}

// The namespace is the part of a document id before the first '/'.
fn validate_namespace(value: &LitStr) -> syn::Result<()> {
    let text = value.value();
    if text.is_empty() {
        return Err(syn::Error::new(value.span(), "namespace must not be empty"));
    }
    if text.contains('/') {
        return Err(syn::Error::new(value.span(), "namespace must not contain '/'"));
    }
    Ok(())
}
