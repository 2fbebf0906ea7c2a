//! `#[derive(Out)]` expansion.

use darling::FromDeriveInput;
use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

use crate::fields::{FieldOpts, ObjectInput};

pub fn expand(input: &DeriveInput) -> TokenStream {
    match try_expand(input) {
        Ok(tokens) => tokens,
        Err(err) => err.write_errors(),
    }
}

fn try_expand(input: &DeriveInput) -> darling::Result<TokenStream> {
    let ObjectInput {
        ident,
        generics,
        data,
    } = ObjectInput::from_derive_input(input)?;
    let fields = data
        .take_struct()
        .map(|fields| fields.fields)
        .unwrap_or_default();

    let mut errors = darling::Error::accumulator();
    let mut descriptors = Vec::with_capacity(fields.len());
    let mut emitters = Vec::with_capacity(fields.len());
    for field in &fields {
        if let Some((descriptor, emitter)) = errors.handle(expand_field(field)) {
            descriptors.push(descriptor);
            emitters.push(emitter);
        }
    }
    errors.finish()?;

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::binaa::constructor::ResultObject for #ident #ty_generics #where_clause {
            fn result_fields() -> ::std::vec::Vec<::binaa::result::ResultField> {
                ::std::vec![#(#descriptors),*]
            }

            #[allow(unused_variables)]
            fn emit(self, outputs: &mut ::binaa::constructor::Outputs) {
                #(#emitters)*
            }
        }
    })
}

fn expand_field(field: &FieldOpts) -> darling::Result<(TokenStream, TokenStream)> {
    field.check_common()?;
    if field.optional {
        return Err(field.error("results cannot be optional"));
    }

    let ident = &field.ident;
    let field_name = field.field_name();
    let ty = &field.ty;

    let (result, emit) = if field.nested {
        (
            quote! {
                ::binaa::result::ResultItem::object(
                    <#ty as ::binaa::constructor::ResultObject>::result_fields(),
                )
            },
            quote! { ::binaa::constructor::ResultObject::emit(self.#ident, outputs); },
        )
    } else if let Some(group) = &field.group {
        (
            quote! { ::binaa::result::ResultItem::group::<#ty>(#group) },
            quote! { outputs.push(self.#ident); },
        )
    } else {
        let name = field.name_or_empty();
        (
            quote! { ::binaa::result::ResultItem::named::<#ty>(#name) },
            quote! { outputs.push(self.#ident); },
        )
    };

    Ok((
        quote! { ::binaa::result::ResultField::new(#field_name, #result) },
        emit,
    ))
}
