//! `#[derive(In)]` expansion.

use darling::FromDeriveInput;
use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

use crate::fields::{FieldOpts, ObjectInput, inner_type};

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
    let mut extractors = Vec::with_capacity(fields.len());
    for field in &fields {
        if let Some((descriptor, extractor)) = errors.handle(expand_field(field)) {
            descriptors.push(descriptor);
            extractors.push(extractor);
        }
    }
    errors.finish()?;

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::binaa::constructor::ParamObject for #ident #ty_generics #where_clause {
            fn param_fields() -> ::std::vec::Vec<::binaa::param::ParamField> {
                ::std::vec![#(#descriptors),*]
            }

            #[allow(unused_variables)]
            fn extract(
                args: &mut ::binaa::constructor::Arguments,
            ) -> ::binaa::Result<Self> {
                ::std::result::Result::Ok(Self { #(#extractors),* })
            }
        }
    })
}

/// Descriptor and initializer of one field.
fn expand_field(field: &FieldOpts) -> darling::Result<(TokenStream, TokenStream)> {
    field.check_common()?;

    let ident = &field.ident;
    let field_name = field.field_name();
    let ty = &field.ty;

    let (param, extract) = if field.nested {
        if field.optional {
            return Err(field.error("nested objects cannot be optional"));
        }
        (
            quote! {
                ::binaa::param::Param::object(
                    <#ty as ::binaa::constructor::ParamObject>::param_fields(),
                )
            },
            quote! { <#ty as ::binaa::constructor::ParamObject>::extract(args)? },
        )
    } else if let Some(group) = &field.group {
        if field.optional {
            return Err(field.error("value groups cannot be optional"));
        }
        let Some(elem) = inner_type(ty, "Vec") else {
            return Err(field.error("value group fields must be `Vec<T>`"));
        };
        (
            quote! { ::binaa::param::Param::group::<#elem>(#group) },
            quote! { args.next_group::<#elem>()? },
        )
    } else if field.optional {
        let Some(inner) = inner_type(ty, "Option") else {
            return Err(field.error("optional fields must be `Option<T>`"));
        };
        let name = field.name_or_empty();
        (
            quote! { ::binaa::param::Param::named::<#inner>(#name).into_optional() },
            quote! { args.next_optional::<#inner>()? },
        )
    } else {
        let name = field.name_or_empty();
        (
            quote! { ::binaa::param::Param::named::<#ty>(#name) },
            quote! { args.next::<#ty>()? },
        )
    };

    Ok((
        quote! { ::binaa::param::ParamField::new(#field_name, #param) },
        quote! { #ident: #extract },
    ))
}
