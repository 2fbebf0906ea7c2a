//! Field attributes shared by `In` and `Out`.

use darling::{FromDeriveInput, FromField};
use proc_macro2::Ident;
use syn::{GenericArgument, Generics, PathArguments, Type};

/// Backquotes are reserved in names and groups.
const RESERVED_DELIMITER: char = '`';

#[derive(Debug, FromDeriveInput)]
#[darling(attributes(binaa), supports(struct_named))]
pub struct ObjectInput {
    pub ident: Ident,
    pub generics: Generics,
    pub data: darling::ast::Data<(), FieldOpts>,
}

#[derive(Debug, FromField)]
#[darling(attributes(binaa))]
pub struct FieldOpts {
    pub ident: Option<Ident>,
    pub ty: Type,
    #[darling(default)]
    pub name: Option<String>,
    #[darling(default)]
    pub group: Option<String>,
    #[darling(default)]
    pub optional: bool,
    #[darling(default)]
    pub nested: bool,
}

impl FieldOpts {
    /// Rejects attribute combinations that both derives forbid.
    pub fn check_common(&self) -> darling::Result<()> {
        if self.name.is_some() && self.group.is_some() {
            return Err(self.error("cannot use named values with value groups"));
        }
        if self.nested && (self.name.is_some() || self.group.is_some()) {
            return Err(self.error("nested objects cannot have a name or group"));
        }
        for value in [&self.name, &self.group].into_iter().flatten() {
            if value.contains(RESERVED_DELIMITER) {
                return Err(self.error(&format!(
                    "invalid {value:?}: names and groups cannot contain backquotes"
                )));
            }
        }
        Ok(())
    }

    pub fn field_name(&self) -> String {
        self.ident.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn error(&self, message: &str) -> darling::Error {
        let error = darling::Error::custom(message);
        match &self.ident {
            Some(ident) => error.with_span(ident),
            None => error,
        }
    }
}

/// `T` out of `Wrapper<T>`, when the last path segment is `wrapper`.
pub fn inner_type<'t>(ty: &'t Type, wrapper: &str) -> Option<&'t Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}
