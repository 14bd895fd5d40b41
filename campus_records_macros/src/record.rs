use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{Data, DeriveInput, Field, Fields, Ident, LitStr};

pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let collection = extract_collection(input)?;
    let fields = named_fields(input)?;

    let key_field = extract_key_field(&fields, name)?;
    let key_name = key_field.to_string();
    let indexes = extract_indexes(&fields)?;

    Ok(quote! {
        impl campus_records::Record for #name {
            const COLLECTION: &'static str = #collection;
            const KEY_FIELD: &'static str = #key_name;
            const INDEXES: &'static [&'static str] = &[#(#indexes),*];

            fn key(&self) -> &str {
                &self.#key_field
            }
        }
    })
}

fn named_fields(input: &DeriveInput) -> syn::Result<Vec<&Field>> {
    if let Data::Struct(data_struct) = &input.data {
        if let Fields::Named(fields) = &data_struct.fields {
            return Ok(fields.named.iter().collect());
        }
    }

    Err(syn::Error::new_spanned(
        &input.ident,
        "Record derive: only structs with named fields are supported",
    ))
}

fn extract_collection(input: &DeriveInput) -> syn::Result<String> {
    for attr in &input.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }

        let mut collection = None;
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") {
                let value: LitStr = meta.value()?.parse()?;
                collection = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("expected `collection = \"...\"`"))
            }
        })?;

        if let Some(c) = collection {
            return Ok(c);
        }
    }

    // Collections are addressed by their type name, e.g. `Employee`.
    Ok(input.ident.to_string())
}

/// Flags set on a field through `#[record(key)]` / `#[record(index)]`.
#[derive(Default)]
struct FieldFlags {
    key: bool,
    index: bool,
}

fn field_flags(field: &Field) -> syn::Result<FieldFlags> {
    let mut flags = FieldFlags::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("key") {
                flags.key = true;
                Ok(())
            } else if meta.path.is_ident("index") {
                flags.index = true;
                Ok(())
            } else {
                Err(meta.error("expected `key` or `index`"))
            }
        })?;
    }
    Ok(flags)
}

fn extract_key_field(fields: &[&Field], name: &Ident) -> syn::Result<Ident> {
    let mut marked = Vec::new();
    for field in fields {
        if field_flags(field)?.key {
            marked.push(field);
        }
    }

    match marked.as_slice() {
        [field] => return Ok(field.ident.clone().expect("named field")),
        [] => {}
        [_, second, ..] => {
            return Err(syn::Error::new_spanned(
                second,
                "Record derive: only one field may be marked #[record(key)]",
            ))
        }
    }

    // Default: a field named `id`.
    fields
        .iter()
        .filter_map(|field| field.ident.clone())
        .find(|ident| ident == "id")
        .ok_or_else(|| {
            syn::Error::new(
                Span::call_site(),
                format!(
                    "Record derive: `{}` has no field marked #[record(key)] and no field named `id`",
                    name
                ),
            )
        })
}

fn extract_indexes(fields: &[&Field]) -> syn::Result<Vec<String>> {
    let mut indexes = Vec::new();
    for field in fields {
        if field_flags(field)?.index {
            if let Some(ident) = &field.ident {
                indexes.push(ident.to_string());
            }
        }
    }
    Ok(indexes)
}
