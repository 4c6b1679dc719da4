use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, LitStr};

/// Derives the field-walk a record needs to participate in binding and
/// documentation traversal.
///
/// Field attribute: `#[env("KEY,flag,flag")]`, the raw tag text handed to
/// the runtime tag parser; omit it to derive the key from the field name.
/// Container attributes register optional capabilities:
/// `#[env(describe)]` (rich self-description, requires a `DescribeFields`
/// impl), `#[env(descriptions)]` (legacy description map, requires a
/// `FieldDescriptions` impl), `#[env(opaque)]` (whole-record parsing from a
/// single string, requires `FromStr`).
///
/// The derived type must also implement `Default`; it is the zero value used
/// when optional sub-records are tentatively allocated.
#[proc_macro_derive(EnvRecord, attributes(env))]
pub fn derive_env_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generate_record(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
struct Capabilities {
    describe: bool,
    descriptions: bool,
    opaque: bool,
}

fn generate_record(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "EnvRecord cannot be derived for generic types",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "EnvRecord only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "EnvRecord only supports structs",
            ));
        }
    };

    let caps = parse_capabilities(&input.attrs)?;

    let mut visit_calls = Vec::new();
    for field in fields {
        let ident = field.ident.as_ref().unwrap();
        let ident_str = ident.to_string();
        let tag = field_tag(&field.attrs)?;

        // Forward cfg attributes so feature-gated fields stay feature-gated
        let cfg_attrs: Vec<&Attribute> = field
            .attrs
            .iter()
            .filter(|attr| attr.path().is_ident("cfg"))
            .collect();

        visit_calls.push(quote! {
            #(#cfg_attrs)*
            visitor.field(#ident_str, #tag, ::envbind::Bind::as_slot(&mut self.#ident))?;
        });
    }

    let record_name = name.to_string();

    let opaque_hook = if caps.opaque {
        quote! {
            fn opaque_scalar(
                &mut self,
            ) -> ::core::option::Option<&mut dyn ::envbind::OpaqueScalar> {
                ::core::option::Option::Some(self)
            }
        }
    } else {
        quote! {}
    };

    let describe_hook = if caps.describe {
        quote! {
            fn describe_fields(&self) -> ::core::option::Option<&dyn ::envbind::DescribeFields> {
                ::core::option::Option::Some(self)
            }
        }
    } else {
        quote! {}
    };

    let legacy_hook = if caps.descriptions {
        quote! {
            fn legacy_field_descriptions(
                &self,
            ) -> ::core::option::Option<&dyn ::envbind::FieldDescriptions> {
                ::core::option::Option::Some(self)
            }
        }
    } else {
        quote! {}
    };

    Ok(quote! {
        impl ::envbind::EnvRecord for #name {
            #[allow(unused_variables)]
            fn visit_fields(
                &mut self,
                visitor: &mut dyn ::envbind::FieldVisitor,
            ) -> ::core::result::Result<(), ::envbind::LoadError> {
                #(#visit_calls)*
                ::core::result::Result::Ok(())
            }

            fn record_name(&self) -> &'static str {
                #record_name
            }

            #opaque_hook
            #describe_hook
            #legacy_hook
        }

        impl ::envbind::EnvRecord for ::std::boxed::Box<#name> {
            fn visit_fields(
                &mut self,
                visitor: &mut dyn ::envbind::FieldVisitor,
            ) -> ::core::result::Result<(), ::envbind::LoadError> {
                <#name as ::envbind::EnvRecord>::visit_fields(&mut **self, visitor)
            }

            fn record_name(&self) -> &'static str {
                #record_name
            }

            fn opaque_scalar(
                &mut self,
            ) -> ::core::option::Option<&mut dyn ::envbind::OpaqueScalar> {
                <#name as ::envbind::EnvRecord>::opaque_scalar(&mut **self)
            }

            fn describe_fields(&self) -> ::core::option::Option<&dyn ::envbind::DescribeFields> {
                <#name as ::envbind::EnvRecord>::describe_fields(&**self)
            }

            fn legacy_field_descriptions(
                &self,
            ) -> ::core::option::Option<&dyn ::envbind::FieldDescriptions> {
                <#name as ::envbind::EnvRecord>::legacy_field_descriptions(&**self)
            }
        }

        impl ::envbind::Bind for #name {
            fn as_slot(&mut self) -> ::envbind::FieldSlot<'_> {
                ::envbind::FieldSlot::Record(self)
            }
        }

        impl ::envbind::Bind for ::std::boxed::Box<#name> {
            fn as_slot(&mut self) -> ::envbind::FieldSlot<'_> {
                ::envbind::FieldSlot::Record(self)
            }
        }

        impl ::envbind::OptionalSlot for #name {
            fn option_slot(
                opt: &mut ::core::option::Option<#name>,
            ) -> ::envbind::FieldSlot<'_> {
                ::envbind::FieldSlot::OptRecord(opt)
            }
        }

        impl ::envbind::OptionalSlot for ::std::boxed::Box<#name> {
            fn option_slot(
                opt: &mut ::core::option::Option<::std::boxed::Box<#name>>,
            ) -> ::envbind::FieldSlot<'_> {
                ::envbind::FieldSlot::OptRecord(opt)
            }
        }
    })
}

fn parse_capabilities(attrs: &[Attribute]) -> syn::Result<Capabilities> {
    let mut caps = Capabilities::default();
    for attr in attrs {
        if !attr.path().is_ident("env") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("describe") {
                caps.describe = true;
                Ok(())
            } else if meta.path.is_ident("descriptions") {
                caps.descriptions = true;
                Ok(())
            } else if meta.path.is_ident("opaque") {
                caps.opaque = true;
                Ok(())
            } else {
                Err(meta.error(
                    "unknown capability; expected describe, descriptions or opaque",
                ))
            }
        })?;
    }
    Ok(caps)
}

/// The raw tag text of a field's `#[env("...")]` attribute, empty when the
/// field carries none.
fn field_tag(attrs: &[Attribute]) -> syn::Result<String> {
    for attr in attrs {
        if attr.path().is_ident("env") {
            let lit: LitStr = attr.parse_args()?;
            return Ok(lit.value());
        }
    }
    Ok(String::new())
}
