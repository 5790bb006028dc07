//! Expansion of `#[derive(Throwable)]`

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Expr, Fields, Ident};

pub(crate) fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let class = container_expr(&input.attrs, "throwable_class")?
        .unwrap_or_else(|| quote! { "Exception" });
    let code = container_expr(&input.attrs, "throwable_code")?.unwrap_or_else(|| quote! { 0 });

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let body = match &input.data {
        Data::Enum(data) => {
            let mut transparent = Vec::new();
            for variant in &data.variants {
                let Some(attr) = find_attr(&variant.attrs, "throwable") else {
                    continue;
                };
                let flag: Ident = attr.parse_args()?;
                if flag != "transparent" {
                    return Err(syn::Error::new_spanned(
                        attr,
                        "only #[throwable(transparent)] is supported on variants",
                    ));
                }
                match &variant.fields {
                    Fields::Unnamed(fields) if fields.unnamed.len() == 1 => {
                        transparent.push(variant.ident.clone());
                    }
                    _ => {
                        return Err(syn::Error::new_spanned(
                            variant,
                            "#[throwable(transparent)] needs a variant with exactly one unnamed field",
                        ));
                    }
                }
            }

            let class_arms = transparent.iter().map(|v| {
                quote! { Self::#v(inner) => ::hostbind::error::Throwable::class_name(inner), }
            });
            let code_arms = transparent.iter().map(|v| {
                quote! { Self::#v(inner) => ::hostbind::error::Throwable::code(inner), }
            });
            let message_arms = transparent.iter().map(|v| {
                quote! { Self::#v(inner) => ::hostbind::error::Throwable::message(inner), }
            });

            quote! {
                #[allow(unreachable_patterns)]
                fn class_name(&self) -> &str {
                    match self {
                        #(#class_arms)*
                        _ => #class,
                    }
                }

                #[allow(unreachable_patterns)]
                fn code(&self) -> i64 {
                    match self {
                        #(#code_arms)*
                        _ => #code,
                    }
                }

                #[allow(unreachable_patterns)]
                fn message(&self) -> ::std::string::String {
                    match self {
                        #(#message_arms)*
                        _ => ::std::string::ToString::to_string(self),
                    }
                }
            }
        }
        Data::Struct(_) => quote! {
            fn class_name(&self) -> &str {
                #class
            }

            fn code(&self) -> i64 {
                #code
            }
        },
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Throwable cannot be derived for unions",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics ::hostbind::error::Throwable for #ident #ty_generics #where_clause {
            #body
        }
    })
}

fn container_expr(attrs: &[Attribute], name: &str) -> syn::Result<Option<TokenStream>> {
    find_attr(attrs, name)
        .map(|attr| attr.parse_args::<Expr>().map(|expr| quote! { #expr }))
        .transpose()
}

fn find_attr<'a>(attrs: &'a [Attribute], name: &str) -> Option<&'a Attribute> {
    attrs.iter().find(|attr| attr.path().is_ident(name))
}
