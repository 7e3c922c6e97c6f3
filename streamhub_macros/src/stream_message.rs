use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr};

pub fn derive_stream_message(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let key = match extract_key(input)? {
        Some(key) => quote! { #key },
        None => {
            let type_name = name.to_string();
            quote! { concat!(module_path!(), "::", #type_name) }
        }
    };

    let subject = match extract_subject_field(input)? {
        Some(field) => quote! {
            fn subject(&self) -> ::core::option::Option<::std::string::String> {
                ::core::option::Option::Some(::std::string::ToString::to_string(&self.#field))
            }
        },
        None => quote! {},
    };

    Ok(quote! {
        impl #impl_generics streamhub::MessagePayload for #name #ty_generics #where_clause {
            #subject
        }

        impl #impl_generics streamhub::StreamMessage for #name #ty_generics #where_clause {
            const STREAM_KEY: &'static str = #key;
        }
    })
}

fn extract_key(input: &DeriveInput) -> syn::Result<Option<LitStr>> {
    let mut key = None;
    for attr in &input.attrs {
        if !attr.path().is_ident("stream") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("key") {
                key = Some(meta.value()?.parse::<LitStr>()?);
                Ok(())
            } else {
                Err(meta.error("expected `key = \"...\"`"))
            }
        })?;
    }
    Ok(key)
}

fn extract_subject_field(input: &DeriveInput) -> syn::Result<Option<TokenStream2>> {
    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => return Ok(None),
    };

    let mut subject = None;
    let members: Vec<(TokenStream2, &syn::Field)> = match fields {
        Fields::Named(named) => named
            .named
            .iter()
            .filter_map(|f| f.ident.as_ref().map(|ident| (quote! { #ident }, f)))
            .collect(),
        Fields::Unnamed(unnamed) => unnamed
            .unnamed
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let index = syn::Index::from(i);
                (quote! { #index }, f)
            })
            .collect(),
        Fields::Unit => Vec::new(),
    };

    for (member, field) in members {
        for attr in &field.attrs {
            if !attr.path().is_ident("stream") {
                continue;
            }
            let mut is_subject = false;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("subject") {
                    is_subject = true;
                    Ok(())
                } else {
                    Err(meta.error("expected `subject`"))
                }
            })?;
            if is_subject {
                if subject.is_some() {
                    return Err(syn::Error::new_spanned(
                        attr,
                        "only one field may be marked #[stream(subject)]",
                    ));
                }
                subject = Some(member.clone());
            }
        }
    }
    Ok(subject)
}
