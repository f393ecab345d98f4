// Copyright 2024 Dmitry Tantsur <dtantsur@protonmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Derive macros for `oscloud::PaginatedResource` and `oscloud::QueryItem`.

use convert_case::{Case, Casing};
use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;

/// Where the items of a listing are found.
enum Collection {
    /// A plain JSON array.
    Flat,
    /// An object key, with an optional `<key>_links` (or `links`) array next to it.
    Key(String),
}

/// Derive `PaginatedResource`.
///
/// * `#[resource_id]` marks the field used as the pagination marker.
/// * `#[collection_name = "loadBalancers"]` overrides the key holding the items, which defaults
///   to the snake-case plural of the type name.
/// * `#[flat_collection]` is used when the listing is a plain array.
/// * `#[link_only]` disables markers: such services only paginate by `next` links.
#[proc_macro_derive(
    PaginatedResource,
    attributes(resource_id, collection_name, flat_collection, link_only)
)]
pub fn paginated_resource_macro_derive(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as syn::DeriveInput);
    paginated_resource(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Derive `QueryItem` for an enum of single-field variants.
///
/// The key is the snake-case variant name unless `#[query_item = "key"]` is given. `String`
/// values are borrowed, everything else is rendered with `Display`.
#[proc_macro_derive(QueryItem, attributes(query_item))]
pub fn query_item_macro_derive(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as syn::DeriveInput);
    query_item(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn paginated_resource(input: &syn::DeriveInput) -> syn::Result<TokenStream2> {
    let class_name = &input.ident;
    let vis = &input.vis;
    let (id_name, id_type) = id_field(input)?;
    let supports_marker = !has_attr(&input.attrs, "link_only");

    let resource_impl = |root: TokenStream2| {
        quote! {
            #[allow(missing_docs, unused)]
            impl ::oscloud::PaginatedResource for #class_name {
                type Id = #id_type;
                type Root = #root;
                const SUPPORTS_MARKER: bool = #supports_marker;

                fn resource_id(&self) -> Self::Id {
                    ::std::clone::Clone::clone(&self.#id_name)
                }
            }
        }
    };

    let collection_name = match collection(input)? {
        Collection::Flat => return Ok(resource_impl(quote!(Vec<#class_name>))),
        Collection::Key(name) => name,
    };

    let links_name = format!("{}_links", collection_name);
    let root_name = syn::Ident::new(
        &format!("{}DerivedResourceCollection", class_name),
        Span::call_site(),
    );
    let resource = resource_impl(quote!(#root_name));

    Ok(quote! {
        #[derive(Debug, ::serde::Deserialize)]
        #[allow(missing_docs, unused)]
        #vis struct #root_name {
            #[serde(rename = #collection_name)]
            items: Vec<#class_name>,
            #[serde(default, rename = #links_name)]
            collection_links: Vec<::oscloud::common::Link>,
            #[serde(default)]
            links: Vec<::oscloud::common::Link>,
        }

        #resource

        #[allow(missing_docs, unused)]
        impl ::oscloud::ResourceCollection<#class_name> for #root_name {
            fn into_items(self) -> Vec<#class_name> {
                self.items
            }

            fn next_link(&self) -> Option<::oscloud::Url> {
                ::oscloud::common::Link::find_next(&self.collection_links)
                    .or_else(|| ::oscloud::common::Link::find_next(&self.links))
            }
        }
    })
}

fn query_item(input: &syn::DeriveInput) -> syn::Result<TokenStream2> {
    let class_name = &input.ident;
    let variants = match input.data {
        syn::Data::Enum(ref en) => &en.variants,
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "only enums are supported for derive(QueryItem)",
            ))
        }
    };

    let arms = variants
        .iter()
        .map(|variant| {
            let field = match variant.fields {
                syn::Fields::Unnamed(ref fs) if fs.unnamed.len() == 1 => &fs.unnamed[0],
                _ => {
                    return Err(syn::Error::new_spanned(
                        variant,
                        "derive(QueryItem) requires variants with exactly one unnamed field",
                    ))
                }
            };

            let item = &variant.ident;
            let key = match query_item_name(&variant.attrs)? {
                Some(key) => key,
                None => item.to_string().to_case(Case::Snake),
            };
            let value = if is_string(&field.ty) {
                quote!(::std::borrow::Cow::Borrowed(value.as_str()))
            } else {
                quote!(::std::borrow::Cow::Owned(::std::string::ToString::to_string(value)))
            };

            Ok(quote! {
                #class_name::#item(ref value) => (#key, #value)
            })
        })
        .collect::<syn::Result<Vec<_>>>()?;

    Ok(quote! {
        #[allow(missing_docs, unused)]
        impl ::oscloud::QueryItem for #class_name {
            fn query_item(
                &self,
            ) -> ::std::result::Result<(&str, ::std::borrow::Cow<str>), ::oscloud::Error> {
                Ok(match *self {
                    #(#arms),*
                })
            }
        }
    })
}

fn has_attr(attrs: &[syn::Attribute], attr: &str) -> bool {
    attrs.iter().any(|x| x.path.is_ident(attr))
}

fn is_string(ty: &syn::Type) -> bool {
    match ty {
        syn::Type::Path(tp) => tp
            .path
            .segments
            .last()
            .map(|seg| seg.ident == "String" && seg.arguments.is_empty())
            .unwrap_or(false),
        _ => false,
    }
}

fn id_field(input: &syn::DeriveInput) -> syn::Result<(&syn::Ident, &syn::Type)> {
    let fields = match input.data {
        syn::Data::Struct(syn::DataStruct {
            fields: syn::Fields::Named(ref fs),
            ..
        }) => &fs.named,
        syn::Data::Struct(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "only named fields are supported for derive(PaginatedResource)",
            ))
        }
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "only structs are supported for derive(PaginatedResource)",
            ))
        }
    };

    fields
        .iter()
        .find(|field| has_attr(&field.attrs, "resource_id"))
        .and_then(|field| field.ident.as_ref().map(|ident| (ident, &field.ty)))
        .ok_or_else(|| syn::Error::new_spanned(input, "#[resource_id] missing"))
}

fn string_attr(attr: &syn::Attribute, name: &str) -> syn::Result<Option<String>> {
    match attr.parse_meta() {
        Ok(syn::Meta::NameValue(nv)) if nv.path.is_ident(name) => match nv.lit {
            syn::Lit::Str(s) => Ok(Some(s.value())),
            _ => Err(syn::Error::new_spanned(
                attr,
                format!("{} must be a string", name),
            )),
        },
        _ => Ok(None),
    }
}

fn query_item_name(attrs: &[syn::Attribute]) -> syn::Result<Option<String>> {
    for attr in attrs {
        if let Some(name) = string_attr(attr, "query_item")? {
            return Ok(Some(name));
        }
    }
    Ok(None)
}

fn collection(input: &syn::DeriveInput) -> syn::Result<Collection> {
    let flat = has_attr(&input.attrs, "flat_collection");
    let mut name = None;
    for attr in &input.attrs {
        if let Some(value) = string_attr(attr, "collection_name")? {
            if flat {
                return Err(syn::Error::new_spanned(
                    attr,
                    "collection_name and flat_collection cannot be used together",
                ));
            }
            name = Some(value);
        }
    }

    if flat {
        return Ok(Collection::Flat);
    }

    Ok(Collection::Key(name.unwrap_or_else(|| {
        let snake = input.ident.to_string().to_case(Case::Snake);
        if snake.ends_with('s') {
            format!("{}es", snake)
        } else {
            format!("{}s", snake)
        }
    })))
}
