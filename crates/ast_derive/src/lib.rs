use proc_macro::TokenStream;
use quote::{format_ident, quote, quote_spanned};
use syn::{Data, DeriveInput, Field, Fields, Index, parse_macro_input, spanned::Spanned};

/// Derives `crate::walk::Walk` for an AST node.
///
/// Every field is walked in declaration order. Fields tagged `#[walk(skip)]`
/// are left out of the traversal (positions, flags, raw text handles).
#[proc_macro_derive(WalkAst, attributes(walk))]
pub fn derive_walk_ast(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let span = input.span();

    let walk_body = match generate_walk_body(&input.data) {
        Ok(body) => body,
        Err(err) => return err.into_compile_error().into(),
    };

    let expanded = quote_spanned! {span =>
        impl<'ast> crate::walk::Walk<'ast> for #name {
            #[inline(always)]
            #[allow(unused_variables)]
            fn walk<V: crate::walk::Visitor<'ast> + ?Sized>(
                &self,
                __arena: &'ast crate::ast::AstArena,
                __visitor: &mut V
            ) {
                #walk_body
            }
        }
    };

    expanded.into()
}

fn is_skipped(field: &Field) -> syn::Result<bool> {
    let mut skip = false;
    for attr in &field.attrs {
        if !attr.path().is_ident("walk") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else {
                Err(meta.error("unsupported walk attribute, expected `skip`"))
            }
        })?;
    }
    Ok(skip)
}

fn generate_walk_body(data: &Data) -> syn::Result<proc_macro2::TokenStream> {
    match data {
        Data::Struct(data_struct) => generate_fields_walk(&data_struct.fields),
        Data::Enum(data_enum) => {
            let arms = data_enum
                .variants
                .iter()
                .map(|variant| generate_variant_arm(&variant.ident, &variant.fields))
                .collect::<syn::Result<Vec<_>>>()?;

            Ok(quote! {
                match self {
                    #(#arms)*
                }
            })
        }
        Data::Union(u) => Err(syn::Error::new_spanned(
            u.union_token,
            "WalkAst cannot be derived for unions",
        )),
    }
}

fn generate_fields_walk(fields: &Fields) -> syn::Result<proc_macro2::TokenStream> {
    let mut walk_calls = Vec::new();
    for (i, field) in fields.iter().enumerate() {
        if is_skipped(field)? {
            continue;
        }
        let field_access = match &field.ident {
            Some(ident) => quote! { &self.#ident },
            None => {
                let index = Index::from(i);
                quote! { &self.#index }
            }
        };
        walk_calls.push(quote! { crate::walk::Walk::walk(#field_access, __arena, __visitor); });
    }

    Ok(quote! { #(#walk_calls)* })
}

fn generate_variant_arm(
    variant_name: &syn::Ident,
    fields: &Fields,
) -> syn::Result<proc_macro2::TokenStream> {
    match fields {
        Fields::Unit => Ok(quote! { Self::#variant_name => {} }),
        Fields::Named(fields_named) => {
            let mut patterns = Vec::new();
            let mut walk_calls = Vec::new();
            for field in &fields_named.named {
                let Some(ident) = field.ident.as_ref() else {
                    continue;
                };
                if is_skipped(field)? {
                    continue;
                }
                // Bindings get a private prefix so field names never collide
                // with the generated parameters.
                let binding = format_ident!("__f_{}", ident);
                patterns.push(quote! { #ident: #binding });
                walk_calls.push(quote! { crate::walk::Walk::walk(#binding, __arena, __visitor); });
            }

            Ok(quote! {
                Self::#variant_name { #(#patterns,)* .. } => {
                    #(#walk_calls)*
                }
            })
        }
        Fields::Unnamed(fields_unnamed) => {
            let mut bindings = Vec::new();
            let mut walk_calls = Vec::new();
            for (i, field) in fields_unnamed.unnamed.iter().enumerate() {
                if is_skipped(field)? {
                    bindings.push(quote! { _ });
                    continue;
                }
                let var = format_ident!("__f{}", i);
                walk_calls.push(quote! { crate::walk::Walk::walk(#var, __arena, __visitor); });
                bindings.push(quote! { #var });
            }

            Ok(quote! {
                Self::#variant_name(#(#bindings),*) => {
                    #(#walk_calls)*
                }
            })
        }
    }
}
