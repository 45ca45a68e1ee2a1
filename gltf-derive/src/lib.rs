// Adapted from `validator_derive` (https://github.com/Keats/validator).
//
// See LICENSE for details.

use inflections::Inflect;
use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Meta};

/// Derives `gltf_json::validation::Validate` for a struct by walking every
/// field and delegating to its own `Validate::validate` implementation.
///
/// A struct may additionally carry `#[gltf(validate_hook = "path::to::fn")]`
/// to run extra, struct-level validation (e.g. cross-field invariants) after
/// every field has been validated.
#[proc_macro_derive(Validate, attributes(gltf))]
pub fn derive_validate(input: TokenStream) -> TokenStream {
    let ast: DeriveInput = syn::parse_macro_input!(input as DeriveInput);
    expand(&ast).into()
}

fn validate_hook(ast: &DeriveInput) -> Option<syn::Path> {
    for attr in &ast.attrs {
        if !attr.path().is_ident("gltf") {
            continue;
        }
        let mut found = None;
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("validate_hook") {
                let value = meta.value()?;
                let lit: syn::LitStr = value.parse()?;
                found = Some(lit.parse::<syn::Path>()?);
            }
            Ok(())
        });
        if found.is_some() {
            return found;
        }
    }
    None
}

fn expand(ast: &DeriveInput) -> proc_macro2::TokenStream {
    let fields = match &ast.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => panic!("#[derive(Validate)] only supports structs with named fields"),
        },
        _ => panic!("#[derive(Validate)] only works on `struct`s"),
    };

    let ident = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let field_validations: Vec<proc_macro2::TokenStream> = fields
        .iter()
        .map(|f| f.ident.as_ref().expect("named field"))
        .map(|ident| {
            let field = ident.to_string().to_camel_case();
            quote! {
                self.#ident.validate(_root, || _path().field(#field), _report);
            }
        })
        .collect();

    let hook_call = if let Some(hook) = validate_hook(ast) {
        quote! { #hook(self, _root, &_path, _report); }
    } else {
        quote! {}
    };

    quote! {
        impl #impl_generics crate::validation::Validate for #ident #ty_generics #where_clause {
            fn validate<P, R>(&self, _root: &crate::Root, _path: P, _report: &mut R)
            where
                P: Fn() -> crate::Path,
                R: FnMut(&dyn Fn() -> crate::Path, crate::validation::Error),
            {
                #(#field_validations)*
                #hook_call
            }
        }
    }
}
