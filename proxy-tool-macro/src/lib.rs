//! Procedural macros for proxy-tool scripts.
//!
//! This crate provides the `#[proxy_script]` attribute macro, which turns
//! an async function over a `ProxyTool` into a registered script.
//!
//! # Example
//!
//! ```ignore
//! use proxy_tool::prelude::*;
//!
//! #[proxy_script(name = "greet", kind = "http-request", pattern = "^http://example\\.com/")]
//! async fn greet(tool: &ProxyTool) -> Result<(), ScriptError> {
//!     tool.done("Hello!");
//!     Ok(())
//! }
//! ```

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, punctuated::Punctuated, Expr, ExprLit, ItemFn, Lit, Meta, Token};

/// Attributes for the `#[proxy_script]` macro.
#[derive(Default, Debug)]
struct ScriptAttrs {
    name: Option<String>,
    kind: Option<String>,
    pattern: Option<String>,
    timeout: Option<u64>,
    description: Option<String>,
}

impl ScriptAttrs {
    fn parse_meta_list(metas: Punctuated<Meta, Token![,]>) -> syn::Result<Self> {
        let mut attrs = ScriptAttrs::default();

        for meta in metas {
            let Meta::NameValue(nv) = meta else {
                return Err(syn::Error::new_spanned(meta, "expected name = value"));
            };
            let ident = nv
                .path
                .get_ident()
                .ok_or_else(|| syn::Error::new_spanned(&nv.path, "expected identifier"))?
                .to_string();

            let lit = match &nv.value {
                Expr::Lit(ExprLit { lit, .. }) => lit.clone(),
                _ => return Err(syn::Error::new_spanned(&nv.value, "expected literal")),
            };

            match (ident.as_str(), lit) {
                ("name", Lit::Str(s)) => attrs.name = Some(s.value()),
                ("kind", Lit::Str(s)) => attrs.kind = Some(s.value()),
                ("pattern", Lit::Str(s)) => attrs.pattern = Some(s.value()),
                ("description", Lit::Str(s)) => attrs.description = Some(s.value()),
                ("timeout", Lit::Int(i)) => attrs.timeout = Some(i.base10_parse()?),
                ("name" | "kind" | "pattern" | "description" | "timeout", other) => {
                    return Err(syn::Error::new_spanned(
                        other,
                        format!("wrong literal type for `{}`", ident),
                    ));
                }
                _ => {
                    return Err(syn::Error::new_spanned(
                        nv.path,
                        format!("unknown attribute: {}", ident),
                    ));
                }
            }
        }

        Ok(attrs)
    }
}

/// Defines a proxy script from an async function.
///
/// The function must have the signature
/// `async fn(&ProxyTool) -> Result<(), ScriptError>`. The macro keeps it
/// as is and adds a `{Name}Script` struct implementing `ProxyScript`,
/// plus a static `{NAME}_MANIFEST`.
///
/// # Attributes
///
/// - `name` (required): unique script name
/// - `kind` (optional): `http-request`, `http-response`, `cron`, `event`,
///   `dns`, `rule` or `generic` (default)
/// - `pattern` (optional): URL pattern for HTTP scripts
/// - `timeout` (optional): timeout in seconds (default: 30)
/// - `description` (optional)
#[proc_macro_attribute]
pub fn proxy_script(args: TokenStream, input: TokenStream) -> TokenStream {
    let args = parse_macro_input!(args with Punctuated::<Meta, Token![,]>::parse_terminated);
    let input_fn = parse_macro_input!(input as ItemFn);

    match generate_script(args, input_fn) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn generate_script(
    args: Punctuated<Meta, Token![,]>,
    input_fn: ItemFn,
) -> syn::Result<proc_macro2::TokenStream> {
    let attrs = ScriptAttrs::parse_meta_list(args)?;

    let name = attrs.name.ok_or_else(|| {
        syn::Error::new(
            proc_macro2::Span::call_site(),
            "missing required attribute: name",
        )
    })?;
    let kind = attrs.kind.unwrap_or_else(|| "generic".to_string());
    let variant = script_type_variant(&kind).ok_or_else(|| {
        syn::Error::new(
            proc_macro2::Span::call_site(),
            format!("unknown script kind: {}", kind),
        )
    })?;
    let pattern = attrs.pattern.unwrap_or_default();
    let timeout = attrs.timeout.unwrap_or(30);
    let description = attrs.description.unwrap_or_default();

    if input_fn.sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(
            &input_fn.sig,
            "proxy_script must be async",
        ));
    }

    let fn_name = &input_fn.sig.ident;
    let fn_vis = &input_fn.vis;
    let struct_name = format_ident!("{}Script", to_pascal_case(&fn_name.to_string()));
    let manifest_name = format_ident!("{}_MANIFEST", fn_name.to_string().to_uppercase());
    let variant = format_ident!("{}", variant);

    Ok(quote! {
        /// Generated script manifest.
        #[allow(dead_code)]
        #fn_vis static #manifest_name: proxy_tool::script::ScriptManifest =
            proxy_tool::script::ScriptManifest {
                name: #name,
                script_type: proxy_tool::host::ScriptType::#variant,
                pattern: #pattern,
                timeout: #timeout,
                description: #description,
            };

        /// Generated script type.
        #[derive(Default)]
        #fn_vis struct #struct_name;

        impl #struct_name {
            pub fn new() -> Self {
                Self
            }

            /// Get the script manifest.
            pub fn manifest() -> &'static proxy_tool::script::ScriptManifest {
                &#manifest_name
            }
        }

        #[proxy_tool::prelude::async_trait]
        impl proxy_tool::prelude::ProxyScript for #struct_name {
            async fn run(
                &self,
                tool: &proxy_tool::prelude::ProxyTool,
            ) -> Result<(), proxy_tool::prelude::ScriptError> {
                #fn_name(tool).await
            }

            fn name(&self) -> &str {
                #name
            }

            fn manifest(&self) -> Option<&'static proxy_tool::script::ScriptManifest> {
                Some(&#manifest_name)
            }
        }

        #input_fn
    })
}

fn script_type_variant(kind: &str) -> Option<&'static str> {
    Some(match kind {
        "http-request" => "HttpRequest",
        "http-response" => "HttpResponse",
        "cron" => "Cron",
        "event" => "Event",
        "dns" => "Dns",
        "rule" => "Rule",
        "generic" => "Generic",
        _ => return None,
    })
}

/// Convert a snake_case string to PascalCase.
fn to_pascal_case(s: &str) -> String {
    s.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect()
}
