//! Procedural macros for testkit-mock
//!
//! This crate provides the `#[testkit_mock::test]` attribute macro, which
//! wraps a test in a mock [`Session`] and verifies it when the test ends.
//!
//! # Example
//!
//! ```rust,ignore
//! use testkit_mock::prelude::*;
//!
//! #[testkit_mock::test]
//! fn my_test(session: Session) {
//!     let format = MethodMock::<i32, String>::new(&session, "format");
//!     format.expect("two").with(eq(2)).will_once(Action::Return("two".into())).commit();
//!     assert_eq!(format.call(2), Some("two".to_string()));
//! }
//! ```
//!
//! [`Session`]: https://docs.rs/testkit-mock/latest/testkit_mock/session/struct.Session.html

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    parse::{Parse, ParseStream},
    parse_macro_input, FnArg, Ident, ItemFn, Lit, Pat, ReturnType, Token, Type,
};

/// Configuration options for the test macro.
#[derive(Default)]
struct TestConfig {
    /// Default wait timeout in milliseconds
    timeout_ms: Option<u64>,
    /// Whether waits check completion order
    enforce_order: bool,
    /// Unexpected-call policy ("fail" or "warn")
    unexpected: Option<String>,
    /// Flavor for tokio runtime of async tests ("current_thread" or "multi_thread")
    flavor: Option<String>,
}

impl Parse for TestConfig {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut config = TestConfig::default();

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "timeout_ms" => {
                    let lit: Lit = input.parse()?;
                    if let Lit::Int(i) = lit {
                        config.timeout_ms = Some(i.base10_parse()?);
                    }
                }
                "enforce_order" => {
                    let lit: Lit = input.parse()?;
                    if let Lit::Bool(b) = lit {
                        config.enforce_order = b.value();
                    }
                }
                "unexpected" => {
                    let lit: Lit = input.parse()?;
                    if let Lit::Str(s) = lit {
                        let policy = s.value();
                        if policy != "fail" && policy != "warn" {
                            return Err(syn::Error::new(
                                s.span(),
                                format!("unknown unexpected-call policy: {policy}. Use \"fail\" or \"warn\""),
                            ));
                        }
                        config.unexpected = Some(policy);
                    }
                }
                "flavor" => {
                    let lit: Lit = input.parse()?;
                    if let Lit::Str(s) = lit {
                        config.flavor = Some(s.value());
                    }
                }
                _ => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown attribute: {ident}"),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(config)
    }
}

/// Determines if a function parameter is requesting a Session.
fn is_session_param(arg: &FnArg) -> bool {
    if let FnArg::Typed(pat_type) = arg {
        if let Type::Path(type_path) = &*pat_type.ty {
            if let Some(segment) = type_path.path.segments.last() {
                return segment.ident == "Session";
            }
        }
    }
    false
}

/// Extracts the parameter name from a function argument.
fn get_param_name(arg: &FnArg) -> Option<&Pat> {
    if let FnArg::Typed(pat_type) = arg {
        Some(&pat_type.pat)
    } else {
        None
    }
}

/// Test attribute macro that runs a test inside a mock session.
///
/// The session is named after the test, configured from the attribute and
/// ended after the body returns: tokens nobody waited for are checked and
/// any recorded failure fails the test.
///
/// # Session Injection
///
/// Add a `session: Session` parameter to receive the session:
///
/// ```rust,ignore
/// use testkit_mock::prelude::*;
///
/// #[testkit_mock::test]
/// fn test_with_session(session: Session) {
///     let notify = ClosureMock::<u32, ()>::new(&session, "notify");
///     notify.expect("once").will_once(None).commit();
///     notify.invoke(1);
///     assert!(session.wait_for_expectations());
/// }
/// ```
///
/// # Configuration Options
///
/// - `timeout_ms = 250` - Default timeout of `wait_for_expectations`
/// - `enforce_order = true` - Waits check completion order
/// - `unexpected = "warn"` or `unexpected = "fail"` - Unexpected-call policy
/// - `flavor = "multi_thread"` - Tokio runtime flavor for `async fn` tests
///
/// ```rust,ignore
/// #[testkit_mock::test(timeout_ms = 50, unexpected = "warn")]
/// fn test_lenient(session: Session) {
///     assert_eq!(session.config().default_timeout, Duration::from_millis(50));
/// }
///
/// #[testkit_mock::test(flavor = "multi_thread")]
/// async fn test_async(session: Session) {
///     assert!(session.wait_for_expectations_async(None).await);
/// }
/// ```
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let config = parse_macro_input!(attr as TestConfig);
    let input = parse_macro_input!(item as ItemFn);

    expand_test(&config, &input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_test(config: &TestConfig, input: &ItemFn) -> syn::Result<TokenStream2> {
    let name = &input.sig.ident;
    let body = &input.block;
    let attrs = &input.attrs;
    let vis = &input.vis;
    let output = &input.sig.output;

    if let Some(arg) = input.sig.inputs.iter().find(|arg| !is_session_param(arg)) {
        return Err(syn::Error::new_spanned(
            arg,
            "test functions may only take a `Session` parameter",
        ));
    }

    let session_name: TokenStream2 = match input
        .sig
        .inputs
        .iter()
        .find(|arg| is_session_param(arg))
        .and_then(get_param_name)
    {
        Some(pat) => quote! { #pat },
        None => {
            let hidden = format_ident!("__testkit_session");
            quote! { #hidden }
        }
    };

    let session_init = session_init(config, name, &session_name);
    let return_type = match output {
        ReturnType::Default => quote! { () },
        ReturnType::Type(_, ty) => quote! { #ty },
    };

    let wrapper = if input.sig.asyncness.is_some() {
        let flavor_attr = match config.flavor.as_deref().unwrap_or("current_thread") {
            "multi_thread" => quote! { #[::tokio::test(flavor = "multi_thread")] },
            "current_thread" => quote! { #[::tokio::test] },
            other => {
                return Err(syn::Error::new(
                    proc_macro2::Span::call_site(),
                    format!("unsupported flavor: {other}. Use \"current_thread\" or \"multi_thread\""),
                ));
            }
        };
        quote! {
            #flavor_attr
            #(#attrs)*
            #vis async fn #name() #output {
                #session_init
                let __testkit_guard = ::std::clone::Clone::clone(&#session_name);
                let __testkit_result: #return_type = async move #body.await;
                __testkit_guard.end_test();
                __testkit_result
            }
        }
    } else {
        if config.flavor.is_some() {
            return Err(syn::Error::new(
                proc_macro2::Span::call_site(),
                "`flavor` only applies to async tests",
            ));
        }
        quote! {
            #[::core::prelude::v1::test]
            #(#attrs)*
            #vis fn #name() #output {
                #session_init
                let __testkit_guard = ::std::clone::Clone::clone(&#session_name);
                let __testkit_result: #return_type = (move || #body)();
                __testkit_guard.end_test();
                __testkit_result
            }
        }
    };

    Ok(wrapper)
}

fn session_init(config: &TestConfig, name: &Ident, session_name: &TokenStream2) -> TokenStream2 {
    let timeout = config.timeout_ms.map(|ms| {
        quote! {
            .with_default_timeout(::std::time::Duration::from_millis(#ms))
        }
    });
    let enforce_order = config.enforce_order.then(|| quote! { .with_enforce_order(true) });
    let unexpected = match config.unexpected.as_deref() {
        Some("warn") => Some(quote! {
            .with_unexpected_call(::testkit_mock::config::UnexpectedCallPolicy::Warn)
        }),
        _ => None,
    };

    quote! {
        let #session_name = ::testkit_mock::session::Session::new(
            ::std::concat!(::std::module_path!(), "::", ::std::stringify!(#name))
        );
        #session_name.configure(
            ::testkit_mock::config::Config::default()
                #timeout
                #enforce_order
                #unexpected
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{expand_test, TestConfig};

    #[::core::prelude::v1::test]
    fn test_config_parse_empty() {
        let config: TestConfig = syn::parse_str("").unwrap();
        assert!(config.timeout_ms.is_none());
        assert!(!config.enforce_order);
        assert!(config.unexpected.is_none());
        assert!(config.flavor.is_none());
    }

    #[::core::prelude::v1::test]
    fn test_config_parse_timeout() {
        let config: TestConfig = syn::parse_str("timeout_ms = 250").unwrap();
        assert_eq!(config.timeout_ms, Some(250));
    }

    #[::core::prelude::v1::test]
    fn test_config_parse_multiple() {
        let config: TestConfig =
            syn::parse_str("timeout_ms = 10, enforce_order = true, unexpected = \"warn\"")
                .unwrap();
        assert_eq!(config.timeout_ms, Some(10));
        assert!(config.enforce_order);
        assert_eq!(config.unexpected.as_deref(), Some("warn"));
    }

    #[::core::prelude::v1::test]
    fn test_config_rejects_unknown_policy() {
        assert!(syn::parse_str::<TestConfig>("unexpected = \"ignore\"").is_err());
        assert!(syn::parse_str::<TestConfig>("retries = 3").is_err());
    }

    #[::core::prelude::v1::test]
    fn test_expand_rejects_foreign_parameters() {
        let input: syn::ItemFn = syn::parse_str("fn t(count: u32) {}").unwrap();
        assert!(expand_test(&TestConfig::default(), &input).is_err());
    }

    #[::core::prelude::v1::test]
    fn test_expand_rejects_flavor_on_sync_tests() {
        let config: TestConfig = syn::parse_str("flavor = \"multi_thread\"").unwrap();
        let input: syn::ItemFn = syn::parse_str("fn t(session: Session) {}").unwrap();
        assert!(expand_test(&config, &input).is_err());
    }
}
