use proc_macro::TokenStream;
use quote::quote;
use syn::parse_macro_input;

/// Marker attributes are consumed by `#[routes]`; on their own they leave the
/// method untouched.
pub fn marker_attribute(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as syn::ImplItemFn);

    TokenStream::from(quote! {
        #input
    })
}
