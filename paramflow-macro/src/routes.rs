use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    parse::Parse, parse::ParseStream, parse_macro_input, punctuated::Punctuated, Attribute, FnArg,
    ImplItem, ImplItemFn, ItemImpl, LitStr, Pat, Token, Type,
};

const HTTP_METHODS: [(&str, &str); 5] = [
    ("get", "Get"),
    ("post", "Post"),
    ("put", "Put"),
    ("delete", "Delete"),
    ("patch", "Patch"),
];

const METHOD_ATTRS: [&str; 8] = [
    "get",
    "post",
    "put",
    "delete",
    "patch",
    "param_processor",
    "before_dispatch",
    "response_filter",
];

/// `#[param_processor(target = T)]` or
/// `#[param_processor(annotation = A, produces = T)]`
struct ProcessorArgs {
    target: Option<Type>,
    annotation: Option<Type>,
    produces: Option<Type>,
}

impl Parse for ProcessorArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = ProcessorArgs {
            target: None,
            annotation: None,
            produces: None,
        };
        while !input.is_empty() {
            let name: syn::Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            let ty: Type = input.parse()?;
            match name.to_string().as_str() {
                "target" => args.target = Some(ty),
                "annotation" => args.annotation = Some(ty),
                "produces" => args.produces = Some(ty),
                _ => {
                    return Err(syn::Error::new(
                        name.span(),
                        "expected `target`, `annotation` or `produces`",
                    ))
                }
            }
            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }
        Ok(args)
    }
}

enum ProcessorKind {
    Type(Type),
    Annotation { annotation: Type, produces: Type },
}

enum MethodKind {
    Route { variant: syn::Ident, path: LitStr },
    Processor(ProcessorKind),
    BeforeDispatch,
    ResponseFilter,
}

enum ArgSource {
    /// `&RequestContext`, passed through untouched
    Context,
    Param {
        name: String,
        ty: Type,
        annotations: Vec<Type>,
    },
}

pub fn routes_attribute(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemImpl);
    generate_routes_impl(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn generate_routes_impl(input: ItemImpl) -> syn::Result<TokenStream2> {
    if input.trait_.is_some() {
        return Err(syn::Error::new_spanned(
            &input.self_ty,
            "#[routes] must be placed on an inherent impl block",
        ));
    }
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "#[routes] does not support generic controllers",
        ));
    }

    let self_ty = &input.self_ty;
    let mut registrations: Vec<TokenStream2> = Vec::new();
    let mut clean_items: Vec<ImplItem> = Vec::new();

    for item in input.items.iter() {
        let ImplItem::Fn(method) = item else {
            clean_items.push(item.clone());
            continue;
        };

        if let Some(kind) = method_kind(method)? {
            registrations.push(match kind {
                MethodKind::Route { variant, path } => {
                    route_registration(self_ty, method, &variant, &path)?
                }
                MethodKind::Processor(kind) => processor_registration(self_ty, method, kind)?,
                MethodKind::BeforeDispatch => trigger_registration(self_ty, method),
                MethodKind::ResponseFilter => filter_registration(self_ty, method),
            });
        }

        let mut clean_method = method.clone();
        clean_method.attrs.retain(|attr| !is_method_attr(attr));
        for input in clean_method.sig.inputs.iter_mut() {
            if let FnArg::Typed(pat_type) = input {
                pat_type.attrs.retain(|attr| !attr.path().is_ident("annotated"));
            }
        }
        clean_items.push(ImplItem::Fn(clean_method));
    }

    let attrs = &input.attrs;

    Ok(quote! {
        #(#attrs)*
        impl #self_ty {
            #(#clean_items)*
        }

        impl ::paramflow::Controller for #self_ty {
            fn configure(
                routes: &mut ::paramflow::ControllerBuilder<Self>,
            ) -> ::paramflow::Result<()> {
                #(#registrations)*
                ::core::result::Result::Ok(())
            }
        }
    })
}

fn method_kind(method: &ImplItemFn) -> syn::Result<Option<MethodKind>> {
    let mut kind = None;
    for attr in &method.attrs {
        let Some(ident) = attr.path().get_ident() else {
            continue;
        };
        let name = ident.to_string();
        let found = if let Some((_, variant)) = HTTP_METHODS.iter().find(|(m, _)| *m == name) {
            let path: LitStr = attr.parse_args()?;
            if !path.value().starts_with('/') {
                return Err(syn::Error::new_spanned(path, "route paths must start with `/`"));
            }
            MethodKind::Route {
                variant: format_ident!("{}", variant),
                path,
            }
        } else if name == "param_processor" {
            MethodKind::Processor(processor_kind(attr)?)
        } else if name == "before_dispatch" {
            MethodKind::BeforeDispatch
        } else if name == "response_filter" {
            MethodKind::ResponseFilter
        } else {
            continue;
        };
        if kind.is_some() {
            return Err(syn::Error::new_spanned(
                attr,
                "a method can only be one route, processor, trigger or filter",
            ));
        }
        kind = Some(found);
    }
    Ok(kind)
}

fn processor_kind(attr: &Attribute) -> syn::Result<ProcessorKind> {
    let args: ProcessorArgs = attr.parse_args()?;
    match (args.target, args.annotation, args.produces) {
        (Some(target), None, None) => Ok(ProcessorKind::Type(target)),
        (None, Some(annotation), Some(produces)) => Ok(ProcessorKind::Annotation {
            annotation,
            produces,
        }),
        (None, Some(_), None) => Err(syn::Error::new_spanned(
            attr,
            "annotation processors must declare the type they produce: `produces = T`",
        )),
        _ => Err(syn::Error::new_spanned(
            attr,
            "expected `target = T` or `annotation = A, produces = T`",
        )),
    }
}

fn is_method_attr(attr: &Attribute) -> bool {
    attr.path()
        .get_ident()
        .map_or(false, |ident| METHOD_ATTRS.contains(&ident.to_string().as_str()))
}

fn is_request_context(ty: &Type) -> bool {
    let Type::Reference(reference) = ty else {
        return false;
    };
    if reference.mutability.is_some() {
        return false;
    }
    match reference.elem.as_ref() {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .map_or(false, |segment| segment.ident == "RequestContext"),
        _ => false,
    }
}

fn require_ref_self(method: &ImplItemFn) -> syn::Result<()> {
    match method.sig.inputs.first() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() =>
        {
            Ok(())
        }
        _ => Err(syn::Error::new_spanned(
            &method.sig,
            "controller methods must take `&self`",
        )),
    }
}

fn typed_arg_count(method: &ImplItemFn) -> usize {
    method
        .sig
        .inputs
        .iter()
        .filter(|input| matches!(input, FnArg::Typed(_)))
        .count()
}

fn await_tokens(method: &ImplItemFn) -> TokenStream2 {
    if method.sig.asyncness.is_some() {
        quote! { .await }
    } else {
        quote! {}
    }
}

/// Routes returning a `Result` propagate their error to the exception filter.
fn returns_result(method: &ImplItemFn) -> bool {
    let syn::ReturnType::Type(_, ty) = &method.sig.output else {
        return false;
    };
    match ty.as_ref() {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .map_or(false, |segment| segment.ident == "Result"),
        _ => false,
    }
}

fn arg_sources(method: &ImplItemFn) -> syn::Result<Vec<ArgSource>> {
    let mut sources = Vec::new();
    for (position, input) in method.sig.inputs.iter().enumerate() {
        let FnArg::Typed(pat_type) = input else {
            continue;
        };
        if is_request_context(&pat_type.ty) {
            sources.push(ArgSource::Context);
            continue;
        }
        let name = match pat_type.pat.as_ref() {
            Pat::Ident(pat) => {
                let ident = pat.ident.to_string();
                let ident = ident.trim_start_matches("r#");
                // `_q` still binds the query key `q`
                ident.strip_prefix('_').unwrap_or(ident).to_string()
            }
            _ => format!("arg{}", position),
        };
        let mut annotations = Vec::new();
        for attr in pat_type.attrs.iter().filter(|a| a.path().is_ident("annotated")) {
            let listed = attr.parse_args_with(Punctuated::<Type, Token![,]>::parse_terminated)?;
            annotations.extend(listed);
        }
        sources.push(ArgSource::Param {
            name,
            ty: (*pat_type.ty).clone(),
            annotations,
        });
    }
    Ok(sources)
}

fn route_registration(
    self_ty: &Type,
    method: &ImplItemFn,
    variant: &syn::Ident,
    path: &LitStr,
) -> syn::Result<TokenStream2> {
    require_ref_self(method)?;
    let fn_name = &method.sig.ident;
    let handler_ident = format_ident!("__ParamflowRoute_{}", fn_name);
    let await_tokens = await_tokens(method);
    let try_tokens = if returns_result(method) {
        quote! { ? }
    } else {
        quote! {}
    };

    let mut specs = Vec::new();
    let mut bindings = Vec::new();
    let mut call_args = Vec::new();
    for (position, source) in arg_sources(method)?.into_iter().enumerate() {
        match source {
            ArgSource::Context => call_args.push(quote! { ctx }),
            ArgSource::Param {
                name,
                ty,
                annotations,
            } => {
                let index = specs.len();
                let arg = format_ident!("__arg{}", position);
                specs.push(quote! {
                    ::paramflow::ParamSpec::of::<#ty>(#name)
                        #(.annotated::<#annotations>())*
                });
                bindings.push(quote! {
                    let #arg: #ty = params.take::<#ty>(#index)?;
                });
                call_args.push(quote! { #arg });
            }
        }
    }

    Ok(quote! {
        #[allow(non_camel_case_types)]
        struct #handler_ident;

        #[::paramflow::async_trait]
        impl ::paramflow::RouteHandler<#self_ty> for #handler_ident {
            async fn call(
                &self,
                controller: &#self_ty,
                ctx: &::paramflow::RequestContext,
                params: ::paramflow::ResolvedParams,
            ) -> ::core::result::Result<
                ::paramflow::axum::response::Response,
                ::paramflow::DispatchError,
            > {
                let _ = &ctx;
                #[allow(unused_mut, unused_variables)]
                let mut params = params;
                #(#bindings)*
                let response = controller.#fn_name(#(#call_args),*) #await_tokens #try_tokens;
                ::core::result::Result::Ok(
                    ::paramflow::axum::response::IntoResponse::into_response(response),
                )
            }
        }

        routes.route(
            ::paramflow::HttpMethod::#variant,
            #path,
            ::std::vec![#(#specs),*],
            #handler_ident,
        )?;
    })
}

fn processor_registration(
    self_ty: &Type,
    method: &ImplItemFn,
    kind: ProcessorKind,
) -> syn::Result<TokenStream2> {
    require_ref_self(method)?;
    let fn_name = &method.sig.ident;
    let processor_ident = format_ident!("__ParamflowProcessor_{}", fn_name);
    let await_tokens = await_tokens(method);

    let call_args = match typed_arg_count(method) {
        0 => quote! {},
        1 => quote! { ctx },
        2 => quote! { ctx, param },
        _ => {
            return Err(syn::Error::new_spanned(
                &method.sig.inputs,
                "parameter processors take `(&self)`, `(&self, &RequestContext)` or `(&self, &RequestContext, &ParamSpec)`",
            ))
        }
    };

    let register = match kind {
        ProcessorKind::Type(target) => quote! {
            routes.processor_for_type::<#target>(#processor_ident)?;
        },
        ProcessorKind::Annotation {
            annotation,
            produces,
        } => quote! {
            routes.processor_for_annotation::<#annotation, #produces>(#processor_ident)?;
        },
    };

    Ok(quote! {
        #[allow(non_camel_case_types)]
        struct #processor_ident;

        #[::paramflow::async_trait]
        impl ::paramflow::ParamProcessor<#self_ty> for #processor_ident {
            async fn process(
                &self,
                controller: &#self_ty,
                ctx: &::paramflow::RequestContext,
                param: &::paramflow::ParamSpec,
            ) -> ::paramflow::ParamProcessorResult {
                let _ = (&ctx, &param);
                controller.#fn_name(#call_args) #await_tokens
            }
        }

        #register
    })
}

fn trigger_registration(self_ty: &Type, method: &ImplItemFn) -> TokenStream2 {
    let fn_name = &method.sig.ident;
    let trigger_ident = format_ident!("__ParamflowTrigger_{}", fn_name);
    let await_tokens = await_tokens(method);

    quote! {
        #[allow(non_camel_case_types)]
        struct #trigger_ident;

        #[::paramflow::async_trait]
        impl ::paramflow::trigger::BeforeDispatchTrigger<#self_ty> for #trigger_ident {
            async fn before_dispatch(
                &self,
                controller: &#self_ty,
                ctx: &::paramflow::RequestContext,
            ) -> ::core::option::Option<::paramflow::axum::response::Response> {
                controller.#fn_name(ctx) #await_tokens
            }
        }

        routes.before_dispatch(#trigger_ident);
    }
}

fn filter_registration(self_ty: &Type, method: &ImplItemFn) -> TokenStream2 {
    let fn_name = &method.sig.ident;
    let filter_ident = format_ident!("__ParamflowFilter_{}", fn_name);
    let await_tokens = await_tokens(method);

    quote! {
        #[allow(non_camel_case_types)]
        struct #filter_ident;

        #[::paramflow::async_trait]
        impl ::paramflow::trigger::ResponseFilter<#self_ty> for #filter_ident {
            async fn filter(
                &self,
                controller: &#self_ty,
                ctx: &::paramflow::RequestContext,
                response: &mut ::paramflow::axum::response::Response,
            ) {
                controller.#fn_name(ctx, response) #await_tokens
            }
        }

        routes.response_filter(#filter_ident);
    }
}
