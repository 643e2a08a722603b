//! Type provider: turns a service trait into ordered method descriptors.
//!
//! The rest of the pipeline never looks at syntax trees. It only sees the
//! [`ServiceDescriptor`] produced by a [`TypeProvider`], so alternative sources (a
//! hand-built descriptor in tests, another reflection facility) plug in at this seam.

use crate::error::{GenerationError, Result};
use crate::parser::ParsedFile;
use log::debug;
use quote::ToTokens;
use serde::{Deserialize, Serialize};
use syn::visit::Visit;

/// Supplies the raw method list of one service interface.
pub trait TypeProvider {
    fn describe(&self) -> Result<ServiceDescriptor>;
}

/// Everything the provider knows about one service trait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDescriptor {
    pub trait_name: String,
    /// Whether the trait is annotated with `#[async_trait]`
    pub async_trait: bool,
    /// Methods in declaration order
    pub methods: Vec<MethodDescriptor>,
    /// `use` declarations of the declaring file, as source text
    pub imports: Vec<String>,
    /// Structs, enums, unions and type aliases declared at the top of the same file
    pub local_types: Vec<String>,
}

/// One trait method, as declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub params: Vec<Parameter>,
    pub returns: Vec<ReturnValue>,
    /// The declared return type verbatim, empty for `()`
    pub return_type: String,
    pub is_async: bool,
    /// Doc comment lines, without the leading `///`
    pub docs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub ty: String,
    pub is_context: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnValue {
    pub name: String,
    pub ty: String,
    pub is_error: bool,
}

impl MethodDescriptor {
    /// The non-error return value, if the method produces one.
    pub fn success(&self) -> Option<&ReturnValue> {
        self.returns.iter().find(|r| !r.is_error)
    }

    /// The trailing error value of a `Result` return type.
    pub fn error(&self) -> Option<&ReturnValue> {
        self.returns.last().filter(|r| r.is_error)
    }
}

/// Provider backed by a syn syntax tree.
pub struct SynTraitProvider<'a> {
    file: &'a ParsedFile,
    trait_name: String,
    context_types: Vec<String>,
}

impl<'a> SynTraitProvider<'a> {
    /// `context_types` lists the type names (last path segment) that mark a
    /// parameter as the request-context carrier.
    pub fn new(file: &'a ParsedFile, trait_name: &str, context_types: &[String]) -> Self {
        Self {
            file,
            trait_name: trait_name.to_string(),
            context_types: context_types.to_vec(),
        }
    }

    fn describe_method(&self, method: &syn::TraitItemFn) -> Result<MethodDescriptor> {
        let sig = &method.sig;
        let name = sig.ident.to_string();
        let unsupported = |reason: &str| GenerationError::UnsupportedSignature {
            method: name.clone(),
            reason: reason.to_string(),
        };

        if !sig.generics.params.is_empty() {
            return Err(unsupported("generic methods cannot be routed"));
        }

        let mut inputs = sig.inputs.iter();
        match inputs.next() {
            Some(syn::FnArg::Receiver(receiver))
                if receiver.reference.is_some() && receiver.mutability.is_none() => {}
            _ => return Err(unsupported("the first parameter must be `&self`")),
        }

        let mut params = Vec::new();
        for input in inputs {
            let syn::FnArg::Typed(pat_type) = input else {
                return Err(unsupported("unexpected receiver"));
            };
            let syn::Pat::Ident(pat_ident) = pat_type.pat.as_ref() else {
                return Err(unsupported("parameters must be plain identifiers"));
            };
            params.push(Parameter {
                name: pat_ident.ident.to_string(),
                ty: type_to_string(&pat_type.ty),
                is_context: self.is_context_type(&pat_type.ty),
            });
        }

        let (return_type, returns) = match &sig.output {
            syn::ReturnType::Default => (String::new(), Vec::new()),
            syn::ReturnType::Type(_, ty) => (type_to_string(ty), return_values(&name, ty)?),
        };

        Ok(MethodDescriptor {
            name,
            params,
            returns,
            return_type,
            is_async: sig.asyncness.is_some(),
            docs: doc_lines(&method.attrs),
        })
    }

    fn is_context_type(&self, ty: &syn::Type) -> bool {
        match ty {
            syn::Type::Reference(reference) => self.is_context_type(&reference.elem),
            syn::Type::Path(type_path) => type_path
                .path
                .segments
                .last()
                .map(|segment| self.context_types.iter().any(|c| segment.ident == c))
                .unwrap_or(false),
            _ => false,
        }
    }
}

impl TypeProvider for SynTraitProvider<'_> {
    fn describe(&self) -> Result<ServiceDescriptor> {
        let item_trait = find_item_trait(&self.file.syntax_tree, &self.trait_name)
            .ok_or_else(|| GenerationError::TraitNotFound {
                name: self.trait_name.clone(),
                source_path: self.file.path.display().to_string(),
            })?;

        let mut methods = Vec::new();
        for item in &item_trait.items {
            if let syn::TraitItem::Fn(method) = item {
                methods.push(self.describe_method(method)?);
            }
        }
        debug!(
            "Trait {} declares {} methods",
            self.trait_name,
            methods.len()
        );

        let async_trait = item_trait.attrs.iter().any(|attr| {
            attr.path()
                .segments
                .last()
                .map(|segment| segment.ident == "async_trait")
                .unwrap_or(false)
        });
        if !async_trait {
            if let Some(method) = methods.iter().find(|m| m.is_async) {
                return Err(GenerationError::UnsupportedSignature {
                    method: method.name.clone(),
                    reason: "`async fn` needs `#[async_trait]` on the trait; native async methods \
                             give no `Send` bound on the returned future"
                        .to_string(),
                });
            }
        }

        let imports = self
            .file
            .syntax_tree
            .items
            .iter()
            .filter_map(|item| match item {
                syn::Item::Use(item_use) => Some(format!(
                    "use {}{};",
                    if item_use.leading_colon.is_some() { "::" } else { "" },
                    normalize_tokens(&item_use.tree.to_token_stream().to_string())
                )),
                _ => None,
            })
            .collect();

        let local_types = self
            .file
            .syntax_tree
            .items
            .iter()
            .filter_map(|item| match item {
                syn::Item::Struct(item) => Some(item.ident.to_string()),
                syn::Item::Enum(item) => Some(item.ident.to_string()),
                syn::Item::Union(item) => Some(item.ident.to_string()),
                syn::Item::Type(item) => Some(item.ident.to_string()),
                _ => None,
            })
            .collect();

        Ok(ServiceDescriptor {
            trait_name: self.trait_name.clone(),
            async_trait,
            methods,
            imports,
            local_types,
        })
    }
}

/// Finds a trait declaration by name, including inside inline `mod` blocks.
pub fn find_item_trait<'ast>(file: &'ast syn::File, trait_name: &str) -> Option<&'ast syn::ItemTrait> {
    let mut finder = TraitFinder {
        trait_name,
        found: None,
    };
    finder.visit_file(file);
    finder.found
}

struct TraitFinder<'n, 'ast> {
    trait_name: &'n str,
    found: Option<&'ast syn::ItemTrait>,
}

impl<'ast> Visit<'ast> for TraitFinder<'_, 'ast> {
    fn visit_item_trait(&mut self, node: &'ast syn::ItemTrait) {
        if self.found.is_none() && node.ident == self.trait_name {
            self.found = Some(node);
        }
    }
}

/// Splits a return type into the data model's return values.
///
/// A `Result<T>` alias takes its error type from the alias's module: `anyhow::Result<T>`
/// fails with `anyhow::Error`. An unqualified alias names no module and is rejected.
fn return_values(method: &str, ty: &syn::Type) -> Result<Vec<ReturnValue>> {
    if let syn::Type::Tuple(tuple) = ty {
        if tuple.elems.is_empty() {
            return Ok(Vec::new());
        }
    }

    if let Some((ok, err)) = result_arguments(ty) {
        let err = match err {
            Some(err) => type_to_string(err),
            None => alias_error_type(ty).ok_or_else(|| GenerationError::UnsupportedSignature {
                method: method.to_string(),
                reason: "a single-argument `Result<T>` must be written with its module path \
                         (`anyhow::Result<T>`) or as `Result<T, E>`"
                    .to_string(),
            })?,
        };

        let mut returns = Vec::new();
        let ok = type_to_string(ok);
        if ok != "()" {
            returns.push(ReturnValue {
                name: "result".to_string(),
                ty: ok,
                is_error: false,
            });
        }
        returns.push(ReturnValue {
            name: "err".to_string(),
            ty: err,
            is_error: true,
        });
        return Ok(returns);
    }

    Ok(vec![ReturnValue {
        name: "result".to_string(),
        ty: type_to_string(ty),
        is_error: false,
    }])
}

/// `a::b::Error` for a `a::b::Result<T>` alias; `None` when the alias is unqualified.
fn alias_error_type(ty: &syn::Type) -> Option<String> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    let segments = &type_path.path.segments;
    if segments.len() < 2 {
        return None;
    }
    let prefix = segments
        .iter()
        .take(segments.len() - 1)
        .map(|segment| segment.ident.to_string())
        .collect::<Vec<_>>()
        .join("::");
    let leading = if type_path.path.leading_colon.is_some() { "::" } else { "" };
    Some(format!("{}{}::Error", leading, prefix))
}

/// Single-segment type names a printed type refers to: `Result`, `Vec` and `Item` in
/// `Result<Vec<Item>, model::ItemError>`. Qualified paths are skipped.
pub fn bare_type_names(ty: &str) -> Vec<String> {
    struct Collector(Vec<String>);

    impl<'ast> Visit<'ast> for Collector {
        fn visit_type_path(&mut self, node: &'ast syn::TypePath) {
            if node.qself.is_none() && node.path.leading_colon.is_none() && node.path.segments.len() == 1 {
                let name = node.path.segments[0].ident.to_string();
                if !self.0.contains(&name) {
                    self.0.push(name);
                }
            }
            syn::visit::visit_type_path(self, node);
        }
    }

    let Ok(parsed) = syn::parse_str::<syn::Type>(ty) else {
        return Vec::new();
    };
    let mut collector = Collector(Vec::new());
    collector.visit_type(&parsed);
    collector.0
}

/// Returns `(T, Some(E))` for `Result<T, E>` and `(T, None)` for a `Result<T>` alias.
fn result_arguments(ty: &syn::Type) -> Option<(&syn::Type, Option<&syn::Type>)> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Result" {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    let mut types = args.args.iter().filter_map(|arg| match arg {
        syn::GenericArgument::Type(ty) => Some(ty),
        _ => None,
    });
    let ok = types.next()?;
    Some((ok, types.next()))
}

fn doc_lines(attrs: &[syn::Attribute]) -> Vec<String> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            syn::Meta::NameValue(name_value) => match &name_value.value {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(lit),
                    ..
                }) => Some(lit.value()),
                _ => None,
            },
            _ => None,
        })
        .flat_map(|doc| doc.lines().map(str::to_string).collect::<Vec<_>>())
        .collect()
}

/// Prints a type the way it is usually written in source.
pub fn type_to_string(ty: &syn::Type) -> String {
    normalize_tokens(&ty.to_token_stream().to_string())
}

/// Collapses the spacing of a printed token stream: `Vec < u8 >` becomes `Vec<u8>`.
pub fn normalize_tokens(raw: &str) -> String {
    let mut out = String::new();
    let mut prev_word = false;

    for token in raw.split_whitespace() {
        let is_word = token
            .chars()
            .next()
            .map(|c| c.is_alphanumeric() || c == '_' || c == '\'')
            .unwrap_or(false);

        match token {
            "," | ";" => {
                out.push_str(token);
                out.push(' ');
            }
            "->" | "+" | "=" => {
                let trimmed = out.trim_end().len();
                out.truncate(trimmed);
                out.push(' ');
                out.push_str(token);
                out.push(' ');
            }
            _ => {
                if is_word && prev_word {
                    out.push(' ');
                }
                out.push_str(token);
            }
        }
        prev_word = is_word;
    }

    out.trim().to_string()
}
