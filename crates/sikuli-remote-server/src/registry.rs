//! Keyword registry
//!
//! The registry is built once at startup from an explicit table and never
//! changes afterwards. Each keyword has one handler and one or more
//! signatures; a call picks the signature whose arity accepts it, then binds
//! and coerces its arguments before the handler runs.

use crate::coerce::{BoundArgs, ParamType};
use crate::context::LibraryContext;
use crate::errors::{CallError, KeywordResult};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::pin::Pin;

/// Future returned by keyword handlers
pub type KeywordFuture<'a> = Pin<Box<dyn Future<Output = KeywordResult<Value>> + Send + 'a>>;

/// Entry point of a keyword
pub type Handler = for<'a> fn(&'a LibraryContext, BoundArgs) -> KeywordFuture<'a>;

/// Normalize a keyword name the way remote test frameworks match them
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ParamKind {
    Required,
    /// Filled with this literal when the caller leaves it out
    Default(&'static str),
    /// Left unbound when the caller leaves it out
    Optional,
    Varargs,
}

/// One declared parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    kind: ParamKind,
}

impl ParamSpec {
    /// `name`, `name=default` or `*name`
    fn render(&self) -> String {
        match self.kind {
            ParamKind::Required => self.name.to_string(),
            ParamKind::Default(default) => format!("{}={}", self.name, default),
            ParamKind::Optional => format!("{}=None", self.name),
            ParamKind::Varargs => format!("*{}", self.name),
        }
    }

    fn render_as_optional(&self) -> String {
        match self.kind {
            ParamKind::Required => format!("{}=None", self.name),
            _ => self.render(),
        }
    }
}

/// An ordered parameter list
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    params: Vec<ParamSpec>,
}

impl Signature {
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    pub fn arg(mut self, name: &'static str, ty: ParamType) -> Self {
        self.params.push(ParamSpec {
            name,
            ty,
            kind: ParamKind::Required,
        });
        self
    }

    pub fn with_default(
        mut self,
        name: &'static str,
        ty: ParamType,
        default: &'static str,
    ) -> Self {
        self.params.push(ParamSpec {
            name,
            ty,
            kind: ParamKind::Default(default),
        });
        self
    }

    pub fn optional(mut self, name: &'static str, ty: ParamType) -> Self {
        self.params.push(ParamSpec {
            name,
            ty,
            kind: ParamKind::Optional,
        });
        self
    }

    pub fn varargs(mut self, name: &'static str, ty: ParamType) -> Self {
        self.params.push(ParamSpec {
            name,
            ty,
            kind: ParamKind::Varargs,
        });
        self
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    fn required(&self) -> usize {
        self.params
            .iter()
            .filter(|p| p.kind == ParamKind::Required)
            .count()
    }

    /// Number of parameters that can be passed by position, variadic excluded
    fn total(&self) -> usize {
        self.params
            .iter()
            .filter(|p| p.kind != ParamKind::Varargs)
            .count()
    }

    fn has_varargs(&self) -> bool {
        self.params.iter().any(|p| p.kind == ParamKind::Varargs)
    }

    fn accepts(&self, given: usize) -> bool {
        given >= self.required() && (given <= self.total() || self.has_varargs())
    }

    fn arity(&self) -> String {
        let (required, total) = (self.required(), self.total());
        if self.has_varargs() {
            format!("at least {}", required)
        } else if required == total {
            required.to_string()
        } else {
            format!("{} to {}", required, total)
        }
    }

    pub fn render(&self) -> Vec<String> {
        self.params.iter().map(ParamSpec::render).collect()
    }

    /// Bind positional and named arguments, coercing each to its declared type
    fn bind(
        &self,
        keyword: &str,
        positional: &[Value],
        named: &Map<String, Value>,
    ) -> Result<BoundArgs, CallError> {
        let mut bound = BoundArgs::new(keyword);
        let coerce = |spec: &ParamSpec, value: &Value| {
            spec.ty.coerce(value).ok_or_else(|| CallError::Coercion {
                keyword: keyword.to_string(),
                param: spec.name.to_string(),
                expected: spec.ty.describe(),
                value: value.to_string(),
            })
        };

        let mut rest = positional.iter();
        for spec in self.params.iter().filter(|p| p.kind != ParamKind::Varargs) {
            match rest.next() {
                Some(value) => bound.insert(spec.name, coerce(spec, value)?),
                None => break,
            }
        }
        if let Some(spec) = self.params.iter().find(|p| p.kind == ParamKind::Varargs) {
            for value in rest {
                bound.push_vararg(coerce(spec, value)?);
            }
        }

        for (name, value) in named {
            let spec = self
                .params
                .iter()
                .find(|p| p.kind != ParamKind::Varargs && p.name == name)
                .ok_or_else(|| CallError::UnexpectedArgument {
                    keyword: keyword.to_string(),
                    param: name.clone(),
                })?;
            if bound.contains(spec.name) {
                return Err(CallError::DuplicateArgument {
                    keyword: keyword.to_string(),
                    param: name.clone(),
                });
            }
            bound.insert(spec.name, coerce(spec, value)?);
        }

        for spec in &self.params {
            if bound.contains(spec.name) {
                continue;
            }
            match spec.kind {
                ParamKind::Required => {
                    return Err(CallError::MissingArgument {
                        keyword: keyword.to_string(),
                        param: spec.name.to_string(),
                    });
                }
                ParamKind::Default(default) => {
                    bound.insert(spec.name, coerce(spec, &Value::String(default.to_string()))?)
                }
                ParamKind::Optional | ParamKind::Varargs => {}
            }
        }
        Ok(bound)
    }
}

static NO_ARGUMENTS: Signature = Signature { params: Vec::new() };

/// Metadata and entry point of one keyword
pub struct KeywordDescriptor {
    pub name: &'static str,
    pub documentation: &'static str,
    signatures: Vec<Signature>,
    handler: Handler,
}

impl KeywordDescriptor {
    pub fn new(name: &'static str, documentation: &'static str, handler: Handler) -> Self {
        Self {
            name,
            documentation,
            signatures: Vec::new(),
            handler,
        }
    }

    /// Add an accepted signature; keywords without one take no arguments
    pub fn signature(mut self, signature: Signature) -> Self {
        self.signatures.push(signature);
        self
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    pub fn handler(&self) -> Handler {
        self.handler
    }

    /// Pick the signature for `given` arguments.
    ///
    /// An exact parameter count wins, then the signature leaving the fewest
    /// parameters to their defaults, then one without variadic arguments.
    pub fn resolve(&self, given: usize) -> Result<&Signature, CallError> {
        if self.signatures.is_empty() && given == 0 {
            return Ok(&NO_ARGUMENTS);
        }
        self.signatures
            .iter()
            .filter(|s| s.accepts(given))
            .min_by_key(|s| {
                (
                    s.total() != given,
                    s.total().saturating_sub(given),
                    s.has_varargs(),
                )
            })
            .ok_or_else(|| CallError::NoSuchOverload {
                name: self.name.to_string(),
                expected: self
                    .signatures
                    .iter()
                    .map(Signature::arity)
                    .collect::<Vec<_>>()
                    .join(" or "),
                given,
            })
    }

    /// Resolve the overload and bind the call's arguments
    pub fn bind(
        &self,
        positional: &[Value],
        named: Option<&Map<String, Value>>,
    ) -> Result<BoundArgs, CallError> {
        let empty = Map::new();
        let named = named.unwrap_or(&empty);
        self.resolve(positional.len() + named.len())?
            .bind(self.name, positional, named)
    }

    /// Parameter list reported to remote callers.
    ///
    /// Overloaded keywords report their longest signature with every
    /// parameter the shortest one lacks shown as optional.
    pub fn arguments(&self) -> Vec<String> {
        let Some(longest) = self
            .signatures
            .iter()
            .max_by_key(|s| (s.has_varargs(), s.total()))
        else {
            return Vec::new();
        };
        let min_required = self
            .signatures
            .iter()
            .map(Signature::required)
            .min()
            .unwrap_or(0);

        longest
            .params
            .iter()
            .enumerate()
            .map(|(idx, spec)| {
                if self.signatures.len() > 1 && idx >= min_required {
                    spec.render_as_optional()
                } else {
                    spec.render()
                }
            })
            .collect()
    }
}

/// All keywords, in registration order
pub struct KeywordRegistry {
    keywords: Vec<KeywordDescriptor>,
    index: HashMap<String, usize>,
}

impl KeywordRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            keywords: Vec::new(),
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.keywords.iter().map(|k| k.name).collect()
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn get(&self, name: &str) -> Result<&KeywordDescriptor, CallError> {
        self.index
            .get(&normalize(name))
            .map(|&idx| &self.keywords[idx])
            .ok_or_else(|| CallError::NoSuchKeyword(name.to_string()))
    }
}

pub struct RegistryBuilder {
    keywords: Vec<KeywordDescriptor>,
}

impl RegistryBuilder {
    pub fn keyword(mut self, descriptor: KeywordDescriptor) -> Self {
        self.keywords.push(descriptor);
        self
    }

    /// Freeze the table; a later registration under an equivalent name replaces the earlier one
    pub fn build(self) -> KeywordRegistry {
        let mut keywords: Vec<KeywordDescriptor> = Vec::with_capacity(self.keywords.len());
        let mut index = HashMap::new();
        for descriptor in self.keywords {
            let key = normalize(descriptor.name);
            match index.get(&key) {
                Some(&idx) => {
                    tracing::warn!("Keyword {} registered twice", descriptor.name);
                    keywords[idx] = descriptor;
                }
                None => {
                    index.insert(key, keywords.len());
                    keywords.push(descriptor);
                }
            }
        }
        KeywordRegistry { keywords, index }
    }
}
