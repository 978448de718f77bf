use serde::{Deserialize, Serialize};

/// One side of a [`Scope`] — a polymorphic reference expressed as a plain
/// `(type-tag, id)` pair rather than a live model reference. The host that
/// owns the rich domain model converts to this pair at the boundary; the
/// core never dereferences it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeRef {
    pub type_tag: String,
    pub id: String,
}

impl ScopeRef {
    pub fn new(type_tag: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            id: id.into(),
        }
    }
}

/// The `(context?, boundary?)` pair. Both sides are independently optional;
/// two scopes are equal iff both sides are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Scope {
    pub context: Option<ScopeRef>,
    pub boundary: Option<ScopeRef>,
}

impl Scope {
    #[must_use]
    pub fn global() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_context(mut self, context: Option<ScopeRef>) -> Self {
        self.context = context;
        self
    }

    #[must_use]
    pub fn with_boundary(mut self, boundary: Option<ScopeRef>) -> Self {
        self.boundary = boundary;
        self
    }
}

/// `(name, scope)` — uniquely identifies one breaker record in a store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub scope: Scope,
}

impl Identity {
    pub fn new(name: impl Into<String>, scope: Scope) -> Self {
        Self {
            name: name.into(),
            scope,
        }
    }

    /// The canonical string key used by drivers that key on strings (the
    /// memory and cache drivers). Stores that index by tuple columns (the
    /// durable driver) don't need this form but must honour the same
    /// equality it encodes.
    ///
    /// Form: `[prefix:]ctx:<type>:<id>:bnd:<type>:<id>:<name>:<suffix>`,
    /// omitting the `ctx`/`bnd` segments when that side is absent.
    #[must_use]
    pub fn canonical_key(&self, prefix: Option<&str>, suffix: &str) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(5);
        if let Some(p) = prefix {
            parts.push(p.to_string());
        }
        if let Some(ctx) = &self.scope.context {
            parts.push(format!("ctx:{}:{}", ctx.type_tag, ctx.id));
        }
        if let Some(bnd) = &self.scope.boundary {
            parts.push(format!("bnd:{}:{}", bnd.type_tag, bnd.id));
        }
        parts.push(self.name.clone());
        parts.push(suffix.to_string());
        parts.join(":")
    }
}
