// ============================================================================
// 方法身份模块 - 每次构建一个方法注册表
// ============================================================================
//
// Every method the builder sees (hierarchy declarations, call sites) is
// interned here exactly once. Edges refer to methods by `MethodId`, so two
// lookups with the same key always end up pointing at the same entity.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Index;

/// Metadata key holding the declared kind of a method
pub const METHOD_TYPE_KEY: &str = "type";

/// Open string-keyed metadata attached to a method
pub type Metadata = BTreeMap<String, String>;

/// Handle to a method interned in a [`MethodRegistry`].
///
/// Only meaningful together with the registry that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId(u32);

impl MethodId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// 方法声明类型 (由类/方法修饰符推导)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// Declared on an interface type
    Interface,
    /// Declared without a body
    Abstract,
    Implementation,
}

impl MethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodKind::Interface => "INTERFACE",
            MethodKind::Abstract => "ABSTRACT",
            MethodKind::Implementation => "IMPLEMENTATION",
        }
    }
}

/// A method attributed to a known artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMethod {
    pub namespace: String,
    pub symbol: String,
    pub artifact: String,
    pub metadata: Metadata,
}

/// A method whose declaring type could not be attributed to any artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedMethod {
    pub namespace: String,
    pub symbol: String,
    pub metadata: Metadata,
}

/// Method identity: `namespace` is the declaring type, `symbol` is name + descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Resolved(ResolvedMethod),
    Unresolved(UnresolvedMethod),
}

impl Method {
    pub fn namespace(&self) -> &str {
        match self {
            Method::Resolved(m) => &m.namespace,
            Method::Unresolved(m) => &m.namespace,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Method::Resolved(m) => &m.symbol,
            Method::Unresolved(m) => &m.symbol,
        }
    }

    /// Owning artifact id, present only for resolved methods
    pub fn artifact(&self) -> Option<&str> {
        match self {
            Method::Resolved(m) => Some(&m.artifact),
            Method::Unresolved(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Method::Resolved(_))
    }

    pub fn metadata(&self) -> &Metadata {
        match self {
            Method::Resolved(m) => &m.metadata,
            Method::Unresolved(m) => &m.metadata,
        }
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        match self {
            Method::Resolved(m) => &mut m.metadata,
            Method::Unresolved(m) => &mut m.metadata,
        }
    }

    /// Declared kind recorded by the hierarchy phase, if any
    pub fn kind(&self) -> Option<&str> {
        self.metadata().get(METHOD_TYPE_KEY).map(String::as_str)
    }

    /// Stable textual id used by the text and DOT renderers
    ///
    /// `artifact::namespace.symbol` for resolved methods, `namespace.symbol` otherwise.
    pub fn to_id(&self) -> String {
        match self {
            Method::Resolved(m) => format!("{}::{}.{}", m.artifact, m.namespace, m.symbol),
            Method::Unresolved(m) => format!("{}.{}", m.namespace, m.symbol),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_id())
    }
}

/// 方法注册表 - 单次构建内的规范方法池
///
/// Resolved methods are keyed by (namespace, symbol, artifact), unresolved ones
/// by (namespace, symbol). The pool only grows; ids stay valid for the lifetime
/// of the registry.
#[derive(Debug, Default)]
pub struct MethodRegistry {
    methods: Vec<Method>,
    resolved: HashMap<(String, String, String), MethodId>,
    unresolved: HashMap<(String, String), MethodId>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the resolved method for the key, creating it on first sight
    pub fn find_or_create_resolved(&mut self, namespace: &str, symbol: &str, artifact: &str) -> MethodId {
        let key = (namespace.to_string(), symbol.to_string(), artifact.to_string());
        if let Some(id) = self.resolved.get(&key) {
            return *id;
        }

        let id = self.push(Method::Resolved(ResolvedMethod {
            namespace: key.0.clone(),
            symbol: key.1.clone(),
            artifact: key.2.clone(),
            metadata: Metadata::new(),
        }));
        self.resolved.insert(key, id);
        id
    }

    /// Return the unresolved method for the key, creating it on first sight
    pub fn find_or_create_unresolved(&mut self, namespace: &str, symbol: &str) -> MethodId {
        let key = (namespace.to_string(), symbol.to_string());
        if let Some(id) = self.unresolved.get(&key) {
            return *id;
        }

        let id = self.push(Method::Unresolved(UnresolvedMethod {
            namespace: key.0.clone(),
            symbol: key.1.clone(),
            metadata: Metadata::new(),
        }));
        self.unresolved.insert(key, id);
        id
    }

    fn push(&mut self, method: Method) -> MethodId {
        let id = MethodId(self.methods.len() as u32);
        self.methods.push(method);
        id
    }

    pub fn get(&self, id: MethodId) -> Option<&Method> {
        self.methods.get(id.index())
    }

    pub fn get_mut(&mut self, id: MethodId) -> Option<&mut Method> {
        self.methods.get_mut(id.index())
    }

    /// Record the declared kind of a method in its metadata
    pub fn tag_kind(&mut self, id: MethodId, kind: MethodKind) {
        if let Some(method) = self.get_mut(id) {
            method
                .metadata_mut()
                .insert(METHOD_TYPE_KEY.to_string(), kind.as_str().to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MethodId, &Method)> {
        self.methods
            .iter()
            .enumerate()
            .map(|(i, m)| (MethodId(i as u32), m))
    }
}

impl Index<MethodId> for MethodRegistry {
    type Output = Method;

    fn index(&self, id: MethodId) -> &Method {
        &self.methods[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_resolved_lookup_returns_same_id() {
        let mut registry = MethodRegistry::new();
        let a = registry.find_or_create_resolved("com.example.A", "m1()V", "com.example:p1:1.0");
        let b = registry.find_or_create_resolved("com.example.A", "m1()V", "com.example:p1:1.0");

        assert_eq!(a, b);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_artifact_is_part_of_resolved_key() {
        let mut registry = MethodRegistry::new();
        let a = registry.find_or_create_resolved("com.example.A", "m1()V", "g:p1:1.0");
        let b = registry.find_or_create_resolved("com.example.A", "m1()V", "g:p2:1.0");

        assert_ne!(a, b);
        assert_eq!(registry[a].artifact(), Some("g:p1:1.0"));
        assert_eq!(registry[b].artifact(), Some("g:p2:1.0"));
    }

    #[test]
    fn test_resolved_and_unresolved_never_alias() {
        let mut registry = MethodRegistry::new();
        let resolved = registry.find_or_create_resolved("Ext", "helper()V", "g:p:1");
        let unresolved = registry.find_or_create_unresolved("Ext", "helper()V");

        assert_ne!(resolved, unresolved);
        assert!(registry[resolved].is_resolved());
        assert!(!registry[unresolved].is_resolved());
        assert_eq!(registry[unresolved].artifact(), None);
    }

    #[test]
    fn test_tag_kind_is_visible_through_every_lookup() {
        let mut registry = MethodRegistry::new();
        let id = registry.find_or_create_unresolved("A", "m()V");
        registry.tag_kind(id, MethodKind::Abstract);

        let again = registry.find_or_create_unresolved("A", "m()V");
        assert_eq!(registry[again].kind(), Some("ABSTRACT"));
    }

    #[test]
    fn test_to_id() {
        let mut registry = MethodRegistry::new();
        let r = registry.find_or_create_resolved("com.example.A", "m1()V", "g:p1:1.0");
        let u = registry.find_or_create_unresolved("Ext", "helper()V");

        assert_eq!(registry[r].to_id(), "g:p1:1.0::com.example.A.m1()V");
        assert_eq!(registry[u].to_id(), "Ext.helper()V");
    }

    #[test]
    fn test_independent_registries_share_nothing() {
        let mut first = MethodRegistry::new();
        let mut second = MethodRegistry::new();
        first.find_or_create_unresolved("A", "x()V");
        let id = first.find_or_create_unresolved("A", "m()V");
        first.tag_kind(id, MethodKind::Interface);

        let other = second.find_or_create_unresolved("A", "m()V");
        assert_eq!(second.len(), 1);
        assert_eq!(second[other].kind(), None);
    }

    fn namespace_strategy() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z][a-z0-9]{0,5}", 1..=3)
            .prop_map(|parts| format!("{}.C", parts.join(".")))
    }

    fn symbol_strategy() -> impl Strategy<Value = String> {
        "[a-z][a-zA-Z0-9]{0,8}".prop_map(|name| format!("{}()V", name))
    }

    proptest! {
        /// Repeated lookups with the same key yield the same entity,
        /// and the registry grows by exactly the number of distinct keys.
        #[test]
        fn prop_identity_stability(
            keys in prop::collection::vec(
                (namespace_strategy(), symbol_strategy(), prop::option::of("[a-z]{1,4}")),
                1..40,
            ),
        ) {
            let mut registry = MethodRegistry::new();
            let mut seen: HashMap<(String, String, Option<String>), MethodId> = HashMap::new();

            for (namespace, symbol, artifact) in keys.iter().chain(keys.iter()) {
                let id = match artifact {
                    Some(artifact) => registry.find_or_create_resolved(namespace, symbol, artifact),
                    None => registry.find_or_create_unresolved(namespace, symbol),
                };
                let key = (namespace.clone(), symbol.clone(), artifact.clone());
                let expected = *seen.entry(key).or_insert(id);
                prop_assert_eq!(id, expected);
                prop_assert_eq!(registry[id].namespace(), namespace.as_str());
                prop_assert_eq!(registry[id].artifact(), artifact.as_deref());
            }

            prop_assert_eq!(registry.len(), seen.len());
        }
    }
}
