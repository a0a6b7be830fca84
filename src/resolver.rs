// ============================================================================
// 作用域解析模块 - 方法能否归属到已知构件
// ============================================================================

use std::collections::{BTreeMap, HashMap};

use crate::analysis::{MethodReference, Scope, TypeReference};
use crate::method::{MethodId, MethodRegistry};

/// Maps classes and method references to the artifact that ships them.
///
/// Never fails: `None` is the ordinary outcome for types that no analyzed
/// artifact provides, and it drives the unresolved branch.
pub trait ClassToArtifactResolver {
    fn artifact_from_class(&self, class: &TypeReference) -> Option<String>;

    fn artifact_from_method_reference(&self, method: &MethodReference) -> Option<String> {
        self.artifact_from_class(&method.declaring_class)
    }
}

/// In-memory resolver: class namespace -> artifact id
#[derive(Debug, Clone, Default)]
pub struct ArtifactIndex {
    classes: HashMap<String, String>,
}

impl ArtifactIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        Self {
            classes: map
                .iter()
                .map(|(class, artifact)| (crate::analysis::to_namespace(class), artifact.clone()))
                .collect(),
        }
    }

    pub fn insert(&mut self, namespace: &str, artifact: &str) {
        self.classes.insert(namespace.to_string(), artifact.to_string());
    }

    pub fn with_class(mut self, namespace: &str, artifact: &str) -> Self {
        self.insert(namespace, artifact);
        self
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl ClassToArtifactResolver for ArtifactIndex {
    fn artifact_from_class(&self, class: &TypeReference) -> Option<String> {
        self.classes.get(&class.namespace()).cloned()
    }
}

/// Whether methods of a type defined in `scope` may be attributed to an artifact
pub fn is_attributable_scope(scope: &Scope) -> bool {
    matches!(scope, Scope::Application | Scope::Primordial)
}

/// 解析策略 - 决定方法落入 resolved 还是 unresolved 一侧
///
/// APPLICATION or PRIMORDIAL scope plus a successful artifact lookup gives a
/// resolved identity; anything else gives an unresolved one.
pub struct ScopeResolver<'r, R: ClassToArtifactResolver + ?Sized> {
    artifacts: &'r R,
}

impl<'r, R: ClassToArtifactResolver + ?Sized> ScopeResolver<'r, R> {
    pub fn new(artifacts: &'r R) -> Self {
        Self { artifacts }
    }

    /// Artifact a method reference is attributed to, if any
    pub fn attribute(&self, reference: &MethodReference) -> Option<String> {
        if !is_attributable_scope(&reference.declaring_class.scope) {
            return None;
        }
        self.artifacts.artifact_from_method_reference(reference)
    }

    /// Canonical identity of a method reference in this build
    pub fn resolve(&self, registry: &mut MethodRegistry, reference: &MethodReference) -> MethodId {
        let namespace = reference.declaring_class.namespace();

        match self.attribute(reference) {
            Some(artifact) => registry.find_or_create_resolved(&namespace, &reference.selector, &artifact),
            None => registry.find_or_create_unresolved(&namespace, &reference.selector),
        }
    }

    /// Owning artifact of a class node
    pub fn class_artifact(&self, class: &TypeReference) -> Option<String> {
        self.artifacts.artifact_from_class(class)
    }
}
