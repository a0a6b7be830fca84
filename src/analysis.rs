// ============================================================================
// 分析输入模块 - 外部静态分析引擎的物化结果
// ============================================================================
//
// The hierarchy and call graph are computed elsewhere; these types are the
// in-memory (and on-disk bundle) form the builder consumes. Nothing here does
// any analysis of its own.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::package::{ArtifactRecord, CallType};
use crate::resolver::ArtifactIndex;

/// Defining-loader classification of a type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Scope {
    /// Code of the analyzed artifacts
    Application,
    /// Platform code (the JDK)
    Primordial,
    Extension,
    Other(String),
}

impl Scope {
    pub fn as_str(&self) -> &str {
        match self {
            Scope::Application => "APPLICATION",
            Scope::Primordial => "PRIMORDIAL",
            Scope::Extension => "EXTENSION",
            Scope::Other(s) => s,
        }
    }
}

impl From<String> for Scope {
    fn from(s: String) -> Self {
        match s.trim().to_uppercase().as_str() {
            "APPLICATION" => Scope::Application,
            "PRIMORDIAL" => Scope::Primordial,
            "EXTENSION" => Scope::Extension,
            _ => Scope::Other(s),
        }
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        scope.as_str().to_string()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a type together with the scope that defined it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeReference {
    /// JVM internal (`Lcom/example/A`) or dotted (`com.example.A`) name
    pub name: String,
    pub scope: Scope,
}

impl TypeReference {
    pub fn new(name: &str, scope: Scope) -> Self {
        Self {
            name: name.to_string(),
            scope,
        }
    }

    /// Fully-qualified dotted name of the type
    pub fn namespace(&self) -> String {
        to_namespace(&self.name)
    }
}

/// Normalize a type name to its dotted namespace form
///
/// A name is in internal form when it contains `/` or is wrapped as `L...;`.
/// `Lcom/example/A;`, `Lcom/example/A` and `LMain;` become `com.example.A`
/// and `Main`. Anything else is already dotted, so `LMain` stays `LMain`;
/// default-package classes need the trailing `;` in internal form.
pub fn to_namespace(type_name: &str) -> String {
    let name = type_name.trim();
    let wrapped = name
        .strip_prefix('L')
        .and_then(|n| n.strip_suffix(';'))
        .filter(|n| !n.is_empty());

    match wrapped {
        Some(inner) => inner.replace('/', "."),
        None if name.contains('/') => name.strip_prefix('L').unwrap_or(name).replace('/', "."),
        None => name.to_string(),
    }
}

/// Reference to a method: declaring type plus selector (name + descriptor)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodReference {
    pub declaring_class: TypeReference,
    pub selector: String,
}

impl MethodReference {
    pub fn new(declaring_class: TypeReference, selector: &str) -> Self {
        Self {
            declaring_class,
            selector: selector.to_string(),
        }
    }
}

/// Class-level modifiers reported by the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassModifiers {
    pub public: bool,
    pub private: bool,
    pub interface: bool,
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
}

/// A method declared (not inherited) by a class node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDeclaration {
    pub selector: String,
    /// No body
    #[serde(rename = "abstract", default)]
    pub is_abstract: bool,
    #[serde(rename = "static", default)]
    pub is_static: bool,
    #[serde(rename = "private", default)]
    pub is_private: bool,
}

impl MethodDeclaration {
    pub fn new(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            is_abstract: false,
            is_static: false,
            is_private: false,
        }
    }

    pub fn abstract_method(selector: &str) -> Self {
        Self {
            is_abstract: true,
            ..Self::new(selector)
        }
    }

    /// Whether virtual dispatch can reach this declaration through a subtype
    pub fn is_overridable(&self) -> bool {
        !self.is_static
            && !self.is_private
            && !self.selector.starts_with("<init>")
            && !self.selector.starts_with("<clinit>")
    }
}

/// One node of the class hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassNode {
    pub reference: TypeReference,
    /// Absent only for the hierarchy root
    #[serde(default)]
    pub superclass: Option<TypeReference>,
    #[serde(default)]
    pub interfaces: Vec<TypeReference>,
    #[serde(default)]
    pub methods: Vec<MethodDeclaration>,
    #[serde(default)]
    pub modifiers: ClassModifiers,
}

impl ClassNode {
    pub fn new(reference: TypeReference) -> Self {
        Self {
            reference,
            superclass: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            modifiers: ClassModifiers::default(),
        }
    }

    pub fn with_superclass(mut self, superclass: TypeReference) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn with_interface(mut self, interface: TypeReference) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn with_method(mut self, method: MethodDeclaration) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_modifiers(mut self, modifiers: ClassModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn namespace(&self) -> String {
        self.reference.namespace()
    }

    pub fn is_interface(&self) -> bool {
        self.modifiers.interface
    }

    /// Reference to one of this class's declared methods
    pub fn method_reference(&self, method: &MethodDeclaration) -> MethodReference {
        MethodReference::new(self.reference.clone(), &method.selector)
    }

    pub fn declares(&self, selector: &str) -> Option<&MethodDeclaration> {
        self.methods.iter().find(|m| m.selector == selector)
    }
}

/// Class hierarchy of one artifact (every reachable class node)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassHierarchy {
    #[serde(default)]
    pub classes: Vec<ClassNode>,
}

impl ClassHierarchy {
    pub fn new(classes: Vec<ClassNode>) -> Self {
        Self { classes }
    }

    /// Namespace -> node lookup table
    pub fn index(&self) -> HashMap<String, &ClassNode> {
        self.classes.iter().map(|c| (c.namespace(), c)).collect()
    }
}

/// 调用分派类型 (字节码层面)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DispatchKind {
    Interface,
    Virtual,
    Special,
    Static,
    /// Target fully resolved by the engine
    Resolved,
    Unknown,
}

impl DispatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchKind::Interface => "interface",
            DispatchKind::Virtual => "virtual",
            DispatchKind::Special => "special",
            DispatchKind::Static => "static",
            DispatchKind::Resolved => "resolved",
            DispatchKind::Unknown => "unknown",
        }
    }

    pub fn call_type(self) -> CallType {
        match self {
            DispatchKind::Interface => CallType::Interface,
            DispatchKind::Virtual => CallType::Virtual,
            DispatchKind::Special => CallType::Special,
            DispatchKind::Static => CallType::Static,
            DispatchKind::Resolved => CallType::ResolvedDispatch,
            DispatchKind::Unknown => CallType::Unknown,
        }
    }
}

impl From<String> for DispatchKind {
    fn from(s: String) -> Self {
        let lower = s.trim().to_lowercase();
        match lower.strip_prefix("invoke").unwrap_or(&lower) {
            "interface" => DispatchKind::Interface,
            "virtual" => DispatchKind::Virtual,
            "special" => DispatchKind::Special,
            "static" => DispatchKind::Static,
            "resolved" | "resolved_dispatch" => DispatchKind::Resolved,
            _ => {
                tracing::warn!("Unknown dispatch kind \"{}\", recording as unknown", s);
                DispatchKind::Unknown
            }
        }
    }
}

impl From<DispatchKind> for String {
    fn from(kind: DispatchKind) -> Self {
        kind.as_str().to_string()
    }
}

/// One statically reachable call edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallEdge {
    pub caller: MethodReference,
    pub callee: MethodReference,
    pub dispatch: DispatchKind,
}

impl CallEdge {
    pub fn new(caller: MethodReference, callee: MethodReference, dispatch: DispatchKind) -> Self {
        Self { caller, callee, dispatch }
    }
}

/// Call graph of one artifact, restricted to edges reachable from entry points
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallGraph {
    #[serde(default)]
    pub edges: Vec<CallEdge>,
}

impl CallGraph {
    pub fn new(edges: Vec<CallEdge>) -> Self {
        Self { edges }
    }
}

/// Engine output for one artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactAnalysis {
    pub artifact: ArtifactRecord,
    #[serde(default)]
    pub hierarchy: Option<ClassHierarchy>,
    #[serde(default)]
    pub call_graph: Option<CallGraph>,
}

impl ArtifactAnalysis {
    pub fn new(artifact: ArtifactRecord, hierarchy: ClassHierarchy, call_graph: CallGraph) -> Self {
        Self {
            artifact,
            hierarchy: Some(hierarchy),
            call_graph: Some(call_graph),
        }
    }
}

/// 分析包 - 一次构建的全部输入
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisBundle {
    /// Class namespace -> artifact id (`group:name:version`)
    #[serde(default)]
    pub class_artifacts: BTreeMap<String, String>,
    #[serde(default)]
    pub analyses: Vec<ArtifactAnalysis>,
}

impl AnalysisBundle {
    /// Load a bundle, YAML for `.yaml`/`.yml` files and JSON otherwise
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let content = fs::read_to_string(path).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            "yaml" | "yml" => Self::from_yaml(&content),
            _ => Self::from_json(&content),
        }
    }

    pub fn from_json(content: &str) -> Result<Self, ExportError> {
        serde_json::from_str::<Self>(content)?.validated()
    }

    pub fn from_yaml(content: &str) -> Result<Self, ExportError> {
        serde_yaml::from_str::<Self>(content)?.validated()
    }

    /// Every `classArtifacts` value must be a `group:name:version` id
    fn validated(self) -> Result<Self, ExportError> {
        for (class, artifact) in &self.class_artifacts {
            artifact
                .parse::<ArtifactRecord>()
                .map_err(|reason| ExportError::ArtifactId {
                    class: class.clone(),
                    reason,
                })?;
        }
        Ok(self)
    }

    /// Artifact resolver backed by `class_artifacts`
    pub fn resolver(&self) -> ArtifactIndex {
        ArtifactIndex::from_map(&self.class_artifacts)
    }

    pub fn artifacts(&self) -> Vec<ArtifactRecord> {
        self.analyses.iter().map(|a| a.artifact.clone()).collect()
    }
}
