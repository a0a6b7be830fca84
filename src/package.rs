// ============================================================================
// 程序模型 - 构件、类记录、调用边
// ============================================================================

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::method::{Method, MethodId, MethodRegistry};

/// One analyzed binary unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub group: String,
    pub name: String,
    pub version: String,
}

impl ArtifactRecord {
    pub fn new(group: &str, name: &str, version: &str) -> Self {
        Self {
            group: group.to_string(),
            name: name.to_string(),
            version: version.to_string(),
        }
    }
}

/// Artifact id used by resolvers: `group:name:version`
impl fmt::Display for ArtifactRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

impl FromStr for ArtifactRecord {
    type Err = String;

    /// Parse a `group:name:version` coordinate
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        match parts.as_slice() {
            [group, name, version] if !group.is_empty() && !name.is_empty() && !version.is_empty() => {
                Ok(Self::new(group, name, version))
            }
            _ => Err(format!("invalid artifact coordinate \"{}\", expected group:name:version", s)),
        }
    }
}

/// 调用类型 - 由外部引擎报告的分派方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallType {
    Interface,
    Virtual,
    Special,
    Static,
    #[serde(rename = "RESOLVED")]
    ResolvedDispatch,
    Unknown,
}

impl CallType {
    /// Label as written in the persisted contract
    pub fn label(&self) -> &'static str {
        match self {
            CallType::Interface => "INTERFACE",
            CallType::Virtual => "VIRTUAL",
            CallType::Special => "SPECIAL",
            CallType::Static => "STATIC",
            CallType::ResolvedDispatch => "RESOLVED",
            CallType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for CallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An executed-in-principle call edge; dedup key is the whole triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Call {
    pub source: MethodId,
    pub target: MethodId,
    pub call_type: CallType,
}

impl Call {
    pub fn new(source: MethodId, target: MethodId, call_type: CallType) -> Self {
        Self {
            source,
            target,
            call_type,
        }
    }
}

/// CHA 边类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChaEdgeKind {
    /// Interface method -> implementation
    Implements,
    /// Superclass method -> subclass method
    Override,
}

impl ChaEdgeKind {
    pub fn label(&self) -> &'static str {
        match self {
            ChaEdgeKind::Implements => "IMPLEMENTS",
            ChaEdgeKind::Override => "OVERRIDE",
        }
    }
}

/// Statically possible (not necessarily executed) override/implementation edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExpectedCall {
    pub source: MethodId,
    pub target: MethodId,
    pub kind: ChaEdgeKind,
}

/// 类记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRecord {
    /// Owning artifact, `None` when no artifact ships the class
    pub artifact: Option<String>,
    pub namespace: String,
    /// Absent only for the hierarchy root
    pub super_class: Option<String>,
    pub interfaces: BTreeSet<String>,
    pub methods: BTreeSet<String>,
    pub expected_calls: BTreeSet<ExpectedCall>,
    pub is_public: bool,
    pub is_private: bool,
    pub is_interface: bool,
    pub is_abstract: bool,
}

impl ClassRecord {
    pub fn new(artifact: Option<String>, namespace: &str) -> Self {
        Self {
            artifact,
            namespace: namespace.to_string(),
            super_class: None,
            interfaces: BTreeSet::new(),
            methods: BTreeSet::new(),
            expected_calls: BTreeSet::new(),
            is_public: false,
            is_private: false,
            is_interface: false,
            is_abstract: false,
        }
    }
}

/// Logs a class seen again under a different artifact than its kept record
pub(crate) fn warn_on_artifact_clash(namespace: &str, kept: Option<&str>, other: Option<&str>) {
    if kept != other {
        warn!(
            "Class {} found in {} and {}, keeping the first",
            namespace,
            kept.unwrap_or("<unknown>"),
            other.unwrap_or("<unknown>"),
        );
    }
}

/// 程序模型 (构建中)
///
/// Only the inserters mutate it; [`PackageModel::build`] freezes it into a
/// [`Package`].
#[derive(Debug, Default)]
pub struct PackageModel {
    artifacts: BTreeSet<ArtifactRecord>,
    class_records: BTreeMap<String, ClassRecord>,
    resolved_calls: BTreeSet<Call>,
    unresolved_calls: BTreeSet<Call>,
}

impl PackageModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_artifact(&mut self, artifact: ArtifactRecord) -> bool {
        self.artifacts.insert(artifact)
    }

    /// Insert a class record; the first record for a namespace wins.
    ///
    /// Returns false when a record already existed. A clash between different
    /// artifacts is a configuration problem and is logged as a warning.
    pub(crate) fn add_class_record(&mut self, record: ClassRecord) -> bool {
        if let Some(existing) = self.class_records.get(&record.namespace) {
            warn_on_artifact_clash(&record.namespace, existing.artifact.as_deref(), record.artifact.as_deref());
            return false;
        }

        self.class_records.insert(record.namespace.clone(), record);
        true
    }

    pub fn class_record(&self, namespace: &str) -> Option<&ClassRecord> {
        self.class_records.get(namespace)
    }

    /// Insert a call into the half selected by its target's attribution
    pub(crate) fn add_call(&mut self, call: Call, methods: &MethodRegistry) -> bool {
        let resolved = methods.get(call.target).map_or(false, Method::is_resolved);
        if resolved {
            self.resolved_calls.insert(call)
        } else {
            self.unresolved_calls.insert(call)
        }
    }

    pub fn artifact_count(&self) -> usize {
        self.artifacts.len()
    }

    pub fn class_count(&self) -> usize {
        self.class_records.len()
    }

    /// Freeze the model together with the registry its ids point into
    pub fn build(self, methods: MethodRegistry) -> Package {
        Package {
            artifacts: self.artifacts,
            class_records: self.class_records,
            resolved_calls: self.resolved_calls,
            unresolved_calls: self.unresolved_calls,
            methods,
        }
    }
}

/// Frozen, read-only program model
#[derive(Debug)]
pub struct Package {
    artifacts: BTreeSet<ArtifactRecord>,
    class_records: BTreeMap<String, ClassRecord>,
    resolved_calls: BTreeSet<Call>,
    unresolved_calls: BTreeSet<Call>,
    methods: MethodRegistry,
}

impl Package {
    pub fn artifacts(&self) -> &BTreeSet<ArtifactRecord> {
        &self.artifacts
    }

    pub fn class_records(&self) -> impl Iterator<Item = &ClassRecord> {
        self.class_records.values()
    }

    pub fn class_record(&self, namespace: &str) -> Option<&ClassRecord> {
        self.class_records.get(namespace)
    }

    pub fn resolved_calls(&self) -> &BTreeSet<Call> {
        &self.resolved_calls
    }

    pub fn unresolved_calls(&self) -> &BTreeSet<Call> {
        &self.unresolved_calls
    }

    /// Resolved calls followed by unresolved ones
    pub fn calls(&self) -> impl Iterator<Item = &Call> {
        self.resolved_calls.iter().chain(self.unresolved_calls.iter())
    }

    pub fn methods(&self) -> &MethodRegistry {
        &self.methods
    }

    pub fn method(&self, id: MethodId) -> &Method {
        &self.methods[id]
    }
}
