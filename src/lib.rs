// ============================================================================
// lapp - Library Interface
// ============================================================================
//
// Merges an externally computed class hierarchy and call graph into one
// artifact-aware program model. The binary (main.rs) is a thin CLI over these
// modules; integration tests use them directly.

pub mod analysis;
pub mod builder;
pub mod cli;
pub mod document;
pub mod error;
pub mod method;
pub mod outputs;
pub mod package;
pub mod resolver;

pub use analysis::{
    AnalysisBundle, ArtifactAnalysis, CallEdge, CallGraph, ClassHierarchy, ClassModifiers, ClassNode, DispatchKind,
    MethodDeclaration, MethodReference, Scope, TypeReference,
};
pub use builder::{build_bundle, build_package, PackageBuilder};
pub use document::PackageDocument;
pub use error::{BuildError, ExportError};
pub use method::{Method, MethodId, MethodKind, MethodRegistry};
pub use package::{ArtifactRecord, Call, CallType, ClassRecord, ExpectedCall, Package, PackageModel};
pub use resolver::{ArtifactIndex, ClassToArtifactResolver, ScopeResolver};
