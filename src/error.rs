// ============================================================================
// 错误类型 - 构建与导出
// ============================================================================

use std::path::PathBuf;
use thiserror::Error;

use crate::package::ArtifactRecord;

/// Caller errors detected by the package builder.
///
/// Classification problems (unknown scope, missing artifact mapping) are never
/// errors; they route a method to the unresolved half of the model instead.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("artifact {0} has no class hierarchy")]
    MissingHierarchy(ArtifactRecord),

    #[error("artifact {0} has no call graph")]
    MissingCallGraph(ArtifactRecord),

    /// 调用图阶段已开始后不允许再插入类层级
    #[error("class hierarchy inserted after call graph insertion started")]
    HierarchyAfterCallGraph,
}

/// Failures while reading bundles or writing a frozen package.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Write(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid artifact id for class {class}: {reason}")]
    ArtifactId { class: String, reason: String },
}
