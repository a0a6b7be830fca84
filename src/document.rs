// ============================================================================
// 输出格式模块 - 持久化/交换用的 Package 文档
// ============================================================================
//
// The document mirrors the exchange schema downstream consumers read:
// methods are inlined as {namespace, symbol, artifact?}, call types use the
// wire labels, and every collection is a set so comparisons ignore order.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::method::{Method, MethodId};
use crate::package::{ArtifactRecord, Call, CallType, ClassRecord, Package};

/// Method { namespace, symbol, artifact? }
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodDocument {
    pub namespace: String,
    pub symbol: String,
    /// Present only for resolved methods
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
}

impl From<&Method> for MethodDocument {
    fn from(method: &Method) -> Self {
        Self {
            namespace: method.namespace().to_string(),
            symbol: method.symbol().to_string(),
            artifact: method.artifact().map(String::from),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExpectedCallDocument {
    pub source: MethodDocument,
    pub target: MethodDocument,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallDocument {
    pub source: MethodDocument,
    pub target: MethodDocument,
    pub call_type: CallType,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecordDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    pub name: String,
    /// java.lang.Object doesn't have a super class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub super_class: Option<String>,
    #[serde(default)]
    pub interfaces: BTreeSet<String>,
    #[serde(default)]
    pub methods: BTreeSet<String>,
    #[serde(default)]
    pub expected_calls: BTreeSet<ExpectedCallDocument>,
    #[serde(rename = "public", default)]
    pub is_public: bool,
    #[serde(rename = "private", default)]
    pub is_private: bool,
    #[serde(rename = "interface", default)]
    pub is_interface: bool,
    #[serde(rename = "abstract", default)]
    pub is_abstract: bool,
}

/// 持久化文档根节点
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDocument {
    #[serde(default)]
    pub artifacts: BTreeSet<ArtifactRecord>,
    #[serde(default)]
    pub class_records: BTreeSet<ClassRecordDocument>,
    #[serde(default)]
    pub resolved_calls: BTreeSet<CallDocument>,
    #[serde(default)]
    pub unresolved_calls: BTreeSet<CallDocument>,
}

impl PackageDocument {
    pub fn of(package: &Package) -> Self {
        let method = |id: MethodId| MethodDocument::from(package.method(id));
        let call = |c: &Call| CallDocument {
            source: method(c.source),
            target: method(c.target),
            call_type: c.call_type,
        };
        let class_record = |r: &ClassRecord| ClassRecordDocument {
            artifact: r.artifact.clone(),
            name: r.namespace.clone(),
            super_class: r.super_class.clone(),
            interfaces: r.interfaces.clone(),
            methods: r.methods.clone(),
            expected_calls: r
                .expected_calls
                .iter()
                .map(|e| ExpectedCallDocument {
                    source: method(e.source),
                    target: method(e.target),
                })
                .collect(),
            is_public: r.is_public,
            is_private: r.is_private,
            is_interface: r.is_interface,
            is_abstract: r.is_abstract,
        };

        Self {
            artifacts: package.artifacts().clone(),
            class_records: package.class_records().map(class_record).collect(),
            resolved_calls: package.resolved_calls().iter().map(call).collect(),
            unresolved_calls: package.unresolved_calls().iter().map(call).collect(),
        }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ExportError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let file = File::open(path).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn write<W: Write>(&self, mut writer: W, pretty: bool) -> Result<(), ExportError> {
        if pretty {
            serde_json::to_writer_pretty(&mut writer, self)?;
        } else {
            serde_json::to_writer(&mut writer, self)?;
        }
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    /// Write to `path`, creating parent directories as needed
    pub fn write_to_path(&self, path: &Path, pretty: bool) -> Result<(), ExportError> {
        let io_err = |source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let file = File::create(path).map_err(io_err)?;
        self.write(BufWriter::new(file), pretty)
    }
}

impl From<&Package> for PackageDocument {
    fn from(package: &Package) -> Self {
        Self::of(package)
    }
}
