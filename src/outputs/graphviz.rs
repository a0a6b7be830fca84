// ============================================================================
// GraphViz DOT 输出
// ============================================================================

use std::io::{self, Write};

use super::PackageOutput;
use crate::method::Method;
use crate::package::{CallType, ChaEdgeKind, Package};

/// DOT digraph: one vertex per known method, call edges plus CHA edges
#[derive(Debug, Clone)]
pub struct GraphVizOutput {
    name: String,
}

impl Default for GraphVizOutput {
    fn default() -> Self {
        Self::new("lapp")
    }
}

impl GraphVizOutput {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }

    fn vertex_attributes(method: &Method) -> Vec<(String, String)> {
        let mut attributes = vec![(
            "label".to_string(),
            format!("{}.{}", method.namespace(), method.symbol()),
        )];
        attributes.extend(method.metadata().iter().map(|(k, v)| (k.clone(), v.clone())));
        attributes
    }

    fn call_style(call_type: CallType) -> Option<&'static str> {
        match call_type {
            CallType::Interface | CallType::Virtual => Some("bold"),
            CallType::Special | CallType::Static | CallType::ResolvedDispatch | CallType::Unknown => None,
        }
    }

    fn cha_style(kind: ChaEdgeKind) -> &'static str {
        match kind {
            ChaEdgeKind::Implements => "dashed",
            ChaEdgeKind::Override => "dotted",
        }
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

fn attribute_list(attributes: &[(String, String)]) -> String {
    let parts: Vec<String> = attributes
        .iter()
        .map(|(k, v)| format!("{}={}", k, quote(v)))
        .collect();
    format!("[{}]", parts.join(", "))
}

impl PackageOutput for GraphVizOutput {
    fn export(&self, package: &Package, writer: &mut dyn Write) -> io::Result<()> {
        writeln!(writer, "digraph {} {{", quote(&self.name))?;

        for (_, method) in package.methods().iter() {
            writeln!(
                writer,
                "  {} {};",
                quote(&method.to_id()),
                attribute_list(&Self::vertex_attributes(method))
            )?;
        }

        for call in package.calls() {
            let mut attributes = vec![("label".to_string(), call.call_type.label().to_string())];
            if let Some(style) = Self::call_style(call.call_type) {
                attributes.push(("style".to_string(), style.to_string()));
            }
            writeln!(
                writer,
                "  {} -> {} {};",
                quote(&package.method(call.source).to_id()),
                quote(&package.method(call.target).to_id()),
                attribute_list(&attributes)
            )?;
        }

        for record in package.class_records() {
            for expected in &record.expected_calls {
                let attributes = [
                    ("label".to_string(), expected.kind.label().to_string()),
                    ("style".to_string(), Self::cha_style(expected.kind).to_string()),
                ];
                writeln!(
                    writer,
                    "  {} -> {} {};",
                    quote(&package.method(expected.source).to_id()),
                    quote(&package.method(expected.target).to_id()),
                    attribute_list(&attributes)
                )?;
            }
        }

        writeln!(writer, "}}")?;
        writer.flush()
    }
}
