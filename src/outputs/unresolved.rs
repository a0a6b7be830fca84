// ============================================================================
// 未解析调用列表
// ============================================================================

use std::io::{self, Write};

use super::PackageOutput;
use crate::package::Package;

/// One line per unresolved call: `source \t->\t target :TYPE`
#[derive(Debug, Default, Clone, Copy)]
pub struct UnresolvedCallOutput;

impl PackageOutput for UnresolvedCallOutput {
    fn export(&self, package: &Package, writer: &mut dyn Write) -> io::Result<()> {
        for call in package.unresolved_calls() {
            writeln!(
                writer,
                "{} \t->\t {} :{}",
                package.method(call.source).to_id(),
                package.method(call.target).to_id(),
                call.call_type.label()
            )?;
        }
        writer.flush()
    }
}
