//! 只读视图 (Read-only views of a frozen package)
//!
//! Renderers enumerate classes and calls of a [`Package`] without touching it.

use std::io::{self, Write};

use crate::package::Package;

pub mod graphviz;
pub mod unresolved;

pub use graphviz::GraphVizOutput;
pub use unresolved::UnresolvedCallOutput;

/// A textual rendering of a package
pub trait PackageOutput {
    fn export(&self, package: &Package, writer: &mut dyn Write) -> io::Result<()>;

    /// Render into a string
    fn render(&self, package: &Package) -> io::Result<String> {
        let mut buf = Vec::new();
        self.export(package, &mut buf)?;
        String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}
