//! Loading pipeline that reads a document from disk, parses it, and compiles it.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::isa::ast::IsaDocument;
use crate::isa::error::IsaError;
use crate::isa::handle::CompiledIsa;
use crate::isa::set::LoadOptions;

use super::parser::parse_str;

#[derive(Debug, Clone, Default)]
pub struct IsaLoader {
    options: LoadOptions,
}

impl IsaLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: LoadOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    pub fn read_document<P: AsRef<Path>>(&self, path: P) -> Result<IsaDocument, IsaError> {
        let path = path.as_ref();
        debug!("reading instruction set from {}", path.display());
        let src = fs::read_to_string(path)?;
        parse_str(path.to_path_buf(), &src)
    }

    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<CompiledIsa, IsaError> {
        let document = self.read_document(path)?;
        CompiledIsa::compile(&document, &self.options)
    }

    /// Compiles in-memory source; `path` is only used for diagnostics.
    pub fn load_str(&self, path: impl Into<PathBuf>, src: &str) -> Result<CompiledIsa, IsaError> {
        let document = parse_str(path.into(), src)?;
        CompiledIsa::compile(&document, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::diagnostic::DiagnosticPhase;
    use tempfile::tempdir;

    const SOURCE: &str = r#"<bifrost>
  <ins name="*NOP" dests="0"/>
  <ins name="+NOP" dests="0"/>
  <ins name="+DEBUG" unused="true"/>
</bifrost>"#;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).expect("write file");
        path
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempdir().expect("tempdir");
        let path = write_file(dir.path(), "isa.xml", SOURCE);
        let compiled = IsaLoader::new().load_file(&path).expect("load");
        assert_eq!(compiled.instructions.len(), 2);
        assert_eq!(compiled.mnemonic("NOP").map(|group| group.variants), Some(2));
    }

    #[test]
    fn options_are_threaded_through() {
        let loader = IsaLoader::with_options(LoadOptions::new().include_unused(true));
        let compiled = loader.load_str("inline.xml", SOURCE).expect("load");
        assert!(compiled.instructions.get("+DEBUG").is_some());
        assert!(loader.options().include_unused);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempdir().expect("tempdir");
        let err = IsaLoader::new()
            .load_file(dir.path().join("absent.xml"))
            .unwrap_err();
        assert!(matches!(err, IsaError::Io(_)));
    }

    #[test]
    fn parse_errors_carry_the_file_path() {
        let dir = tempdir().expect("tempdir");
        let path = write_file(dir.path(), "broken.xml", "<bifrost><ins></bifrost>");
        let err = IsaLoader::new().load_file(&path).unwrap_err();
        assert_eq!(err.phase(), Some(DiagnosticPhase::Parser));
        assert!(err.to_string().contains("broken.xml"), "{err}");
    }
}
