//! Import location and loading.
//!
//! The context does not read files itself. An [`ImportResolver`] turns an
//! import path into a source location and a parsed structure declaration;
//! [`FsImportResolver`] does so from disk with a pluggable [`SourceParser`],
//! and [`StaticImportResolver`] serves pre-parsed declarations from memory.
//!
//! An import path `a/b` is searched as `a/b.chs`, then `a/b/lib.chs`, first
//! in the importing file's directory and then in each library root.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use cheese_ast::StructureDecl;
use cheese_core::{CompileError, ErrorCode, Result};

use crate::config::CompilerConfig;
use crate::context::CompilationContext;
use crate::object::TypeRef;

/// Locates and loads imported source files.
pub trait ImportResolver<'ast> {
    /// Resolve an import path to the file that provides it.
    fn locate(&self, path: &str, directory: Option<&Path>, config: &CompilerConfig) -> Option<PathBuf>;

    /// Parse the file found by [`locate`](Self::locate).
    fn load(&mut self, path: &Path) -> Result<&'ast StructureDecl<'ast>>;
}

/// Turns source text into a structure declaration.
pub trait SourceParser<'ast> {
    fn parse(&mut self, path: &Path, source: &str) -> Result<&'ast StructureDecl<'ast>>;
}

impl<'ast, F> SourceParser<'ast> for F
where
    F: FnMut(&Path, &str) -> Result<&'ast StructureDecl<'ast>>,
{
    fn parse(&mut self, path: &Path, source: &str) -> Result<&'ast StructureDecl<'ast>> {
        self(path, source)
    }
}

/// Files an import path may resolve to, in search order.
pub fn candidates(path: &str, directory: Option<&Path>, config: &CompilerConfig) -> Vec<PathBuf> {
    let relative: PathBuf = path.split('/').filter(|part| !part.is_empty()).collect();
    let file = relative.with_extension(&config.source_extension);
    let package = relative
        .join(&config.package_entry)
        .with_extension(&config.source_extension);
    directory
        .into_iter()
        .chain(config.library_roots.iter().map(PathBuf::as_path))
        .flat_map(|base| [base.join(&file), base.join(&package)])
        .collect()
}

/// Structure name of an imported file: its stem, or the directory name for a
/// package entry file.
pub fn module_name(path: &Path, config: &CompilerConfig) -> String {
    let stem = path.file_stem().and_then(|stem| stem.to_str()).unwrap_or("module");
    if stem == config.package_entry {
        if let Some(directory) = path.parent().and_then(Path::file_name).and_then(|name| name.to_str()) {
            return directory.to_string();
        }
    }
    stem.to_string()
}

/// Loads imports from the file system.
pub struct FsImportResolver<P> {
    parser: P,
}

impl<P> FsImportResolver<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }
}

impl<'ast, P: SourceParser<'ast>> ImportResolver<'ast> for FsImportResolver<P> {
    fn locate(&self, path: &str, directory: Option<&Path>, config: &CompilerConfig) -> Option<PathBuf> {
        candidates(path, directory, config)
            .into_iter()
            .find(|candidate| candidate.is_file())
            .and_then(|found| found.canonicalize().ok())
    }

    fn load(&mut self, path: &Path) -> Result<&'ast StructureDecl<'ast>> {
        let source = std::fs::read_to_string(path).map_err(|err| {
            CompileError::new(
                ErrorCode::UnresolvedImport,
                format!("cannot read `{}`: {err}", path.display()),
            )
        })?;
        self.parser.parse(path, &source)
    }
}

/// Serves already-parsed declarations keyed by path.
#[derive(Default)]
pub struct StaticImportResolver<'ast> {
    files: FxHashMap<PathBuf, &'ast StructureDecl<'ast>>,
}

impl<'ast> StaticImportResolver<'ast> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, decl: &'ast StructureDecl<'ast>) -> Self {
        self.files.insert(path.into(), decl);
        self
    }
}

impl<'ast> ImportResolver<'ast> for StaticImportResolver<'ast> {
    fn locate(&self, path: &str, directory: Option<&Path>, config: &CompilerConfig) -> Option<PathBuf> {
        candidates(path, directory, config)
            .into_iter()
            .find(|candidate| self.files.contains_key(candidate))
    }

    fn load(&mut self, path: &Path) -> Result<&'ast StructureDecl<'ast>> {
        self.files.get(path).copied().ok_or_else(|| {
            CompileError::new(
                ErrorCode::UnresolvedImport,
                format!("no source registered for `{}`", path.display()),
            )
        })
    }
}

impl<'ast> CompilationContext<'ast> {
    /// Import the structure for `path`, relative to `directory`.
    ///
    /// Each file is translated once; later imports of the same file return the
    /// same structure. Imported structures are rooted for the life of the unit.
    pub fn import_structure(&mut self, directory: Option<&Path>, path: &str) -> Result<TypeRef<'ast>> {
        let located = match &self.importer {
            Some(importer) => importer.locate(path, directory, &self.config),
            None => None,
        };
        let Some(located) = located else {
            return Err(CompileError::new(
                ErrorCode::UnresolvedImport,
                format!("cannot find `{path}`"),
            ));
        };
        if let Some(existing) = self.imports.get(&located) {
            return Ok(*existing);
        }
        let decl = match self.importer.as_mut() {
            Some(importer) => importer.load(&located)?,
            None => {
                return Err(CompileError::new(
                    ErrorCode::UnresolvedImport,
                    format!("cannot load `{}`", located.display()),
                ));
            }
        };

        let name = module_name(&located, &self.config);
        let scope = self.root_scope(located.parent());
        let structure = self.create_structure(scope.get(), decl, &name);
        self.heap.add_root(structure.get());
        self.imports.insert(located.clone(), structure.get());
        tracing::debug!(path = %located.display(), structure = %name, "imported file");
        self.populate_structure(structure.get(), decl);
        Ok(structure.get())
    }

    /// Every structure imported so far.
    pub fn imported_structures(&self) -> Vec<TypeRef<'ast>> {
        let mut imported: Vec<TypeRef<'ast>> = self.imports.values().copied().collect();
        imported.sort();
        imported
    }
}
