//! The compilation driver.
//!
//! ## Algorithm
//!
//! 1. Translate the root declaration into the root structure.
//! 2. Search for the entry function. Only imports are forced during the
//!    search, then structures already reachable through compile-time type
//!    members are visited depth first; the search stops at the first entry.
//!    Failing to load an import here is fatal.
//! 3. Instantiate the entry with no arguments, falling back to the root's
//!    function set named by [`CompilerConfig::entry_name`].
//! 4. Resolve every remaining lazy member of every reachable structure. A
//!    failing member is raised and analysis goes on.
//!
//! [`CompilerConfig::entry_name`]: crate::CompilerConfig::entry_name

use std::path::Path;

use rustc_hash::FxHashSet;

use cheese_ast::{Member, StructureDecl};
use cheese_core::{CompileError, ErrorCode, Result, Span};

use crate::backend::BackendProgram;
use crate::context::CompilationContext;
use crate::functions::ScoreMode;
use crate::object::{ConcreteRef, TypeRef};
use crate::types::Type;

/// What an analyzed unit produced.
#[derive(Debug)]
pub struct CompilationOutput<'ast> {
    pub program: BackendProgram<'ast>,
    pub diagnostics: Vec<CompileError>,
    pub errored: bool,
}

impl<'ast> CompilationOutput<'ast> {
    pub fn functions(&self) -> &[crate::backend::FunctionRecord<'ast>] {
        &self.program.functions
    }

    pub fn globals(&self) -> &[crate::backend::GlobalRecord<'ast>] {
        &self.program.globals
    }
}

impl<'ast> CompilationContext<'ast> {
    /// Analyze a root file.
    ///
    /// Returns `Err` only for fatal problems: an import that cannot be loaded
    /// while looking for the entry, or no entry at all. Everything else is
    /// reported through [`diagnostics`](Self::diagnostics).
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn analyze(&mut self, decl: &'ast StructureDecl<'ast>, path: Option<&Path>) -> Result<()> {
        let name = path
            .and_then(Path::file_stem)
            .and_then(|stem| stem.to_str())
            .unwrap_or("main")
            .to_string();
        let scope = self.root_scope(path.and_then(Path::parent));
        let root = self.create_structure(scope.get(), decl, &name);
        self.heap.add_root(root.get());
        self.root = Some(root.get());
        if let Some(path) = path {
            let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
            self.imports.insert(key, root.get());
        }
        self.populate_structure(root.get(), decl);
        tracing::debug!(root = %name, "analyzing");

        let mut visited = Vec::new();
        self.search_entry(root.get(), &mut visited)?;
        tracing::debug!(visited = visited.len(), found = self.entry.is_some(), "entry search finished");

        match self.instantiate_entry(root.get()) {
            Ok(Some(entry)) => {
                tracing::debug!(entry = %self.concrete_function(entry).mangled_name, "entry instantiated");
            }
            Ok(None) => {
                let err = CompileError::new(
                    ErrorCode::MissingEntry,
                    format!(
                        "no entry function: nothing is flagged `entry` and `{}` has no `{}`",
                        name, self.config.entry_name
                    ),
                );
                self.raise(err.clone());
                return Err(err);
            }
            Err(err) => self.raise(err),
        }

        self.resolve_reachable(root.get());
        Ok(())
    }

    /// Hand over the built program and the diagnostics.
    pub fn finish(&mut self) -> CompilationOutput<'ast> {
        CompilationOutput {
            program: std::mem::take(&mut self.program),
            diagnostics: self.take_diagnostics(),
            errored: self.errored(),
        }
    }

    /// Depth-first search for an entry function below `st`.
    fn search_entry(&mut self, st: TypeRef<'ast>, visited: &mut Vec<TypeRef<'ast>>) -> Result<bool> {
        if self.entry.is_some() {
            return Ok(true);
        }
        if visited.contains(&st) {
            return Ok(false);
        }
        visited.push(st);

        let imports: Vec<&'ast str> = self
            .structure(st)
            .map(|structure| {
                structure
                    .lazies
                    .iter()
                    .filter(|lazy| matches!(lazy.member, Member::Import(_)))
                    .map(|lazy| lazy.name)
                    .collect()
            })
            .unwrap_or_default();
        for import in imports {
            self.resolve_lazy(st, import)?;
            if self.entry.is_some() {
                return Ok(true);
            }
        }

        let mut nested: Vec<TypeRef<'ast>> = self
            .structure(st)
            .map(|structure| {
                structure
                    .comptime_variables
                    .values()
                    .filter_map(|variable| self.as_type(variable.value))
                    .filter(|ty| matches!(self.ty(*ty), Type::Structure(_)))
                    .collect()
            })
            .unwrap_or_default();
        nested.sort();
        for ty in nested {
            if self.search_entry(ty, visited)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn instantiate_entry(&mut self, root: TypeRef<'ast>) -> Result<Option<ConcreteRef<'ast>>> {
        if let Some(template) = self.entry {
            let span = self.template(template).decl.span;
            let name = self.template(template).name.clone();
            let Some(candidate) = self.score(template, &[], ScoreMode::Probe)? else {
                return Err(CompileError::at(
                    ErrorCode::MismatchedFunctionCall,
                    format!("entry function `{name}` cannot be called without arguments"),
                    span,
                ));
            };
            return self.instantiate(candidate).map(Some);
        }
        let fallback = self
            .structure(root)
            .and_then(|structure| structure.function_sets.get(&self.config.entry_name).copied());
        match fallback {
            Some(set) => self.resolve_call(set, &[], Span::default(), ScoreMode::Probe).map(Some),
            None => Ok(None),
        }
    }

    /// Resolve the lazy members of everything reachable from the root and
    /// from imported files, until no new structures appear.
    fn resolve_reachable(&mut self, root: TypeRef<'ast>) {
        let mut done: FxHashSet<TypeRef<'ast>> = FxHashSet::default();
        loop {
            let mut pending = self.reachable_structures(root);
            for imported in self.imported_structures() {
                pending.extend(self.reachable_structures(imported));
            }
            pending.retain(|st| !done.contains(st));
            pending.dedup();
            if pending.is_empty() {
                break;
            }
            for st in pending {
                if done.insert(st) {
                    self.resolve_all_lazies(st);
                }
            }
        }
    }
}
