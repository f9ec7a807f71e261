//! CompilationContext - the compilation-wide state of one unit.
//!
//! Owns the object heap, the type pools, the structure name registry, the
//! imported-structure cache, the diagnostics sink and the backend output being
//! built. Every resolver in this crate is an `impl` block on this type.

use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};

use cheese_core::{CompileError, Scoped, SymbolHash};

use crate::backend::{BackendProgram, BackendTypeId};
use crate::config::CompilerConfig;
use crate::functions::{ConcreteFunction, FunctionSet, FunctionTemplate};
use crate::import::ImportResolver;
use crate::object::{
    ConcreteRef, FunctionSetRef, ObjectHeap, ScopeRef, TemplateRef, TypeRef, ValueRef,
};
use crate::scope::Scope;
use crate::types::{Type, TypeCache};
use crate::values::Value;

/// Registry of structure names; keeps every registered name unique.
#[derive(Debug, Default)]
pub struct NameRegistry {
    taken: FxHashSet<String>,
    anonymous: usize,
    literals: usize,
}

impl NameRegistry {
    /// Register `name`, suffixing `#N` when it is already taken.
    pub fn register(&mut self, name: &str) -> String {
        if self.taken.insert(name.to_string()) {
            return name.to_string();
        }
        let mut suffix = 1usize;
        loop {
            let candidate = format!("{name}#{suffix}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            suffix += 1;
        }
    }

    /// Base name for an anonymous structure; registered on declaration.
    pub fn anonymous(&mut self) -> String {
        let name = format!("anonymous_{}", self.anonymous);
        self.anonymous += 1;
        name
    }

    pub fn literal(&mut self) -> String {
        let name = format!("::literal_{}", self.literals);
        self.literals += 1;
        self.register(&name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.taken.contains(name)
    }
}

/// Compilation-wide context.
pub struct CompilationContext<'ast> {
    pub(crate) heap: ObjectHeap<'ast>,
    pub(crate) config: CompilerConfig,
    pub(crate) types: TypeCache<'ast>,
    pub(crate) names: NameRegistry,
    /// Imported root structures by canonical path.
    pub(crate) imports: FxHashMap<PathBuf, TypeRef<'ast>>,
    pub(crate) importer: Option<Box<dyn ImportResolver<'ast> + 'ast>>,
    diagnostics: Vec<CompileError>,
    errored: bool,
    pub(crate) root: Option<TypeRef<'ast>>,
    pub(crate) entry: Option<TemplateRef<'ast>>,
    pub(crate) program: BackendProgram<'ast>,
    /// Flattened descriptor per type object. Keys are not rooted; a swept
    /// type's handle can never be produced again, so its entry is inert.
    pub(crate) backend_cache: FxHashMap<TypeRef<'ast>, BackendTypeId>,
    /// Concrete functions by the hash of their mangled name.
    pub(crate) concrete: FxHashMap<SymbolHash, ConcreteRef<'ast>>,
    /// Nesting of compile-time function calls being interpreted.
    pub(crate) call_depth: usize,
}

impl<'ast> CompilationContext<'ast> {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            heap: ObjectHeap::with_config(config.gc),
            config,
            types: TypeCache::new(),
            names: NameRegistry::default(),
            imports: FxHashMap::default(),
            importer: None,
            diagnostics: Vec::new(),
            errored: false,
            root: None,
            entry: None,
            program: BackendProgram::new(),
            backend_cache: FxHashMap::default(),
            concrete: FxHashMap::default(),
            call_depth: 0,
        }
    }

    /// Install the collaborator that locates and parses imports.
    pub fn with_importer(mut self, importer: impl ImportResolver<'ast> + 'ast) -> Self {
        self.importer = Some(Box::new(importer));
        self
    }

    pub fn set_importer(&mut self, importer: impl ImportResolver<'ast> + 'ast) {
        self.importer = Some(Box::new(importer));
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn heap(&self) -> &ObjectHeap<'ast> {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut ObjectHeap<'ast> {
        &mut self.heap
    }

    pub fn program(&self) -> &BackendProgram<'ast> {
        &self.program
    }

    pub fn root(&self) -> Option<TypeRef<'ast>> {
        self.root
    }

    pub fn entry(&self) -> Option<TemplateRef<'ast>> {
        self.entry
    }

    // Diagnostics

    /// Record a diagnostic and mark the unit as errored.
    pub fn raise(&mut self, error: CompileError) {
        tracing::warn!(code = %error.code, "{error}");
        self.errored = true;
        self.diagnostics.push(error);
    }

    pub fn errored(&self) -> bool {
        self.errored
    }

    pub fn diagnostics(&self) -> &[CompileError] {
        &self.diagnostics
    }

    pub(crate) fn take_diagnostics(&mut self) -> Vec<CompileError> {
        std::mem::take(&mut self.diagnostics)
    }

    // Object access

    pub fn ty(&self, ty: TypeRef<'ast>) -> &Type<'ast> {
        self.heap.get(ty)
    }

    pub fn ty_mut(&mut self, ty: TypeRef<'ast>) -> &mut Type<'ast> {
        self.heap.get_mut(ty)
    }

    pub fn value(&self, value: ValueRef<'ast>) -> &Value<'ast> {
        self.heap.get(value)
    }

    pub fn scope(&self, scope: ScopeRef<'ast>) -> &Scope<'ast> {
        self.heap.get(scope)
    }

    pub fn scope_mut(&mut self, scope: ScopeRef<'ast>) -> &mut Scope<'ast> {
        self.heap.get_mut(scope)
    }

    pub fn template(&self, template: TemplateRef<'ast>) -> &FunctionTemplate<'ast> {
        self.heap.get(template)
    }

    pub fn template_mut(&mut self, template: TemplateRef<'ast>) -> &mut FunctionTemplate<'ast> {
        self.heap.get_mut(template)
    }

    pub fn function_set(&self, set: FunctionSetRef<'ast>) -> &FunctionSet<'ast> {
        self.heap.get(set)
    }

    pub fn concrete_function(&self, concrete: ConcreteRef<'ast>) -> &ConcreteFunction<'ast> {
        self.heap.get(concrete)
    }

    /// Look up a concrete function by mangled name.
    pub fn find_concrete(&self, mangled: &str) -> Option<ConcreteRef<'ast>> {
        self.concrete.get(&SymbolHash::function(mangled)).copied()
    }

    // Scopes

    /// A top-level scope for a file in `directory`.
    pub fn root_scope(&mut self, directory: Option<&Path>) -> Scoped<Scope<'ast>> {
        self.heap.alloc(Scope::root(directory.map(Path::to_path_buf)))
    }

    /// A new scope nested in `parent`.
    pub fn child_scope(&mut self, parent: ScopeRef<'ast>) -> Scoped<Scope<'ast>> {
        self.heap.alloc(Scope::child(parent))
    }

    /// Directory of the file a scope belongs to.
    pub fn scope_directory(&self, scope: ScopeRef<'ast>) -> Option<PathBuf> {
        let mut current = Some(scope);
        while let Some(scope) = current {
            let data = self.scope(scope);
            if let Some(directory) = &data.directory {
                return Some(directory.clone());
            }
            current = data.parent;
        }
        None
    }
}
