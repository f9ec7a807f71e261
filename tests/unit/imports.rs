//! Imports loaded from disk through `FsImportResolver`.

use std::cell::Cell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use cheese::ast::{AstBuilder, BinaryOp, DeclFlags, FunctionBody, StructureDecl};
use cheese::{CompilationContext, CompilerConfig, ErrorCode, FsImportResolver};

use crate::{arena, init_logging, root_member};

/// Build a resolver whose parser is `parse`.
fn resolver<'ast, F>(parse: F) -> FsImportResolver<F>
where
    F: FnMut(&Path, &str) -> cheese::Result<&'ast StructureDecl<'ast>>,
{
    FsImportResolver::new(parse)
}

fn write(dir: &Path, relative: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create source directory");
    }
    fs::write(&path, "// parsed by the test resolver\n").expect("write source file");
}

#[test]
fn test_imports_from_disk() {
    init_logging();
    let dir = tempfile::tempdir().expect("temp dir");
    write(dir.path(), "main.chs");
    write(dir.path(), "util.chs");
    write(dir.path(), "math/lib.chs");

    let arena = arena();
    let b = AstBuilder::new(&arena);
    let util = b.structure(&[b.variable("answer", None, b.int(40), DeclFlags::PUBLIC)]);
    let math = b.structure(&[
        b.import("util"),
        b.variable("two", None, b.int(2), DeclFlags::PUBLIC),
    ]);
    let sum = b.binary(
        BinaryOp::Add,
        b.member(b.name("util"), "answer"),
        b.member(b.name("math"), "two"),
    );
    let root = b.structure(&[
        b.import("util"),
        b.import("math"),
        b.variable("total", None, sum, DeclFlags::empty()),
        b.function("main", &[], b.void_type(), FunctionBody::Block(b.block(&[])), DeclFlags::ENTRY),
    ]);

    let parsed = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&parsed);
    let importer = resolver(move |path, _source| {
        counter.set(counter.get() + 1);
        match path.parent().and_then(Path::file_name).and_then(|name| name.to_str()) {
            Some("math") => Ok(math),
            _ => Ok(util),
        }
    });
    let config = CompilerConfig::default().with_library_root(dir.path());
    let mut ctx = CompilationContext::new(config).with_importer(importer);
    let main_path = dir.path().join("main.chs");
    assert!(ctx.analyze(root, Some(&main_path)).is_ok());
    assert!(!ctx.errored(), "{:?}", ctx.diagnostics());

    assert_eq!(root_member(&mut ctx, "total").as_deref(), Some("42"));
    // `util` is shared between the root and `math`.
    assert_eq!(parsed.get(), 2);
    assert_eq!(ctx.imported_structures().len(), 3);
    let mut names: Vec<String> = ctx
        .imported_structures()
        .into_iter()
        .map(|st| ctx.type_name(st))
        .collect();
    names.sort();
    assert_eq!(names, vec!["main", "math", "util"]);
}

#[test]
fn test_unresolved_import_is_fatal() {
    init_logging();
    let dir = tempfile::tempdir().expect("temp dir");
    write(dir.path(), "main.chs");

    let arena = arena();
    let b = AstBuilder::new(&arena);
    // No flagged entry, so the search has to force the import.
    let root = b.structure(&[
        b.import("absent"),
        b.function("main", &[], b.void_type(), FunctionBody::Block(b.block(&[])), DeclFlags::empty()),
    ]);
    let importer = resolver(move |_, _| Ok(root));
    let mut ctx = CompilationContext::new(CompilerConfig::default()).with_importer(importer);
    let err = ctx.analyze(root, Some(&dir.path().join("main.chs"))).err();
    assert_eq!(err.map(|e| e.code), Some(ErrorCode::UnresolvedImport));
}

#[test]
fn test_unresolved_import_after_entry_is_reported() {
    init_logging();
    let dir = tempfile::tempdir().expect("temp dir");
    write(dir.path(), "main.chs");

    let arena = arena();
    let b = AstBuilder::new(&arena);
    let root = b.structure(&[
        b.import("absent"),
        b.function("main", &[], b.void_type(), FunctionBody::Block(b.block(&[])), DeclFlags::ENTRY),
    ]);
    let importer = resolver(move |_, _| Ok(root));
    let mut ctx = CompilationContext::new(CompilerConfig::default()).with_importer(importer);
    assert!(ctx.analyze(root, Some(&dir.path().join("main.chs"))).is_ok());
    assert!(ctx.errored());
    assert_eq!(
        ctx.diagnostics().iter().map(|e| e.code).collect::<Vec<_>>(),
        vec![ErrorCode::UnresolvedImport]
    );
}

#[test]
fn test_parse_failure_surfaces() {
    init_logging();
    let dir = tempfile::tempdir().expect("temp dir");
    write(dir.path(), "broken.chs");

    let importer = resolver(|path, _| {
        Err(cheese::CompileError::new(
            ErrorCode::UnresolvedImport,
            format!("syntax error in `{}`", path.display()),
        ))
    });
    let mut ctx = CompilationContext::new(CompilerConfig::default()).with_importer(importer);
    let err = ctx.import_structure(Some(dir.path()), "broken").err();
    assert!(err.is_some_and(|e| e.message.contains("syntax error")));
    assert!(ctx.imported_structures().is_empty());
}
