//! Topologically orders modules from the union of their files' imports
//! (spec §4.3 `ImportGraph` / §3 `DepGraph`).
//!
//! The DFS-with-temporary-marks cycle detection here is a direct
//! generalisation of the teacher's dependency resolver
//! (`examples/nyejames-beanstalk/src/compiler_frontend/module_dependencies.rs`),
//! adapted from per-header nodes to per-module nodes.

use crate::diagnostics::{CompileError, ErrorKind};
use crate::resolver::FileImport;
use rustc_hash::{FxHashMap, FxHashSet};

/// Builds the adjacency list (module name -> union of imported module
/// names) from every file's import table.
fn build_adjacency(file_imports: &[FileImport]) -> FxHashMap<String, FxHashSet<String>> {
    let mut graph: FxHashMap<String, FxHashSet<String>> = FxHashMap::default();
    for file in file_imports {
        let entry = graph.entry(file.module_name.clone()).or_default();
        for imported in &file.imports {
            if imported != &file.module_name {
                entry.insert(imported.clone());
            }
        }
    }
    // Ensure every imported module has a node even if none of its own
    // files have been seen yet (caller resolves that separately).
    for file in file_imports {
        for imported in &file.imports {
            graph.entry(imported.clone()).or_default();
        }
    }
    graph
}

enum Mark {
    Temporary,
    Permanent,
}

/// Topologically sorts modules such that each module appears only after
/// every module it imports. `builtin_module` is always pinned first
/// regardless of the sort (spec §3 invariant: "the builtin module is
/// always present and always first").
pub fn topological_order(
    file_imports: &[FileImport],
    builtin_module: &str,
) -> Result<Vec<String>, CompileError> {
    let graph = build_adjacency(file_imports);

    // Deterministic visiting order: first-seen order of module names.
    let mut seen_order: Vec<String> = Vec::new();
    let mut seen: FxHashSet<String> = FxHashSet::default();
    for file in file_imports {
        if seen.insert(file.module_name.clone()) {
            seen_order.push(file.module_name.clone());
        }
        for imported in &file.imports {
            if seen.insert(imported.clone()) {
                seen_order.push(imported.clone());
            }
        }
    }

    let mut marks: FxHashMap<String, Mark> = FxHashMap::default();
    let mut sorted: Vec<String> = Vec::with_capacity(seen_order.len());

    for module in &seen_order {
        if !matches!(marks.get(module), Some(Mark::Permanent)) {
            let mut stack = Vec::new();
            visit(module, &graph, &mut marks, &mut sorted, &mut stack)?;
        }
    }

    // Pin the builtin module first, preserving the relative order of
    // everything else.
    sorted.retain(|m| m != builtin_module);
    sorted.insert(0, builtin_module.to_string());
    Ok(sorted)
}

fn visit(
    module: &str,
    graph: &FxHashMap<String, FxHashSet<String>>,
    marks: &mut FxHashMap<String, Mark>,
    sorted: &mut Vec<String>,
    stack: &mut Vec<String>,
) -> Result<(), CompileError> {
    if matches!(marks.get(module), Some(Mark::Temporary)) {
        let mut cycle_path = stack.clone();
        cycle_path.push(module.to_string());
        let start = cycle_path.iter().position(|m| m == module).unwrap_or(0);
        let cycle = cycle_path[start..].join(" -> ");
        return Err(CompileError::new(
            ErrorKind::ImportCycle,
            format!("Import cycle detected: {cycle}"),
        ));
    }

    if matches!(marks.get(module), Some(Mark::Permanent)) {
        return Ok(());
    }

    marks.insert(module.to_string(), Mark::Temporary);
    stack.push(module.to_string());

    if let Some(dependencies) = graph.get(module) {
        let mut deps: Vec<&String> = dependencies.iter().collect();
        deps.sort();
        for dependency in deps {
            visit(dependency, graph, marks, sorted, stack)?;
        }
    }

    stack.pop();
    marks.insert(module.to_string(), Mark::Permanent);
    sorted.push(module.to_string());
    Ok(())
}
