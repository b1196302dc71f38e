//! Build-wide symbol table shared by every parser (spec §3 `SymbolTable`).
//!
//! Structurally this is the teacher's `StringTable`
//! (`examples/nyejames-beanstalk/src/compiler_frontend/string_interning.rs`)
//! generalised from a single string-interning map to the five maps the
//! driver actually needs, keeping the same `FxHashMap`-backed,
//! insert-if-absent style.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};

pub const TEST_FUNCTION_PREFIX: &str = "test_";

#[derive(Debug, Clone, Default)]
pub struct ModuleDescriptor {
    pub name: String,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct FunctionDescriptor {
    pub name: String,
    pub module: String,
}

#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    pub name: String,
    pub module: String,
}

/// Shared across every parser for the lifetime of one build (spec §3
/// lifecycle note). Mutated during the `decl` pass, read during `main`.
#[derive(Debug, Default)]
pub struct SymbolTable {
    modules: FxHashMap<String, ModuleDescriptor>,
    imports: FxHashSet<String>,
    functions: FxHashMap<String, FunctionDescriptor>,
    types: FxHashMap<String, TypeDescriptor>,
    obf_names: FxHashMap<u32, String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Idempotent: re-registering the same file against the same module on
    /// a repeated `decl` run is a no-op, satisfying the "idempotent w.r.t.
    /// symbol-table contents" requirement.
    pub fn register_module_file(&mut self, module_name: &str, file: &Path) {
        let descriptor = self
            .modules
            .entry(module_name.to_string())
            .or_insert_with(|| ModuleDescriptor {
                name: module_name.to_string(),
                files: Vec::new(),
            });
        if !descriptor.files.iter().any(|f| f == file) {
            descriptor.files.push(file.to_path_buf());
        }
    }

    pub fn record_import(&mut self, module_name: &str) {
        self.imports.insert(module_name.to_string());
    }

    pub fn imports(&self) -> &FxHashSet<String> {
        &self.imports
    }

    pub fn module(&self, name: &str) -> Option<&ModuleDescriptor> {
        self.modules.get(name)
    }

    /// Every registered module name, sorted for deterministic
    /// `__init_module` call ordering in `MainEmitter`.
    pub fn module_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Declares a function. Returns `false` without overwriting the
    /// existing descriptor if the name is already declared, so a repeated
    /// `decl` pass over the same file stays idempotent.
    pub fn declare_function(&mut self, name: &str, module: &str) -> bool {
        match self.functions.entry(name.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(FunctionDescriptor {
                    name: name.to_string(),
                    module: module.to_string(),
                });
                true
            }
        }
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.functions.get(name)
    }

    /// Names of every declared function, sorted for deterministic
    /// entry-point generation (used by `MainEmitter`'s script mode).
    pub fn function_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.values().map(|f| f.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Names of every declared function beginning with `test_`, sorted for
    /// deterministic entry-point generation (used by `MainEmitter`).
    pub fn test_function_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .functions
            .values()
            .map(|f| f.name.as_str())
            .filter(|name| name.starts_with(TEST_FUNCTION_PREFIX))
            .collect();
        names.sort_unstable();
        names
    }

    pub fn declare_type(&mut self, name: &str, module: &str) -> bool {
        match self.types.entry(name.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(TypeDescriptor {
                    name: name.to_string(),
                    module: module.to_string(),
                });
                true
            }
        }
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Obfuscation-mode symbol renaming: `obf_id -> renamed_name`.
    pub fn set_obfuscated_name(&mut self, obf_id: u32, renamed_name: impl Into<String>) {
        self.obf_names.insert(obf_id, renamed_name.into());
    }

    pub fn obfuscated_name(&self, obf_id: u32) -> Option<&str> {
        self.obf_names.get(&obf_id).map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registering_the_same_file_twice_does_not_duplicate() {
        let mut table = SymbolTable::new();
        table.register_module_file("net", Path::new("net/http.v"));
        table.register_module_file("net", Path::new("net/http.v"));
        assert_eq!(table.module("net").unwrap().files.len(), 1);
    }

    #[test]
    fn redeclaring_a_function_is_a_no_op() {
        let mut table = SymbolTable::new();
        assert!(table.declare_function("main", "main"));
        assert!(!table.declare_function("main", "main"));
        assert_eq!(table.function("main").unwrap().module, "main");
    }

    #[test]
    fn function_names_lists_everything_sorted() {
        let mut table = SymbolTable::new();
        table.declare_function("b", "main");
        table.declare_function("a", "main");
        assert_eq!(table.function_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_function_names_are_filtered_and_sorted() {
        let mut table = SymbolTable::new();
        table.declare_function("test_b", "main");
        table.declare_function("helper", "main");
        table.declare_function("test_a", "main");
        assert_eq!(table.test_function_names(), vec!["test_a", "test_b"]);
    }

    #[test]
    fn obfuscated_names_round_trip() {
        let mut table = SymbolTable::new();
        table.set_obfuscated_name(7, "f_7");
        assert_eq!(table.obfuscated_name(7), Some("f_7"));
        assert_eq!(table.obfuscated_name(8), None);
    }
}
