//! Graph-to-AST compiler.
//!
//! Turns the blocks and wires of a prefab into an [`Ast`]: nodes are
//! instantiated per block family, wires are validated and oriented,
//! adjacency wires are synthesized, inputs are resolved to producers,
//! custom blocks are compiled into shared nested ASTs, gotos are bound to
//! labels and the value graph is checked for cycles.

mod cycles;
mod goto;
mod instantiate;
mod resolve;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::config::Limits;
use crate::error::{BlockRef, CompileError, CompileWarning, Result};
use crate::graph::PrefabList;
use crate::signal::{SignalKind, Variable, VariableId};
use crate::syntax::{Ast, VariableTable};

/// Options controlling compilation.
#[derive(Clone, Debug)]
pub struct CompileOptions {
    /// Levels of custom blocks allowed below the entry prefab.
    pub max_nesting_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self::from(&Limits::default())
    }
}

impl From<&Limits> for CompileOptions {
    fn from(limits: &Limits) -> Self {
        Self {
            max_nesting_depth: limits.max_nesting_depth,
        }
    }
}

/// A compiled entry prefab and every variable it or its nested programs
/// reference.
#[derive(Clone, Debug)]
pub struct Program {
    pub ast: Arc<Ast>,
    pub variables: Vec<Variable>,
    /// Findings that did not stop compilation. Each prefab contributes
    /// its warnings once.
    pub warnings: Vec<CompileWarning>,
}

impl Program {
    pub fn variable(&self, name: &str, kind: SignalKind) -> Option<VariableId> {
        self.variables
            .iter()
            .find(|v| v.name == name && v.kind == kind)
            .map(|v| v.id)
    }

    /// Canonical listing: the AST dump followed by the variable table.
    pub fn dump(&self) -> String {
        let mut out = self.ast.dump();
        for v in &self.variables {
            out.push_str(&format!("var v{} {} {:?}\n", v.id.0, v.kind, v.name));
        }
        out
    }

    /// blake3 digest of the canonical listing, hex encoded. Identical
    /// inputs compile to identical fingerprints.
    pub fn fingerprint(&self) -> String {
        blake3::hash(self.dump().as_bytes()).to_hex().to_string()
    }
}

/// Compile the prefab at `entry` and everything it nests.
pub fn compile(list: &PrefabList, entry: usize, options: &CompileOptions) -> Result<Program> {
    let mut compiler = Compiler::new(list, options);
    let ast = compiler.prefab(entry, None)?;
    Ok(Program {
        ast,
        variables: compiler.vars.into_vec(),
        warnings: compiler.warnings,
    })
}

/// Compile several entry prefabs concurrently. Each entry gets its own
/// variable table.
pub fn compile_many(
    list: &PrefabList,
    entries: &[usize],
    options: &CompileOptions,
) -> Vec<Result<Program>> {
    entries
        .par_iter()
        .map(|&entry| compile(list, entry, options))
        .collect()
}

// ─── Compiler State ────────────────────────────────────────────────

struct Compiler<'a> {
    list: &'a PrefabList,
    options: &'a CompileOptions,
    vars: VariableTable,
    warnings: Vec<CompileWarning>,
    /// Compiled prefabs by index; each is compiled once per compilation.
    cache: BTreeMap<usize, Arc<Ast>>,
    /// Prefabs currently being compiled, outermost first.
    stack: Vec<usize>,
}

impl<'a> Compiler<'a> {
    fn new(list: &'a PrefabList, options: &'a CompileOptions) -> Self {
        Self {
            list,
            options,
            vars: VariableTable::default(),
            warnings: Vec::new(),
            cache: BTreeMap::new(),
            stack: Vec::new(),
        }
    }

    fn nesting_error(&self, index: usize) -> CompileError {
        let mut chain: Vec<String> = self
            .stack
            .iter()
            .map(|&i| self.list.prefabs[i].name.clone())
            .collect();
        chain.push(self.list.prefabs[index].name.clone());
        CompileError::NestingTooDeep {
            chain,
            limit: self.options.max_nesting_depth,
        }
    }

    /// The AST of prefab `index`, compiling it on first use. `site` is the
    /// custom block that refers to it.
    fn prefab(&mut self, index: usize, site: Option<BlockRef>) -> Result<Arc<Ast>> {
        if index >= self.list.prefabs.len() {
            return Err(CompileError::UnknownPrefab { index, block: site });
        }
        // Levels of nesting above this prefab.
        let above = self.stack.len();
        if let Some(ast) = self.cache.get(&index) {
            if above + ast.height > self.options.max_nesting_depth {
                return Err(self.nesting_error(index));
            }
            return Ok(Arc::clone(ast));
        }
        if self.stack.contains(&index) || above > self.options.max_nesting_depth {
            return Err(self.nesting_error(index));
        }

        self.stack.push(index);
        let built = self.build(index);
        self.stack.pop();
        let ast = Arc::new(built?);

        debug!(
            prefab = %ast.prefab,
            nodes = ast.nodes.len(),
            roots = ast.roots.len(),
            height = ast.height,
            "compiled prefab"
        );
        self.cache.insert(index, Arc::clone(&ast));
        Ok(ast)
    }
}
