pub mod check;
pub mod dump;
pub mod run;

use std::path::Path;
use std::process;

use voxscript::diagnostic::{render_diagnostics, Diagnostic};
use voxscript::graph::listing::Listing;
use voxscript::{CompileError, CompileWarning, Config, PrefabList, Program, RuntimeError};

/// Load the config found next to `input` or in its ancestors.
pub fn load_config(input: &Path) -> Config {
    let dir = input.parent().unwrap_or(Path::new("."));
    match Config::discover(dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

/// Read a program file. A file without its own `builtin_threshold`
/// takes the configured one.
pub fn load_program(input: &Path, config: &Config) -> PrefabList {
    let text = match std::fs::read_to_string(input) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", input.display(), e);
            process::exit(1);
        }
    };
    let value: serde_json::Value = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: invalid program '{}': {}", input.display(), e);
            process::exit(1);
        }
    };
    let has_threshold = value.get("builtin_threshold").is_some();
    let mut list: PrefabList = match serde_json::from_value(value) {
        Ok(list) => list,
        Err(e) => {
            eprintln!("error: invalid program '{}': {}", input.display(), e);
            process::exit(1);
        }
    };
    if !has_threshold {
        list.builtin_threshold = config.builtin_threshold;
    }
    list
}

/// Resolve `--entry`: a prefab name, or an index into the list.
pub fn resolve_entry(list: &PrefabList, entry: Option<&str>) -> usize {
    let Some(entry) = entry else {
        return 0;
    };
    if let Some(index) = list.find(entry) {
        return index;
    }
    match entry.parse::<usize>() {
        Ok(index) => index,
        Err(_) => {
            eprintln!("error: no prefab named '{}'", entry);
            process::exit(1);
        }
    }
}

/// Listing of the prefab named `prefab`, or of the entry.
fn listing_for(list: &PrefabList, prefab: Option<&str>, entry: usize) -> Option<Listing> {
    let index = prefab.and_then(|name| list.find(name)).unwrap_or(entry);
    list.prefabs.get(index).map(|p| Listing::of(list, p))
}

fn emit(diagnostic: &Diagnostic, listing: &Listing) {
    if diagnostic.render(&listing.name, &listing.text).is_err() {
        eprintln!("error: {}", diagnostic.message);
    }
}

/// Compile `entry`, rendering the error and exiting on failure.
pub fn compile_or_exit(list: &PrefabList, entry: usize, config: &Config) -> Program {
    let options = voxscript::CompileOptions::from(&config.limits);
    match voxscript::compile(list, entry, &options) {
        Ok(program) => program,
        Err(err) => {
            report_compile(list, entry, &err);
            process::exit(1);
        }
    }
}

pub fn report_compile(list: &PrefabList, entry: usize, err: &CompileError) {
    match listing_for(list, err.prefab(), entry) {
        Some(listing) => emit(&Diagnostic::from_compile(err, &listing), &listing),
        None => eprintln!("error: {}", err),
    }
}

/// Render warnings grouped by the prefab they were found in.
pub fn report_warnings(list: &PrefabList, warnings: &[CompileWarning]) {
    let mut prefabs: Vec<&str> = warnings.iter().map(CompileWarning::prefab).collect();
    prefabs.dedup();
    for prefab in prefabs {
        let group = warnings.iter().filter(|w| w.prefab() == prefab);
        match list.find(prefab).map(|i| Listing::of(list, &list.prefabs[i])) {
            Some(listing) => {
                let diagnostics: Vec<Diagnostic> =
                    group.map(|w| Diagnostic::from_warning(w, &listing)).collect();
                if render_diagnostics(&diagnostics, &listing.name, &listing.text).is_err() {
                    for d in &diagnostics {
                        eprintln!("warning: {}", d.message);
                    }
                }
            }
            None => group.for_each(|w| eprintln!("warning: {}", w)),
        }
    }
}

pub fn report_runtime(list: &PrefabList, entry: usize, err: &RuntimeError) {
    let prefab = err.block().map(|b| b.prefab.as_str());
    match listing_for(list, prefab, entry) {
        Some(listing) => emit(&Diagnostic::from_runtime(err, &listing), &listing),
        None => eprintln!("error: {}", err),
    }
}
