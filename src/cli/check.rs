use std::path::PathBuf;
use std::process;

use clap::Args;

use super::{load_config, load_program, report_compile, report_warnings};

#[derive(Args)]
pub struct CheckArgs {
    /// Program file (JSON prefab list)
    pub input: PathBuf,
    /// Check only this prefab (name or index) instead of all of them
    #[arg(long)]
    pub entry: Option<String>,
}

pub fn cmd_check(args: CheckArgs) {
    let CheckArgs { input, entry } = args;
    let config = load_config(&input);
    let list = load_program(&input, &config);
    let options = voxscript::CompileOptions::from(&config.limits);

    let entries: Vec<usize> = match entry.as_deref() {
        Some(e) => vec![super::resolve_entry(&list, Some(e))],
        None => (0..list.prefabs.len()).collect(),
    };

    let results = voxscript::compile_many(&list, &entries, &options);
    let mut failed = false;
    // Nested prefabs are compiled again under every entry that uses them.
    let mut warnings = Vec::new();
    for (&index, result) in entries.iter().zip(&results) {
        match result {
            Ok(program) => {
                for w in &program.warnings {
                    if !warnings.contains(w) {
                        warnings.push(w.clone());
                    }
                }
            }
            Err(err) => {
                report_compile(&list, index, err);
                failed = true;
            }
        }
    }
    warnings.sort_by(|a, b| a.prefab().cmp(b.prefab()));
    report_warnings(&list, &warnings);
    if failed {
        process::exit(1);
    }
    eprintln!("OK: {} ({} prefabs)", input.display(), entries.len());
}
