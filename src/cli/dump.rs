use std::path::PathBuf;

use clap::Args;

use super::{compile_or_exit, load_config, load_program, resolve_entry};

#[derive(Args)]
pub struct DumpArgs {
    /// Program file (JSON prefab list)
    pub input: PathBuf,
    /// Entry prefab, by name or index (default: 0)
    #[arg(long)]
    pub entry: Option<String>,
}

pub fn cmd_dump(args: DumpArgs) {
    let config = load_config(&args.input);
    let list = load_program(&args.input, &config);
    let entry = resolve_entry(&list, args.entry.as_deref());
    let program = compile_or_exit(&list, entry, &config);

    print!("{}", program.dump());
    println!("fingerprint {}", program.fingerprint());
}
