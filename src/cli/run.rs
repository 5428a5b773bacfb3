use std::path::PathBuf;
use std::process;

use clap::Args;
use tracing::info;

use voxscript::SimContext;

use super::{compile_or_exit, load_config, load_program, report_runtime, resolve_entry};

#[derive(Args)]
pub struct RunArgs {
    /// Program file (JSON prefab list)
    pub input: PathBuf,
    /// Entry prefab, by name or index (default: 0)
    #[arg(long)]
    pub entry: Option<String>,
    /// Frames to run
    #[arg(long, default_value_t = 1)]
    pub frames: u64,
    /// Step budget per frame (overrides the config file)
    #[arg(long)]
    pub max_steps: Option<u64>,
    /// Random seed
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

pub fn cmd_run(args: RunArgs) {
    let mut config = load_config(&args.input);
    if let Some(steps) = args.max_steps {
        config.limits.max_steps = steps;
    }
    let list = load_program(&args.input, &config);
    let entry = resolve_entry(&list, args.entry.as_deref());
    let program = compile_or_exit(&list, entry, &config);

    let mut ctx = SimContext::new(args.seed);
    for frame in 0..args.frames {
        let seen = (ctx.inspections.len(), ctx.effects.len());
        let result = voxscript::run_frame(&program, &mut ctx, &config.limits);

        for inspection in &ctx.inspections[seen.0..] {
            println!(
                "frame {} inspect {}: {}",
                frame, inspection.block.pos, inspection.value
            );
        }
        for effect in &ctx.effects[seen.1..] {
            println!("frame {} {:?}", frame, effect);
        }

        match result {
            Ok(report) => info!(frame, steps = report.steps, "frame done"),
            Err(err) => {
                report_runtime(&list, entry, &err);
                process::exit(1);
            }
        }
        ctx.next_frame();
    }
}
