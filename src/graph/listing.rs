//! Textual listing of a prefab: one line per block, in spatial order.
//!
//! Diagnostics point into this text, the way a source compiler points
//! into source code.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::graph::catalog;
use crate::graph::order::sort_spatially;
use crate::graph::{Block, GridPos, Prefab, PrefabList, Setting};
use crate::span::Span;

#[derive(Clone, Debug)]
pub struct Listing {
    pub name: String,
    pub text: String,
    header: Span,
    lines: BTreeMap<GridPos, Span>,
}

impl Listing {
    pub fn of(list: &PrefabList, prefab: &Prefab) -> Self {
        let mut text = String::new();
        let _ = writeln!(text, "prefab {}", prefab.name);
        let header = Span::new(0, text.len().saturating_sub(1) as u32);

        let mut blocks: Vec<&Block> = prefab.blocks.iter().collect();
        sort_spatially(&mut blocks, |b| b.pos);

        let mut lines = BTreeMap::new();
        for block in blocks {
            let start = text.len() + 2;
            let _ = write!(text, "  {} {}", block.pos, block_name(list, block));
            for setting in &block.settings {
                let _ = write!(text, " {}", setting_text(setting));
            }
            lines.entry(block.pos).or_insert(Span::new(start as u32, text.len() as u32));
            text.push('\n');
        }

        Self {
            name: prefab.name.clone(),
            text,
            header,
            lines,
        }
    }

    /// Span of the block at `pos`, or the header line.
    pub fn span(&self, pos: Option<GridPos>) -> Span {
        pos.and_then(|p| self.lines.get(&p).copied())
            .unwrap_or(self.header)
    }
}

fn block_name(list: &PrefabList, block: &Block) -> String {
    if let Some(def) = catalog::lookup(block.id) {
        return format!("{} {}", block.id, def.name);
    }
    match list.prefab_index(block.id) {
        Some(i) => format!("{} [{}]", block.id, list.prefabs[i].name),
        None => format!("{}", block.id),
    }
}

fn setting_text(setting: &Setting) -> String {
    match setting {
        Setting::Number(n) => format!("{}", n),
        Setting::Vector(v) => format!("{}", v),
        Setting::Text(s) => format!("{:?}", s),
        Setting::Bool(b) => format!("{}", b),
        Setting::Choice(c) => format!("choice:{}", c),
        Setting::Object(o) => format!("object#{}", o),
    }
}
