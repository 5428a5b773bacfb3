//! Programmatic construction of prefabs, wiring terminals by name.
//!
//! Hosts and tests use this instead of spelling out terminal keys:
//!
//! ```
//! use voxscript::graph::build::PrefabBuilder;
//! use voxscript::graph::catalog::ids;
//!
//! let mut b = PrefabBuilder::new("level");
//! let a = b.place(ids::PLAY_SENSOR, (0, 0, 2));
//! let win = b.place(ids::WIN, (0, 0, 0));
//! b.wire(a, "On Play", win, "Before").unwrap();
//! let prefab = b.build();
//! assert_eq!(prefab.connections.len(), 1);
//! ```

use std::collections::BTreeMap;

use crate::error::BuildError;
use crate::graph::catalog::{self, Terminal};
use crate::graph::{
    Block, BlockId, Connection, Endpoint, GridPos, Port, PortDir, Prefab, Setting, TerminalKey,
    VOXELS_PER_CELL,
};

#[derive(Debug)]
pub struct PrefabBuilder {
    prefab: Prefab,
    terminals: BTreeMap<GridPos, Vec<Terminal>>,
    /// Exposed ports in declaration order; keys are assigned on `build`.
    ports: Vec<(String, PortDir, Endpoint, Terminal)>,
}

impl PrefabBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            prefab: Prefab::new(name),
            terminals: BTreeMap::new(),
            ports: Vec::new(),
        }
    }

    /// Place a built-in block.
    pub fn place(&mut self, id: BlockId, pos: impl Into<GridPos>) -> GridPos {
        self.place_with(id, pos, Vec::new())
    }

    pub fn place_with(
        &mut self,
        id: BlockId,
        pos: impl Into<GridPos>,
        settings: Vec<Setting>,
    ) -> GridPos {
        let pos = pos.into();
        let layout = catalog::lookup(id)
            .map(|def| def.layout())
            .unwrap_or_default();
        self.terminals.insert(pos, layout);
        self.prefab.blocks.push(Block { id, pos, settings });
        pos
    }

    /// Place a custom block standing for `inner`, placed under `id`.
    pub fn place_custom(&mut self, id: BlockId, pos: impl Into<GridPos>, inner: &Prefab) -> GridPos {
        let pos = pos.into();
        let layout = inner
            .ports
            .iter()
            .map(|p| Terminal {
                name: p.name.clone().into(),
                key: p.key,
                wire: p.wire,
                dir: p.dir,
            })
            .collect();
        self.terminals.insert(pos, layout);
        self.prefab.blocks.push(Block::new(id, pos));
        pos
    }

    /// A number literal.
    pub fn number(&mut self, value: f32, pos: impl Into<GridPos>) -> GridPos {
        self.place_with(catalog::ids::NUMBER, pos, vec![Setting::Number(value)])
    }

    fn terminal(&self, pos: GridPos, name: &str) -> Result<&Terminal, BuildError> {
        let layout = self
            .terminals
            .get(&pos)
            .ok_or(BuildError::UnknownBlock { pos })?;
        layout
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| BuildError::UnknownTerminal {
                pos,
                name: name.to_string(),
            })
    }

    /// Wire terminal `a_name` of the block at `a` to `b_name` of the block
    /// at `b`. Direction and kinds are checked by the compiler, not here.
    pub fn wire(
        &mut self,
        a: GridPos,
        a_name: &str,
        b: GridPos,
        b_name: &str,
    ) -> Result<&mut Self, BuildError> {
        let a_key = self.terminal(a, a_name)?.key;
        let b_key = self.terminal(b, b_name)?.key;
        self.prefab.connections.push(Connection::new(
            Endpoint::new(a, a_key),
            Endpoint::new(b, b_key),
        ));
        Ok(self)
    }

    /// Expose terminal `inner_name` of the block at `inner` as a port of
    /// this prefab. The port's direction and wire follow the inner
    /// terminal.
    pub fn port(
        &mut self,
        name: impl Into<String>,
        inner: GridPos,
        inner_name: &str,
    ) -> Result<&mut Self, BuildError> {
        let terminal = self.terminal(inner, inner_name)?.clone();
        let endpoint = Endpoint::new(inner, terminal.key);
        self.ports
            .push((name.into(), terminal.dir, endpoint, terminal));
        Ok(self)
    }

    /// Finish the prefab. Port keys follow the built-in layout: the first
    /// void input and output take the before and after faces, other
    /// inputs the left rows and other outputs the right rows.
    pub fn build(mut self) -> Prefab {
        let cell = VOXELS_PER_CELL as i16;
        let mut before = None;
        let mut after = None;
        let mut left = Vec::new();
        let mut right = Vec::new();
        for (i, (_, dir, _, t)) in self.ports.iter().enumerate() {
            match dir {
                PortDir::In if t.wire.is_void() && before.is_none() => before = Some(i),
                PortDir::Out if t.wire.is_void() && after.is_none() => after = Some(i),
                PortDir::In => left.push(i),
                PortDir::Out => right.push(i),
            }
        }
        let depth = left.len().max(right.len()).max(1) as i16;
        let mut keys = vec![TerminalKey::default(); self.ports.len()];
        if let Some(i) = before {
            keys[i] = TerminalKey::new(3, 1, cell * depth - 1);
        }
        if let Some(i) = after {
            keys[i] = TerminalKey::new(3, 1, 0);
        }
        for (row, i) in left.into_iter().enumerate() {
            keys[i] = TerminalKey::new(0, 1, cell * (depth - 1 - row as i16) + 3);
        }
        for (row, i) in right.into_iter().enumerate() {
            keys[i] = TerminalKey::new(2 * cell - 1, 1, cell * (depth - 1 - row as i16) + 3);
        }
        self.prefab.ports = self
            .ports
            .into_iter()
            .zip(keys)
            .map(|((name, dir, inner, t), key)| Port {
                name,
                key,
                wire: t.wire,
                dir,
                inner,
            })
            .collect();
        self.prefab
    }
}
