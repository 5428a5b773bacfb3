//! Family → node kind dispatch for built-in blocks.

use crate::error::Result;
use crate::graph::catalog::Family;
use crate::syntax::node::Site;
use crate::syntax::{NodeKind, VariableTable};

/// The node kind of a built-in block, or `None` for inert scenery.
pub(super) fn builtin_kind(
    site: Site<'_>,
    family: Family,
    vars: &mut VariableTable,
) -> Result<Option<NodeKind>> {
    let kind = match family {
        Family::Inert => return Ok(None),
        Family::Literal => NodeKind::literal(site)?,
        Family::Unary => NodeKind::unary(site)?,
        Family::Binary => NodeKind::binary(site)?,
        Family::Random => NodeKind::random(site)?,
        Family::Lerp => NodeKind::lerp(site)?,
        Family::Make => NodeKind::make(site)?,
        Family::Break => NodeKind::split(site)?,
        Family::AxisAngle => NodeKind::axis_angle(site)?,
        Family::LookRotation => NodeKind::look_rotation(site)?,
        Family::WorldToScreen => NodeKind::world_to_screen(site)?,
        Family::ScreenToWorld => NodeKind::screen_to_world(site)?,
        Family::GetVariable => NodeKind::get_variable(site, vars)?,
        Family::ListElement => NodeKind::list_element(site)?,
        Family::Query => NodeKind::query(site)?,
        Family::If => NodeKind::branch(site)?,
        Family::Loop => NodeKind::repeat(site)?,
        Family::Event => NodeKind::event(site)?,
        Family::SetVariable => NodeKind::set_variable(site, vars)?,
        Family::SetPointer => NodeKind::set_pointer(site)?,
        Family::StepVariable => NodeKind::step(site)?,
        Family::Inspect => NodeKind::inspect(site)?,
        Family::Object => NodeKind::object(site)?,
        Family::Sound => NodeKind::sound(site)?,
        Family::Game => NodeKind::game(site)?,
        Family::Label => NodeKind::label(site)?,
        Family::Goto => NodeKind::goto(site)?,
    };
    Ok(Some(kind))
}
