use crate::geometry::Rect;
use crate::model::Agent;

/// Move `agent` along its velocity for `dt` seconds, then keep it in `bounds`.
pub fn advance(agent: &mut Agent, bounds: &Rect, dt: f64) {
    agent.position += agent.velocity * dt;
    reflect(agent, bounds);
}

/// Bounce an agent that left `bounds` off the crossed edge.
///
/// Edges are checked right, left, top, bottom and only the first crossed one
/// is corrected, so an agent leaving through a corner stays out on the other
/// axis until the next call.
///
/// # Panics
/// Panics if the position is outside `bounds` yet crosses no edge, which
/// only happens for a non-finite position.
pub fn reflect(agent: &mut Agent, bounds: &Rect) {
    let id = agent.id();
    let pos = &mut agent.position;
    let vel = &mut agent.velocity;

    if bounds.contains(*pos) {
        return;
    }

    if pos.x >= bounds.max.x {
        pos.x = bounds.max.x;
        vel.x = -vel.x;
    } else if pos.x <= bounds.min.x {
        pos.x = bounds.min.x;
        vel.x = -vel.x;
    } else if pos.y >= bounds.max.y {
        pos.y = bounds.max.y;
        vel.y = -vel.y;
    } else if pos.y <= bounds.min.y {
        pos.y = bounds.min.y;
        vel.y = -vel.y;
    } else {
        panic!("agent {id} at {pos:?} is outside {bounds:?} but crossed no edge");
    }
}
