use crate::model::State;
use crate::population::Population;

/// Response to two agents coming within reach of each other.
pub trait CollisionHandler {
    /// Called once per frame for every pair of agents `a`, `b` in contact.
    fn on_collision(&self, pop: &mut Population, a: usize, b: usize);
}

/// Default handler: a touched agent may pass the infection to a live one.
pub struct Transmission;

impl CollisionHandler for Transmission {
    fn on_collision(&self, pop: &mut Population, a: usize, b: usize) {
        let threshold = pop.dt() * pop.prob_trans();
        if pop.draw() >= threshold {
            return;
        }
        match (pop.agent(a).state(), pop.agent(b).state()) {
            (State::Live, State::Touched) => {
                pop.transition(a, State::Touched);
            }
            (State::Touched, State::Live) => {
                pop.transition(b, State::Touched);
            }
            _ => {}
        }
    }
}

/// Handler that ignores every contact.
pub struct NoContact;

impl CollisionHandler for NoContact {
    fn on_collision(&self, _pop: &mut Population, _a: usize, _b: usize) {}
}

/// Run `handler` on every unordered pair of agents closer than two radii.
///
/// Pairs are visited with `i` outer and `j < i` inner, each exactly once.
pub fn detect<H: CollisionHandler + ?Sized>(pop: &mut Population, handler: &H) {
    let reach = 4.0 * pop.radius() * pop.radius();
    for i in 0..pop.len() {
        for j in 0..i {
            let d2 = pop
                .agent(i)
                .position()
                .distance_squared(pop.agent(j).position());
            if d2 <= reach {
                handler.on_collision(pop, i, j);
            }
        }
    }
}
