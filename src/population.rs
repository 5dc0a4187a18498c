use crate::collision::{self, CollisionHandler, Transmission};
use crate::config::{ModelConfig, StopPolicy};
use crate::geometry::{MAX_COORD, Rect, Vec2};
use crate::kinematics;
use crate::model::{Agent, Counts, Stat, State};
use crate::render::Sprite;
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use std::sync::Arc;

/// Fixed-size set of agents moving in a bounded arena.
///
/// Owns every agent and keeps `counts` equal to the number of agents in
/// each state at all times.
pub struct Population {
    agents: Vec<Agent>,
    bounds: Rect,
    radius: f64,
    prob_trans: f64,
    prob_death: f64,
    prob_cure: f64,
    stop: StopPolicy,

    counts: Counts,
    elapsed_seconds: u64,
    running: bool,

    dt: f64,
    rng: ChaCha12Rng,
    handler: Arc<dyn CollisionHandler>,
}

impl Population {
    /// Create `n_agents` live agents at uniformly random positions inside the
    /// arena, then touch the first `n_touched` of them.
    ///
    /// Out-of-range parameters are normalized rather than rejected.
    pub fn new(
        model: &ModelConfig,
        n_agents: usize,
        n_touched: usize,
        mut rng: ChaCha12Rng,
    ) -> Self {
        let bounds = model.bounds.normalized();
        if bounds != model.bounds {
            log::warn!("normalized arena bounds {:?} to {bounds:?}", model.bounds);
        }
        let radius = non_negative(model.radius, "radius");
        let mut speed = non_negative(model.speed, "speed");
        if speed > MAX_COORD {
            log::warn!("clamped speed {speed} to {MAX_COORD}");
            speed = MAX_COORD;
        }

        let mut agents = Vec::with_capacity(n_agents);
        for id in 0..n_agents {
            let position = Vec2::new(
                rng.random_range(bounds.min.x..bounds.max.x),
                rng.random_range(bounds.min.y..bounds.max.y),
            );
            let velocity = Vec2::new(
                rng.random_range(-speed..=speed),
                rng.random_range(-speed..=speed),
            );
            agents.push(Agent::new(id, position, velocity));
        }

        let mut counts = Counts::default();
        counts[State::Live] = n_agents;

        let mut pop = Self {
            agents,
            bounds,
            radius,
            prob_trans: non_negative(model.prob_trans, "transmission probability"),
            prob_death: non_negative(model.prob_death, "death probability"),
            prob_cure: non_negative(model.prob_cure, "cure probability"),
            stop: model.stop,
            counts,
            elapsed_seconds: 0,
            running: true,
            dt: 0.0,
            rng,
            handler: Arc::new(Transmission),
        };

        if n_touched > n_agents {
            log::warn!("clamped initial touched count {n_touched} to {n_agents}");
        }
        for i in 0..n_touched.min(n_agents) {
            pop.transition(i, State::Touched);
        }

        pop
    }

    /// Replace the collision handler.
    pub fn with_handler(mut self, handler: Arc<dyn CollisionHandler>) -> Self {
        self.handler = handler;
        self
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// Applies the touched-state decay and moves every agent that is not
    /// dead, then handles every contact.
    pub fn step(&mut self, dt: f64) {
        self.dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        let bounds = self.bounds;
        for i in 0..self.agents.len() {
            self.decay(i);
            let agent = &mut self.agents[i];
            if agent.state != State::Dead {
                kinematics::advance(agent, &bounds, self.dt);
            }
        }

        let handler = Arc::clone(&self.handler);
        collision::detect(self, handler.as_ref());
    }

    fn decay(&mut self, i: usize) {
        if self.agents[i].state != State::Touched {
            return;
        }
        if self.draw() < self.dt * self.prob_death {
            self.transition(i, State::Dead);
        } else if self.draw() < self.dt * self.prob_cure {
            self.transition(i, State::Cured);
        }
    }

    /// Move agent `i` to `next`, keeping the counts in step.
    ///
    /// Returns `false` and leaves the agent alone if the state machine has
    /// no such edge.
    pub fn transition(&mut self, i: usize, next: State) -> bool {
        let agent = &mut self.agents[i];
        if !agent.state.can_become(next) {
            return false;
        }
        self.counts.shift(agent.state, next);
        agent.state = next;
        true
    }

    /// Draw a uniform sample from `[0, 1)`.
    pub fn draw(&mut self) -> f64 {
        self.rng.random()
    }

    /// Count one more elapsed second and return its stat.
    pub fn advance_second(&mut self) -> Stat {
        self.elapsed_seconds += 1;
        self.snapshot()
    }

    /// Current counts and elapsed seconds.
    pub fn snapshot(&self) -> Stat {
        Stat::new(self.elapsed_seconds, &self.counts)
    }

    pub fn is_extinct_or_stable(&self) -> bool {
        self.stop.holds(&self.counts)
    }

    /// Clear `running` once the stop policy holds; returns the new value.
    pub fn update_running(&mut self) -> bool {
        if self.running && self.is_extinct_or_stable() {
            self.running = false;
        }
        self.running
    }

    /// What to draw for each agent, in id order.
    pub fn sprites(&self) -> impl Iterator<Item = Sprite> + '_ {
        self.agents().iter().map(|agt| Sprite {
            position: agt.position(),
            radius: self.radius,
            state: agt.state(),
        })
    }

    pub fn agent(&self, i: usize) -> &Agent {
        &self.agents[i]
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn counts(&self) -> &Counts {
        &self.counts
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn bounds(&self) -> &Rect {
        &self.bounds
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn prob_trans(&self) -> f64 {
        self.prob_trans
    }

    /// Duration of the frame being stepped.
    pub fn dt(&self) -> f64 {
        self.dt
    }
}

#[cfg(test)]
impl Population {
    pub(crate) fn place(&mut self, i: usize, position: Vec2, velocity: Vec2) {
        self.agents[i].position = position;
        self.agents[i].velocity = velocity;
    }

    pub(crate) fn set_dt(&mut self, dt: f64) {
        self.dt = dt;
    }
}

fn non_negative(val: f64, name: &str) -> f64 {
    if val.is_finite() && val >= 0.0 {
        return val;
    }
    log::warn!("clamped {name} {val} to 0");
    0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::NoContact;
    use crate::config::ContactRule;

    fn model() -> ModelConfig {
        ModelConfig {
            bounds: Rect::new(Vec2::new(0.0, 0.0), Vec2::new(400.0, 300.0)),
            radius: 6.0,
            speed: 80.0,
            prob_trans: 2.0,
            prob_death: 0.05,
            prob_cure: 0.2,
            contact: ContactRule::Transmit,
            stop: StopPolicy::NoTouched,
        }
    }

    fn build(model: &ModelConfig, n_agents: usize, n_touched: usize, seed: u64) -> Population {
        Population::new(model, n_agents, n_touched, ChaCha12Rng::seed_from_u64(seed))
    }

    #[test]
    fn seeds_lowest_ids() {
        let pop = build(&model(), 10, 3, 0);
        assert_eq!(pop.counts()[State::Touched], 3);
        assert_eq!(pop.counts()[State::Live], 7);
        for agt in pop.agents() {
            let exp = if agt.id() < 3 { State::Touched } else { State::Live };
            assert_eq!(agt.state(), exp);
        }
    }

    #[test]
    fn clamps_construction_parameters() {
        let pop = build(&model(), 4, 9, 0);
        assert_eq!(pop.counts()[State::Touched], 4);
        assert_eq!(pop.counts()[State::Live], 0);

        let mut bad = model();
        bad.bounds = Rect::new(Vec2::new(5.0, 5.0), Vec2::new(5.0, 5.0));
        bad.radius = -1.0;
        bad.speed = f64::NAN;
        bad.prob_trans = -3.0;
        let pop = build(&bad, 20, 0, 0);
        assert_eq!(pop.radius(), 0.0);
        assert_eq!(pop.prob_trans(), 0.0);
        assert!(pop.agents().iter().all(|agt| agt.velocity() == Vec2::default()));
        assert!(pop.agents().iter().all(|agt| pop.bounds().contains(agt.position())));
    }

    #[test]
    fn clamps_huge_speed() {
        let mut m = model();
        m.speed = f64::MAX;
        let mut pop = build(&m, 50, 5, 0);
        for agt in pop.agents() {
            assert!(agt.velocity().x.abs() <= MAX_COORD);
            assert!(agt.velocity().y.abs() <= MAX_COORD);
        }
        for _ in 0..50 {
            pop.step(0.016);
        }
        assert!(pop.agents().iter().all(|agt| agt.position().x.is_finite()));
        assert_eq!(pop.counts().total(), 50);
    }

    #[test]
    fn clamps_huge_bounds() {
        let mut m = model();
        m.bounds = Rect::new(Vec2::new(-f64::MAX, -f64::MAX), Vec2::new(f64::MAX, f64::MAX));
        let pop = build(&m, 50, 0, 0);
        assert!(pop.bounds().size().x.is_finite());
        assert!(pop.bounds().size().y.is_finite());
        assert!(pop.agents().iter().all(|agt| pop.bounds().contains(agt.position())));
    }

    #[test]
    fn initial_agents_inside_bounds_with_bounded_speed() {
        let pop = build(&model(), 300, 0, 5);
        for agt in pop.agents() {
            assert!(pop.bounds().contains(agt.position()));
            assert!(agt.velocity().x.abs() <= 80.0);
            assert!(agt.velocity().y.abs() <= 80.0);
        }
    }

    #[test]
    fn counts_always_sum_to_size() {
        let mut pop = build(&model(), 150, 10, 11);
        for _ in 0..500 {
            pop.step(0.016);
            assert_eq!(pop.counts().total(), 150);
            for state in State::ALL {
                let n = pop.agents().iter().filter(|agt| agt.state() == state).count();
                assert_eq!(pop.counts()[state], n);
            }
        }
    }

    #[test]
    fn terminal_agents_stay_put() {
        let mut pop = build(&model(), 100, 40, 3);
        let mut frozen: Vec<Option<(State, Vec2)>> = vec![None; pop.len()];
        for _ in 0..3000 {
            pop.step(0.02);
            for (agt, seen) in pop.agents().iter().zip(frozen.iter_mut()) {
                match (agt.state(), *seen) {
                    (State::Dead, None) => *seen = Some((State::Dead, agt.position())),
                    (State::Cured, None) => *seen = Some((State::Cured, agt.position())),
                    (state, Some((State::Dead, pos))) => {
                        assert_eq!(state, State::Dead);
                        assert_eq!(agt.position(), pos);
                    }
                    (state, Some((prev, _))) => assert_eq!(state, prev),
                    _ => {}
                }
            }
        }
        assert!(frozen.iter().any(Option::is_some));
    }

    #[test]
    fn agents_stay_within_one_frame_of_the_arena() {
        let mut pop = build(&model(), 100, 0, 9);
        let dt = 0.016;
        let slack = 80.0 * dt;
        for _ in 0..1000 {
            pop.step(dt);
            let b = *pop.bounds();
            for agt in pop.agents() {
                let p = agt.position();
                assert!(p.x >= b.min.x - slack && p.x <= b.max.x + slack, "{p:?}");
                assert!(p.y >= b.min.y - slack && p.y <= b.max.y + slack, "{p:?}");
            }
        }
    }

    #[test]
    fn single_axis_motion_stays_strictly_inside() {
        let mut pop = build(&model(), 20, 0, 9);
        for i in 0..pop.len() {
            let pos = Vec2::new(10.0 * i as f64 + 5.0, 150.0);
            let vel = Vec2::new(if i % 2 == 0 { 75.0 } else { -75.0 }, 0.0);
            pop.place(i, pos, vel);
        }
        for _ in 0..1000 {
            pop.step(0.016);
            for agt in pop.agents() {
                let p = agt.position();
                assert!(p.x >= 0.0 && p.x <= 400.0, "{p:?}");
                assert_eq!(p.y, 150.0);
            }
        }
    }

    #[test]
    fn identical_seeds_give_identical_trajectories() {
        let dts = [0.016, 0.02, 0.0, 0.033, 0.016, 0.1];
        let mut a = build(&model(), 80, 5, 1234);
        let mut b = build(&model(), 80, 5, 1234);
        for k in 0..600 {
            let dt = dts[k % dts.len()];
            a.step(dt);
            b.step(dt);
            assert_eq!(a.agents(), b.agents());
            assert_eq!(a.counts(), b.counts());
        }
    }

    #[test]
    fn no_transmission_keeps_counts_constant() {
        let mut m = model();
        m.prob_trans = 0.0;
        let mut pop = build(&m, 100, 0, 2);
        let before = *pop.counts();
        for _ in 0..1000 {
            pop.step(0.016);
        }
        assert_eq!(*pop.counts(), before);
        assert_eq!(pop.counts()[State::Live], 100);
    }

    #[test]
    fn substituted_handler_is_used() {
        let mut m = model();
        m.prob_trans = 1000.0;
        m.prob_death = 0.0;
        m.prob_cure = 0.0;
        let mut pop = build(&m, 100, 50, 4).with_handler(Arc::new(NoContact));
        for _ in 0..200 {
            pop.step(0.016);
        }
        assert_eq!(pop.counts()[State::Touched], 50);
    }

    #[test]
    fn negative_dt_is_zero() {
        let mut pop = build(&model(), 10, 0, 4);
        let before = pop.agents().to_vec();
        pop.step(-1.0);
        assert_eq!(pop.dt(), 0.0);
        assert_eq!(pop.agents(), &before[..]);
    }

    #[test]
    fn running_clears_once_policy_holds() {
        let mut pop = build(&model(), 10, 0, 4);
        assert!(pop.running());
        assert!(pop.is_extinct_or_stable());
        assert!(!pop.update_running());
        assert!(!pop.running());
    }

    #[test]
    fn seconds_are_counted_in_stats() {
        let mut pop = build(&model(), 10, 2, 4);
        assert_eq!(pop.snapshot().time, 0);
        let stat = pop.advance_second();
        assert_eq!(stat.time, 1);
        assert_eq!(stat.touched, 2);
        assert_eq!(pop.elapsed_seconds(), 1);
    }

    #[test]
    fn transition_refuses_missing_edges() {
        let mut pop = build(&model(), 3, 1, 4);
        assert!(!pop.transition(1, State::Dead));
        assert!(pop.transition(0, State::Cured));
        assert!(!pop.transition(0, State::Touched));
        assert_eq!(pop.counts()[State::Cured], 1);
        assert_eq!(pop.counts().total(), 3);
    }
}
