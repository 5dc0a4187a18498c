//! Simulation data types.

use crate::geometry::Vec2;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Infection state of an agent.
///
/// `Live -> Touched -> {Dead, Cured}`; `Dead` and `Cured` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum State {
    Live,
    Touched,
    Dead,
    Cured,
}

impl State {
    pub const ALL: [State; 4] = [State::Live, State::Touched, State::Dead, State::Cured];

    /// Whether the state machine has an edge from `self` to `next`.
    pub fn can_become(self, next: State) -> bool {
        matches!(
            (self, next),
            (State::Live, State::Touched) | (State::Touched, State::Dead | State::Cured)
        )
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Agent of the simulation.
///
/// Owned by the population; mutated in place every frame and never removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    id: usize,
    pub(crate) state: State,
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
}

impl Agent {
    pub fn new(id: usize, position: Vec2, velocity: Vec2) -> Self {
        Self {
            id,
            state: State::Live,
            position,
            velocity,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }
}

/// Number of agents in each state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts([usize; 4]);

impl Counts {
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    /// Move one agent from `from` to `to`.
    pub(crate) fn shift(&mut self, from: State, to: State) {
        self[from] -= 1;
        self[to] += 1;
    }
}

impl Index<State> for Counts {
    type Output = usize;

    fn index(&self, state: State) -> &usize {
        &self.0[state.index()]
    }
}

impl IndexMut<State> for Counts {
    fn index_mut(&mut self, state: State) -> &mut usize {
        &mut self.0[state.index()]
    }
}

/// Record of the state counts at a given elapsed second.
///
/// Appended once per second to the report and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub time: u64,
    pub live: usize,
    pub touched: usize,
    pub cured: usize,
    pub dead: usize,
}

impl Stat {
    pub fn new(time: u64, counts: &Counts) -> Self {
        Self {
            time,
            live: counts[State::Live],
            touched: counts[State::Touched],
            cured: counts[State::Cured],
            dead: counts[State::Dead],
        }
    }

    pub fn total(&self) -> usize {
        self.live + self.touched + self.cured + self.dead
    }
}
