/// Actor motion state — keystate latches plus the idle/walk/run machine.
///
/// ## Keystate model
///
/// Four directional latches plus a run latch, set on press and cleared
/// on release. The latches store the PHYSICAL key state; the designed
/// tie-breaks are applied at derivation time:
///   - Opposing keys held together cancel to "neither" for that axis.
///   - When several non-opposing directions are held, the display
///     facing picks vertical before horizontal (up, down, left, right).
///
/// The last released direction is tracked separately from the latches:
/// it is what the actor faces when everything is released.
///
/// ## Intent vs. outcome
///
/// `intent` is what the held keys ask for; whether the position
/// actually moves is the collision resolver's call. The motion state
/// and animation always follow intent — an actor walking into a fence
/// keeps its walking animation.

use crate::config::{AnimConfig, SpeedConfig};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Motion {
    Idle,
    Walking,
    Running,
}

/// A key the actor cares about. The mapping from physical keys is the
/// input layer's business.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ActorKey {
    Up,
    Down,
    Left,
    Right,
    Run,
}

/// Press/release edges observed since the previous tick.
#[derive(Clone, Debug, Default)]
pub struct InputFrame {
    pub pressed: Vec<ActorKey>,
    pub released: Vec<ActorKey>,
}

#[derive(Clone, Copy, Debug, Default)]
struct KeyLatches {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
    run: bool,
}

#[derive(Clone, Debug)]
pub struct ActorMotionState {
    keys: KeyLatches,
    motion: Motion,
    facing: Facing,
    last_released: Facing,
    frame: usize,
    frame_ticks: u32,
}

impl ActorMotionState {
    pub fn new() -> ActorMotionState {
        ActorMotionState {
            keys: KeyLatches::default(),
            motion: Motion::Idle,
            facing: Facing::Down,
            last_released: Facing::Down,
            frame: 0,
            frame_ticks: 0,
        }
    }

    pub fn motion(&self) -> Motion {
        self.motion
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Latch the edges observed this tick.
    pub fn apply_input(&mut self, input: &InputFrame) {
        for key in &input.pressed {
            match key {
                ActorKey::Up => self.keys.up = true,
                ActorKey::Down => self.keys.down = true,
                ActorKey::Left => self.keys.left = true,
                ActorKey::Right => self.keys.right = true,
                ActorKey::Run => self.keys.run = true,
            }
        }
        for key in &input.released {
            match key {
                ActorKey::Up => {
                    self.keys.up = false;
                    self.last_released = Facing::Up;
                }
                ActorKey::Down => {
                    self.keys.down = false;
                    self.last_released = Facing::Down;
                }
                ActorKey::Left => {
                    self.keys.left = false;
                    self.last_released = Facing::Left;
                }
                ActorKey::Right => {
                    self.keys.right = false;
                    self.last_released = Facing::Right;
                }
                ActorKey::Run => self.keys.run = false,
            }
        }
    }

    /// Effective vertical direction: opposing keys cancel.
    fn vertical(&self) -> Option<Facing> {
        match (self.keys.up, self.keys.down) {
            (true, false) => Some(Facing::Up),
            (false, true) => Some(Facing::Down),
            _ => None,
        }
    }

    fn horizontal(&self) -> Option<Facing> {
        match (self.keys.left, self.keys.right) {
            (true, false) => Some(Facing::Left),
            (false, true) => Some(Facing::Right),
            _ => None,
        }
    }

    /// The displacement the held keys ask for this tick. Both axes may
    /// be non-zero; the resolver treats them independently.
    pub fn intent(&self, speed: &SpeedConfig) -> (i32, i32) {
        let amount = if self.keys.run { speed.run_speed } else { speed.walk_speed };
        let dx = match self.horizontal() {
            Some(Facing::Left) => -amount,
            Some(Facing::Right) => amount,
            _ => 0,
        };
        let dy = match self.vertical() {
            Some(Facing::Up) => -amount,
            Some(Facing::Down) => amount,
            _ => 0,
        };
        (dx, dy)
    }

    /// Re-derive motion and facing from the latches. Any change — motion
    /// or facing — restarts the animation from frame 0.
    pub fn refresh(&mut self) {
        // Vertical wins over horizontal for the single display facing.
        let held = self.vertical().or_else(|| self.horizontal());
        let (motion, facing) = match held {
            Some(direction) => {
                let motion = if self.keys.run { Motion::Running } else { Motion::Walking };
                (motion, direction)
            }
            None => (Motion::Idle, self.last_released),
        };
        if motion != self.motion || facing != self.facing {
            self.motion = motion;
            self.facing = facing;
            self.frame = 0;
            self.frame_ticks = 0;
        }
    }

    /// Tick-counted frame advance; the cadence follows the current
    /// motion (idle slowest, running fastest).
    pub fn advance_animation(&mut self, anim: &AnimConfig) {
        self.frame_ticks += 1;
        if self.frame_ticks >= anim.period(self.motion) {
            self.frame_ticks = 0;
            self.frame = (self.frame + 1) % anim.frames(self.motion).max(1);
        }
    }
}

// ── Unit tests ──
