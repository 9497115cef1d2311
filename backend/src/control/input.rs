use crate::config::ControlConfig;
use crate::control::{Direction, DirectionSet, RepeatPolicy};
use crate::servo::{ChannelId, Command, ServoBank};

/// Turns direction press/release events into servo commands.
///
/// Tilt (channel 1) moves by a fixed step per press and saturates at the
/// configured bounds. Pan (channel 2) jumps to a fixed left/right value on
/// press and returns to center when a horizontal key is released.
#[derive(Debug, Clone)]
pub struct InputStateMachine {
    held: DirectionSet,
    config: ControlConfig,
}

impl InputStateMachine {
    pub fn new(config: ControlConfig) -> Self {
        Self {
            held: DirectionSet::new(),
            config,
        }
    }

    /// Marks `direction` held and applies its effect to `servos`.
    ///
    /// Pressing an already held key applies the effect again.
    pub fn on_press(&mut self, direction: Direction, servos: &mut ServoBank) -> Command {
        self.held.insert(direction);

        let tilt = &self.config.tilt;
        let pan = &self.config.pan;
        let command = match direction {
            Direction::Up => {
                let target = servos
                    .get(ChannelId::One)
                    .saturating_add(tilt.step)
                    .clamp(tilt.min, tilt.max);
                Command::new(ChannelId::One, target)
            }
            Direction::Down => {
                let target = servos
                    .get(ChannelId::One)
                    .saturating_sub(tilt.step)
                    .clamp(tilt.min, tilt.max);
                Command::new(ChannelId::One, target)
            }
            Direction::Left => Command::new(ChannelId::Two, pan.left),
            Direction::Right => Command::new(ChannelId::Two, pan.right),
        };

        servos.apply(command);
        command
    }

    /// OS key-repeat for a key that is still down.
    pub fn on_repeat(&mut self, direction: Direction, servos: &mut ServoBank) -> Option<Command> {
        match self.config.repeat {
            RepeatPolicy::Resend => Some(self.on_press(direction, servos)),
            RepeatPolicy::Suppress => None,
        }
    }

    pub fn on_release(&mut self, direction: Direction, servos: &mut ServoBank) -> Option<Command> {
        self.held.remove(direction);

        match direction {
            Direction::Left | Direction::Right => {
                let command = Command::new(ChannelId::Two, self.config.pan.center);
                servos.apply(command);
                Some(command)
            }
            // tilt holds its last position
            Direction::Up | Direction::Down => None,
        }
    }

    pub fn held_directions(&self) -> DirectionSet {
        self.held
    }
}
