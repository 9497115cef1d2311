use crate::config::ControlConfig;
use crate::control::input::InputStateMachine;
use crate::servo::{ChannelId, Command, ServoBank};
use crate::sink::CommandSink;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub mod input;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    fn bit(self) -> u8 {
        match self {
            Direction::Up => 0b0001,
            Direction::Down => 0b0010,
            Direction::Left => 0b0100,
            Direction::Right => 0b1000,
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        };
        f.write_str(name)
    }
}

/// Set of currently held directions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DirectionSet {
    bits: u8,
}

impl DirectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, direction: Direction) {
        self.bits |= direction.bit();
    }

    pub fn remove(&mut self, direction: Direction) {
        self.bits &= !direction.bit();
    }

    pub fn contains(&self, direction: Direction) -> bool {
        self.bits & direction.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL.into_iter().filter(|d| self.contains(*d))
    }
}

impl FromIterator<Direction> for DirectionSet {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut set = DirectionSet::new();
        for direction in iter {
            set.insert(direction);
        }
        set
    }
}

/// What to do with OS key-repeat events for a key that is still held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatPolicy {
    /// Treat every repeat as a new press, so holding a key keeps slewing.
    #[default]
    Resend,
    /// One command per physical press.
    Suppress,
}

pub type SharedTurret = Arc<Mutex<Turret>>;

/// Locks the shared turret, recovering the state if a holder panicked.
pub fn lock(turret: &SharedTurret) -> MutexGuard<'_, Turret> {
    turret.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Control state of the turret: held keys, servo positions and the sink
/// commands go out through.
pub struct Turret {
    input: InputStateMachine,
    servos: ServoBank,
    sink: Box<dyn CommandSink>,
}

impl Turret {
    pub fn new(config: ControlConfig, sink: Box<dyn CommandSink>) -> Self {
        let servos = ServoBank::new(config.tilt.initial, config.pan.center);
        Self {
            input: InputStateMachine::new(config),
            servos,
            sink,
        }
    }

    pub fn into_shared(self) -> SharedTurret {
        Arc::new(Mutex::new(self))
    }

    pub fn on_press(&mut self, direction: Direction) -> Command {
        let command = self.input.on_press(direction, &mut self.servos);
        self.dispatch(command);
        command
    }

    pub fn on_repeat(&mut self, direction: Direction) -> Option<Command> {
        let command = self.input.on_repeat(direction, &mut self.servos)?;
        self.dispatch(command);
        Some(command)
    }

    pub fn on_release(&mut self, direction: Direction) -> Option<Command> {
        let command = self.input.on_release(direction, &mut self.servos)?;
        self.dispatch(command);
        Some(command)
    }

    pub fn held_directions(&self) -> DirectionSet {
        self.input.held_directions()
    }

    pub fn servo(&self, channel: ChannelId) -> i32 {
        self.servos.get(channel)
    }

    pub fn sink_name(&self) -> &str {
        self.sink.name()
    }

    pub fn set_sink(&mut self, sink: Box<dyn CommandSink>) {
        tracing::info!(from = self.sink.name(), to = sink.name(), "switching command sink");
        self.sink = sink;
    }

    // Fire-and-forget: the servo state already reflects the command.
    fn dispatch(&mut self, command: Command) {
        tracing::debug!(%command, sink = self.sink.name(), "servo command");
        if let Err(err) = self.sink.send(command) {
            tracing::debug!(%command, %err, "dropped servo command");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::testing::{FailingSink, RecordingSink};

    fn turret() -> (Turret, RecordingSink) {
        let sink = RecordingSink::default();
        let turret = Turret::new(ControlConfig::default(), Box::new(sink.clone()));
        (turret, sink)
    }

    #[test]
    fn test_five_presses_up() {
        let (mut turret, sink) = turret();

        for _ in 0..5 {
            turret.on_press(Direction::Up);
        }

        assert_eq!(turret.servo(ChannelId::One), 140);
        let values: Vec<_> = sink.commands().iter().map(|c| (c.channel.id(), c.value)).collect();
        assert_eq!(values, vec![(1, 100), (1, 110), (1, 120), (1, 130), (1, 140)]);
    }

    #[test]
    fn test_right_press_release() {
        let (mut turret, sink) = turret();

        turret.on_press(Direction::Right);
        turret.on_release(Direction::Right);

        assert_eq!(
            sink.commands(),
            vec![
                Command::new(ChannelId::Two, 1470),
                Command::new(ChannelId::Two, 1500),
            ]
        );
    }

    #[test]
    fn test_left_release_wins_over_interleaved_right() {
        let (mut turret, sink) = turret();

        turret.on_press(Direction::Left);
        turret.on_press(Direction::Right);
        turret.on_release(Direction::Right);
        turret.on_press(Direction::Right);
        turret.on_release(Direction::Left);

        let commands = sink.commands();
        assert_eq!(commands.first(), Some(&Command::new(ChannelId::Two, 1540)));
        assert_eq!(commands.last(), Some(&Command::new(ChannelId::Two, 1500)));
        assert_eq!(turret.servo(ChannelId::Two), 1500);
    }

    #[test]
    fn test_vertical_release_sends_nothing() {
        let (mut turret, sink) = turret();

        turret.on_press(Direction::Down);
        assert_eq!(turret.on_release(Direction::Down), None);
        assert_eq!(sink.commands().len(), 1);
        assert_eq!(turret.servo(ChannelId::One), 80);
    }

    #[test]
    fn test_failed_sends_are_dropped() {
        let mut turret = Turret::new(ControlConfig::default(), Box::new(FailingSink));

        turret.on_press(Direction::Up);
        turret.on_press(Direction::Left);

        assert_eq!(turret.servo(ChannelId::One), 100);
        assert_eq!(turret.servo(ChannelId::Two), 1540);
    }

    #[test]
    fn test_held_directions_snapshot() {
        let (mut turret, _sink) = turret();

        turret.on_press(Direction::Up);
        turret.on_press(Direction::Left);
        turret.on_release(Direction::Up);

        let held = turret.held_directions();
        assert_eq!(held, DirectionSet::from_iter([Direction::Left]));
        assert_eq!(held.iter().collect::<Vec<_>>(), vec![Direction::Left]);
    }

    #[test]
    fn test_shared_lock() {
        let (turret, sink) = turret();
        let shared = turret.into_shared();

        lock(&shared).on_press(Direction::Up);
        assert_eq!(lock(&shared).servo(ChannelId::One), 100);
        assert_eq!(sink.commands().len(), 1);
    }

    #[test]
    fn test_direction_set() {
        let mut set = DirectionSet::new();
        assert!(set.is_empty());
        set.insert(Direction::Down);
        set.insert(Direction::Down);
        set.insert(Direction::Right);
        assert!(set.contains(Direction::Down));
        assert!(!set.contains(Direction::Up));
        set.remove(Direction::Down);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Direction::Right]);
    }
}
