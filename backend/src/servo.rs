use crate::error::Error;
use std::fmt::{Display, Formatter};

/// One of the two independently addressed servo outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelId {
    /// Tilt servo, angle in degrees.
    One,
    /// Pan servo, pulse width units.
    Two,
}

impl ChannelId {
    /// Wire id used by the command protocol.
    pub fn id(self) -> u8 {
        match self {
            ChannelId::One => 1,
            ChannelId::Two => 2,
        }
    }

    fn index(self) -> usize {
        self.id() as usize - 1
    }
}

impl TryFrom<u8> for ChannelId {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(ChannelId::One),
            2 => Ok(ChannelId::Two),
            other => Err(Error::InvalidChannel(other)),
        }
    }
}

impl Display for ChannelId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// A single outbound instruction for the actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub channel: ChannelId,
    pub value: i32,
}

impl Command {
    pub fn new(channel: ChannelId, value: i32) -> Self {
        Self { channel, value }
    }

    /// Serial line format: `"<id> <value>\n"`.
    pub fn encode(&self) -> String {
        format!("{} {}\n", self.channel, self.value)
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.channel, self.value)
    }
}

/// Last commanded value of each servo channel.
///
/// This is a plain state holder: range checks belong to whoever decides the
/// value, never to the bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServoBank {
    values: [i32; 2],
}

impl ServoBank {
    pub fn new(tilt: i32, pan: i32) -> Self {
        Self { values: [tilt, pan] }
    }

    /// Replaces the stored value and returns the previous one.
    pub fn set(&mut self, channel: ChannelId, value: i32) -> i32 {
        std::mem::replace(&mut self.values[channel.index()], value)
    }

    pub fn get(&self, channel: ChannelId) -> i32 {
        self.values[channel.index()]
    }

    pub fn apply(&mut self, command: Command) -> i32 {
        self.set(command.channel, command.value)
    }
}

impl Default for ServoBank {
    fn default() -> Self {
        Self::new(90, 1500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_returns_previous() {
        let mut bank = ServoBank::default();
        assert_eq!(bank.set(ChannelId::One, 120), 90);
        assert_eq!(bank.get(ChannelId::One), 120);
        assert_eq!(bank.get(ChannelId::Two), 1500);
    }

    #[test]
    fn test_set_does_not_clamp() {
        let mut bank = ServoBank::default();
        bank.set(ChannelId::One, 500);
        bank.set(ChannelId::Two, -20);
        assert_eq!(bank.get(ChannelId::One), 500);
        assert_eq!(bank.get(ChannelId::Two), -20);
    }

    #[test]
    fn test_channel_from_wire_id() {
        assert_eq!(ChannelId::try_from(1).unwrap(), ChannelId::One);
        assert_eq!(ChannelId::try_from(2).unwrap(), ChannelId::Two);
        assert!(matches!(
            ChannelId::try_from(3),
            Err(Error::InvalidChannel(3))
        ));
        assert!(ChannelId::try_from(0).is_err());
    }

    #[test]
    fn test_command_encoding() {
        assert_eq!(Command::new(ChannelId::One, 100).encode(), "1 100\n");
        assert_eq!(Command::new(ChannelId::Two, 1470).encode(), "2 1470\n");
    }
}
