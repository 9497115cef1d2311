//! Command sinks: where servo commands go once the turret has decided them.

use crate::config::{SinkConfig, SinkKind};
use crate::error::Error;
use crate::servo::Command;
use serial2::SerialPort;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread::JoinHandle;
use std::time::Duration;

/// Accepts commands without waiting for the actuator.
pub trait CommandSink: Send {
    fn send(&mut self, command: Command) -> crate::Result<()>;

    fn name(&self) -> &str;
}

/// Stand-in for disconnected hardware.
#[derive(Debug, Default)]
pub struct NullSink;

impl CommandSink for NullSink {
    fn send(&mut self, command: Command) -> crate::Result<()> {
        tracing::debug!(%command, "no actuator attached");
        Ok(())
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Writes encoded commands on a dedicated thread so `send` never blocks.
pub struct ThreadedSink<W> {
    name: String,
    tx: Option<SyncSender<Command>>,
    writer: Option<JoinHandle<W>>,
}

impl<W: Write + Send + 'static> ThreadedSink<W> {
    pub fn spawn(name: impl Into<String>, mut out: W, queue_depth: usize) -> crate::Result<Self> {
        let name = name.into();
        let (tx, rx) = mpsc::sync_channel::<Command>(queue_depth);

        let thread_name = name.clone();
        let writer = std::thread::Builder::new()
            .name(format!("sink-{thread_name}"))
            .spawn(move || {
                for command in rx {
                    let written = out
                        .write_all(command.encode().as_bytes())
                        .and_then(|_| out.flush());
                    if let Err(err) = written {
                        tracing::warn!(sink = %thread_name, %command, %err, "write failed");
                    }
                }
                out
            })?;

        Ok(Self {
            name,
            tx: Some(tx),
            writer: Some(writer),
        })
    }

    /// Stops the writer after it drains the queue and hands the writer back.
    pub fn close(mut self) -> Option<W> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Option<W> {
        drop(self.tx.take());
        self.writer.take().and_then(|handle| handle.join().ok())
    }
}

impl<W: Write + Send + 'static> CommandSink for ThreadedSink<W> {
    fn send(&mut self, command: Command) -> crate::Result<()> {
        let tx = self.tx.as_ref().ok_or(Error::SinkClosed)?;
        tx.try_send(command).map_err(|err| match err {
            TrySendError::Full(_) => Error::SinkBusy,
            TrySendError::Disconnected(_) => Error::SinkClosed,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<W> Drop for ThreadedSink<W> {
    fn drop(&mut self) {
        drop(self.tx.take());
        if let Some(handle) = self.writer.take() {
            let _ = handle.join();
        }
    }
}

pub fn open_serial(config: &SinkConfig, port: &Path) -> crate::Result<ThreadedSink<SerialPort>> {
    let mut serial = SerialPort::open(port, config.baud_rate)?;
    serial.set_write_timeout(Duration::from_millis(config.write_timeout_ms))?;
    tracing::info!(port = %port.display(), baud = config.baud_rate, "serial port opened");

    ThreadedSink::spawn(port.display().to_string(), serial, config.queue_depth)
}

pub fn from_config(config: &SinkConfig) -> crate::Result<Box<dyn CommandSink>> {
    match (config.kind, &config.port) {
        (SinkKind::Null, _) => Ok(Box::new(NullSink)),
        (SinkKind::Serial, Some(port)) => Ok(Box::new(open_serial(config, port)?)),
        (SinkKind::Serial, None) => Err(Error::InvalidConfig(
            "serial sink requires a port".to_string(),
        )),
    }
}

pub fn list_devices() -> crate::Result<Vec<PathBuf>> {
    Ok(SerialPort::available_ports()?)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::servo::ChannelId;

    #[test]
    fn test_threaded_sink_writes_in_order() {
        let mut sink = ThreadedSink::spawn("memory", Vec::<u8>::new(), 8).unwrap();

        sink.send(Command::new(ChannelId::One, 100)).unwrap();
        sink.send(Command::new(ChannelId::Two, 1470)).unwrap();
        sink.send(Command::new(ChannelId::Two, 1500)).unwrap();

        let written = sink.close().unwrap();
        assert_eq!(String::from_utf8(written).unwrap(), "1 100\n2 1470\n2 1500\n");
    }

    #[test]
    fn test_null_sink_accepts_everything() {
        let mut sink = NullSink;
        assert!(sink.send(Command::new(ChannelId::One, 180)).is_ok());
        assert_eq!(sink.name(), "none");
    }

    #[test]
    fn test_from_config_defaults_to_null() {
        let sink = from_config(&SinkConfig::default()).unwrap();
        assert_eq!(sink.name(), "none");
    }

    #[test]
    fn test_serial_without_port_is_rejected() {
        let config = SinkConfig {
            kind: SinkKind::Serial,
            ..SinkConfig::default()
        };
        assert!(matches!(from_config(&config), Err(Error::InvalidConfig(_))));
    }

    /// Blocks every write until the test lets it through.
    struct GatedWriter(mpsc::Receiver<()>);

    impl Write for GatedWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let _ = self.0.recv();
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_full_queue_reports_busy() {
        let (gate, rx) = mpsc::channel();
        let mut sink = ThreadedSink::spawn("gated", GatedWriter(rx), 1).unwrap();

        // at most one command in flight plus one queued before the gate opens
        let mut busy = false;
        for value in 0..4 {
            if let Err(err) = sink.send(Command::new(ChannelId::One, value)) {
                assert!(matches!(err, Error::SinkBusy));
                busy = true;
            }
        }
        assert!(busy);

        drop(gate);
        assert!(sink.close().is_some());
    }
}
