/*! Control connection to the radio front-end.

The HackRF TCP server exposes two sockets: one streams raw IQ (see
[`crate::tcp_source`]), and one takes line based ASCII commands of the
form `SET_<PARAM>:<value>\n`, answering each with a single text line.
A response containing `Ready` means the parameter was applied.

The connection greets with a textual welcome banner, which is drained
right after connecting. Each exchange is a request/response pair on one
stateful connection, so callers must not interleave commands: share a
`ControlClient` behind a `Mutex` and hold it for the whole exchange.
*/
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::time::Duration;

use log::{debug, info};

use crate::config::GainStage;
use crate::{Error, Result};

/// Abstract front-end control surface.
///
/// The pipeline only ever tunes through this trait, so tests can
/// substitute a recording mock and other front-ends can slot in.
pub trait Tuner {
    /// Tune the front-end center frequency.
    fn set_center_frequency(&mut self, hz: u64) -> Result<()>;
    /// Set the front-end sample rate.
    fn set_sample_rate(&mut self, hz: u32) -> Result<()>;
    /// Set one gain stage.
    fn set_gain(&mut self, stage: GainStage, value: u32) -> Result<()>;
}

/// Line protocol client for the HackRF TCP control port.
pub struct ControlClient {
    stream: TcpStream,
    reader: BufReader<TcpStream>,
}

impl ControlClient {
    /// Connect and drain the welcome banner.
    pub fn connect(addr: &str) -> Result<Self> {
        info!("connecting to control port {addr}");
        let stream = TcpStream::connect(addr)?;
        let reader = BufReader::new(stream.try_clone()?);
        let mut c = Self { stream, reader };
        c.drain_banner()?;
        Ok(c)
    }

    /// The banner is free-form text of unknown length; read lines
    /// until the server goes quiet.
    fn drain_banner(&mut self) -> Result<()> {
        self.stream
            .set_read_timeout(Some(Duration::from_millis(300)))?;
        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => debug!("banner: {}", line.trim_end()),
                Err(e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }
        self.stream
            .set_read_timeout(Some(Duration::from_secs(5)))?;
        Ok(())
    }

    /// Send one command and read its single-line response. Success is
    /// a response containing "Ready".
    pub fn command(&mut self, cmd: &str) -> Result<String> {
        debug!("control: {cmd}");
        self.stream.write_all(cmd.as_bytes())?;
        self.stream.write_all(b"\n")?;
        let mut response = String::new();
        let n = self.reader.read_line(&mut response)?;
        if n == 0 {
            return Err(Error::Device("control connection closed".into()));
        }
        let response = response.trim_end().to_string();
        if response.contains("Ready") {
            Ok(response)
        } else {
            Err(Error::Protocol(format!("{cmd} rejected: {response}")))
        }
    }
}

impl Tuner for ControlClient {
    fn set_center_frequency(&mut self, hz: u64) -> Result<()> {
        self.command(&format!("SET_FREQ:{hz}"))?;
        Ok(())
    }
    fn set_sample_rate(&mut self, hz: u32) -> Result<()> {
        self.command(&format!("SET_SAMPLE_RATE:{hz}"))?;
        Ok(())
    }
    fn set_gain(&mut self, stage: GainStage, value: u32) -> Result<()> {
        let param = match stage {
            GainStage::Lna => "SET_LNA_GAIN",
            GainStage::Vga => "SET_VGA_GAIN",
            GainStage::RxAmp => "SET_RX_AMP_GAIN",
        };
        self.command(&format!("{param}:{value}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;

    /// Minimal fake of the HackRF TCP control port: banner on connect,
    /// "Ready" for SET_FREQ, an error line for everything else.
    fn fake_server() -> Result<String> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let addr = format!("127.0.0.1:{}", listener.local_addr()?.port());
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream
                .write_all(b"HackRF TCP Server v1.0\nType HELP for commands\n")
                .unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while let Ok(n) = reader.read_line(&mut line) {
                if n == 0 {
                    break;
                }
                if line.starts_with("SET_FREQ:") {
                    stream.write_all(b"Frequency set - Ready\n").unwrap();
                } else {
                    stream.write_all(b"ERROR: unknown command\n").unwrap();
                }
                line.clear();
            }
            // Keep the read half alive until the client is done.
            let mut buf = [0u8; 1];
            let _ = stream.read(&mut buf);
        });
        Ok(addr)
    }

    #[test]
    fn set_frequency_ok() -> Result<()> {
        let addr = fake_server()?;
        let mut c = ControlClient::connect(&addr)?;
        c.set_center_frequency(100_000_000)?;
        Ok(())
    }

    #[test]
    fn rejected_command_is_protocol_error() -> Result<()> {
        let addr = fake_server()?;
        let mut c = ControlClient::connect(&addr)?;
        match c.set_gain(GainStage::Vga, 20) {
            Err(Error::Protocol(_)) => Ok(()),
            other => panic!("want protocol error, got {other:?}"),
        }
    }
}
/* vim: textwidth=80
 */
