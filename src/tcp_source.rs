/*! IQ sample source reading from a TCP data port.

The HackRF TCP server streams raw interleaved signed 8-bit I/Q on its
data port. Each pair becomes one complex sample scaled to roughly
[-1, 1] by dividing by 127. A read can end mid-pair, so an odd trailing
byte is carried into the next read.
*/
use std::io::Read;
use std::net::TcpStream;

use log::{info, trace, warn};

use crate::block::{Block, BlockRet};
use crate::stream::{Stream, Streamp};
use crate::{Complex, Float, Result};

/// IQ source block for the HackRF TCP data port.
pub struct IqTcpSource {
    stream: TcpStream,
    buf: Vec<u8>,
    carry: Option<u8>,
    dst: Streamp<Complex>,
}

impl IqTcpSource {
    /// Connect to the data port. `chunk_size` is the read size in
    /// bytes per `work()` call.
    pub fn connect(addr: &str, chunk_size: usize) -> Result<(Self, Streamp<Complex>)> {
        info!("connecting to data port {addr}");
        let stream = TcpStream::connect(addr)?;
        let dst = Stream::newp();
        Ok((
            Self {
                stream,
                buf: vec![0u8; chunk_size],
                carry: None,
                dst: dst.clone(),
            },
            dst,
        ))
    }

    fn to_sample(i: u8, q: u8) -> Complex {
        Complex::new(i as i8 as Float / 127.0, q as i8 as Float / 127.0)
    }
}

impl Block for IqTcpSource {
    fn block_name(&self) -> &'static str {
        "IqTcpSource"
    }
    fn work(&mut self) -> Result<BlockRet> {
        // A short or interrupted read only skips this block; the next
        // call tries again.
        let n = match self.stream.read(&mut self.buf) {
            Ok(n) => n,
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::Interrupted
                        | std::io::ErrorKind::WouldBlock
                        | std::io::ErrorKind::TimedOut
                ) =>
            {
                trace!("transient read error, skipping block: {e}");
                return Ok(BlockRet::Noop);
            }
            Err(e) => return Err(e.into()),
        };
        if n == 0 {
            warn!("data connection closed by server");
            return Ok(BlockRet::EOF);
        }
        let mut bytes = self.buf[..n].iter().copied();
        let mut out = Vec::with_capacity(n / 2 + 1);
        if let Some(i) = self.carry.take() {
            // First byte of this read completes the previous pair.
            match bytes.next() {
                Some(q) => out.push(Self::to_sample(i, q)),
                None => self.carry = Some(i),
            }
        }
        loop {
            match (bytes.next(), bytes.next()) {
                (Some(i), Some(q)) => out.push(Self::to_sample(i, q)),
                (Some(i), None) => {
                    self.carry = Some(i);
                    break;
                }
                _ => break,
            }
        }
        self.dst.lock().unwrap().write_slice(&out);
        Ok(BlockRet::Again)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;

    #[test]
    fn decodes_pairs_across_odd_reads() -> Result<()> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let addr = format!("127.0.0.1:{}", listener.local_addr()?.port());
        let h = std::thread::spawn(move || {
            let (mut s, _) = listener.accept().unwrap();
            // 127, -127, 0, 63, -64 as unsigned bytes; 5 bytes so the
            // last pair straddles the connection's final write.
            s.write_all(&[127, 129, 0]).unwrap();
            s.flush().unwrap();
            std::thread::sleep(std::time::Duration::from_millis(50));
            s.write_all(&[63, 192]).unwrap();
        });

        let (mut src, out) = IqTcpSource::connect(&addr, 1024)?;
        let mut got = Vec::new();
        loop {
            match src.work()? {
                BlockRet::EOF => break,
                _ => got.extend(out.lock().unwrap().take()),
            }
        }
        h.join().unwrap();
        assert_eq!(got.len(), 2);
        assert!((got[0].re - 1.0).abs() < 1e-6);
        assert!((got[0].im + 1.0).abs() < 1e-6);
        assert!((got[1].re - 0.0).abs() < 1e-6);
        assert!((got[1].im - 63.0 / 127.0).abs() < 1e-6);
        Ok(())
    }

    /// A read that would block skips the block and keeps the pipeline
    /// alive, instead of erroring out of the graph.
    #[test]
    fn transient_read_error_skips_block() -> Result<()> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let addr = format!("127.0.0.1:{}", listener.local_addr()?.port());
        let (mut src, out) = IqTcpSource::connect(&addr, 1024)?;
        let (mut server, _) = listener.accept()?;
        src.stream.set_nonblocking(true)?;

        // Nothing sent yet: not an error, just no block this time.
        assert!(matches!(src.work()?, BlockRet::Noop));

        server.write_all(&[127, 0])?;
        server.flush()?;
        let mut got = Vec::new();
        for _ in 0..100 {
            src.work()?;
            got = out.lock().unwrap().take();
            if !got.is_empty() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert_eq!(got.len(), 1);
        assert!((got[0].re - 1.0).abs() < 1e-6);
        assert!(got[0].im.abs() < 1e-6);
        Ok(())
    }
}
/* vim: textwidth=80
 */
