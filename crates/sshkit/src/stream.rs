//! Copying remote streams while the session runs in non-blocking mode.

use std::io::{self, Read, Write};
use std::thread;
use std::time::Duration;

/// How long a pump sleeps when the channel has nothing to read yet.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Copy `reader` into `writer` until end of stream.
///
/// `WouldBlock` means "no data yet" and is retried after [`POLL_INTERVAL`].
/// Each chunk is flushed as soon as it is written so output shows up live.
pub fn pump<R, W>(reader: &mut R, writer: &mut W) -> io::Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut buf = [0u8; 8192];
    let mut total = 0u64;

    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                writer.write_all(&buf[..n])?;
                writer.flush()?;
                total += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(POLL_INTERVAL),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }

    writer.flush()?;
    Ok(total)
}

/// Pump `stderr` and `stdout` into their sinks on two scoped threads.
///
/// Returns only after both streams have reached end of stream, even when one
/// of them fails first. The stdout error wins when both fail.
pub fn drain_both<E, O, EW, OW>(
    mut stderr: E,
    err_sink: &mut EW,
    mut stdout: O,
    out_sink: &mut OW,
) -> io::Result<()>
where
    E: Read + Send,
    O: Read + Send,
    EW: Write + Send + ?Sized,
    OW: Write + Send + ?Sized,
{
    thread::scope(|scope| {
        let errors = scope.spawn(move || pump(&mut stderr, err_sink));
        let outputs = scope.spawn(move || pump(&mut stdout, out_sink));

        let outputs = outputs
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("stdout forwarder panicked")));
        let errors = errors
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("stderr forwarder panicked")));
        outputs.and(errors).map(|_| ())
    })
}
