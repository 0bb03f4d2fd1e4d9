//! Async packet I/O on top of tokio readiness.

use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use tokio::io::Interest;
use tokio::io::unix::AsyncFd;

use super::device::Tunnel;

/// A [`Tunnel`] driven by the tokio reactor.
///
/// Each `recv`/`send` waits for readiness and then issues exactly one
/// `read(2)`/`write(2)`. Wrap calls in `tokio::time::timeout` for a
/// bounded wait.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use overtun::{AsyncTunnel, Tunnel};
///
/// let tun = AsyncTunnel::new(Tunnel::create("tun-test")?)?;
/// let mut buf = [0u8; 1504];
/// match tokio::time::timeout(Duration::from_secs(1), tun.recv(&mut buf)).await {
///     Ok(n) => println!("read {} bytes", n?),
///     Err(_) => println!("nothing within a second"),
/// }
/// ```
pub struct AsyncTunnel {
    fd: AsyncFd<Tunnel>,
    /// Bytes read since creation or the last take.
    rx_bytes: AtomicU64,
    /// Bytes written since creation or the last take.
    tx_bytes: AtomicU64,
}

impl AsyncTunnel {
    /// Register a tunnel with the current tokio reactor.
    ///
    /// The descriptor is switched to non-blocking mode. Must be called
    /// from within a tokio runtime.
    pub fn new(tunnel: Tunnel) -> io::Result<Self> {
        tunnel.set_nonblocking(true)?;
        let fd = AsyncFd::with_interest(tunnel, Interest::READABLE | Interest::WRITABLE)?;
        Ok(Self {
            fd,
            rx_bytes: AtomicU64::new(0),
            tx_bytes: AtomicU64::new(0),
        })
    }

    /// Get the interface name.
    pub fn name(&self) -> &str {
        self.fd.get_ref().name()
    }

    /// Get a reference to the blocking handle.
    pub fn get_ref(&self) -> &Tunnel {
        self.fd.get_ref()
    }

    /// Read one packet.
    pub async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let mut guard = self.fd.ready(Interest::READABLE).await?;

            match guard.try_io(|inner| inner.get_ref().read(buf)) {
                Ok(result) => return count(&self.rx_bytes, result),
                Err(_would_block) => continue,
            }
        }
    }

    /// Write one packet.
    pub async fn send(&self, buf: &[u8]) -> io::Result<usize> {
        loop {
            let mut guard = self.fd.ready(Interest::WRITABLE).await?;

            match guard.try_io(|inner| inner.get_ref().write(buf)) {
                Ok(result) => return count(&self.tx_bytes, result),
                Err(_would_block) => continue,
            }
        }
    }

    /// Poll for one incoming packet.
    ///
    /// This is the poll-based version of [`recv`](Self::recv) for use in
    /// hand-written futures and streams.
    pub fn poll_recv(&self, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<io::Result<usize>> {
        loop {
            let mut guard = match self.fd.poll_read_ready(cx) {
                Poll::Ready(Ok(guard)) => guard,
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Pending => return Poll::Pending,
            };

            match guard.try_io(|inner| inner.get_ref().read(buf)) {
                Ok(result) => return Poll::Ready(count(&self.rx_bytes, result)),
                Err(_would_block) => continue,
            }
        }
    }

    /// Bytes read so far.
    pub fn rx_bytes(&self) -> u64 {
        self.rx_bytes.load(Ordering::Relaxed)
    }

    /// Bytes written so far.
    pub fn tx_bytes(&self) -> u64 {
        self.tx_bytes.load(Ordering::Relaxed)
    }

    /// Return the read counter and reset it to zero.
    pub fn take_rx_bytes(&self) -> u64 {
        self.rx_bytes.swap(0, Ordering::Relaxed)
    }

    /// Return the write counter and reset it to zero.
    pub fn take_tx_bytes(&self) -> u64 {
        self.tx_bytes.swap(0, Ordering::Relaxed)
    }

    /// Deregister and return the handle (left in non-blocking mode).
    pub fn into_inner(self) -> Tunnel {
        self.fd.into_inner()
    }

    /// Close the device, removing the interface.
    pub fn destroy(self) {
        self.into_inner().destroy();
    }
}

fn count(counter: &AtomicU64, result: io::Result<usize>) -> io::Result<usize> {
    if let Ok(n) = result {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }
    result
}

impl AsRawFd for AsyncTunnel {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.get_ref().as_raw_fd()
    }
}

impl std::fmt::Debug for AsyncTunnel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncTunnel")
            .field("tunnel", self.fd.get_ref())
            .field("rx_bytes", &self.rx_bytes())
            .field("tx_bytes", &self.tx_bytes())
            .finish()
    }
}
