//! UART link to the radio.
//!
//! The radio's serial port is reached through a TCP bridge. A reader thread
//! pushes received bytes into a bounded single-producer queue which the node
//! drains through [`ByteSource`]; writes go straight to the socket.

use std::io::{self, BufWriter, Read};
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, SendTimeoutError, Sender, TryRecvError};
use xbee_api::{ByteSource, IoSink, TransportError};

use crate::config::UartConfig;
use crate::error::NodeResult;

/// How long a blocked socket read or queue push waits before checking for shutdown.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Create a connected receive queue pair holding up to `capacity` bytes.
pub fn rx_queue(capacity: usize) -> (RxProducer, RxQueue) {
    let (sender, receiver) = crossbeam_channel::bounded(capacity.max(1));
    (
        RxProducer { sender },
        RxQueue {
            receiver,
            closed: false,
        },
    )
}

/// Writing half of the receive queue, owned by the reader thread.
#[derive(Debug, Clone)]
pub struct RxProducer {
    sender: Sender<u8>,
}

impl RxProducer {
    /// Queue received bytes, waiting while the queue is full.
    ///
    /// Returns `Ok(false)` if `stop` was set before every byte was queued.
    pub fn push(&self, bytes: &[u8], stop: &AtomicBool) -> Result<bool, TransportError> {
        for &byte in bytes {
            let mut pending = byte;
            loop {
                match self.sender.send_timeout(pending, READ_TIMEOUT) {
                    Ok(()) => break,
                    Err(SendTimeoutError::Timeout(byte)) => {
                        if stop.load(Ordering::Relaxed) {
                            return Ok(false);
                        }
                        pending = byte;
                    }
                    Err(SendTimeoutError::Disconnected(_)) => return Err(TransportError::Closed),
                }
            }
        }
        Ok(true)
    }
}

/// Reading half of the receive queue.
#[derive(Debug)]
pub struct RxQueue {
    receiver: Receiver<u8>,
    closed: bool,
}

impl RxQueue {
    /// Bytes currently queued.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl ByteSource for RxQueue {
    fn bytes_available(&self) -> bool {
        !self.receiver.is_empty()
    }

    fn next_byte(&mut self) -> Option<u8> {
        match self.receiver.try_recv() {
            Ok(byte) => Some(byte),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.closed = true;
                None
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Transmit side of the link.
pub type UartSink = IoSink<BufWriter<TcpStream>>;

/// Background thread copying socket bytes into the receive queue.
pub struct UartReader {
    stop_flag: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl UartReader {
    /// Start reading `stream` into `producer`.
    pub fn spawn(stream: TcpStream, producer: RxProducer) -> NodeResult<Self> {
        stream.set_read_timeout(Some(READ_TIMEOUT))?;
        let stop_flag = Arc::new(AtomicBool::new(false));
        let reader_stop = Arc::clone(&stop_flag);

        let thread_handle = thread::Builder::new()
            .name("uart-rx".to_string())
            .spawn(move || read_loop(stream, producer, &reader_stop))?;

        Ok(UartReader {
            stop_flag,
            thread_handle: Some(thread_handle),
        })
    }

    /// Returns true while the reader thread is running.
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the reader thread and wait for it to finish.
    pub fn stop(mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for UartReader {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }
}

fn read_loop(mut stream: TcpStream, producer: RxProducer, stop: &AtomicBool) {
    let mut buf = [0u8; 256];
    while !stop.load(Ordering::Relaxed) {
        match stream.read(&mut buf) {
            Ok(0) => {
                tracing::info!("UART bridge closed the connection");
                break;
            }
            Ok(n) => {
                tracing::trace!(bytes = n, "UART rx");
                match producer.push(&buf[..n], stop) {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::debug!("UART reader stopped with a full rx queue");
                        break;
                    }
                    Err(_) => break,
                }
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => {
                tracing::warn!(error = %e, "UART read failed");
                break;
            }
        }
    }
    let _ = stream.shutdown(Shutdown::Read);
}

/// A connected UART link.
pub struct UartLink {
    pub rx: RxQueue,
    pub tx: UartSink,
    pub reader: UartReader,
}

impl UartLink {
    /// Connect to the bridge and start the reader thread.
    pub fn connect(config: &UartConfig) -> NodeResult<Self> {
        let stream = TcpStream::connect(&config.connect)?;
        stream.set_nodelay(true)?;
        tracing::info!(address = %config.connect, "Connected to UART bridge");
        Self::from_stream(stream, config.rx_queue_capacity)
    }

    /// Build a link over an already connected stream.
    pub fn from_stream(stream: TcpStream, rx_queue_capacity: usize) -> NodeResult<Self> {
        let (producer, rx) = rx_queue(rx_queue_capacity);
        let tx = IoSink::new(BufWriter::new(stream.try_clone()?));
        let reader = UartReader::spawn(stream, producer)?;
        Ok(UartLink { rx, tx, reader })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;
    use std::time::Instant;
    use xbee_api::ByteSink;

    #[test]
    fn test_rx_queue_order() {
        let (producer, mut queue) = rx_queue(16);
        assert!(producer.push(&[1, 2, 3], &AtomicBool::new(false)).unwrap());
        assert_eq!(queue.len(), 3);
        assert!(queue.bytes_available());
        assert_eq!(queue.next_byte(), Some(1));
        assert_eq!(queue.next_byte(), Some(2));
        assert_eq!(queue.next_byte(), Some(3));
        assert_eq!(queue.next_byte(), None);
        assert!(!queue.is_closed());
    }

    #[test]
    fn test_rx_queue_closed_after_drain() {
        let (producer, mut queue) = rx_queue(16);
        producer.push(&[9], &AtomicBool::new(false)).unwrap();
        drop(producer);
        // Queued bytes are still delivered.
        assert!(!queue.is_closed());
        assert_eq!(queue.next_byte(), Some(9));
        assert_eq!(queue.next_byte(), None);
        assert!(queue.is_closed());
    }

    #[test]
    fn test_producer_fails_when_queue_dropped() {
        let (producer, queue) = rx_queue(4);
        drop(queue);
        assert!(matches!(
            producer.push(&[1], &AtomicBool::new(false)),
            Err(TransportError::Closed)
        ));
    }

    #[test]
    fn test_push_gives_up_when_stopped() {
        let (producer, queue) = rx_queue(2);
        let stop = AtomicBool::new(true);
        assert!(!producer.push(&[1, 2, 3, 4], &stop).unwrap());
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_stop_with_full_rx_queue() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        let client = TcpStream::connect(address).unwrap();
        let (mut bridge, _) = listener.accept().unwrap();

        let link = UartLink::from_stream(client, 16).unwrap();
        bridge.write_all(&[0x55; 64]).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while link.rx.len() < 16 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(link.rx.len(), 16);

        // The queue stays alive and full while the reader is stopped.
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let reader = link.reader;
        thread::spawn(move || {
            reader.stop();
            let _ = done_tx.send(());
        });
        assert!(
            done_rx.recv_timeout(Duration::from_secs(3)).is_ok(),
            "reader did not stop while the rx queue was full"
        );
        assert_eq!(link.rx.len(), 16);
    }

    #[test]
    fn test_link_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        let client = TcpStream::connect(address).unwrap();
        let (mut bridge, _) = listener.accept().unwrap();

        let mut link = UartLink::from_stream(client, 64).unwrap();
        assert!(link.reader.is_running());

        bridge.write_all(&[0x7E, 0x00, 0x02]).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut received = Vec::new();
        while received.len() < 3 && Instant::now() < deadline {
            match link.rx.next_byte() {
                Some(byte) => received.push(byte),
                None => thread::sleep(Duration::from_millis(5)),
            }
        }
        assert_eq!(received, vec![0x7E, 0x00, 0x02]);

        link.tx.write_byte(0x42).unwrap();
        link.tx.flush().unwrap();
        let mut echo = [0u8; 1];
        bridge.read_exact(&mut echo).unwrap();
        assert_eq!(echo, [0x42]);

        drop(bridge);
        let deadline = Instant::now() + Duration::from_secs(5);
        while !link.rx.is_closed() && Instant::now() < deadline {
            let _ = link.rx.next_byte();
            thread::sleep(Duration::from_millis(5));
        }
        assert!(link.rx.is_closed());
        link.reader.stop();
    }
}
