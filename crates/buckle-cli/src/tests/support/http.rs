//! Minimal HTTP responder standing in for the server's health endpoint.
//!
//! Every request is answered with the current status code and an empty body.
//! The status can be changed while the responder runs, which lets tests model
//! a server that becomes healthy after a delay.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::num::NonZeroU16;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// Shared handle for changing the responder's status code.
#[derive(Debug, Clone)]
pub(crate) struct StatusHandle(Arc<AtomicU16>);

impl StatusHandle {
    pub fn set(&self, status: u16) {
        self.0.store(status, Ordering::SeqCst);
    }
}

/// HTTP responder listening on an ephemeral loopback port.
pub(crate) struct HealthServer {
    address: SocketAddr,
    status: StatusHandle,
    hits: Arc<AtomicUsize>,
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl HealthServer {
    pub fn start(status: u16) -> Self {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind health responder");
        let address = listener.local_addr().expect("health responder address");
        let status = StatusHandle(Arc::new(AtomicU16::new(status)));
        let hits = Arc::new(AtomicUsize::new(0));
        let stop = Arc::new(AtomicBool::new(false));

        let thread_status = status.clone();
        let thread_hits = Arc::clone(&hits);
        let thread_stop = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            for stream in listener.incoming() {
                if thread_stop.load(Ordering::SeqCst) {
                    break;
                }
                let Ok(stream) = stream else {
                    continue;
                };
                thread_hits.fetch_add(1, Ordering::SeqCst);
                respond(stream, thread_status.0.load(Ordering::SeqCst));
            }
        });

        Self {
            address,
            status,
            hits,
            stop,
            handle: Some(handle),
        }
    }

    pub fn port(&self) -> NonZeroU16 {
        NonZeroU16::new(self.address.port()).expect("ephemeral port is non-zero")
    }

    pub fn status_handle(&self) -> StatusHandle {
        self.status.clone()
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for HealthServer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        // Wake the accept loop so it observes the stop flag.
        let _ = TcpStream::connect(self.address);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn respond(mut stream: TcpStream, status: u16) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(1)));
    let mut request = Vec::new();
    let mut buffer = [0_u8; 512];
    while !request.windows(4).any(|window| window == b"\r\n\r\n") {
        match stream.read(&mut buffer) {
            Ok(0) | Err(_) => break,
            Ok(read) => request.extend_from_slice(&buffer[..read]),
        }
    }
    let response =
        format!("HTTP/1.1 {status} Health\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}
