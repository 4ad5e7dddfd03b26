use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use may::coroutine::JoinHandle;
use tracing::{error, info};

use super::service::AppService;
use crate::dispatcher::Dispatcher;
use crate::runtime_config::RuntimeConfig;

/// One-shot lifecycle hook. Single-slot: the last registration wins.
pub type LifecycleHook = Box<dyn FnOnce() + Send>;

type CloseHook = Arc<Mutex<Option<LifecycleHook>>>;

/// Lifecycle wrapper around the transport: bind, serve, shut down.
///
/// Runs the before-listen hook, applies the coroutine stack size from
/// [`RuntimeConfig`], starts the `may_minihttp` accept loop, and wires
/// SIGINT/SIGTERM to a graceful close that runs the before-close hook.
pub struct HttpServer {
    service: AppService,
    before_listen: Option<LifecycleHook>,
    before_close: CloseHook,
}

impl HttpServer {
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        HttpServer {
            service: AppService::new(dispatcher),
            before_listen: None,
            before_close: Arc::new(Mutex::new(None)),
        }
    }

    /// Run once right before the listener binds. Last registration wins.
    pub fn set_on_before_listen(&mut self, hook: impl FnOnce() + Send + 'static) {
        self.before_listen = Some(Box::new(hook));
    }

    /// Run once when the server shuts down, whether through
    /// [`ServerHandle::stop`] or a termination signal. Last registration
    /// wins.
    pub fn set_on_before_close(&mut self, hook: impl FnOnce() + Send + 'static) {
        *self.before_close.lock().unwrap() = Some(Box::new(hook));
    }

    /// Bind and serve. Returns a handle for readiness probing and shutdown.
    pub fn listen<A: ToSocketAddrs>(
        mut self,
        addr: A,
        config: &RuntimeConfig,
    ) -> io::Result<ServerHandle> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))?;

        may::config().set_stack_size(config.stack_size);

        if let Some(hook) = self.before_listen.take() {
            hook();
        }

        info!(addr = %addr, stack_size = config.stack_size, "Listening");
        let handle = may_minihttp::HttpServer(self.service).start(addr)?;

        #[cfg(unix)]
        spawn_signal_watcher(self.before_close.clone());

        Ok(ServerHandle {
            addr,
            handle,
            before_close: self.before_close,
        })
    }
}

/// Handle to a running server.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
    before_close: CloseHook,
}

impl ServerHandle {
    /// Poll the bound address until the server accepts connections.
    /// Useful in tests to avoid racing the accept loop.
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Graceful stop: run the before-close hook, cancel the accept loop,
    /// wait for it to finish.
    pub fn stop(self) {
        if let Some(hook) = self.before_close.lock().unwrap().take() {
            hook();
        }
        // SAFETY: cancelling the accept-loop coroutine is the intended
        // shutdown path; the handle is valid for the lifetime of self.
        unsafe {
            self.handle.coroutine().cancel();
        }
        let _ = self.handle.join();
    }

    /// Block until the server finishes (it runs until stopped).
    pub fn join(self) -> std::thread::Result<()> {
        self.handle.join()
    }
}

#[cfg(unix)]
fn spawn_signal_watcher(before_close: CloseHook) {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    thread::spawn(move || {
        let mut signals = match Signals::new([SIGINT, SIGTERM]) {
            Ok(signals) => signals,
            Err(err) => {
                error!(error = %err, "Failed to install signal handlers");
                return;
            }
        };
        if let Some(signal) = signals.forever().next() {
            info!(signal = signal, "Termination signal received, shutting down");
            if let Some(hook) = before_close.lock().unwrap().take() {
                hook();
            }
            std::process::exit(0);
        }
    });
}
