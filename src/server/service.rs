use std::io;
use std::sync::Arc;

use may_minihttp::{HttpService, Request, Response};

use super::request::parse_request;
use crate::dispatcher::Dispatcher;
use crate::response::WireResponse;

/// The transport adapter: one `call` per request, parsing the raw request,
/// running it through the dispatcher, and writing the assembled response.
///
/// Cloned per connection by the server; the dispatcher behind the `Arc` is
/// read-only, so clones share it without locking.
#[derive(Clone)]
pub struct AppService {
    pub dispatcher: Arc<Dispatcher>,
}

impl AppService {
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        AppService { dispatcher }
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let raw = parse_request(req);
        let wire = self.dispatcher.handle(raw);
        write_wire_response(res, wire);
        Ok(())
    }
}

/// Write an assembled response into may_minihttp's response object.
/// Header lines and reason phrases are leaked: the sink wants `'static`
/// strings and responses outlive the call.
pub fn write_wire_response(res: &mut Response, wire: WireResponse) {
    res.status_code(
        wire.status as usize,
        Box::leak(wire.reason.into_boxed_str()),
    );
    for (name, value) in wire.headers.iter() {
        let line = format!("{name}: {value}").into_boxed_str();
        res.header(Box::leak(line));
    }
    res.body_vec(wire.body);
}
