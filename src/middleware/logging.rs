use std::sync::Arc;

use tracing::info;

use super::MiddlewareHandler;
use crate::context::Context;

/// A global middleware entry that logs each request as it enters the chain.
///
/// The dispatcher already traces state transitions at debug level; this adds
/// one info-level line per request for setups that filter debug out.
#[must_use]
pub fn request_logging() -> MiddlewareHandler {
    Arc::new(|ctx: &mut Context| {
        info!(
            method = %ctx.method(),
            path = %ctx.path(),
            "Request received"
        );
        Ok(())
    })
}
