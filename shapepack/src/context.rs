//! Per-call state threaded through a single serialize/deserialize
//! invocation (spec §5, §6): recursion depth, cancellation, the async
//! flush threshold, and (optionally) the reference table used by
//! reference-preserving converters.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::options::CacheOptions;
use crate::reference::ReferenceTable;

/// Default nesting depth at which `SerializeContext::enter` refuses to
/// recurse further, guarding against cyclic or pathologically deep schemas
/// when reference preservation is disabled.
pub const DEFAULT_MAX_DEPTH: u32 = 64;

/// Default number of buffered-but-unflushed bytes an async writer will
/// accumulate before suspending to push them to the sink.
pub const DEFAULT_UNFLUSHED_BYTES_THRESHOLD: usize = 64 * 1024;

/// A cooperative cancellation flag. Cheap to clone and share across the
/// async reader/writer halves of one call.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct SerializeContext {
    pub max_depth: u32,
    pub unflushed_bytes_threshold: usize,
    depth: u32,
    cancellation: CancellationToken,
    references: Option<ReferenceTable>,
    options: CacheOptions,
}

impl SerializeContext {
    pub fn new(cancellation: CancellationToken) -> Self {
        SerializeContext {
            max_depth: DEFAULT_MAX_DEPTH,
            unflushed_bytes_threshold: DEFAULT_UNFLUSHED_BYTES_THRESHOLD,
            depth: 0,
            cancellation,
            references: None,
            options: CacheOptions::default(),
        }
    }

    pub fn with_reference_tracking(mut self) -> Self {
        self.references = Some(ReferenceTable::new());
        self
    }

    pub fn with_options(mut self, options: CacheOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    pub fn references_mut(&mut self) -> Option<&mut ReferenceTable> {
        self.references.as_mut()
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn check_cancelled(&self) -> Result<()> {
        if self.cancellation.is_cancelled() {
            Err(Error::cancelled())
        } else {
            Ok(())
        }
    }

    /// Enter one level of recursion for the duration of `body`, failing
    /// with `ErrorCode::DepthExceeded` rather than overflowing the native
    /// call stack on a cyclic or adversarially deep schema.
    pub fn enter<T>(&mut self, body: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.depth += 1;
        if self.depth > self.max_depth {
            self.depth -= 1;
            return Err(Error::depth_exceeded(self.max_depth));
        }
        let result = body(self);
        self.depth -= 1;
        result
    }
}

impl Default for SerializeContext {
    fn default() -> Self {
        SerializeContext::new(CancellationToken::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_restores_depth_after_success_and_failure() {
        let mut ctx = SerializeContext::default();
        let _ = ctx.enter(|ctx| {
            assert_eq!(ctx.depth(), 1);
            Ok::<_, Error>(())
        });
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn exceeding_max_depth_errors() {
        let mut ctx = SerializeContext::default();
        ctx.max_depth = 1;
        let outcome = ctx.enter(|ctx| ctx.enter(|_| Ok::<_, Error>(())));
        assert!(outcome.is_err());
    }

    #[test]
    fn cancellation_is_observed() {
        let token = CancellationToken::new();
        let ctx = SerializeContext::new(token.clone());
        assert!(ctx.check_cancelled().is_ok());
        token.cancel();
        assert!(ctx.check_cancelled().is_err());
    }
}
