//! Hook pipeline engine.
//!
//! Pre-hooks run sequentially in registration order and may enrich the
//! context or short-circuit the chain with a block signal. Post-hooks all
//! run best-effort; a failing post-hook never alters control flow.
//!
//! A buggy pre-hook must never open a hole: internal hook errors are
//! converted into `GENERIC_BLOCK` signals naming the hook.

use crate::core::block::BlockSignal;
use crate::core::context::ToolContext;
use crate::core::error::GatehouseError;

/// Why a pre-hook did not return an enriched context.
#[derive(Debug, Clone)]
pub enum HookError {
    /// Intentional policy verdict; surfaced to the agent as-is.
    Block(BlockSignal),
    /// Unexpected internal failure; contained to a generic block.
    Internal(GatehouseError),
}

impl From<BlockSignal> for HookError {
    fn from(signal: BlockSignal) -> Self {
        Self::Block(signal)
    }
}

impl From<GatehouseError> for HookError {
    fn from(error: GatehouseError) -> Self {
        Self::Internal(error)
    }
}

/// Result of one pre-hook invocation.
pub type HookResult = Result<ToolContext, HookError>;

/// A hook that runs before tool execution.
pub trait PreHook: Send + Sync {
    /// Stable hook name, used for registration and block attribution.
    fn name(&self) -> &'static str;

    /// Consumes the current context; returns an enriched copy or a signal.
    fn run(&self, ctx: ToolContext) -> HookResult;
}

/// A hook that runs after tool execution, best-effort.
pub trait PostHook: Send + Sync {
    /// Stable hook name, used for registration and failure logging.
    fn name(&self) -> &'static str;

    /// Observes (and may further enrich) the context.
    fn run(&self, ctx: &mut ToolContext) -> crate::core::error::Result<()>;
}

/// Ordered pre- and post-hook registries.
#[derive(Default)]
pub struct Pipeline {
    pre: Vec<Box<dyn PreHook>>,
    post: Vec<Box<dyn PostHook>>,
}

impl Pipeline {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pre-hook. A second registration under the same name is
    /// a no-op; returns whether the hook was added.
    pub fn register_pre(&mut self, hook: Box<dyn PreHook>) -> bool {
        if self.pre.iter().any(|h| h.name() == hook.name()) {
            return false;
        }
        self.pre.push(hook);
        true
    }

    /// Registers a post-hook, with the same once-only semantics.
    pub fn register_post(&mut self, hook: Box<dyn PostHook>) -> bool {
        if self.post.iter().any(|h| h.name() == hook.name()) {
            return false;
        }
        self.post.push(hook);
        true
    }

    /// Runs the pre-chain, carrying the context forward hook by hook.
    ///
    /// # Errors
    /// Returns the first block signal; remaining pre-hooks are not
    /// invoked. Internal hook errors come back as `GENERIC_BLOCK`.
    pub fn run_pre(&self, mut ctx: ToolContext) -> Result<ToolContext, BlockSignal> {
        for hook in &self.pre {
            match hook.run(ctx) {
                Ok(next) => ctx = next,
                Err(HookError::Block(signal)) => return Err(signal),
                Err(HookError::Internal(error)) => {
                    tracing::warn!(hook = hook.name(), %error, "pre-hook failed; blocking call");
                    return Err(BlockSignal::generic(format!(
                        "Pre-hook '{}' failed: {error}",
                        hook.name()
                    )));
                }
            }
        }
        Ok(ctx)
    }

    /// Runs every post-hook; failures are logged and swallowed.
    pub fn run_post(&self, ctx: &mut ToolContext) {
        for hook in &self.post {
            if let Err(error) = hook.run(ctx) {
                tracing::warn!(hook = hook.name(), %error, "post-hook failed; continuing");
            }
        }
    }

    /// Number of registered pre-hooks.
    #[must_use]
    pub fn pre_len(&self) -> usize {
        self.pre.len()
    }

    /// Number of registered post-hooks.
    #[must_use]
    pub fn post_len(&self) -> usize {
        self.post.len()
    }
}
