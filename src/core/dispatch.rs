//! Dispatch façade - the entry point used by the host.
//!
//! The mediator owns one pipeline instance with the standard hook chain
//! registered exactly once, and hands real tool execution to a
//! host-supplied dispatcher. On the success path the mediation layer is
//! invisible; on the audit path it is indelible.

use crate::core::context::ToolContext;
use crate::core::error::{GatehouseError, Result};
use crate::core::pipeline::Pipeline;
use crate::core::posthooks::{IntentMapUpdater, LessonRecorder, TraceLogger};
use crate::core::prehooks::{
    ContextInjector, IntentGatekeeper, OptimisticLockGuard, ScopeEnforcer,
};
use serde_json::{Map, Value};
use std::path::Path;
use uuid::Uuid;

/// Executes the real tools on behalf of the mediator.
pub trait ToolDispatcher: Send + Sync {
    /// Runs the named tool with the (possibly rewritten) parameters.
    ///
    /// # Errors
    /// Returns the tool's own error; the mediator forwards it verbatim.
    fn dispatch(&self, tool_name: &str, params: &Map<String, Value>) -> Result<Value>;
}

/// What the host gets back from one mediated call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Tool result, injected result, or block/error payload.
    pub content: Value,
    /// Whether a pre-hook blocked the call.
    pub blocked: bool,
    /// The block reason, when blocked.
    pub block_reason: Option<String>,
}

/// Mediator configuration, sourced from the environment by default.
#[derive(Debug, Clone, Default)]
pub struct MediatorConfig {
    /// Model identifier recorded with trace entries.
    pub model_identifier: Option<String>,
    /// Session identifier; generated lazily when absent.
    pub session_id: Option<String>,
}

impl MediatorConfig {
    /// Reads configuration from `GATEHOUSE_MODEL_ID` and
    /// `GATEHOUSE_SESSION_ID`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            model_identifier: std::env::var("GATEHOUSE_MODEL_ID").ok(),
            session_id: std::env::var("GATEHOUSE_SESSION_ID").ok(),
        }
    }
}

/// The tool-call mediation façade.
pub struct Mediator {
    pipeline: Pipeline,
    dispatcher: Box<dyn ToolDispatcher>,
    session_id: String,
    model_identifier: Option<String>,
}

impl Mediator {
    /// Creates a mediator with configuration from the environment.
    #[must_use]
    pub fn new(dispatcher: Box<dyn ToolDispatcher>) -> Self {
        Self::with_config(dispatcher, MediatorConfig::from_env())
    }

    /// Creates a mediator with explicit configuration.
    ///
    /// The standard hook chain is registered here, once per instance:
    /// injector, gatekeeper, scope enforcer, lock guard; then trace
    /// logger, intent-map updater, lesson recorder.
    #[must_use]
    pub fn with_config(dispatcher: Box<dyn ToolDispatcher>, config: MediatorConfig) -> Self {
        let mut pipeline = Pipeline::new();
        pipeline.register_pre(Box::new(ContextInjector));
        pipeline.register_pre(Box::new(IntentGatekeeper));
        pipeline.register_pre(Box::new(ScopeEnforcer));
        pipeline.register_pre(Box::new(OptimisticLockGuard));
        pipeline.register_post(Box::new(TraceLogger));
        pipeline.register_post(Box::new(IntentMapUpdater));
        pipeline.register_post(Box::new(LessonRecorder));

        Self {
            pipeline,
            dispatcher,
            session_id: config
                .session_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            model_identifier: config.model_identifier,
        }
    }

    /// Session identifier recorded with every trace entry.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Mediates one tool call.
    ///
    /// Pre-hooks may block the call or synthesize its result; otherwise
    /// the host dispatcher runs the real tool. Post-hooks observe the
    /// outcome best-effort either way.
    pub fn dispatch(
        &self,
        tool_name: &str,
        params: Map<String, Value>,
        workspace: &Path,
        session_intent: Option<&str>,
    ) -> DispatchOutcome {
        let mut ctx = ToolContext::new(tool_name, params, workspace, self.session_id.clone());
        if let Some(model) = &self.model_identifier {
            ctx = ctx.with_model(model.clone());
        }
        if let Some(intent_id) = session_intent {
            ctx = ctx.with_intent(intent_id);
        }

        let mut ctx = match self.pipeline.run_pre(ctx) {
            Ok(enriched) => enriched,
            Err(signal) => {
                return DispatchOutcome {
                    content: signal.error_payload(),
                    blocked: true,
                    block_reason: Some(signal.reason),
                }
            }
        };

        if let Some(injected) = ctx.injected_result.clone() {
            self.pipeline.run_post(&mut ctx);
            return DispatchOutcome {
                content: Value::String(injected),
                blocked: false,
                block_reason: None,
            };
        }

        let content = match self.dispatcher.dispatch(&ctx.tool_name, &ctx.params) {
            Ok(result) => result,
            Err(error) => tool_error_payload(&error),
        };

        self.pipeline.run_post(&mut ctx);

        DispatchOutcome {
            content,
            blocked: false,
            block_reason: None,
        }
    }
}

/// Renders a tool's own error for the agent; distinct from block payloads
/// only in that the code comes from the tool.
fn tool_error_payload(error: &GatehouseError) -> Value {
    serde_json::json!({
        "type": "error",
        "error": error.message,
        "code": error.code,
    })
}
