//! Per-message orchestrator.
//!
//! Each inbound text message runs the same sequence: load or create the user
//! record, intercept commands, decide conversation continuity, query the Ask
//! backend, deliver the answer, persist the new conversation state. The
//! typing indicator runs alongside and is stopped on every exit path; every
//! error is trapped here and mapped to one generic failure message.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{error, info, warn};

use askbridge_ask::{AskBackend, AskError};
use askbridge_core::session::should_reset;
use askbridge_store::{StoreError, UserStore};

use crate::client::ChatTransport;
use crate::commands;
use crate::error::WaError;
use crate::send;
use crate::typing::TypingHandle;
use crate::webhook::InboundMessage;

/// Explicitly injected dependencies for message handling.
///
/// Constructed once at process start and shared across all in-flight
/// messages; no global lookups.
pub struct BridgeContext {
    pub ask: Arc<dyn AskBackend>,
    pub transport: Arc<dyn ChatTransport>,
    pub store: UserStore,
    pub session_timeout_minutes: i64,
}

#[derive(Debug, thiserror::Error)]
enum HandlerError {
    #[error(transparent)]
    Ask(#[from] AskError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    WhatsApp(#[from] WaError),
}

/// Process one inbound message end to end.
///
/// Never returns an error: failures are logged with their full diagnostics
/// and the user receives a single generic failure notice. One message's
/// failure cannot affect other users' in-flight handling.
pub async fn process_message(ctx: &BridgeContext, inbound: InboundMessage) {
    if let Err(e) = ctx.transport.mark_read(&inbound.message_id).await {
        warn!(error = %e, wa_id = %inbound.wa_id, "failed to mark message as read");
    }

    let typing = TypingHandle::start(Arc::clone(&ctx.transport), inbound.message_id.clone());
    let result = handle_text_message(ctx, &inbound).await;
    typing.stop();

    if let Err(e) = result {
        report_failure(ctx, &inbound.wa_id, &e).await;
    }
}

/// The sequential state machine for one message.
async fn handle_text_message(
    ctx: &BridgeContext,
    inbound: &InboundMessage,
) -> Result<(), HandlerError> {
    let now = Utc::now();
    let text = inbound.text.trim();
    let wa_id = inbound.wa_id.as_str();
    let username = inbound.username.as_deref();

    // 1. Load-or-create. A first-ever message gets the welcome text and
    //    never reaches the Ask backend.
    let Some(user) = ctx.store.get(wa_id)? else {
        ctx.store.create(wa_id, username, now)?;
        info!(wa_id, "first contact, user record created");
        ctx.transport
            .send_text(wa_id, &commands::welcome_text(ctx.session_timeout_minutes))
            .await?;
        return Ok(());
    };

    // 2. Command dispatch.
    let lowered = text.to_lowercase();
    if lowered == commands::START_COMMAND {
        ctx.transport
            .send_text(wa_id, &commands::welcome_text(ctx.session_timeout_minutes))
            .await?;
        return Ok(());
    }
    if lowered == commands::NEW_COMMAND {
        ctx.store.reset_conversation(wa_id, username, now)?;
        ctx.transport
            .send_text(wa_id, commands::NEW_CONVERSATION_TEXT)
            .await?;
        return Ok(());
    }
    if lowered == commands::HELP_COMMAND {
        ctx.transport
            .send_text(wa_id, &commands::help_text(ctx.session_timeout_minutes))
            .await?;
        return Ok(());
    }

    // 3. Continuity check — an expired idle timer forces a fresh conversation.
    let timeout = Duration::minutes(ctx.session_timeout_minutes);
    let conversation_id = if should_reset(Some(user.last_interaction), now, timeout) {
        None
    } else {
        user.conversation_id.as_deref()
    };

    // 4. Query. Errors propagate before any state is touched.
    let answer = ctx.ask.send_query(text, conversation_id).await?;

    // 5. Render and deliver, in chunk order.
    send::send_answer(ctx.transport.as_ref(), wa_id, &answer.message).await?;

    // 6. Persist — the timestamp is the instant captured at step 1.
    ctx.store
        .record_exchange(wa_id, username, answer.conversation_id.as_deref(), now)?;

    Ok(())
}

/// Log the failure with its full diagnostics and notify the user once.
async fn report_failure(ctx: &BridgeContext, wa_id: &str, err: &HandlerError) {
    match err {
        HandlerError::WhatsApp(WaError::Api {
            code,
            subcode,
            kind,
            message,
            is_transient,
            fbtrace_id,
        }) => error!(
            wa_id,
            code,
            subcode = ?subcode,
            kind = %kind,
            is_transient = ?is_transient,
            fbtrace_id = ?fbtrace_id,
            message = %message,
            "WhatsApp API error"
        ),
        HandlerError::Ask(AskError::Upstream(payload)) => {
            error!(wa_id, payload = %payload, "Ask backend rejected the query")
        }
        HandlerError::Ask(AskError::Api { status, body }) => {
            error!(wa_id, status, body = %body, "Ask transport failure")
        }
        other => error!(wa_id, error = %other, "message handling failed"),
    }

    if let Err(e) = ctx.transport.send_text(wa_id, commands::FAILURE_TEXT).await {
        warn!(wa_id, error = %e, "failed to deliver the failure notice");
    }
}
