//! Chat service: admission, generation, and exactly-once finalization.
//!
//! Both paths share the same admission sequence (validate -> quota ->
//! thread) and the same finalization sequence (persist -> deduct -> usage
//! event -> recency -> cache invalidation). Admission rejects before any
//! generation cost is incurred; finalization is best-effort ordered and
//! never rolls back -- the generation cost is already sunk.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use futures_util::StreamExt;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use colloquy_types::account::UserIdentity;
use colloquy_types::chat::{ChatTurn, ThreadSummary};
use colloquy_types::error::ChatError;
use colloquy_types::llm::{
    estimate_tokens, GenerationRequest, LlmError, StreamEvent, Usage,
};
use colloquy_types::usage::{QuotaStatus, UsageEvent};

use crate::cache::ThreadListCache;
use crate::chat::metrics::TurnMetrics;
use crate::chat::stream::{TurnEvent, TurnPhase, TurnStream};
use crate::context::ContextAssembler;
use crate::llm::provider::{GenerationStream, LlmProvider};
use crate::llm::ModelCatalog;
use crate::quota::{Admission, QuotaLedger, QuotaRepository};
use crate::thread::{ThreadRepository, ThreadStore};
use crate::usage::UsageRepository;

/// Sampling temperature used for all generations.
const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Fragment channel capacity; the pump keeps draining the provider even
/// when the caller is slow or gone.
const FRAGMENT_CHANNEL_CAPACITY: usize = 32;

/// A caller's request for one turn.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub message: String,
    /// Existing thread to continue; absent creates a new thread.
    pub thread_id: Option<Uuid>,
    /// Model alias ("opus", "sonnet", "haiku"); absent or unknown uses the
    /// catalog default.
    pub model: Option<String>,
}

/// The complete exchange returned by the synchronous path.
#[derive(Debug, Clone, Serialize)]
pub struct TurnReceipt {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub user_text: String,
    pub model_text: String,
    pub tokens_used: u32,
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub turn_count: u32,
}

/// Outcome of the admission phases (Init + Admitted) shared by both paths.
struct AdmittedTurn {
    thread_id: Uuid,
    prompt: String,
    model_id: String,
    max_tokens: u32,
    prior_turns: u32,
}

/// Orchestrates quota ledger, thread store, context assembler, generation
/// provider, and thread-list cache for chat turns.
pub struct ChatService<Q, T, U, P, C>
where
    Q: QuotaRepository,
    T: ThreadRepository,
    U: UsageRepository,
    P: LlmProvider,
    C: ThreadListCache,
{
    quota: QuotaLedger<Q>,
    threads: ThreadStore<T>,
    usage: U,
    provider: P,
    cache: C,
    assembler: ContextAssembler,
    catalog: ModelCatalog,
    cache_ttl: Duration,
    metrics: TurnMetrics,
}

impl<Q, T, U, P, C> ChatService<Q, T, U, P, C>
where
    Q: QuotaRepository + 'static,
    T: ThreadRepository + 'static,
    U: UsageRepository + 'static,
    P: LlmProvider + 'static,
    C: ThreadListCache + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        quota: QuotaLedger<Q>,
        threads: ThreadStore<T>,
        usage: U,
        provider: P,
        cache: C,
        assembler: ContextAssembler,
        catalog: ModelCatalog,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            quota,
            threads,
            usage,
            provider,
            cache,
            assembler,
            catalog,
            cache_ttl,
            metrics: TurnMetrics::default(),
        }
    }

    /// Turn counters for the stats endpoint.
    pub fn metrics(&self) -> &TurnMetrics {
        &self.metrics
    }

    // --- Admission (Init + Admitted phases) ---

    /// Validate the request, admit it against the quota, and resolve or
    /// create the thread. No generation cost is incurred on any failure
    /// path here.
    async fn admit(
        &self,
        user: &UserIdentity,
        request: &TurnRequest,
    ) -> Result<AdmittedTurn, ChatError> {
        if request.message.trim().is_empty() {
            return Err(ChatError::InvalidInput(
                "message must not be empty".to_string(),
            ));
        }
        debug!(owner_id = %user.id, phase = %TurnPhase::Init, "turn accepted for admission");

        match self.quota.check_and_reset(&user.id, Utc::now()).await? {
            Admission::Allowed { remaining } => {
                debug!(
                    owner_id = %user.id,
                    phase = %TurnPhase::Admitted,
                    remaining,
                    "quota admission passed"
                );
            }
            Admission::Exhausted { reset_at } => {
                return Err(ChatError::QuotaExhausted { reset_at });
            }
        }

        let thread_id = match request.thread_id {
            Some(thread_id) => {
                self.threads.assert_ownership(&thread_id, &user.id).await?;
                thread_id
            }
            None => {
                self.threads
                    .create_thread(user.id, &request.message)
                    .await?
                    .id
            }
        };

        let history = self.threads.load_history(&thread_id).await?;
        let prompt = self.assembler.build(&history, &request.message);
        let spec = self.catalog.resolve(request.model.as_deref());

        Ok(AdmittedTurn {
            thread_id,
            prompt,
            model_id: spec.id.clone(),
            max_tokens: spec.max_output_tokens,
            prior_turns: history.len() as u32,
        })
    }

    // --- Synchronous path ---

    /// Run one whole-answer turn: admit, generate, finalize, respond.
    pub async fn send_turn(
        &self,
        user: UserIdentity,
        request: TurnRequest,
    ) -> Result<TurnReceipt, ChatError> {
        let admitted = self.admit(&user, &request).await?;

        let generation = self
            .provider
            .complete(&GenerationRequest {
                model: admitted.model_id.clone(),
                prompt: admitted.prompt,
                max_tokens: admitted.max_tokens,
                temperature: Some(DEFAULT_TEMPERATURE),
                stream: false,
            })
            .await
            .inspect_err(|e| {
                self.metrics.turn_failed();
                warn!(
                    owner_id = %user.id,
                    thread_id = %admitted.thread_id,
                    phase = %TurnPhase::Failed,
                    error = %e,
                    "generation failed"
                );
            })?;

        let turn = self
            .finalize_turn(
                user,
                admitted.thread_id,
                request.message,
                generation.text,
                generation.tokens_used,
                admitted.model_id,
            )
            .await;

        Ok(TurnReceipt {
            id: turn.id,
            thread_id: turn.thread_id,
            user_text: turn.user_text,
            model_text: turn.model_text,
            tokens_used: turn.tokens_used,
            model: turn.model,
            created_at: turn.created_at,
            turn_count: admitted.prior_turns + 1,
        })
    }

    // --- Streaming path ---

    /// Begin a streaming turn.
    ///
    /// Admission failures return `Err` before any stream opens. On success
    /// the provider stream is handed to a detached pump task that forwards
    /// fragments over the returned channel and then finalizes exactly
    /// once. Dropping the receiver stops delivery but neither the
    /// generation nor its finalization: cost accounting is never skipped
    /// because the caller disconnected.
    pub async fn stream_turn(
        self: Arc<Self>,
        user: UserIdentity,
        request: TurnRequest,
    ) -> Result<TurnStream, ChatError> {
        let admitted = self.admit(&user, &request).await?;

        let llm_stream = self.provider.stream(GenerationRequest {
            model: admitted.model_id.clone(),
            prompt: admitted.prompt,
            max_tokens: admitted.max_tokens,
            temperature: Some(DEFAULT_TEMPERATURE),
            stream: true,
        });

        let (tx, rx) = mpsc::channel(FRAGMENT_CHANNEL_CAPACITY);
        let thread_id = admitted.thread_id;
        let model_id = admitted.model_id;
        let user_text = request.message;
        let service = Arc::clone(&self);

        tokio::spawn(async move {
            service
                .pump(llm_stream, tx, user, thread_id, user_text, model_id)
                .await;
        });

        Ok(TurnStream {
            thread_id,
            events: rx,
        })
    }

    /// Drive the provider stream to completion, forwarding fragments, then
    /// finalize. Runs on its own task so it outlives the request handler.
    async fn pump(
        &self,
        stream: GenerationStream,
        tx: mpsc::Sender<TurnEvent>,
        owner: UserIdentity,
        thread_id: Uuid,
        user_text: String,
        model_id: String,
    ) {
        let mut full_text = String::new();
        let mut usage: Option<Usage> = None;
        let mut failure: Option<LlmError> = None;

        let mut stream = std::pin::pin!(stream);
        while let Some(event) = stream.next().await {
            match event {
                Ok(StreamEvent::TextDelta { text }) => {
                    full_text.push_str(&text);
                    // A closed channel means the caller disconnected; keep
                    // draining so the generation is still accounted for.
                    let _ = tx.send(TurnEvent::Fragment { text }).await;
                }
                Ok(StreamEvent::Usage(reported)) => usage = Some(reported),
                Ok(StreamEvent::Done) => break,
                Ok(StreamEvent::Connected) => {}
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        match failure {
            None => {
                debug!(
                    thread_id = %thread_id,
                    phase = %TurnPhase::Finalizing,
                    "stream complete, finalizing"
                );
                let tokens_used = usage
                    .map(|u| u.total())
                    .filter(|total| *total > 0)
                    .unwrap_or_else(|| estimate_tokens(&full_text));
                let turn = self
                    .finalize_turn(owner, thread_id, user_text, full_text, tokens_used, model_id)
                    .await;
                let _ = tx
                    .send(TurnEvent::Completed {
                        thread_id,
                        tokens_used: turn.tokens_used,
                        model: turn.model,
                    })
                    .await;
            }
            Some(e) => {
                warn!(
                    thread_id = %thread_id,
                    phase = %TurnPhase::Failed,
                    error = %e,
                    "stream failed, no turn persisted"
                );
                self.metrics.turn_failed();
                let _ = tx
                    .send(TurnEvent::Error {
                        message: e.to_string(),
                    })
                    .await;
            }
        }
    }

    // --- Finalization ---

    /// The once-per-turn durable side effects, in order: persist the turn,
    /// deduct the spend, record the usage event, bump thread recency,
    /// invalidate the owner's thread-list cache entry.
    ///
    /// Best-effort: each step logs its own failure and later steps still
    /// run. Nothing rolls back -- this is an at-least-once accounting
    /// guarantee, not exactly-once.
    async fn finalize_turn(
        &self,
        owner: UserIdentity,
        thread_id: Uuid,
        user_text: String,
        model_text: String,
        tokens_used: u32,
        model: String,
    ) -> ChatTurn {
        let turn = ChatTurn {
            id: Uuid::now_v7(),
            thread_id,
            owner_id: owner.id,
            user_text,
            model_text,
            tokens_used,
            model,
            created_at: Utc::now(),
        };

        if let Err(e) = self.threads.append_turn(&turn).await {
            error!(thread_id = %thread_id, error = %e, "failed to persist turn");
        }

        match self.quota.deduct(&owner.id, tokens_used).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(
                    owner_id = %owner.id,
                    tokens = tokens_used,
                    "accounting anomaly: deduct failed after generation"
                );
                self.metrics.accounting_anomaly();
            }
            Err(e) => error!(owner_id = %owner.id, error = %e, "deduct errored"),
        }

        let event = UsageEvent {
            id: Uuid::now_v7(),
            owner_id: owner.id,
            model: turn.model.clone(),
            tokens_used,
            created_at: turn.created_at,
        };
        if let Err(e) = self.usage.record(&event).await {
            error!(owner_id = %owner.id, error = %e, "failed to record usage event");
        }

        if let Err(e) = self.threads.touch(&thread_id).await {
            error!(thread_id = %thread_id, error = %e, "failed to bump thread recency");
        }

        self.cache.invalidate(&owner.id).await;
        self.metrics.turn_completed();
        info!(
            thread_id = %thread_id,
            tokens = tokens_used,
            phase = %TurnPhase::Done,
            "turn finalized"
        );
        turn
    }

    // --- Listing, history, rename, quota status ---

    /// An owner's thread summaries, read through the cache.
    pub async fn list_threads(&self, owner_id: &Uuid) -> Result<Vec<ThreadSummary>, ChatError> {
        if let Some(cached) = self.cache.get(owner_id).await {
            return Ok(cached);
        }
        let summaries = self.threads.list_for_owner(owner_id).await?;
        self.cache
            .put(owner_id, summaries.clone(), self.cache_ttl)
            .await;
        Ok(summaries)
    }

    /// A thread's full ordered history, ownership-checked.
    pub async fn thread_history(
        &self,
        owner_id: &Uuid,
        thread_id: &Uuid,
    ) -> Result<Vec<ChatTurn>, ChatError> {
        self.threads.assert_ownership(thread_id, owner_id).await?;
        self.threads.load_history(thread_id).await
    }

    /// Rename a thread, ownership-checked, and invalidate the owner's
    /// cached listing.
    pub async fn rename_thread(
        &self,
        owner_id: &Uuid,
        thread_id: &Uuid,
        new_title: &str,
    ) -> Result<(), ChatError> {
        self.threads
            .rename_thread(thread_id, owner_id, new_title)
            .await?;
        self.cache.invalidate(owner_id).await;
        Ok(())
    }

    /// The owner's quota standing plus month-to-date recorded spend.
    pub async fn quota_status(&self, owner_id: &Uuid) -> Result<QuotaStatus, ChatError> {
        let (account, allotment) = self.quota.status(owner_id).await?;
        let tokens_this_period = match self
            .usage
            .total_tokens_since(owner_id, month_start(Utc::now()))
            .await
        {
            Ok(total) => total,
            Err(e) => {
                warn!(owner_id = %owner_id, error = %e, "failed to aggregate period usage");
                0
            }
        };
        Ok(QuotaStatus {
            membership_tier: account.membership_tier,
            remaining_units: account.remaining_units,
            allotment,
            units_reset_at: account.units_reset_at,
            tokens_this_period,
        })
    }
}

/// Midnight UTC on the first of the current month.
fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}
