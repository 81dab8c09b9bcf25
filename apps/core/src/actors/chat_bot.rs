use crate::actors::messages::{ActorError, AppError, BotMessage, Utterance};
use crate::actors::traits::ChatResponder;
use crate::brain::engine::{IntentEngine, Reply};
use crate::journal::{JournalEntry, JournalHandle};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Semaphore};
use tokio::time::timeout;
use tracing::{info, instrument, Span};
use uuid::Uuid;

/// Extra time the handle waits on top of the inference deadline, so the
/// runner can still answer with a reserve reply after a missed deadline.
const REPLY_MARGIN: Duration = Duration::from_secs(1);

/// Default number of blocking inference workers that may run at once.
/// Workers that missed their deadline keep their slot until they finish.
pub const MAX_INFERENCE_WORKERS: usize = 8;

/// A handle to the `ChatBotActor`.
///
/// This struct provides a public, cloneable interface for sending messages to
/// the running actor. Each message is processed on its own task, so a slow
/// classification never holds up the next message.
#[derive(Clone)]
pub struct ChatBotHandle {
    sender: mpsc::Sender<BotMessage>,
    reply_timeout: Duration,
}

impl ChatBotHandle {
    /// Spawns the actor and returns a handle to it.
    ///
    /// # Arguments
    ///
    /// * `engine` - The loaded, immutable intent engine.
    /// * `inference_timeout` - Deadline for classifying one message.
    /// * `journal` - Where processed messages are recorded, if anywhere.
    pub fn new(
        engine: Arc<IntentEngine>,
        inference_timeout: Duration,
        journal: Option<JournalHandle>,
    ) -> Self {
        Self::with_worker_limit(engine, inference_timeout, journal, MAX_INFERENCE_WORKERS)
    }

    /// Same as [`new`](Self::new) with an explicit cap on concurrent
    /// inference workers. Waiting for a free worker counts against the
    /// inference deadline.
    pub fn with_worker_limit(
        engine: Arc<IntentEngine>,
        inference_timeout: Duration,
        journal: Option<JournalHandle>,
        workers: usize,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(64);
        let actor = ChatBotRunner {
            receiver,
            engine,
            inference_timeout,
            journal,
            workers: Arc::new(Semaphore::new(workers.max(1))),
        };
        tokio::spawn(async move { actor.run().await });
        Self {
            sender,
            reply_timeout: inference_timeout + REPLY_MARGIN,
        }
    }

    /// Classifies one incoming message and returns the full reply.
    #[instrument(skip(self, utterance), fields(request_id = tracing::field::Empty))]
    pub async fn respond(
        &self,
        utterance: Utterance,
        threshold: Option<f32>,
    ) -> Result<Reply, AppError> {
        let request_id = Uuid::new_v4();
        Span::current().record("request_id", tracing::field::display(request_id));

        let (send, recv) = oneshot::channel();
        let msg = BotMessage::Respond {
            request_id,
            utterance,
            threshold,
            responder: send,
        };
        self.sender
            .send(msg)
            .await
            .map_err(|e| AppError::Actor(ActorError::Closed(e.to_string())))?;
        timeout(self.reply_timeout, recv)
            .await
            .map_err(ActorError::from)?
            .map_err(|e| ActorError::Closed(e.to_string()))?
    }

    /// Stops the actor. Later requests fail with `ActorError::Closed`.
    pub async fn shutdown(&self) -> Result<(), AppError> {
        self.sender
            .send(BotMessage::Shutdown)
            .await
            .map_err(|e| AppError::Actor(ActorError::Closed(e.to_string())))
    }
}

#[async_trait]
impl ChatResponder for ChatBotHandle {
    async fn classify_and_respond(
        &self,
        text: String,
        threshold: Option<f32>,
    ) -> Result<String, AppError> {
        Ok(self.respond(Utterance::Text(text), threshold).await?.text)
    }

    async fn respond_bytes(
        &self,
        bytes: Vec<u8>,
        threshold: Option<f32>,
    ) -> Result<String, AppError> {
        Ok(self.respond(Utterance::Bytes(bytes), threshold).await?.text)
    }
}

// --- Actor Runner ---
struct ChatBotRunner {
    receiver: mpsc::Receiver<BotMessage>,
    engine: Arc<IntentEngine>,
    inference_timeout: Duration,
    journal: Option<JournalHandle>,
    workers: Arc<Semaphore>,
}

impl ChatBotRunner {
    async fn run(mut self) {
        info!("ChatBot actor started");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                BotMessage::Respond {
                    request_id,
                    utterance,
                    threshold,
                    responder,
                } => {
                    let engine = Arc::clone(&self.engine);
                    let journal = self.journal.clone();
                    let workers = Arc::clone(&self.workers);
                    let deadline = self.inference_timeout;
                    tokio::spawn(async move {
                        let job = Job {
                            request_id,
                            utterance,
                            threshold,
                            deadline,
                        };
                        let result = process(engine, workers, job, journal).await;
                        let _ = responder.send(result);
                    });
                }
                BotMessage::Shutdown => {
                    info!("ChatBot actor shutting down");
                    break;
                }
            }
        }
        info!("ChatBot actor stopped");
    }
}

struct Job {
    request_id: Uuid,
    utterance: Utterance,
    threshold: Option<f32>,
    deadline: Duration,
}

/// Run the pipeline for one message off the async threads, bounded by the
/// job's deadline.
#[instrument(skip_all, fields(request_id = %job.request_id))]
async fn process(
    engine: Arc<IntentEngine>,
    workers: Arc<Semaphore>,
    job: Job,
    journal: Option<JournalHandle>,
) -> Result<Reply, AppError> {
    let Job {
        request_id,
        utterance,
        threshold,
        deadline,
    } = job;
    let text = utterance.display_text();

    let worker = Arc::clone(&engine);
    let inference = async move {
        let permit = workers
            .acquire_owned()
            .await
            .map_err(|e| ActorError::Closed(e.to_string()))?;
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let mut rng = rand::thread_rng();
            match &utterance {
                Utterance::Text(text) => worker.respond(text, threshold, &mut rng),
                Utterance::Bytes(bytes) => worker.respond_bytes(bytes, threshold, &mut rng),
            }
        });
        Ok::<_, AppError>(handle.await)
    };

    let reply = match timeout(deadline, inference).await {
        Ok(Ok(Ok(result))) => result?,
        Ok(Ok(Err(join_error))) => recover(
            &engine,
            AppError::Classification(format!("Inference worker failed: {}", join_error)),
        )?,
        Ok(Err(err)) => return Err(err),
        Err(_) => recover(
            &engine,
            AppError::Timeout(format!("Classification exceeded {:?}", deadline)),
        )?,
    };

    info!(
        target: "incoming",
        text = %text,
        intent = reply.intent.as_deref().unwrap_or("none"),
        "Incoming message"
    );
    if let Some(journal) = &journal {
        journal.record(JournalEntry::new(request_id, text, &reply));
    }
    Ok(reply)
}

fn recover(engine: &IntentEngine, err: AppError) -> Result<Reply, AppError> {
    engine.recover(&err, &mut rand::thread_rng())
}
