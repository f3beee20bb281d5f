//! Single-flight credential refresh.
//!
//! The first request to see a 401 while no refresh is running becomes the
//! driver: it starts the one refresh exchange. Requests that see a 401 while
//! that exchange is outstanding queue behind it as followers. When the
//! exchange settles the store is updated (or cleared) once, and every caller
//! of that window is either replayed exactly once or rejected.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use crate::auth::credential::CredentialPair;
use crate::auth::refresh::exchange_refresh_token;
use crate::dispatch::{DispatchError, Dispatcher};
use crate::error::RagchatError;
use crate::request::{ApiResponse, RequestDescriptor};

type Reply = oneshot::Sender<Result<ApiResponse, RagchatError>>;

struct PendingCaller {
    request: RequestDescriptor,
    reply: Reply,
}

enum RefreshState {
    Idle,
    InFlight {
        /// Credential generation the refresh was started from.
        started_at: u64,
        driver: PendingCaller,
        followers: VecDeque<PendingCaller>,
    },
}

enum Expiry {
    Wait(oneshot::Receiver<Result<ApiResponse, RagchatError>>),
    Replay(RequestDescriptor),
    Reject,
}

enum Settlement {
    Replay,
    Reject,
}

struct Inner {
    dispatcher: Dispatcher,
    state: Mutex<RefreshState>,
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owns the refresh protocol for one client session.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refreshing", &self.is_refreshing())
            .field("queued", &self.queued())
            .finish_non_exhaustive()
    }
}

impl RefreshCoordinator {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            inner: Arc::new(Inner {
                dispatcher,
                state: Mutex::new(RefreshState::Idle),
            }),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(*self.inner.lock_state(), RefreshState::InFlight { .. })
    }

    /// Followers waiting on the in-flight refresh (the driver is not counted).
    pub fn queued(&self) -> usize {
        match &*self.inner.lock_state() {
            RefreshState::Idle => 0,
            RefreshState::InFlight { followers, .. } => followers.len(),
        }
    }

    /// Dispatch `request`, recovering from an expired credential through the
    /// refresh protocol.
    pub async fn send(&self, request: RequestDescriptor) -> Result<ApiResponse, RagchatError> {
        match self.inner.dispatcher.send(&request).await {
            Ok(response) => Ok(response),
            Err(DispatchError::ExpiredCredential { generation }) => {
                self.recover(request, generation).await
            }
            Err(DispatchError::Failed(err)) => Err(err),
        }
    }

    /// Handle a 401 observed by `request`, which was sent with credential
    /// `generation`.
    pub async fn recover(
        &self,
        request: RequestDescriptor,
        generation: u64,
    ) -> Result<ApiResponse, RagchatError> {
        let next = {
            let mut state = self.inner.lock_state();
            if let RefreshState::InFlight { followers, .. } = &mut *state {
                let (reply, rx) = oneshot::channel();
                tracing::debug!(
                    request_id = %request.id(),
                    position = followers.len() + 1,
                    "queued behind in-flight refresh"
                );
                followers.push_back(PendingCaller { request, reply });
                Expiry::Wait(rx)
            } else {
                self.begin(&mut state, request, generation)
            }
        };

        match next {
            Expiry::Wait(rx) => rx
                .await
                .unwrap_or(Err(RagchatError::AuthenticationExpired)),
            Expiry::Replay(request) => replay(&self.inner.dispatcher, &request).await,
            Expiry::Reject => Err(RagchatError::AuthenticationExpired),
        }
    }

    /// Decide what an expiry observed while idle turns into. Called with the
    /// state lock held.
    fn begin(
        &self,
        state: &mut RefreshState,
        request: RequestDescriptor,
        generation: u64,
    ) -> Expiry {
        let snapshot = self.inner.dispatcher.credentials().snapshot();
        match snapshot.pair {
            None => {
                tracing::debug!(
                    request_id = %request.id(),
                    "no stored credentials, not refreshing"
                );
                Expiry::Reject
            }
            Some(_) if snapshot.generation != generation => {
                tracing::debug!(
                    request_id = %request.id(),
                    sent_with = generation,
                    current = snapshot.generation,
                    "credential already replaced, replaying"
                );
                Expiry::Replay(request)
            }
            Some(pair) => {
                tracing::info!(
                    request_id = %request.id(),
                    generation = snapshot.generation,
                    "access credential expired, starting refresh"
                );
                let (reply, rx) = oneshot::channel();
                *state = RefreshState::InFlight {
                    started_at: snapshot.generation,
                    driver: PendingCaller { request, reply },
                    followers: VecDeque::new(),
                };
                // The exchange runs detached so that dropping the driver's
                // future cannot strand the followers.
                tokio::spawn(settle(self.inner.clone(), pair.refresh().to_string()));
                Expiry::Wait(rx)
            }
        }
    }

    /// Install a freshly issued pair (login).
    pub fn establish(&self, pair: &CredentialPair) -> Result<(), RagchatError> {
        let _state = self.inner.lock_state();
        let generation = self.inner.dispatcher.credentials().replace(pair)?;
        tracing::debug!(generation, "session established");
        Ok(())
    }

    /// Drop the stored pair (logout).
    pub fn end_session(&self) -> Result<(), RagchatError> {
        let _state = self.inner.lock_state();
        let generation = self.inner.dispatcher.credentials().clear()?;
        tracing::debug!(generation, "session ended");
        Ok(())
    }
}

async fn settle(inner: Arc<Inner>, refresh_token: String) {
    let outcome = exchange_refresh_token(inner.dispatcher.transport(), &refresh_token).await;

    let (callers, settlement) = {
        let mut state = inner.lock_state();
        let RefreshState::InFlight {
            started_at,
            driver,
            followers,
        } = std::mem::replace(&mut *state, RefreshState::Idle)
        else {
            tracing::error!("refresh settled with no refresh in flight");
            return;
        };

        let credentials = inner.dispatcher.credentials();
        let settlement = if credentials.generation() != started_at {
            // A login or logout landed mid-refresh; that state wins.
            tracing::info!("session changed during refresh, discarding refreshed credentials");
            if credentials.snapshot().pair.is_some() {
                Settlement::Replay
            } else {
                Settlement::Reject
            }
        } else {
            match outcome {
                Ok(pair) => match credentials.replace(&pair) {
                    Ok(generation) => {
                        tracing::info!(
                            generation,
                            waiting = followers.len() + 1,
                            "access credential refreshed"
                        );
                        Settlement::Replay
                    }
                    Err(e) => {
                        tracing::warn!("failed to persist refreshed credentials: {e}");
                        clear_after_failure(&inner);
                        Settlement::Reject
                    }
                },
                Err(e) => {
                    tracing::warn!("credential refresh failed: {e}");
                    clear_after_failure(&inner);
                    Settlement::Reject
                }
            }
        };

        let mut callers = Vec::with_capacity(followers.len() + 1);
        callers.push(driver);
        callers.extend(followers);
        (callers, settlement)
    };

    match settlement {
        Settlement::Replay => {
            for caller in callers {
                let dispatcher = inner.dispatcher.clone();
                tokio::spawn(async move {
                    let result = replay(&dispatcher, &caller.request).await;
                    let _ = caller.reply.send(result);
                });
            }
        }
        Settlement::Reject => {
            for caller in callers {
                let _ = caller.reply.send(Err(RagchatError::AuthenticationExpired));
            }
        }
    }
}

fn clear_after_failure(inner: &Inner) {
    if let Err(e) = inner.dispatcher.credentials().clear() {
        tracing::warn!("failed to clear credentials: {e}");
    }
}

/// The one retry a request gets. A second 401 is terminal.
async fn replay(
    dispatcher: &Dispatcher,
    request: &RequestDescriptor,
) -> Result<ApiResponse, RagchatError> {
    tracing::debug!(request_id = %request.id(), "replaying request");
    match dispatcher.send(request).await {
        Ok(response) => Ok(response),
        Err(DispatchError::ExpiredCredential { .. }) => {
            tracing::warn!(
                request_id = %request.id(),
                "request rejected again after refresh"
            );
            Err(RagchatError::AuthenticationExpired)
        }
        Err(DispatchError::Failed(err)) => Err(err),
    }
}
