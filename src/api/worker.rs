//! Non-blocking access to a [`UserApi`].
//!
//! The event loop owns the session state and must never wait on the backend.
//! [`ApiWorker`] moves the backend onto its own thread: requests go in over a
//! channel, completions come back over another and are drained once per tick.
//! Completions are handed out in the order they finish, so when two requests
//! touch the same record the later response wins. There is no cancellation.
//!
//! [`InlineDispatcher`] runs requests on the calling thread instead and is
//! what tests drive.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use super::{DeleteResponse, UserApi};
use crate::error::{ApiError, ApiResult};
use crate::model::{User, UserId, UserInput};

pub type RequestId = u64;

/// A call to make against the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiRequest {
    List { limit: usize, offset: usize },
    Get(UserId),
    Create(UserInput),
    Update(UserId, UserInput),
    Delete(UserId),
}

impl ApiRequest {
    /// Short human description for logs and notifications.
    pub fn describe(&self) -> String {
        match self {
            ApiRequest::List { limit, offset } => format!("list users (limit {limit}, offset {offset})"),
            ApiRequest::Get(id) => format!("get user {id}"),
            ApiRequest::Create(_) => "create user".to_string(),
            ApiRequest::Update(id, _) => format!("update user {id}"),
            ApiRequest::Delete(id) => format!("delete user {id}"),
        }
    }
}

/// Successful backend answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiReply {
    Users(Vec<User>),
    User(User),
    Deleted(DeleteResponse),
}

/// A finished request and its result.
#[derive(Clone, Debug)]
pub struct Completion {
    pub id: RequestId,
    pub request: ApiRequest,
    pub result: ApiResult<ApiReply>,
}

/// Run one request to completion on `api`.
pub fn execute(api: &mut dyn UserApi, request: &ApiRequest) -> ApiResult<ApiReply> {
    match request {
        ApiRequest::List { limit, offset } => api.list_users(*limit, *offset).map(ApiReply::Users),
        ApiRequest::Get(id) => api.get_user(*id).map(ApiReply::User),
        ApiRequest::Create(input) => api.create_user(input).map(ApiReply::User),
        ApiRequest::Update(id, input) => api.update_user(*id, input).map(ApiReply::User),
        ApiRequest::Delete(id) => api.delete_user(*id).map(ApiReply::Deleted),
    }
}

/// Something that accepts requests and later reports their completions.
pub trait Dispatch {
    fn submit(&mut self, request: ApiRequest) -> RequestId;

    /// Drain every completion that has arrived since the last call.
    fn poll(&mut self) -> Vec<Completion>;

    /// Requests submitted but not yet returned by `poll`.
    fn in_flight(&self) -> usize;
}

/// Runs the backend on a dedicated thread.
pub struct ApiWorker {
    tx: Option<Sender<(RequestId, ApiRequest)>>,
    rx: Receiver<Completion>,
    handle: Option<JoinHandle<()>>,
    // set on drop so requests still queued are skipped
    shutdown: Arc<AtomicBool>,
    next_id: RequestId,
    in_flight: usize,
    // completions for requests that could not be handed to the thread
    undelivered: Vec<Completion>,
}

impl ApiWorker {
    /// Move `api` onto a named background thread.
    pub fn spawn(mut api: Box<dyn UserApi>) -> std::io::Result<Self> {
        let (req_tx, req_rx) = mpsc::channel::<(RequestId, ApiRequest)>();
        let (done_tx, done_rx) = mpsc::channel::<Completion>();
        let shutdown = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&shutdown);
        let handle = thread::Builder::new()
            .name("user-api".to_string())
            .spawn(move || {
                for (id, request) in req_rx {
                    if stop.load(Ordering::Acquire) {
                        tracing::debug!(id, request = %request.describe(), "api worker shutting down; request skipped");
                        break;
                    }
                    tracing::debug!(id, request = %request.describe(), "api call started");
                    let result = execute(api.as_mut(), &request);
                    if let Err(e) = &result {
                        tracing::warn!(id, request = %request.describe(), error = %e, "api call failed");
                    }
                    if done_tx.send(Completion { id, request, result }).is_err() {
                        break;
                    }
                }
                tracing::debug!("api worker stopped");
            })?;
        Ok(Self {
            tx: Some(req_tx),
            rx: done_rx,
            handle: Some(handle),
            shutdown,
            next_id: 1,
            in_flight: 0,
            undelivered: Vec::new(),
        })
    }
}

impl Dispatch for ApiWorker {
    fn submit(&mut self, request: ApiRequest) -> RequestId {
        let id = self.next_id;
        self.next_id += 1;
        self.in_flight += 1;
        let sent = match &self.tx {
            Some(tx) => tx.send((id, request.clone())).is_ok(),
            None => false,
        };
        if !sent {
            tracing::error!(id, "api worker is gone; failing request");
            self.undelivered.push(Completion {
                id,
                request,
                result: Err(ApiError::network("api worker is not running")),
            });
        }
        id
    }

    fn poll(&mut self) -> Vec<Completion> {
        let mut out = std::mem::take(&mut self.undelivered);
        out.extend(self.rx.try_iter());
        self.in_flight = self.in_flight.saturating_sub(out.len());
        out
    }

    fn in_flight(&self) -> usize {
        self.in_flight
    }
}

impl Drop for ApiWorker {
    fn drop(&mut self) {
        // the call in progress finishes; anything still queued is dropped
        self.shutdown.store(true, Ordering::Release);
        self.tx.take();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::error!("api worker panicked");
        }
    }
}

/// Executes each request immediately on the caller's thread.
pub struct InlineDispatcher<A: UserApi> {
    api: A,
    next_id: RequestId,
    done: Vec<Completion>,
}

impl<A: UserApi> InlineDispatcher<A> {
    /// Wrap `api`; every `submit` runs to completion before returning.
    pub fn new(api: A) -> Self {
        Self {
            api,
            next_id: 1,
            done: Vec::new(),
        }
    }
}

impl<A: UserApi> Dispatch for InlineDispatcher<A> {
    fn submit(&mut self, request: ApiRequest) -> RequestId {
        let id = self.next_id;
        self.next_id += 1;
        let result = execute(&mut self.api, &request);
        self.done.push(Completion { id, request, result });
        id
    }

    fn poll(&mut self) -> Vec<Completion> {
        std::mem::take(&mut self.done)
    }

    fn in_flight(&self) -> usize {
        self.done.len()
    }
}
