//! Request controller: one configured HTTP call with lifecycle state
//!
//! Every `execute` bumps a generation counter. Only the completion belonging to
//! the latest generation may move the phase or replace `result`/`error`, so an
//! older call that resolves late can never overwrite the state of a newer one.
//! Calls are not cancelled when superseded. `abort()` cancels the latest call,
//! and dropping an unfinished `execute` future records that call as aborted.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::RequestError;
use crate::http::options::{Method, RequestOptions, RequestOverrides};
use crate::http::transport::{Transport, TransportRequest};
use crate::loader::{LoadingIndicator, PendingLoader};

/// Lifecycle phase of the latest call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Aborted,
    Errored,
}

#[derive(Debug, Clone)]
pub struct RequestState<T> {
    pub phase: RequestPhase,
    pub result: Option<T>,
    pub error: Option<RequestError>,
    /// Set once any call has settled, including stale ones
    pub has_fetched: bool,
    /// Number of calls issued so far; never reset
    pub request_count: u64,
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        Self {
            phase: RequestPhase::Idle,
            result: None,
            error: None,
            has_fetched: false,
            request_count: 0,
        }
    }
}

impl<T> RequestState<T> {
    pub fn is_loading(&self) -> bool {
        self.phase == RequestPhase::Loading
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.phase,
            RequestPhase::Loaded | RequestPhase::Aborted | RequestPhase::Errored
        )
    }

    pub fn is_aborted(&self) -> bool {
        self.phase == RequestPhase::Aborted
    }
}

/// Services shared by every controller of an application
#[derive(Clone)]
pub struct HttpContext {
    pub transport: Arc<dyn Transport>,
    pub indicator: LoadingIndicator,
    pub loader_grace: Duration,
}

impl HttpContext {
    pub fn new(transport: Arc<dyn Transport>, indicator: LoadingIndicator) -> Self {
        Self {
            transport,
            indicator,
            loader_grace: Duration::from_millis(200),
        }
    }

    pub fn with_loader_grace(mut self, grace: Duration) -> Self {
        self.loader_grace = grace;
        self
    }
}

struct Inner<T> {
    context: HttpContext,
    method: Method,
    path: String,
    options: RequestOptions,
    state: watch::Sender<RequestState<T>>,
    /// Generation and cancellation token of the latest unsettled call
    current: Mutex<Option<(u64, CancellationToken)>>,
}

pub struct RequestController<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for RequestController<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> RequestController<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Build a controller for `method path`.
    ///
    /// With `options.immediate` one argument-less call is spawned right away,
    /// which requires a running tokio runtime.
    pub fn new(
        context: HttpContext,
        method: Method,
        path: impl Into<String>,
        options: RequestOptions,
    ) -> Self {
        let (state, _rx) = watch::channel(RequestState::default());
        let controller = Self {
            inner: Arc::new(Inner {
                context,
                method,
                path: path.into(),
                options,
                state,
                current: Mutex::new(None),
            }),
        };

        if controller.inner.options.immediate {
            // Enter the loading state now; only the network part runs later.
            let call = controller.begin(None);
            let immediate = controller.clone();
            tokio::spawn(async move {
                if let Err(e) = immediate.run(call, None).await {
                    warn!(
                        "Immediate {} {} failed: {}",
                        immediate.method().as_str(),
                        immediate.path(),
                        e
                    );
                }
            });
        }

        controller
    }

    pub fn method(&self) -> Method {
        self.inner.method
    }

    pub fn path(&self) -> &str {
        &self.inner.path
    }

    /// Snapshot of the current state
    pub fn state(&self) -> RequestState<T> {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        self.inner.state.subscribe()
    }

    /// Issue the call. The payload is sent as query parameters for GET/DELETE
    /// and as the JSON body otherwise. Errors are recorded and returned.
    pub async fn execute(
        &self,
        payload: Option<Value>,
        overrides: Option<RequestOverrides>,
    ) -> Result<T, RequestError> {
        let call = self.begin(overrides.as_ref());
        self.run(call, payload).await
    }

    /// Synchronous half of a call: new generation, token and loader ticket
    fn begin(&self, overrides: Option<&RequestOverrides>) -> InFlight<T> {
        let options = self.inner.options.merged(overrides);
        let token = CancellationToken::new();

        let generation = {
            let mut current = lock(&self.inner.current);
            let mut generation = 0;
            self.inner.state.send_modify(|state| {
                state.request_count += 1;
                generation = state.request_count;
                state.phase = RequestPhase::Loading;
            });
            *current = Some((generation, token.clone()));
            generation
        };

        debug!(
            "Request #{} {} {} started",
            generation,
            self.inner.method.as_str(),
            self.inner.path
        );

        let loader = (!options.skip_loader).then(|| {
            self.inner
                .context
                .indicator
                .schedule(self.inner.context.loader_grace)
        });

        InFlight {
            controller: self.clone(),
            generation,
            token,
            options,
            loader,
            settled: false,
        }
    }

    async fn run(
        &self,
        mut call: InFlight<T>,
        payload: Option<Value>,
    ) -> Result<T, RequestError> {
        let outcome = tokio::select! {
            biased;
            _ = call.token.cancelled() => Err(RequestError::Aborted),
            result = self.perform(payload, &call.options) => result,
        };

        if let Some(loader) = call.loader.as_mut() {
            loader.finish();
        }
        self.settle(call.generation, &outcome);
        call.settled = true;

        outcome
    }

    /// Cancel the latest in-flight call. Does nothing when nothing is in flight.
    pub fn abort(&self) {
        if let Some((generation, token)) = lock(&self.inner.current).as_ref() {
            debug!("Aborting request #{}", generation);
            token.cancel();
        }
    }

    async fn perform(
        &self,
        payload: Option<Value>,
        options: &RequestOptions,
    ) -> Result<T, RequestError> {
        if let Some(delay) = options.with_delay {
            tokio::time::sleep(delay).await;
        }

        let request = TransportRequest::build(self.inner.method, &self.inner.path, payload)?;
        let response = self.inner.context.transport.send(request).await?;

        if !response.is_success() {
            return Err(RequestError::Http {
                status: response.status,
                body: response.body,
            });
        }

        let body = if options.unwrap_data {
            promote_data(response.body)
        } else {
            response.body
        };

        Ok(serde_json::from_value(body)?)
    }

    fn settle(&self, generation: u64, outcome: &Result<T, RequestError>) {
        self.settle_with(generation, |state| match outcome {
            Ok(value) => {
                state.result = Some(value.clone());
                state.error = None;
                state.phase = RequestPhase::Loaded;
            }
            Err(e) => {
                state.error = Some(e.clone());
                state.phase = if e.is_aborted() {
                    RequestPhase::Aborted
                } else {
                    RequestPhase::Errored
                };
            }
        });
    }
}

impl<T> RequestController<T> {
    /// Mark `generation` settled. `apply` only runs while it is still the latest call.
    fn settle_with(&self, generation: u64, apply: impl FnOnce(&mut RequestState<T>)) {
        {
            let mut current = lock(&self.inner.current);
            if matches!(current.as_ref(), Some((latest, _)) if *latest == generation) {
                *current = None;
            }
        }

        self.inner.state.send_modify(|state| {
            state.has_fetched = true;

            if state.request_count != generation {
                debug!(
                    "Request #{} settled after #{} was issued, ignoring",
                    generation, state.request_count
                );
                return;
            }

            apply(state);
        });

        debug!("Request #{} settled", generation);
    }
}

/// One issued call. Dropping it before it settles records it as aborted.
struct InFlight<T> {
    controller: RequestController<T>,
    generation: u64,
    token: CancellationToken,
    options: RequestOptions,
    loader: Option<PendingLoader>,
    settled: bool,
}

impl<T> Drop for InFlight<T> {
    fn drop(&mut self) {
        if let Some(loader) = self.loader.as_mut() {
            loader.finish();
        }
        if !self.settled {
            debug!("Request #{} dropped before settling", self.generation);
            self.controller.settle_with(self.generation, |state| {
                state.error = Some(RequestError::Aborted);
                state.phase = RequestPhase::Aborted;
            });
        }
    }
}

/// Replace a `{ "data": ... }` envelope with its `data` member
fn promote_data(mut body: Value) -> Value {
    if let Value::Object(map) = &mut body {
        if let Some(data) = map.remove("data") {
            return data;
        }
    }
    body
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::ScriptedTransport;
    use serde_json::json;

    fn controller(
        transport: ScriptedTransport,
        options: RequestOptions,
    ) -> (RequestController<Value>, Arc<ScriptedTransport>, LoadingIndicator) {
        let transport = Arc::new(transport);
        let indicator = LoadingIndicator::new();
        let context = HttpContext::new(transport.clone(), indicator.clone());
        let controller = RequestController::new(context, Method::Get, "/api/items", options);
        (controller, transport, indicator)
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_call_records_result() {
        let (controller, transport, _) = controller(
            ScriptedTransport::new().respond(10, 200, json!({"id": 1})),
            RequestOptions::new(),
        );

        assert_eq!(controller.state().phase, RequestPhase::Idle);
        let value = controller.execute(Some(json!({"page": 3})), None).await.unwrap();

        assert_eq!(value, json!({"id": 1}));
        let state = controller.state();
        assert!(state.is_finished());
        assert!(!state.is_loading());
        assert!(state.has_fetched);
        assert_eq!(state.result, Some(json!({"id": 1})));
        assert_eq!(transport.query_value(0, "page").as_deref(), Some("3"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_completion_does_not_overwrite_newer_call() {
        let (controller, _, _) = controller(
            ScriptedTransport::new()
                .respond(100, 200, json!("first"))
                .respond(10, 200, json!("second")),
            RequestOptions::new(),
        );

        let (first, second) = tokio::join!(
            controller.execute(None, None),
            async {
                let value = controller.execute(None, None).await;
                let state = controller.state();
                assert!(!state.is_loading());
                assert_eq!(state.result, Some(json!("second")));
                value
            }
        );

        // Each caller still gets its own payload.
        assert_eq!(first.unwrap(), json!("first"));
        assert_eq!(second.unwrap(), json!("second"));

        let state = controller.state();
        assert_eq!(state.request_count, 2);
        assert_eq!(state.phase, RequestPhase::Loaded);
        assert!(state.is_finished());
        assert!(!state.is_loading());
        assert_eq!(state.result, Some(json!("second")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_failure_still_marks_fetched() {
        let (controller, _, _) = controller(
            ScriptedTransport::new()
                .fail(100, RequestError::Network("reset".into()))
                .respond(10, 200, json!("fresh")),
            RequestOptions::new(),
        );

        let (first, _) = tokio::join!(
            controller.execute(None, None),
            controller.execute(None, None)
        );
        assert!(first.is_err());

        let state = controller.state();
        assert!(state.has_fetched);
        assert!(state.error.is_none());
        assert_eq!(state.phase, RequestPhase::Loaded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_is_idempotent() {
        let (controller, _, _) = controller(
            ScriptedTransport::new().respond(1_000, 200, json!("late")),
            RequestOptions::new(),
        );

        // Nothing in flight
        controller.abort();
        controller.abort();
        assert_eq!(controller.state().phase, RequestPhase::Idle);

        let running = controller.clone();
        let handle = tokio::spawn(async move { running.execute(None, None).await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        controller.abort();
        controller.abort();

        let result = handle.await.unwrap();
        assert_eq!(result, Err(RequestError::Aborted));

        let state = controller.state();
        assert!(state.is_aborted());
        assert!(state.is_finished());
        assert_eq!(state.error, Some(RequestError::Aborted));

        // Settled calls are unaffected
        controller.abort();
        assert!(controller.state().is_aborted());
    }

    #[tokio::test(start_paused = true)]
    async fn test_http_error_keeps_previous_result() {
        let (controller, _, _) = controller(
            ScriptedTransport::new()
                .respond(5, 200, json!("ok"))
                .respond(5, 500, json!({"message": "boom"})),
            RequestOptions::new(),
        );

        controller.execute(None, None).await.unwrap();
        let err = controller.execute(None, None).await.unwrap_err();

        assert_eq!(err.status(), Some(500));
        let state = controller.state();
        assert_eq!(state.phase, RequestPhase::Errored);
        assert_eq!(state.result, Some(json!("ok")));
        assert_eq!(state.error.and_then(|e| e.status()), Some(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_error_has_no_status() {
        let (controller, _, _) = controller(
            ScriptedTransport::new().fail(5, RequestError::Network("connection refused".into())),
            RequestOptions::new(),
        );

        let err = controller.execute(None, None).await.unwrap_err();
        assert_eq!(err.status(), None);
        assert!(!err.is_aborted());
    }

    #[tokio::test(start_paused = true)]
    async fn test_loader_shown_after_grace_and_hidden_on_completion() {
        let (controller, _, indicator) = controller(
            ScriptedTransport::new().respond(500, 200, json!(null)),
            RequestOptions::new(),
        );

        let running = controller.clone();
        let handle = tokio::spawn(async move { running.execute(None, None).await });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!indicator.is_visible());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(indicator.is_visible());

        handle.await.unwrap().unwrap();
        assert_eq!(indicator.holders(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_loader_never_shows() {
        let (controller, _, indicator) = controller(
            ScriptedTransport::new().respond(500, 200, json!(null)),
            RequestOptions::new().skip_loader(),
        );

        let running = controller.clone();
        let handle = tokio::spawn(async move { running.execute(None, None).await });

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!indicator.is_visible());
        handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_delay_postpones_network_call() {
        let (controller, transport, _) = controller(
            ScriptedTransport::new().respond(0, 200, json!(1)),
            RequestOptions::new().with_delay(Duration::from_millis(100)),
        );

        let running = controller.clone();
        let handle = tokio::spawn(async move { running.execute(None, None).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(transport.requests().is_empty());

        handle.await.unwrap().unwrap();
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_fires_once_on_construction() {
        let (controller, transport, _) = controller(
            ScriptedTransport::new().respond(5, 200, json!({"ready": true})),
            RequestOptions::new().immediate(),
        );

        let state = controller.state();
        assert!(state.is_loading());
        assert_eq!(state.request_count, 1);
        assert!(!state.has_fetched);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(transport.requests().len(), 1);
        assert_eq!(controller.state().result, Some(json!({"ready": true})));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unwrap_data_promotes_envelope() {
        let (controller, _, _) = controller(
            ScriptedTransport::new()
                .respond(5, 200, json!({"data": {"name": "inner"}}))
                .respond(5, 200, json!({"data": {"name": "inner"}})),
            RequestOptions::new().unwrap_data(),
        );

        let promoted = controller.execute(None, None).await.unwrap();
        assert_eq!(promoted, json!({"name": "inner"}));

        let keep_envelope = RequestOverrides {
            unwrap_data: Some(false),
            ..Default::default()
        };
        let raw = controller.execute(None, Some(keep_envelope)).await.unwrap();
        assert_eq!(raw, json!({"data": {"name": "inner"}}));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_call_settles_as_aborted() {
        let (controller, _, indicator) = controller(
            ScriptedTransport::new().respond(1000, 200, json!("late")),
            RequestOptions::new(),
        );

        let timed_out =
            tokio::time::timeout(Duration::from_millis(100), controller.execute(None, None)).await;
        assert!(timed_out.is_err());

        let state = controller.state();
        assert_eq!(state.phase, RequestPhase::Aborted);
        assert_eq!(state.error, Some(RequestError::Aborted));
        assert!(state.has_fetched);
        assert!(state.result.is_none());
        assert!(!indicator.is_visible());

        // Nothing left in flight
        controller.abort();
        assert_eq!(controller.state().phase, RequestPhase::Aborted);
        assert_eq!(controller.state().request_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_stale_call_keeps_newer_state() {
        let (controller, _, _) = controller(
            ScriptedTransport::new()
                .respond(1000, 200, json!("abandoned"))
                .respond(10, 200, json!("newer")),
            RequestOptions::new(),
        );

        let abandoned = controller.execute(None, None);
        let newer = controller.clone();
        let (dropped, value) = tokio::join!(
            tokio::time::timeout(Duration::from_millis(100), abandoned),
            async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                newer.execute(None, None).await
            }
        );

        assert!(dropped.is_err());
        assert_eq!(value.unwrap(), json!("newer"));
        let state = controller.state();
        assert_eq!(state.phase, RequestPhase::Loaded);
        assert_eq!(state.result, Some(json!("newer")));
        assert!(state.error.is_none());
    }
}
