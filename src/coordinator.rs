use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::errors::Error;
use crate::exempt::ExemptRoutes;
use crate::gate::SingleFlightGate;
use crate::outcome::{ApiEnvelope, Outcome, TokenGrant, classify};
use crate::request::{PreparedRequest, RequestDescriptor};
use crate::store::{Credential, CredentialStore};
use crate::telemetry::FlightTelemetry;
use crate::transport::Transport;

/// Orchestrates outbound requests around the shared credential.
///
/// For every call it decides whether a credential is required, obtains one
/// through the bootstrap or refresh gate when necessary, dispatches the
/// prepared request, and classifies the result. An in-body credential
/// rejection is absorbed: the coordinator refreshes once and replays the
/// request with the fresh credential before giving up.
pub struct RequestCoordinator {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    exempt: ExemptRoutes,
    bootstrap_gate: SingleFlightGate<Result<Credential, Error>>,
    refresh_gate: SingleFlightGate<Result<Credential, Error>>,
}

impl RequestCoordinator {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        let mut patterns = vec![config.bootstrap_path.clone(), config.refresh_path.clone()];
        patterns.extend(config.exempt_routes.iter().cloned());
        Self {
            exempt: ExemptRoutes::new(patterns),
            bootstrap_gate: SingleFlightGate::new("bootstrap"),
            refresh_gate: SingleFlightGate::new("refresh"),
            config,
            transport,
            store,
        }
    }

    /// Retrieve with query parameters. Pure descriptor builder over [`send`].
    ///
    /// [`send`]: Self::send
    pub async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<ApiEnvelope, Error> {
        let mut descriptor = RequestDescriptor::get(path);
        for (key, value) in query {
            descriptor = descriptor.query(*key, value);
        }
        self.send(descriptor).await
    }

    /// Submit a JSON body, optionally with query parameters (some backends
    /// expect both on a POST). Pure descriptor builder over [`send`].
    ///
    /// [`send`]: Self::send
    pub async fn post(
        &self,
        path: &str,
        body: Value,
        query: &[(&str, &str)],
    ) -> Result<ApiEnvelope, Error> {
        let mut descriptor = RequestDescriptor::post(path).body(body);
        for (key, value) in query {
            descriptor = descriptor.query(*key, value);
        }
        self.send(descriptor).await
    }

    /// Send one request, transparently bootstrapping or refreshing the
    /// credential as required. At most one auth-driven replay per call: a
    /// request still rejected after a successful refresh is terminal.
    pub async fn send(&self, descriptor: RequestDescriptor) -> Result<ApiEnvelope, Error> {
        if descriptor.is_exempt() || self.exempt.is_exempt(descriptor.path()) {
            let outcome = self.dispatch(&descriptor, None).await;
            return self.conclude(outcome, &descriptor, false);
        }

        let mut credential = match self.store.get() {
            Some(credential) => credential,
            None => self.bootstrap().await?,
        };
        let mut refreshed = false;
        loop {
            match self.dispatch(&descriptor, Some(&credential)).await {
                Outcome::AuthRejected if !refreshed => {
                    debug!(path = descriptor.path(), "request.credential_rejected");
                    credential = self.refresh(&credential).await?;
                    refreshed = true;
                }
                outcome => return self.conclude(outcome, &descriptor, true),
            }
        }
    }

    async fn dispatch(
        &self,
        descriptor: &RequestDescriptor,
        credential: Option<&Credential>,
    ) -> Outcome {
        let prepared = PreparedRequest::assemble(&self.config.base_url, descriptor, credential);
        match self.transport.execute(&prepared).await {
            Ok(raw) => classify(raw.status, &raw.body),
            Err(Error::Transport(detail)) => Outcome::Transport(detail),
            Err(err) => Outcome::Transport(err.to_string()),
        }
    }

    fn conclude(
        &self,
        outcome: Outcome,
        descriptor: &RequestDescriptor,
        credentialed: bool,
    ) -> Result<ApiEnvelope, Error> {
        match outcome {
            Outcome::Success(envelope) => Ok(envelope),
            // Either a rejection on the replayed attempt or an in-body
            // rejection on an exempt path; neither is refreshable.
            Outcome::AuthRejected | Outcome::TerminalAuth => {
                warn!(path = descriptor.path(), "request.terminal_auth");
                if credentialed {
                    self.store.clear();
                }
                Err(Error::TerminalAuth)
            }
            Outcome::Application { status, message } => {
                if !descriptor.is_silent() {
                    warn!(
                        path = descriptor.path(),
                        status = %status,
                        message = %message,
                        "request.application_failure"
                    );
                }
                Err(Error::Application { status, message })
            }
            Outcome::Transport(detail) => {
                warn!(
                    path = descriptor.path(),
                    error = %detail,
                    "request.transport_failure"
                );
                Err(Error::Transport(detail))
            }
        }
    }

    /// Obtain an initial credential. Concurrent callers join the in-flight
    /// acquisition through the gate; exactly one bootstrap request reaches
    /// the transport.
    async fn bootstrap(&self) -> Result<Credential, Error> {
        self.bootstrap_gate
            .run(move || self.bootstrap_action())
            .await
    }

    async fn bootstrap_action(&self) -> Result<Credential, Error> {
        let telemetry = FlightTelemetry::new("credential.bootstrap");
        telemetry.emit_start();
        match self.acquire(&self.config.bootstrap_path, None).await {
            Ok(credential) => {
                self.store.set(credential.clone());
                telemetry.emit_success();
                Ok(credential)
            }
            Err(err) => {
                telemetry.emit_failure(&err);
                Err(err)
            }
        }
    }

    /// Exchange a rejected credential for a new one. Any failure of the
    /// round is terminal for the leader and every joined waiter, and leaves
    /// the store empty so the next request starts a clean bootstrap.
    async fn refresh(&self, rejected: &Credential) -> Result<Credential, Error> {
        self.refresh_gate
            .run(move || self.refresh_action(rejected))
            .await
    }

    async fn refresh_action(&self, rejected: &Credential) -> Result<Credential, Error> {
        // A previous round may already have replaced the credential while
        // this request was in flight with the stale one.
        if let Some(current) = self.store.get()
            && current != *rejected
        {
            debug!("credential already replaced; skipping refresh call");
            return Ok(current);
        }

        let telemetry = FlightTelemetry::new("credential.refresh");
        telemetry.emit_start();
        let body = json!({ "token": rejected.as_str() });
        match self.acquire(&self.config.refresh_path, Some(body)).await {
            Ok(credential) => {
                self.store.set(credential.clone());
                telemetry.emit_success();
                Ok(credential)
            }
            Err(err) => {
                telemetry.emit_failure(&err);
                self.store.clear();
                Err(Error::TerminalAuth)
            }
        }
    }

    // Calls a credential-issuing endpoint and validates the grant.
    async fn acquire(&self, path: &str, body: Option<Value>) -> Result<Credential, Error> {
        let mut descriptor = RequestDescriptor::post(path).exempt();
        if let Some(body) = body {
            descriptor = descriptor.body(body);
        }
        match self.dispatch(&descriptor, None).await {
            Outcome::Success(envelope) => {
                let grant: TokenGrant = envelope.parse_result()?;
                match grant.usable() {
                    Some(token) => Ok(Credential::new(token)),
                    None => Err(Error::TerminalAuth),
                }
            }
            Outcome::AuthRejected | Outcome::TerminalAuth => Err(Error::TerminalAuth),
            Outcome::Application { status, message } => Err(Error::Application { status, message }),
            Outcome::Transport(detail) => Err(Error::Transport(detail)),
        }
    }
}
