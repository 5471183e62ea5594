mod config;
mod coordinator;
mod errors;
mod exempt;
mod gate;
mod outcome;
mod request;
mod store;
pub mod telemetry;
mod transport;

pub use config::{ClientConfig, ConfigLocation};
pub use coordinator::RequestCoordinator;
pub use errors::Error;
pub use exempt::ExemptRoutes;
pub use gate::SingleFlightGate;
pub use outcome::{ApiEnvelope, CODE_CREDENTIAL_REJECTED, Outcome, TokenGrant, classify};
pub use request::{PreparedRequest, RequestDescriptor};
pub use store::{Credential, CredentialStore, MemoryCredentialStore};
pub use transport::{RawResponse, ReqwestTransport, Transport};
