//! Classification request lifecycle
//!
//! Leaf-first: payload normalizer, warmup prober, classification transport,
//! response interpreter, session state machine. The example catalog and
//! preview decoder feed submissions into the session.

pub mod classification_transport;
pub mod example_catalog;
pub mod payload_normalizer;
pub mod preview_decoder;
pub mod response_interpreter;
pub mod session;
pub mod warmup_prober;

pub use classification_transport::{
    ClassificationTransport, ClassifyError, PredictBackend, RawHttpResponse, ReqwestBackend,
    RequestProfile, TransportFailure,
};
pub use example_catalog::{CatalogError, ExampleAsset, ExampleCatalog, EXAMPLE_ASSETS};
pub use payload_normalizer::normalize;
pub use response_interpreter::interpret;
pub use session::{ClassificationSession, SubmissionHandle, SubmitOutcome, NETWORK_ERROR_MESSAGE};
pub use warmup_prober::{WarmupProber, WarmupStatus};
