//! Artifact templating: pure, side-effect-free construction of the four CEP
//! artifact forms (streams, receivers, execution plans, publishers).

pub mod plan;
pub mod publisher;
pub mod receiver;
pub mod stream;

pub use plan::{cep_query, processor_schema, render_execution_plan};
pub use publisher::{render_publisher, HttpCredentials, PublisherKind};
pub use receiver::render_receiver;
pub use stream::render_stream;
