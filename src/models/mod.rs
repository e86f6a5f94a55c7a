pub mod envelope;
pub mod invocation;

pub use envelope::ResponseEnvelope;
pub use invocation::{EventDelivery, InvocationParams, ParsedInput, ValidationError, SIGNATURE_HEADER};
