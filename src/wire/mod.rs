pub mod envelope;
pub mod stanza;
pub mod xml;

pub use envelope::{AuthEnvelope, PQC_NS};
pub use stanza::{ChatMessage, MessageKind, Stanza};
pub use xml::Element;
