pub mod continuation;
pub mod filter;
pub mod fuzzy;
pub mod intent;
pub mod payload;
pub mod record;
pub mod render;

pub use continuation::QueryKind;
pub use filter::StructuredFilter;
pub use intent::{QueryIntent, QueryUnderstanding};
pub use payload::{Payload, PayloadValue};
pub use record::{CandidateRecord, FusedRecord, SourceKind};
pub use render::RenderRequest;
