mod state;

pub use state::{AnnotationState, MarkerPhase};
