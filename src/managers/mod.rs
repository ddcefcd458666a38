// Managers Module
//
// Focused manager classes that sit between the engine and a presentation
// or network layer.
//
// - SessionManager: Session registry, frame routing and record broadcast

pub mod session_manager;

pub use session_manager::{SessionEvent, SessionManager};
