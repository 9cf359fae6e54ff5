pub mod community;
pub mod console;
pub mod login;
pub mod protocol;
pub mod questionnaire;
pub mod runtime;
pub mod state;

// Re-export the runtime and its wiring for the binary.
pub use runtime::OracleApp;
pub use state::AppContext;
