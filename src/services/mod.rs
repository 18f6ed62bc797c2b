//! Service layer: the import engine and its collaborators.
//!
//! Domain logic separated from storage and UI concerns. The engine itself
//! lives in [`import`]; the other modules are its leaf collaborators.

pub mod builder;
pub mod identity;
pub mod import;
pub mod listeners;
pub mod publish;

pub use builder::{BuildOptions, RecordBuilder, VideoAttachment};
pub use identity::IdentifierIndex;
pub use import::{ImportOptions, ImportService};
pub use listeners::{ImportHooks, ImportListener};
pub use publish::PublicationGate;
