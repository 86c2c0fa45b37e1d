pub mod agent;
pub mod alternative;
pub mod conflict;
pub mod decision;
pub mod event;
pub mod evidence;
pub mod grant;
pub mod idempotency;
pub mod org;
pub mod outbox;
pub mod run;

pub use agent::*;
pub use alternative::*;
pub use conflict::*;
pub use decision::*;
pub use event::*;
pub use evidence::*;
pub use grant::*;
pub use idempotency::*;
pub use org::*;
pub use outbox::*;
pub use run::*;
