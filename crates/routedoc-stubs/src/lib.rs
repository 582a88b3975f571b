mod writer;

pub use writer::{StubError, StubOutcome, StubWriter, split_action_path};
