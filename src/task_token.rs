use base64::{prelude::BASE64_STANDARD, Engine};
use std::fmt::{Debug, Display, Formatter};

/// Opaque server-issued identifier of a polled workflow or activity task
#[derive(Hash, Eq, PartialEq, Clone, Default, derive_more::From)]
pub struct TaskToken(pub Vec<u8>);

impl Display for TaskToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&fmt_tt(&self.0))
    }
}

impl Debug for TaskToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format!("TaskToken({})", fmt_tt(&self.0)))
    }
}

impl From<TaskToken> for Vec<u8> {
    fn from(tt: TaskToken) -> Self {
        tt.0
    }
}

fn fmt_tt(tt: &[u8]) -> String {
    BASE64_STANDARD.encode(tt)
}
