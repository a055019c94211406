use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{EstimateError, GenerativeModel, ImagePart};

enum Script {
    Reply(String),
    Upstream,
    Hang,
    Unconfigured,
}

/// Model double that answers every call the same way.
pub struct ScriptedModel {
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedModel {
    fn new(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn reply(text: &str) -> Self {
        Self::new(Script::Reply(text.to_string()))
    }

    pub fn upstream_error() -> Self {
        Self::new(Script::Upstream)
    }

    pub fn hang() -> Self {
        Self::new(Script::Hang)
    }

    pub fn unconfigured() -> Self {
        Self::new(Script::Unconfigured)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    fn is_configured(&self) -> bool {
        !matches!(self.script, Script::Unconfigured)
    }

    async fn generate(
        &self,
        _prompt: &str,
        _image: Option<&ImagePart>,
    ) -> Result<String, EstimateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Reply(text) => Ok(text.clone()),
            Script::Upstream => Err(EstimateError::Upstream("connection reset".into())),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(EstimateError::Upstream("unreachable".into()))
            }
            Script::Unconfigured => Err(EstimateError::MissingApiKey),
        }
    }
}
