//! Scripted provider shared by the client and turn tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use sitout_core::{GenerationProvider, GenerationRequest, ProviderError, Persona};

pub(crate) struct FakeProvider {
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    fallback: Result<String, ProviderError>,
    calls: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub(crate) fn replying(text: &str) -> Self {
        Self::scripted(Vec::new(), Ok(text.to_string()))
    }

    pub(crate) fn failing(error: ProviderError) -> Self {
        Self::scripted(Vec::new(), Err(error))
    }

    /// Play `script` in order, then answer every call with `then`.
    pub(crate) fn scripted(
        script: Vec<Result<String, ProviderError>>,
        then: Result<String, ProviderError>,
    ) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: then,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Credentials used so far, in call order.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    async fn generate(
        &self,
        credential: &str,
        _request: &GenerationRequest,
    ) -> Result<String, ProviderError> {
        self.calls.lock().unwrap().push(credential.to_string());
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

pub(crate) fn key(n: usize) -> String {
    format!("AIzaSyTESTKEY{n}-xxxxxxxxxxxxxxxxxxxxxx")
}

pub(crate) fn cast(n: usize) -> Vec<Persona> {
    let names = ["Babu", "Aliyamma", "Fathima", "Chakko", "Kunjumon", "Sosamma"];
    (0..n)
        .map(|i| {
            let name = names[i % names.len()];
            Persona::new(
                name.to_lowercase(),
                name,
                format!("You are {name}."),
                vec![format!("{name} fallback line.")],
            )
        })
        .collect()
}
