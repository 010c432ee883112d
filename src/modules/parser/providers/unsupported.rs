use super::VideoSourceProvider;
use crate::modules::content::model::{Media, NewVideoSource};
use crate::modules::parser::model::ApiKeys;
use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

/// A source platform without an integration yet; always resolves nothing.
#[derive(Debug, Clone, Copy)]
pub struct UnsupportedProvider {
    name: &'static str,
}

impl UnsupportedProvider {
    pub fn vk() -> Self {
        Self { name: "vk" }
    }

    pub fn rutube() -> Self {
        Self { name: "rutube" }
    }

    pub fn youtube() -> Self {
        Self { name: "youtube" }
    }

    /// The providers queried for every released title, in query order.
    pub fn defaults() -> Vec<Self> {
        vec![Self::vk(), Self::rutube(), Self::youtube()]
    }
}

#[async_trait]
impl VideoSourceProvider for UnsupportedProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch_sources(&self, media: &Media, external_id: &str, _keys: &ApiKeys) -> Result<Vec<NewVideoSource>> {
        debug!(
            provider = self.name,
            media_id = %media.id,
            "No {} integration, skipping lookup for {}",
            self.name,
            external_id
        );
        Ok(Vec::new())
    }
}
