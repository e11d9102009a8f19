//! Options providers
//!
//! Parameters can name an options provider that lists the values an author
//! may pick from (for example the models an LLM backend offers). The registry
//! stores only the provider's name; the editor owns an [`OptionsProviders`]
//! table and resolves names against it on demand, passing its own runtime
//! context along.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::block::BlockDescriptor;
use crate::core::parameter::OptionsProviderRef;
use crate::core::registry::BlockRegistry;

/// Lists selectable values for a parameter
#[async_trait]
pub trait OptionsProvider<C>: Send + Sync {
    /// Enumerate the values available for `block` in context `ctx`
    async fn options(&self, ctx: &C, block: &BlockDescriptor) -> anyhow::Result<Vec<String>>;
}

/// Adapter turning a synchronous function into an [`OptionsProvider`]
pub struct FnOptionsProvider<F>(pub F);

#[async_trait]
impl<C, F> OptionsProvider<C> for FnOptionsProvider<F>
where
    C: Send + Sync,
    F: Fn(&C, &BlockDescriptor) -> anyhow::Result<Vec<String>> + Send + Sync,
{
    async fn options(&self, ctx: &C, block: &BlockDescriptor) -> anyhow::Result<Vec<String>> {
        (self.0)(ctx, block)
    }
}

/// Table of named options providers
pub struct OptionsProviders<C> {
    providers: HashMap<String, Arc<dyn OptionsProvider<C>>>,
}

impl<C: Send + Sync + 'static> OptionsProviders<C> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Register a provider under `name`, replacing any previous one
    pub fn insert(&mut self, name: impl Into<String>, provider: impl OptionsProvider<C> + 'static) {
        self.providers.insert(name.into(), Arc::new(provider));
    }

    /// Register a synchronous provider function under `name`
    pub fn insert_fn<F>(&mut self, name: impl Into<String>, provider: F)
    where
        F: Fn(&C, &BlockDescriptor) -> anyhow::Result<Vec<String>> + Send + Sync + 'static,
    {
        self.insert(name, FnOptionsProvider(provider));
    }

    /// Look up the provider a token refers to
    pub fn get(&self, token: &OptionsProviderRef) -> Option<Arc<dyn OptionsProvider<C>>> {
        self.providers.get(token.as_str()).cloned()
    }

    /// List the options of one parameter of a registered block
    ///
    /// # Arguments
    /// * `ctx` - Runtime context handed to the provider
    /// * `registry` - Registry the block is looked up in
    /// * `composite_id` - Block to list options for
    /// * `param` - Parameter name
    pub async fn resolve(
        &self,
        ctx: &C,
        registry: &BlockRegistry,
        composite_id: &str,
        param: &str,
    ) -> Result<Vec<String>, OptionsError> {
        let block = registry
            .get(composite_id)
            .ok_or_else(|| OptionsError::UnknownBlock(composite_id.to_string()))?;
        let descriptor = block
            .parameters
            .get(param)
            .ok_or_else(|| OptionsError::UnknownParameter {
                block: composite_id.to_string(),
                param: param.to_string(),
            })?;
        let token = descriptor
            .options_provider
            .as_ref()
            .ok_or_else(|| OptionsError::NoOptions(param.to_string()))?;
        let provider = self
            .get(token)
            .ok_or_else(|| OptionsError::UnresolvedProvider(token.clone()))?;

        provider
            .options(ctx, &block)
            .await
            .map_err(|source| OptionsError::ProviderFailed {
                provider: token.clone(),
                source,
            })
    }
}

impl<C: Send + Sync + 'static> Default for OptionsProviders<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Options resolution errors
#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    /// Block not found in the registry
    #[error("Block not found: {0}")]
    UnknownBlock(String),

    /// Block has no such configurable parameter
    #[error("Block {block} has no parameter '{param}'")]
    UnknownParameter { block: String, param: String },

    /// Parameter does not offer options
    #[error("Parameter '{0}' has no options provider")]
    NoOptions(String),

    /// No provider registered under the token
    #[error("Options provider '{0}' is not available")]
    UnresolvedProvider(OptionsProviderRef),

    /// Provider returned an error
    #[error("Options provider '{provider}' failed: {source}")]
    ProviderFailed {
        provider: OptionsProviderRef,
        #[source]
        source: anyhow::Error,
    },
}
