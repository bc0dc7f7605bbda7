//! Example plugin declaring one core and one external option.

use siteconf_core::{
    validators, ConfigResult, OptionDefinition, OptionRegistry, ValueKind,
};

use crate::ConfigurerPlugin;

/// Makes `site.datasets_per_page` updatable and adds its own
/// `ext.example_configurer.test_conf` option.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExampleConfigurer;

impl ExampleConfigurer {
    pub const NAME: &'static str = "example_configurer";
    pub const DATASETS_PER_PAGE: &'static str = "site.datasets_per_page";
    pub const TEST_CONF: &'static str = "ext.example_configurer.test_conf";
}

impl ConfigurerPlugin for ExampleConfigurer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn update_config_schema(&self, registry: &mut OptionRegistry) -> ConfigResult<()> {
        // Core option, not runtime-editable unless a plugin opts in
        registry.register(
            OptionDefinition::builder(Self::DATASETS_PER_PAGE)
                .description("Number of datasets shown per search page")
                .core()
                .kind(ValueKind::Int)
                .validator(validators::positive_integer)
                .globals("datasets_per_page")
                .build()?,
        )?;

        registry.register(
            OptionDefinition::builder(Self::TEST_CONF)
                .description("Free text option owned by the example plugin")
                .external()
                .validator(validators::max_length(1000))
                .build()?,
        )?;

        Ok(())
    }
}
