//! Template lookup scoped to one API configuration.

use std::sync::Arc;

use api_templates_sdk::{ConfigurationId, ParameterTemplate};
use tracing::{debug, instrument};

use super::error::DomainError;
use super::repo::TemplateRepository;
use super::resolver::pick_lowest;

pub struct TemplateStore {
    templates: Arc<dyn TemplateRepository>,
}

impl TemplateStore {
    #[must_use]
    pub fn new(templates: Arc<dyn TemplateRepository>) -> Self {
        Self { templates }
    }

    /// Active template `template_name` of configuration `config_id`.
    ///
    /// # Errors
    /// `TemplateNotFound` or a storage error.
    #[instrument(skip_all, fields(config.id = %config_id, template_name = %template_name))]
    pub async fn lookup(
        &self,
        config_id: ConfigurationId,
        template_name: &str,
    ) -> Result<ParameterTemplate, DomainError> {
        let candidates: Vec<ParameterTemplate> = self
            .templates
            .find_active(config_id, template_name)
            .await?
            .into_iter()
            .filter(|t| t.active)
            .collect();

        let template = pick_lowest(candidates, |t| t.id, "parameter_template")
            .ok_or_else(|| DomainError::template_not_found(template_name))?;

        debug!(template.id = %template.id, "template found");
        Ok(template)
    }

    /// Active templates of a configuration, ordered by name.
    ///
    /// # Errors
    /// Storage errors only.
    pub async fn list_active(
        &self,
        config_id: ConfigurationId,
    ) -> Result<Vec<ParameterTemplate>, DomainError> {
        let mut templates: Vec<ParameterTemplate> = self
            .templates
            .list_by_configuration(config_id)
            .await?
            .into_iter()
            .filter(|t| t.active)
            .collect();
        templates.sort_by(|a, b| a.template_name.cmp(&b.template_name).then(a.id.cmp(&b.id)));
        Ok(templates)
    }
}
