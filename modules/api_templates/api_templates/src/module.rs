//! api_templates module definition.
//!
//! Wires the catalog backend chosen by `storage.kind` into the read-side
//! service, the admin service and the local client.

use std::sync::Arc;

use anyhow::Context;
use api_templates_sdk::{
    ApiTemplatesAdminClient, ApiTemplatesClient, NewApiConfiguration, NewParameterTemplate,
    NewTenant,
};
use tracing::{info, instrument, warn};

use crate::config::{ApiTemplatesConfig, CatalogConfig, StorageKind};
use crate::domain::admin::AdminService;
use crate::domain::repo::{ConfigurationRepository, TemplateRepository, TenantRepository};
use crate::domain::service::{Service, ServiceConfig};
use crate::infra::{CatalogSnapshot, InMemoryCatalog, SeaOrmCatalog};
use crate::local_client::ApiTemplatesLocalClient;

/// The backend serving the catalog.
#[derive(Clone)]
pub enum CatalogBackend {
    Static(Arc<InMemoryCatalog>),
    Database(Arc<SeaOrmCatalog>),
}

/// Counts of records written by [`ApiTemplatesModule::import_catalog`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub tenants: usize,
    pub configurations: usize,
    pub templates: usize,
    /// Tenants left alone because one with the same name already exists.
    pub skipped_tenants: usize,
}

pub struct ApiTemplatesModule {
    service: Arc<Service>,
    admin: Arc<AdminService>,
    client: Arc<ApiTemplatesLocalClient>,
    backend: CatalogBackend,
}

impl ApiTemplatesModule {
    /// Build the module from configuration.
    ///
    /// `static` storage serves `catalog` from memory. `database` storage
    /// connects, migrates, and imports any configured tenants whose names
    /// are not registered yet.
    ///
    /// # Errors
    /// Invalid catalog, database connection or migration failures.
    pub async fn init(cfg: &ApiTemplatesConfig) -> anyhow::Result<Self> {
        info!(storage = ?cfg.storage.kind, "initializing api_templates module");
        let service_config = ServiceConfig::from(cfg);

        match cfg.storage.kind {
            StorageKind::Static => {
                let snapshot = CatalogSnapshot::from_config(&cfg.catalog)
                    .context("invalid api_templates catalog")?;
                let catalog = Arc::new(InMemoryCatalog::new(snapshot));
                Ok(Self::from_backend(CatalogBackend::Static(catalog), service_config))
            }
            StorageKind::Database => {
                let catalog = Arc::new(SeaOrmCatalog::connect(&cfg.storage).await?);
                let module =
                    Self::from_backend(CatalogBackend::Database(catalog), service_config);
                if !cfg.catalog.tenants.is_empty() {
                    module.import_catalog(&cfg.catalog).await?;
                }
                Ok(module)
            }
        }
    }

    #[must_use]
    pub fn from_backend(backend: CatalogBackend, config: ServiceConfig) -> Self {
        let (tenants, configurations, templates): (
            Arc<dyn TenantRepository>,
            Arc<dyn ConfigurationRepository>,
            Arc<dyn TemplateRepository>,
        ) = match &backend {
            CatalogBackend::Static(catalog) => (catalog.clone(), catalog.clone(), catalog.clone()),
            CatalogBackend::Database(catalog) => {
                (catalog.clone(), catalog.clone(), catalog.clone())
            }
        };
        Self::from_repos(tenants, configurations, templates, backend, config)
    }

    fn from_repos(
        tenants: Arc<dyn TenantRepository>,
        configurations: Arc<dyn ConfigurationRepository>,
        templates: Arc<dyn TemplateRepository>,
        backend: CatalogBackend,
        config: ServiceConfig,
    ) -> Self {
        let service = Arc::new(Service::new(
            tenants.clone(),
            configurations.clone(),
            templates.clone(),
            config,
        ));
        let admin = Arc::new(AdminService::new(tenants, configurations, templates));
        let client = Arc::new(ApiTemplatesLocalClient::new(service.clone(), admin.clone()));
        Self {
            service,
            admin,
            client,
            backend,
        }
    }

    #[must_use]
    pub fn client(&self) -> Arc<dyn ApiTemplatesClient> {
        self.client.clone()
    }

    #[must_use]
    pub fn admin_client(&self) -> Arc<dyn ApiTemplatesAdminClient> {
        self.client.clone()
    }

    #[must_use]
    pub fn service(&self) -> &Arc<Service> {
        &self.service
    }

    #[must_use]
    pub fn admin(&self) -> &Arc<AdminService> {
        &self.admin
    }

    #[must_use]
    pub fn backend(&self) -> &CatalogBackend {
        &self.backend
    }

    /// Write a configured catalog through the admin service.
    ///
    /// Tenants whose name is already registered are skipped with their
    /// configurations. Any other failure stops the import; records written
    /// before it are kept.
    ///
    /// # Errors
    /// Validation, conflict or storage errors from the admin service.
    #[instrument(skip_all, fields(tenants = catalog.tenants.len()))]
    pub async fn import_catalog(&self, catalog: &CatalogConfig) -> anyhow::Result<ImportReport> {
        let existing = self.admin.list_tenants().await?;
        let mut report = ImportReport::default();

        for tc in &catalog.tenants {
            if existing.iter().any(|t| t.name == tc.name) {
                warn!(tenant.name = %tc.name, "tenant already registered, skipping");
                report.skipped_tenants += 1;
                continue;
            }

            let issued = self
                .admin
                .create_tenant(NewTenant {
                    id: tc.id,
                    name: tc.name.clone(),
                    description: tc.description.clone(),
                    credential: Some(tc.credential.clone()),
                    active: Some(tc.active),
                })
                .await
                .with_context(|| format!("failed to import tenant '{}'", tc.name))?;
            report.tenants += 1;

            for cc in &tc.configurations {
                let config = self
                    .admin
                    .create_configuration(NewApiConfiguration {
                        id: cc.id,
                        tenant_id: issued.tenant.id,
                        api_name: cc.api_name.clone(),
                        base_url: cc.base_url.clone(),
                        token: cc.token.clone(),
                        version: cc.version.clone(),
                        timeout_seconds: cc.timeout_seconds,
                        max_retries: cc.max_retries,
                        description: cc.description.clone(),
                        active: Some(cc.active),
                    })
                    .await
                    .with_context(|| {
                        format!(
                            "failed to import configuration '{}' of tenant '{}'",
                            cc.api_name, tc.name
                        )
                    })?;
                report.configurations += 1;

                for t in &cc.templates {
                    self.admin
                        .create_template(NewParameterTemplate {
                            id: t.id,
                            config_id: config.id,
                            template_name: t.template_name.clone(),
                            description: t.description.clone(),
                            http_method: t.http_method,
                            endpoint_path: t.endpoint_path.clone(),
                            parameter_spec: t.parameter_spec.clone(),
                            response_mapping: t.response_mapping.clone(),
                            active: Some(t.active),
                        })
                        .await
                        .with_context(|| {
                            format!(
                                "failed to import template '{}' of configuration '{}'",
                                t.template_name, cc.api_name
                            )
                        })?;
                    report.templates += 1;
                }
            }
        }

        info!(
            tenants = report.tenants,
            configurations = report.configurations,
            templates = report.templates,
            skipped = report.skipped_tenants,
            "catalog imported"
        );
        Ok(report)
    }
}
