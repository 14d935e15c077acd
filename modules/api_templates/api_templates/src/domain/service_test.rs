#[cfg(test)]
mod tests {
    use super::super::*;
    use api_templates_sdk::{
        ApiConfiguration, ConfigurationId, CredentialDigest, HttpMethod, NewApiConfiguration,
        NewParameterTemplate, NewTenant, ParameterTemplate, RequestInput, ResponseMapping,
        SecretString, TemplateId, Tenant, TenantId,
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use parking_lot::Mutex;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use uuid::Uuid;

    use error::DomainError;

    // Mock repositories backed by plain vectors; no uniqueness enforcement.
    #[derive(Default)]
    struct MockTenants(Mutex<Vec<Tenant>>);

    #[derive(Default)]
    struct MockConfigurations(Mutex<Vec<ApiConfiguration>>);

    #[derive(Default)]
    struct MockTemplates(Mutex<Vec<ParameterTemplate>>);

    #[async_trait]
    impl repo::TenantRepository for MockTenants {
        async fn find_active_by_credential(
            &self,
            digest: &CredentialDigest,
        ) -> Result<Vec<Tenant>, DomainError> {
            Ok(self
                .0
                .lock()
                .iter()
                .filter(|t| t.active && &t.credential_digest == digest)
                .cloned()
                .collect())
        }

        async fn find_by_id(&self, id: TenantId) -> Result<Option<Tenant>, DomainError> {
            Ok(self.0.lock().iter().find(|t| t.id == id).cloned())
        }

        async fn list(&self) -> Result<Vec<Tenant>, DomainError> {
            Ok(self.0.lock().clone())
        }

        async fn insert(&self, tenant: Tenant) -> Result<Tenant, DomainError> {
            self.0.lock().push(tenant.clone());
            Ok(tenant)
        }

        async fn update(&self, tenant: Tenant) -> Result<Tenant, DomainError> {
            let mut rows = self.0.lock();
            if let Some(row) = rows.iter_mut().find(|t| t.id == tenant.id) {
                *row = tenant.clone();
            }
            Ok(tenant)
        }

        async fn delete(&self, id: TenantId) -> Result<bool, DomainError> {
            let mut rows = self.0.lock();
            let before = rows.len();
            rows.retain(|t| t.id != id);
            Ok(rows.len() != before)
        }
    }

    #[async_trait]
    impl repo::ConfigurationRepository for MockConfigurations {
        async fn find_active(
            &self,
            tenant_id: TenantId,
            api_name: &str,
        ) -> Result<Vec<ApiConfiguration>, DomainError> {
            Ok(self
                .0
                .lock()
                .iter()
                .filter(|c| c.active && c.tenant_id == tenant_id && c.api_name == api_name)
                .cloned()
                .collect())
        }

        async fn find_by_id(
            &self,
            id: ConfigurationId,
        ) -> Result<Option<ApiConfiguration>, DomainError> {
            Ok(self.0.lock().iter().find(|c| c.id == id).cloned())
        }

        async fn list_by_tenant(
            &self,
            tenant_id: TenantId,
        ) -> Result<Vec<ApiConfiguration>, DomainError> {
            Ok(self
                .0
                .lock()
                .iter()
                .filter(|c| c.tenant_id == tenant_id)
                .cloned()
                .collect())
        }

        async fn insert(&self, config: ApiConfiguration) -> Result<ApiConfiguration, DomainError> {
            self.0.lock().push(config.clone());
            Ok(config)
        }

        async fn update(&self, config: ApiConfiguration) -> Result<ApiConfiguration, DomainError> {
            Ok(config)
        }

        async fn delete(&self, _id: ConfigurationId) -> Result<bool, DomainError> {
            Ok(false)
        }
    }

    #[async_trait]
    impl repo::TemplateRepository for MockTemplates {
        async fn find_active(
            &self,
            config_id: ConfigurationId,
            template_name: &str,
        ) -> Result<Vec<ParameterTemplate>, DomainError> {
            Ok(self
                .0
                .lock()
                .iter()
                .filter(|t| t.active && t.config_id == config_id && t.template_name == template_name)
                .cloned()
                .collect())
        }

        async fn find_by_id(&self, id: TemplateId) -> Result<Option<ParameterTemplate>, DomainError> {
            Ok(self.0.lock().iter().find(|t| t.id == id).cloned())
        }

        async fn list_by_configuration(
            &self,
            config_id: ConfigurationId,
        ) -> Result<Vec<ParameterTemplate>, DomainError> {
            Ok(self
                .0
                .lock()
                .iter()
                .filter(|t| t.config_id == config_id)
                .cloned()
                .collect())
        }

        async fn insert(&self, template: ParameterTemplate) -> Result<ParameterTemplate, DomainError> {
            self.0.lock().push(template.clone());
            Ok(template)
        }

        async fn update(&self, template: ParameterTemplate) -> Result<ParameterTemplate, DomainError> {
            Ok(template)
        }

        async fn delete(&self, _id: TemplateId) -> Result<bool, DomainError> {
            Ok(false)
        }
    }

    struct Fixture {
        tenants: Arc<MockTenants>,
        configurations: Arc<MockConfigurations>,
        templates: Arc<MockTemplates>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                tenants: Arc::new(MockTenants::default()),
                configurations: Arc::new(MockConfigurations::default()),
                templates: Arc::new(MockTemplates::default()),
            }
        }

        fn service(&self) -> service::Service {
            service::Service::new(
                self.tenants.clone(),
                self.configurations.clone(),
                self.templates.clone(),
                service::ServiceConfig::default(),
            )
        }

        fn admin(&self) -> admin::AdminService {
            admin::AdminService::new(
                self.tenants.clone(),
                self.configurations.clone(),
                self.templates.clone(),
            )
        }

        fn tenant(&self, id: Uuid, credential: &str, active: bool) -> Tenant {
            let tenant = Tenant {
                id,
                name: format!("tenant-{id}"),
                description: None,
                credential_digest: CredentialDigest::of(&SecretString::new(credential)),
                active,
                created_at: Utc::now(),
            };
            self.tenants.0.lock().push(tenant.clone());
            tenant
        }

        fn configuration(&self, id: Uuid, tenant_id: Uuid, api_name: &str, active: bool) {
            let now = Utc::now();
            self.configurations.0.lock().push(ApiConfiguration {
                id,
                tenant_id,
                api_name: api_name.to_owned(),
                base_url: "https://hr.example.com/".to_owned(),
                token: SecretString::new("token-do-not-leak"),
                version: "v2".to_owned(),
                timeout_seconds: 12,
                max_retries: 5,
                description: None,
                active,
                created_at: now,
                updated_at: now,
            });
        }

        fn template(&self, config_id: Uuid, name: &str, spec: Value) {
            let now = Utc::now();
            self.templates.0.lock().push(ParameterTemplate {
                id: Uuid::new_v4(),
                config_id,
                template_name: name.to_owned(),
                description: None,
                http_method: HttpMethod::Get,
                endpoint_path: "/payroll".to_owned(),
                parameter_spec: spec,
                response_mapping: [("salary", "$.data.base_salary")].into_iter().collect(),
                active: true,
                created_at: now,
                updated_at: now,
            });
        }
    }

    fn payroll_spec() -> Value {
        json!({
            "query_params": {
                "empid": { "type": "string", "required": true, "source": "employee_id" },
                "data": { "type": "string", "required": true, "default": "salary" },
                "include_bonus": { "type": "boolean", "required": false, "default": true }
            },
            "headers": { "Content-Type": "application/json" }
        })
    }

    fn input(value: Value) -> RequestInput {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_resolve_returns_active_configuration() {
        let fx = Fixture::new();
        let tenant = fx.tenant(Uuid::new_v4(), "key-1", true);
        let config_id = Uuid::new_v4();
        fx.configuration(config_id, tenant.id, "employee", true);
        fx.configuration(Uuid::new_v4(), tenant.id, "project", true);

        let config = fx
            .service()
            .resolve(&SecretString::new("key-1"), "employee")
            .await
            .unwrap();

        assert_eq!(config.id, config_id);
        assert_eq!(config.api_name, "employee");
    }

    #[tokio::test]
    async fn test_resolve_unknown_credential() {
        let fx = Fixture::new();
        fx.tenant(Uuid::new_v4(), "key-1", true);

        let err = fx
            .service()
            .resolve(&SecretString::new("key-2"), "employee")
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::TenantNotFound));
        assert!(!err.to_string().contains("key-2"));
    }

    #[tokio::test]
    async fn test_resolve_inactive_tenant_is_invisible() {
        let fx = Fixture::new();
        let tenant = fx.tenant(Uuid::new_v4(), "key-1", false);
        fx.configuration(Uuid::new_v4(), tenant.id, "employee", true);

        let err = fx
            .service()
            .resolve(&SecretString::new("key-1"), "employee")
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::TenantNotFound));
    }

    #[tokio::test]
    async fn test_resolve_inactive_configuration_is_not_found() {
        let fx = Fixture::new();
        let tenant = fx.tenant(Uuid::new_v4(), "key-1", true);
        fx.configuration(Uuid::new_v4(), tenant.id, "employee", false);

        let err = fx
            .service()
            .resolve(&SecretString::new("key-1"), "employee")
            .await
            .unwrap_err();

        assert!(
            matches!(err, DomainError::ConfigurationNotFound { ref api_name } if api_name == "employee")
        );
    }

    #[tokio::test]
    async fn test_resolve_tie_break_picks_lowest_id() {
        let fx = Fixture::new();
        let tenant = fx.tenant(Uuid::new_v4(), "key-1", true);
        let low = Uuid::from_u128(1);
        let high = Uuid::from_u128(2);
        fx.configuration(high, tenant.id, "employee", true);
        fx.configuration(low, tenant.id, "employee", true);

        let config = fx
            .service()
            .resolve(&SecretString::new("key-1"), "employee")
            .await
            .unwrap();

        assert_eq!(config.id, low);
    }

    #[tokio::test]
    async fn test_duplicate_credential_tie_break_picks_lowest_tenant() {
        let fx = Fixture::new();
        let low = fx.tenant(Uuid::from_u128(10), "shared", true);
        let high = fx.tenant(Uuid::from_u128(20), "shared", true);
        fx.configuration(Uuid::new_v4(), low.id, "employee", true);
        fx.configuration(Uuid::new_v4(), high.id, "employee", true);

        let config = fx
            .service()
            .resolve(&SecretString::new("shared"), "employee")
            .await
            .unwrap();

        assert_eq!(config.tenant_id, low.id);
    }

    #[tokio::test]
    async fn test_prepare_request_payroll_scenario() {
        let fx = Fixture::new();
        let tenant = fx.tenant(Uuid::new_v4(), "key-1", true);
        let config_id = Uuid::new_v4();
        fx.configuration(config_id, tenant.id, "employee", true);
        fx.template(config_id, "salary_lookup", payroll_spec());

        let prepared = fx
            .service()
            .prepare_request(
                &SecretString::new("key-1"),
                "employee",
                "salary_lookup",
                &input(json!({ "employee_id": "234" })),
            )
            .await
            .unwrap();

        let query: Vec<(&str, &str)> = prepared
            .request
            .query_parameters
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            query,
            [("empid", "234"), ("data", "salary"), ("include_bonus", "true")]
        );
        assert_eq!(prepared.request.url, "https://hr.example.com/payroll");
        assert_eq!(prepared.request.headers["Content-Type"], "application/json");
        assert_eq!(prepared.configuration_id, config_id);
        assert_eq!(prepared.version, "v2");
        assert_eq!(prepared.timeout_seconds, 12);
        assert_eq!(prepared.max_retries, 5);

        let serialized = serde_json::to_string(&prepared).unwrap();
        assert!(!serialized.contains("token-do-not-leak"));
    }

    #[tokio::test]
    async fn test_prepare_request_missing_required_parameter() {
        let fx = Fixture::new();
        let tenant = fx.tenant(Uuid::new_v4(), "key-1", true);
        let config_id = Uuid::new_v4();
        fx.configuration(config_id, tenant.id, "employee", true);
        fx.template(config_id, "salary_lookup", payroll_spec());

        let err = fx
            .service()
            .prepare_request(
                &SecretString::new("key-1"),
                "employee",
                "salary_lookup",
                &RequestInput::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::Compile(compiler::CompileError::MissingRequiredParameter { ref name })
                if name == "empid"
        ));
    }

    #[tokio::test]
    async fn test_prepare_request_unknown_template() {
        let fx = Fixture::new();
        let tenant = fx.tenant(Uuid::new_v4(), "key-1", true);
        let config_id = Uuid::new_v4();
        fx.configuration(config_id, tenant.id, "employee", true);

        let err = fx
            .service()
            .prepare_request(
                &SecretString::new("key-1"),
                "employee",
                "missing",
                &RequestInput::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::TemplateNotFound { .. }));
    }

    #[tokio::test]
    async fn test_admin_issues_credential_that_resolves() {
        let fx = Fixture::new();
        let admin = fx.admin();

        let issued = admin
            .create_tenant(NewTenant {
                name: "IndiaNIC".to_owned(),
                ..NewTenant::default()
            })
            .await
            .unwrap();
        admin
            .create_configuration(NewApiConfiguration::new(
                issued.tenant.id,
                "employee",
                "https://hr.example.com",
                SecretString::new("tok"),
            ))
            .await
            .unwrap();

        let config = fx
            .service()
            .resolve(&issued.credential, "employee")
            .await
            .unwrap();
        assert_eq!(config.version, "v1");
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.max_retries, 3);
    }

    #[tokio::test]
    async fn test_admin_rejects_malformed_template_spec() {
        let fx = Fixture::new();
        let tenant = fx.tenant(Uuid::new_v4(), "key-1", true);
        let config_id = Uuid::new_v4();
        fx.configuration(config_id, tenant.id, "employee", true);

        let mut new_template = NewParameterTemplate::new(config_id, "broken", "/payroll");
        new_template.parameter_spec = json!({ "query_params": { "q": { "type": "integer" } } });

        let err = fx.admin().create_template(new_template).await.unwrap_err();

        assert!(matches!(
            err,
            DomainError::Compile(compiler::CompileError::InvalidTemplateSpecification { .. })
        ));
        assert!(fx.templates.0.lock().is_empty());
    }

    #[tokio::test]
    async fn test_admin_rejects_configuration_for_unknown_tenant() {
        let fx = Fixture::new();

        let err = fx
            .admin()
            .create_configuration(NewApiConfiguration::new(
                Uuid::new_v4(),
                "employee",
                "https://hr.example.com",
                SecretString::new("tok"),
            ))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::RecordNotFound {
                kind: error::RecordKind::Tenant,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_admin_rejects_non_http_base_url() {
        let fx = Fixture::new();
        let tenant = fx.tenant(Uuid::new_v4(), "key-1", true);

        let err = fx
            .admin()
            .create_configuration(NewApiConfiguration::new(
                tenant.id,
                "employee",
                "ftp://hr.example.com",
                SecretString::new("tok"),
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "base_url"));
    }

    #[tokio::test]
    async fn test_rotate_credential_invalidates_old_one() {
        let fx = Fixture::new();
        let tenant = fx.tenant(Uuid::new_v4(), "old-key", true);
        fx.configuration(Uuid::new_v4(), tenant.id, "employee", true);

        let issued = fx.admin().rotate_tenant_credential(tenant.id).await.unwrap();
        let service = fx.service();

        assert!(service.resolve(&issued.credential, "employee").await.is_ok());
        assert!(matches!(
            service
                .resolve(&SecretString::new("old-key"), "employee")
                .await,
            Err(DomainError::TenantNotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_templates_skips_inactive() {
        let fx = Fixture::new();
        let config_id = Uuid::new_v4();
        fx.template(config_id, "b_lookup", json!({}));
        fx.template(config_id, "a_lookup", json!({}));
        fx.templates.0.lock()[0].active = false;

        let templates = fx.service().list_templates(config_id).await.unwrap();

        let names: Vec<&str> = templates.iter().map(|t| t.template_name.as_str()).collect();
        assert_eq!(names, ["a_lookup"]);
    }

    #[test]
    fn test_service_config_default_is_strict() {
        let cfg = service::ServiceConfig::default();
        assert_eq!(
            cfg.compile.path_parameters,
            compiler::PathParameterPolicy::Strict
        );
    }

    #[test]
    fn test_response_mapping_passes_through() {
        let mapping: ResponseMapping = [("salary", "$.data.base_salary")].into_iter().collect();
        assert_eq!(mapping.get("salary").unwrap().as_str(), "$.data.base_salary");
    }
}
