#![allow(clippy::unwrap_used, clippy::expect_used)]

//! SeaORM storage against in-memory SQLite: migrations, unique indexes,
//! cascades and order-preserving JSON columns.

use api_templates::config::{CatalogConfig, StorageKind};
use api_templates::{
    ApiConfigurationPatch, ApiTemplatesConfig, ApiTemplatesError, ApiTemplatesModule,
    CatalogBackend, HttpMethod, NewApiConfiguration, NewParameterTemplate, NewTenant,
    RequestInput, SecretString,
};
use figment::Figment;
use serde_json::json;

fn database_config() -> ApiTemplatesConfig {
    let mut cfg = ApiTemplatesConfig::default();
    cfg.storage.kind = StorageKind::Database;
    cfg.storage.dsn = "sqlite::memory:".to_owned();
    cfg
}

fn catalog() -> CatalogConfig {
    let figment = Figment::new().merge((
        "catalog.tenants",
        json!([{
            "name": "IndiaNIC",
            "credential": "indianic-key",
            "configurations": [{
                "api_name": "employee",
                "base_url": "https://hr.example.com/",
                "token": "hr-token",
                "templates": [{
                    "template_name": "salary_lookup",
                    "http_method": "GET",
                    "endpoint_path": "/payroll",
                    "parameter_spec": {
                        "query_params": {
                            "empid": { "source": "employee_id", "required": true }
                        }
                    },
                    "response_mapping": { "salary": "$.data.base_salary" }
                }]
            }]
        }]),
    ));
    ApiTemplatesConfig::from_figment(&figment).unwrap().catalog
}

async fn database_module() -> ApiTemplatesModule {
    ApiTemplatesModule::init(&database_config()).await.unwrap()
}

#[tokio::test]
async fn configured_catalog_is_imported_on_init() {
    let mut cfg = database_config();
    cfg.catalog = catalog();
    let module = ApiTemplatesModule::init(&cfg).await.unwrap();
    assert!(matches!(module.backend(), CatalogBackend::Database(_)));

    let mut input = RequestInput::new();
    input.insert("employee_id".to_owned(), json!(234));
    let prepared = module
        .client()
        .prepare_request(
            &SecretString::new("indianic-key"),
            "employee",
            "salary_lookup",
            &input,
        )
        .await
        .unwrap();

    assert_eq!(prepared.request.url, "https://hr.example.com/payroll");
    assert_eq!(prepared.request.query_parameters["empid"], "234");
    assert_eq!(
        prepared.request.response_mapping.get("salary").unwrap().as_str(),
        "$.data.base_salary"
    );
}

#[tokio::test]
async fn import_skips_registered_tenants() {
    let module = database_module().await;
    let first = module.import_catalog(&catalog()).await.unwrap();
    assert_eq!(first.tenants, 1);
    assert_eq!(first.configurations, 1);
    assert_eq!(first.templates, 1);

    let second = module.import_catalog(&catalog()).await.unwrap();
    assert_eq!(second.tenants, 0);
    assert_eq!(second.skipped_tenants, 1);
}

#[tokio::test]
async fn template_spec_keeps_declaration_order() {
    let module = database_module().await;
    let admin = module.admin_client();
    let tenant = admin
        .create_tenant(NewTenant {
            name: "Acme".to_owned(),
            credential: Some(SecretString::new("acme-key")),
            ..NewTenant::default()
        })
        .await
        .unwrap();
    let config = admin
        .create_configuration(NewApiConfiguration::new(
            tenant.tenant.id,
            "search",
            "https://search.test",
            SecretString::new("search-token"),
        ))
        .await
        .unwrap();

    let mut new_template = NewParameterTemplate::new(config.id, "find", "/find");
    new_template.http_method = Some(HttpMethod::Post);
    new_template.parameter_spec = json!({
        "query_params": {
            "zeta": { "source": "z", "default": "1" },
            "alpha": { "source": "a", "default": "2" },
            "mid": { "source": "m", "default": "3" }
        }
    });
    new_template.response_mapping = [("z_last", "$.z"), ("a_first", "$.a")]
        .into_iter()
        .collect();
    let stored = admin.create_template(new_template).await.unwrap();

    let fetched = admin.get_template_by_id(stored.id).await.unwrap();
    assert_eq!(fetched.parameter_spec, stored.parameter_spec);
    assert_eq!(fetched.http_method, HttpMethod::Post);

    let request = module
        .client()
        .compile_request(&fetched, &RequestInput::new(), &config.base_url)
        .await
        .unwrap();
    let keys: Vec<&str> = request
        .query_parameters
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    let mapping: Vec<&str> = request
        .response_mapping
        .iter()
        .map(|(k, _)| k.as_str())
        .collect();
    assert_eq!(mapping, vec!["z_last", "a_first"]);
}

#[tokio::test]
async fn duplicate_credential_and_active_template_conflict() {
    let module = database_module().await;
    let admin = module.admin_client();
    let tenant = admin
        .create_tenant(NewTenant {
            name: "Acme".to_owned(),
            credential: Some(SecretString::new("shared-key")),
            ..NewTenant::default()
        })
        .await
        .unwrap()
        .tenant;

    let err = admin
        .create_tenant(NewTenant {
            name: "Globex".to_owned(),
            credential: Some(SecretString::new("shared-key")),
            ..NewTenant::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiTemplatesError::Conflict { .. }));
    assert!(!err.to_string().contains("shared-key"));

    let config = admin
        .create_configuration(NewApiConfiguration::new(
            tenant.id,
            "crm",
            "https://crm.test",
            SecretString::new("t"),
        ))
        .await
        .unwrap();
    admin
        .create_template(NewParameterTemplate::new(config.id, "list", "/items"))
        .await
        .unwrap();
    let err = admin
        .create_template(NewParameterTemplate::new(config.id, "list", "/other"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiTemplatesError::Conflict { .. }));

    let mut inactive = NewParameterTemplate::new(config.id, "list", "/old");
    inactive.active = Some(false);
    admin.create_template(inactive).await.unwrap();
    assert_eq!(admin.list_all_templates(config.id).await.unwrap().len(), 2);
    assert_eq!(module.client().list_templates(config.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn configuration_update_round_trips() {
    let module = database_module().await;
    let admin = module.admin_client();
    let tenant = admin
        .create_tenant(NewTenant {
            name: "Acme".to_owned(),
            credential: Some(SecretString::new("acme-key")),
            ..NewTenant::default()
        })
        .await
        .unwrap()
        .tenant;
    let config = admin
        .create_configuration(NewApiConfiguration::new(
            tenant.id,
            "crm",
            "https://crm.test",
            SecretString::new("old-token"),
        ))
        .await
        .unwrap();

    let updated = admin
        .update_configuration(
            config.id,
            ApiConfigurationPatch {
                token: Some(SecretString::new("new-token")),
                timeout_seconds: Some(90),
                description: Some(Some("CRM".to_owned())),
                ..ApiConfigurationPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.timeout_seconds, 90);

    let resolved = module
        .client()
        .resolve_configuration(&SecretString::new("acme-key"), "crm")
        .await
        .unwrap();
    assert_eq!(resolved.token.expose(), "new-token");
    assert_eq!(resolved.timeout_seconds, 90);
    assert_eq!(resolved.description.as_deref(), Some("CRM"));
}

#[tokio::test]
async fn deleting_a_tenant_removes_its_catalog() {
    let mut cfg = database_config();
    cfg.catalog = catalog();
    let module = ApiTemplatesModule::init(&cfg).await.unwrap();
    let admin = module.admin_client();

    let tenant = admin.list_tenants().await.unwrap().remove(0);
    let config = admin.list_configurations(tenant.id).await.unwrap().remove(0);
    let template = admin.list_all_templates(config.id).await.unwrap().remove(0);

    admin.delete_tenant(tenant.id).await.unwrap();

    let err = admin.get_configuration(config.id).await.unwrap_err();
    assert!(err.is_not_found());
    let err = admin.get_template_by_id(template.id).await.unwrap_err();
    assert!(err.is_not_found());
    let err = admin.delete_tenant(tenant.id).await.unwrap_err();
    assert!(matches!(err, ApiTemplatesError::RecordNotFound { .. }));
}
