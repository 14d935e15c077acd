//! Initial migration for the tenant, configuration and template tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ApiTenant::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ApiTenant::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ApiTenant::Name).text().not_null())
                    .col(ColumnDef::new(ApiTenant::Description).text())
                    .col(ColumnDef::new(ApiTenant::CredentialDigest).text().not_null())
                    .col(
                        ColumnDef::new(ApiTenant::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ApiTenant::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uk_api_tenant_credential_digest")
                    .table(ApiTenant::Table)
                    .col(ApiTenant::CredentialDigest)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uk_api_tenant_name")
                    .table(ApiTenant::Table)
                    .col(ApiTenant::Name)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ApiConfiguration::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApiConfiguration::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ApiConfiguration::TenantId).uuid().not_null())
                    .col(ColumnDef::new(ApiConfiguration::ApiName).text().not_null())
                    .col(ColumnDef::new(ApiConfiguration::BaseUrl).text().not_null())
                    .col(ColumnDef::new(ApiConfiguration::Token).text().not_null())
                    .col(
                        ColumnDef::new(ApiConfiguration::Version)
                            .text()
                            .not_null()
                            .default("v1"),
                    )
                    .col(
                        ColumnDef::new(ApiConfiguration::TimeoutSeconds)
                            .big_integer()
                            .not_null()
                            .default(30),
                    )
                    .col(
                        ColumnDef::new(ApiConfiguration::MaxRetries)
                            .big_integer()
                            .not_null()
                            .default(3),
                    )
                    .col(ColumnDef::new(ApiConfiguration::Description).text())
                    .col(
                        ColumnDef::new(ApiConfiguration::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ApiConfiguration::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApiConfiguration::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ApiConfiguration::Table, ApiConfiguration::TenantId)
                            .to(ApiTenant::Table, ApiTenant::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_api_configuration_tenant")
                    .table(ApiConfiguration::Table)
                    .col(ApiConfiguration::TenantId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ApiParameterTemplate::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApiParameterTemplate::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ApiParameterTemplate::ConfigId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApiParameterTemplate::TemplateName)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ApiParameterTemplate::Description).text())
                    .col(
                        ColumnDef::new(ApiParameterTemplate::HttpMethod)
                            .text()
                            .not_null()
                            .default("GET"),
                    )
                    .col(
                        ColumnDef::new(ApiParameterTemplate::EndpointPath)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApiParameterTemplate::ParameterSpec)
                            .json()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApiParameterTemplate::ResponseMapping)
                            .json()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApiParameterTemplate::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ApiParameterTemplate::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApiParameterTemplate::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ApiParameterTemplate::Table, ApiParameterTemplate::ConfigId)
                            .to(ApiConfiguration::Table, ApiConfiguration::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Partial indexes: only one active row per name, inactive rows may repeat.
        let conn = manager.get_connection();
        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS uk_api_configuration_active_name \
             ON api_configuration (tenant_id, api_name) WHERE active",
        )
        .await?;
        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS uk_api_parameter_template_active_name \
             ON api_parameter_template (config_id, template_name) WHERE active",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ApiParameterTemplate::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ApiConfiguration::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ApiTenant::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum ApiTenant {
    Table,
    Id,
    Name,
    Description,
    CredentialDigest,
    Active,
    CreatedAt,
}

#[derive(Iden)]
enum ApiConfiguration {
    Table,
    Id,
    TenantId,
    ApiName,
    BaseUrl,
    Token,
    Version,
    TimeoutSeconds,
    MaxRetries,
    Description,
    Active,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ApiParameterTemplate {
    Table,
    Id,
    ConfigId,
    TemplateName,
    Description,
    HttpMethod,
    EndpointPath,
    ParameterSpec,
    ResponseMapping,
    Active,
    CreatedAt,
    UpdatedAt,
}
