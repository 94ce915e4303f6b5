//! `CatalogApi` over `aws servicecatalog`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::AwsCli;
use crate::application::ports::{CatalogApi, CommandRunner, ProvisionRequest, ProvisionedRef};
use crate::domain::product::{
    Portfolio, ProductOutput, ProductSummary, ProvisionStatus, ProvisionedProduct,
    ProvisioningArtifact,
};
use crate::domain::remote;

const SERVICE: &str = "servicecatalog";

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListPortfoliosResponse {
    #[serde(default)]
    portfolio_details: Vec<PortfolioDto>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PortfolioDto {
    id: String,
    display_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchProductsResponse {
    #[serde(default)]
    product_view_details: Vec<ProductViewDetail>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ProductViewDetail {
    product_view_summary: ProductViewSummary,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ProductViewSummary {
    product_id: String,
    name: String,
    short_description: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeProductResponse {
    #[serde(default)]
    provisioning_artifacts: Vec<ArtifactDto>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ArtifactDto {
    id: String,
    name: Option<String>,
    #[serde(default, deserialize_with = "cli_timestamp")]
    created_time: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ParameterDto<'a> {
    key: &'a str,
    value: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ProvisionResponse {
    record_detail: RecordDetail,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RecordDetail {
    provisioned_product_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeProvisionedResponse {
    provisioned_product_detail: ProvisionedDto,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ProvisionedDto {
    id: String,
    name: String,
    status: String,
    status_message: Option<String>,
    #[serde(rename = "Type")]
    product_type: Option<String>,
    #[serde(default, deserialize_with = "cli_timestamp")]
    created_time: Option<DateTime<Utc>>,
}

/// AWS CLI v2 prints RFC 3339 strings; v1's default `cli_timestamp_format`
/// prints epoch seconds. Anything unparseable reads as unknown.
fn cli_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Number(n)) => from_epoch_secs(&n),
        Some(serde_json::Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        _ => None,
    })
}

/// Epoch seconds, read from the number's decimal text so `.123` stays 123ms.
fn from_epoch_secs(n: &serde_json::Number) -> Option<DateTime<Utc>> {
    if let Some(secs) = n.as_i64() {
        return DateTime::from_timestamp(secs, 0);
    }
    let text = n.to_string();
    let (whole, frac) = text.split_once('.')?;
    let digits: String = frac.chars().chain(std::iter::repeat('0')).take(9).collect();
    DateTime::from_timestamp(whole.parse().ok()?, digits.parse().ok()?)
}

impl From<ProvisionedDto> for ProvisionedProduct {
    fn from(dto: ProvisionedDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            status: ProvisionStatus::from_remote(&dto.status),
            status_message: dto.status_message,
            product_type: dto.product_type,
            created_time: dto.created_time,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OutputsResponse {
    #[serde(default)]
    outputs: Vec<OutputDto>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OutputDto {
    output_key: String,
    #[serde(default)]
    output_value: String,
    description: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchProvisionedResponse {
    #[serde(default)]
    provisioned_products: Vec<ProvisionedDto>,
}

impl<R: CommandRunner> CatalogApi for AwsCli<R> {
    async fn list_portfolios(&self) -> Result<Vec<Portfolio>> {
        let response: ListPortfoliosResponse =
            self.call_json(SERVICE, "list-portfolios", &[]).await?;
        Ok(response
            .portfolio_details
            .into_iter()
            .map(|p| Portfolio {
                id: p.id,
                display_name: p.display_name,
            })
            .collect())
    }

    async fn search_products(&self, portfolio_id: &str) -> Result<Vec<ProductSummary>> {
        let response: SearchProductsResponse = self
            .call_json(
                SERVICE,
                "search-products-as-admin",
                &["--portfolio-id", portfolio_id],
            )
            .await?;
        Ok(response
            .product_view_details
            .into_iter()
            .map(|d| ProductSummary {
                id: d.product_view_summary.product_id,
                name: d.product_view_summary.name,
                description: d.product_view_summary.short_description,
            })
            .collect())
    }

    async fn describe_product(&self, product_id: &str) -> Result<Vec<ProvisioningArtifact>> {
        let response: DescribeProductResponse = self
            .call_json(SERVICE, "describe-product", &["--id", product_id])
            .await?;
        Ok(response
            .provisioning_artifacts
            .into_iter()
            .map(|a| ProvisioningArtifact {
                id: a.id,
                name: a.name,
                created_time: a.created_time,
            })
            .collect())
    }

    async fn provision(&self, request: &ProvisionRequest) -> Result<String> {
        let params: Vec<ParameterDto<'_>> = request
            .parameters
            .iter()
            .map(|(k, v)| ParameterDto { key: k, value: v })
            .collect();
        let params = serde_json::to_string(&params).context("encoding provisioning parameters")?;
        let response: ProvisionResponse = self
            .call_json(
                SERVICE,
                "provision-product",
                &[
                    "--product-id",
                    &request.product_id,
                    "--provisioning-artifact-id",
                    &request.artifact_id,
                    "--provisioned-product-name",
                    &request.name,
                    "--provisioning-parameters",
                    &params,
                ],
            )
            .await?;
        Ok(response.record_detail.provisioned_product_id)
    }

    async fn describe_provisioned(
        &self,
        target: ProvisionedRef<'_>,
    ) -> Result<Option<ProvisionedProduct>> {
        let args = match target {
            ProvisionedRef::Id(id) => ["--id", id],
            ProvisionedRef::Name(name) => ["--name", name],
        };
        match self
            .call_json::<DescribeProvisionedResponse>(SERVICE, "describe-provisioned-product", &args)
            .await
        {
            Ok(r) => Ok(Some(r.provisioned_product_detail.into())),
            Err(e) if remote::is_not_found(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn provisioned_outputs(&self, name: &str) -> Result<Vec<ProductOutput>> {
        let response: OutputsResponse = self
            .call_json(
                SERVICE,
                "get-provisioned-product-outputs",
                &["--provisioned-product-name", name],
            )
            .await?;
        Ok(response
            .outputs
            .into_iter()
            .map(|o| ProductOutput {
                key: o.output_key,
                value: o.output_value,
                description: o.description,
            })
            .collect())
    }

    async fn search_provisioned(&self) -> Result<Vec<ProvisionedProduct>> {
        let response: SearchProvisionedResponse = self
            .call_json(SERVICE, "search-provisioned-products", &[])
            .await?;
        Ok(response
            .provisioned_products
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn terminate(&self, provisioned_product_id: &str) -> Result<()> {
        self.call(
            SERVICE,
            "terminate-provisioned-product",
            &["--provisioned-product-id", provisioned_product_id],
        )
        .await?;
        Ok(())
    }
}
