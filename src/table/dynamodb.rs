//! DynamoDB table client
//!
//! Item layout, compatible with connect-dynamodb:
//! - `<hashKey>` (S): `prefix + session_id`
//! - `<dataAttribute>` (M): the session payload, including `updated`
//! - `expires` (N): seconds since the Unix epoch, usable as the table's TTL attribute

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::{Credentials, Region};
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, KeySchemaElement, KeyType, ProvisionedThroughput,
    ScalarAttributeType,
};
use aws_sdk_dynamodb::Client;

use super::conversions::{stored_session_from_item, value_to_attribute};
use super::{ItemUpdate, StoredSession, TableClient, EXPIRES_ATTRIBUTE, UPDATED_FIELD};
use crate::config::{DynamoConfig, TableConfig};
use crate::error::SessionError;

impl DynamoConfig {
    /// Build a DynamoDB client from these settings.
    ///
    /// Unset fields fall back to the SDK's default provider chain.
    pub async fn load_client(&self) -> Client {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &self.endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }
        if let Some(profile) = &self.profile {
            loader = loader.profile_name(profile.clone());
        }
        if let (Some(access_key_id), Some(secret_access_key)) =
            (&self.access_key_id, &self.secret_access_key)
        {
            loader = loader.credentials_provider(Credentials::new(
                access_key_id.clone(),
                secret_access_key.clone(),
                self.session_token.clone(),
                None,
                "salvo-dynamodb-session",
            ));
        }
        Client::new(&loader.load().await)
    }
}

fn key_attribute(key: &str) -> AttributeValue {
    AttributeValue::S(key.to_string())
}

fn number(n: i64) -> AttributeValue {
    AttributeValue::N(n.to_string())
}

#[async_trait]
impl TableClient for Client {
    async fn table_exists(&self, table: &TableConfig) -> Result<bool, SessionError> {
        match self.describe_table().table_name(&table.name).send().await {
            Ok(_) => Ok(true),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception()) =>
            {
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn create_table(&self, table: &TableConfig) -> Result<(), SessionError> {
        let attribute = AttributeDefinition::builder()
            .attribute_name(&table.hash_key)
            .attribute_type(ScalarAttributeType::S)
            .build()
            .map_err(SessionError::dynamo)?;
        let key_schema = KeySchemaElement::builder()
            .attribute_name(&table.hash_key)
            .key_type(KeyType::Hash)
            .build()
            .map_err(SessionError::dynamo)?;
        let throughput = ProvisionedThroughput::builder()
            .read_capacity_units(table.read_capacity_units)
            .write_capacity_units(table.write_capacity_units)
            .build()
            .map_err(SessionError::dynamo)?;

        self.create_table()
            .table_name(&table.name)
            .attribute_definitions(attribute)
            .key_schema(key_schema)
            .provisioned_throughput(throughput)
            .send()
            .await?;
        Ok(())
    }

    async fn get_item(
        &self,
        table: &TableConfig,
        key: &str,
    ) -> Result<Option<StoredSession>, SessionError> {
        let output = self
            .get_item()
            .table_name(&table.name)
            .key(&table.hash_key, key_attribute(key))
            .consistent_read(true)
            .send()
            .await?;

        output
            .item()
            .map(|item| stored_session_from_item(table, item))
            .transpose()
    }

    async fn update_item(
        &self,
        table: &TableConfig,
        key: &str,
        update: ItemUpdate,
    ) -> Result<(), SessionError> {
        let request = self
            .update_item()
            .table_name(&table.name)
            .key(&table.hash_key, key_attribute(key))
            .expression_attribute_names("#data", &table.data_attribute)
            .expression_attribute_names("#expires", EXPIRES_ATTRIBUTE);

        let request = match update {
            ItemUpdate::Replace { data, expires } => request
                .update_expression("SET #data = :data, #expires = :expires")
                .expression_attribute_values(":data", value_to_attribute(&data))
                .expression_attribute_values(":expires", number(expires)),
            ItemUpdate::Refresh { updated, expires } => request
                .update_expression("SET #expires = :expires, #data.#updated = :updated")
                .expression_attribute_names("#updated", UPDATED_FIELD)
                .expression_attribute_values(":updated", number(updated))
                .expression_attribute_values(":expires", number(expires)),
        };

        request.send().await?;
        Ok(())
    }

    async fn delete_item(&self, table: &TableConfig, key: &str) -> Result<(), SessionError> {
        self.delete_item()
            .table_name(&table.name)
            .key(&table.hash_key, key_attribute(key))
            .send()
            .await?;
        Ok(())
    }

    async fn scan_expired(
        &self,
        table: &TableConfig,
        now_secs: i64,
    ) -> Result<Vec<String>, SessionError> {
        let expired = "(attribute_not_exists(#expires) OR #expires <= :now)";
        let filter = if table.hash_prefix.is_empty() {
            expired.to_string()
        } else {
            format!("begins_with(#key, :prefix) AND {}", expired)
        };

        let mut keys = Vec::new();
        let mut start_key = None;
        loop {
            let mut request = self
                .scan()
                .table_name(&table.name)
                .projection_expression("#key")
                .filter_expression(&filter)
                .expression_attribute_names("#key", &table.hash_key)
                .expression_attribute_names("#expires", EXPIRES_ATTRIBUTE)
                .expression_attribute_values(":now", number(now_secs))
                .set_exclusive_start_key(start_key.take());
            if !table.hash_prefix.is_empty() {
                request = request
                    .expression_attribute_values(":prefix", key_attribute(&table.hash_prefix));
            }

            let output = request.send().await?;
            keys.extend(
                output
                    .items()
                    .iter()
                    .filter_map(|item| item.get(&table.hash_key))
                    .filter_map(|value| value.as_s().ok())
                    .cloned(),
            );

            match output.last_evaluated_key() {
                Some(last) if !last.is_empty() => start_key = Some(last.clone()),
                _ => break,
            }
        }
        Ok(keys)
    }
}
