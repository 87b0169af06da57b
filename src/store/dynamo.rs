//! DynamoDB item store.
//!
//! Table schema (single table, no sort key):
//! - `id`: partition key (String)
//! - `name`, `description`: String
//! - `createdAt`, `updatedAt`: RFC 3339 timestamps (String)

use async_trait::async_trait;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue, ReturnValuesOnConditionCheckFailure};
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use super::{ItemStore, Result, StoreError};
use crate::model::{Item, ItemPatch};

type Record = HashMap<String, AttributeValue>;

/// Update only existing items, and never move `updatedAt` before `createdAt`.
/// Timestamps are fixed-width UTC strings, so string order is time order.
const UPDATE_CONDITION: &str = "attribute_exists(id) AND createdAt <= :updatedAt";

/// Result of one conditional update attempt
#[derive(Debug, PartialEq, Eq)]
enum UpdateOutcome {
    Applied(Option<Item>),
    Missing,
    /// The writer's clock is behind the item's creation time
    Skewed(DateTime<Utc>),
}

/// DynamoDB implementation of [`ItemStore`]
pub struct DynamoStore {
    client: Client,
    table_name: String,
}

impl DynamoStore {
    /// Connect using the default AWS credential chain.
    ///
    /// `endpoint_url` points the client at a local DynamoDB for development.
    pub async fn new(table_name: impl Into<String>, endpoint_url: Option<&str>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

        let client = if let Some(endpoint) = endpoint_url {
            let dynamo_config = aws_sdk_dynamodb::config::Builder::from(&config)
                .endpoint_url(endpoint)
                .build();
            Client::from_conf(dynamo_config)
        } else {
            Client::new(&config)
        };

        let table_name = table_name.into();
        info!(table = %table_name, "Connected to DynamoDB for items");

        Self::with_client(client, table_name)
    }

    pub const fn with_client(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }
}

fn timestamp(at: DateTime<Utc>) -> AttributeValue {
    AttributeValue::S(at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn to_record(item: &Item) -> Record {
    let mut record = HashMap::new();
    record.insert("id".to_string(), AttributeValue::S(item.id.clone()));
    record.insert("name".to_string(), AttributeValue::S(item.name.clone()));
    record.insert(
        "description".to_string(),
        AttributeValue::S(item.description.clone()),
    );
    record.insert("createdAt".to_string(), timestamp(item.created_at));
    record.insert("updatedAt".to_string(), timestamp(item.updated_at));
    record
}

fn string_attr<'a>(record: &'a Record, key: &str) -> Result<&'a str> {
    match record.get(key) {
        Some(AttributeValue::S(value)) => Ok(value),
        Some(_) => Err(StoreError::Malformed(format!("attribute {key} is not a string"))),
        None => Err(StoreError::Malformed(format!("missing attribute {key}"))),
    }
}

fn time_attr(record: &Record, key: &str) -> Result<DateTime<Utc>> {
    let raw = string_attr(record, key)?;
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Malformed(format!("attribute {key}: {e}")))
}

fn from_record(record: &Record) -> Result<Item> {
    Ok(Item {
        id: string_attr(record, "id")?.to_string(),
        name: string_attr(record, "name")?.to_string(),
        description: string_attr(record, "description")?.to_string(),
        created_at: time_attr(record, "createdAt")?,
        updated_at: time_attr(record, "updatedAt")?,
    })
}

/// Build the `SET` expression for a partial update
fn update_expression(patch: &ItemPatch, now: DateTime<Utc>) -> (String, Record) {
    let mut clauses = vec!["updatedAt = :updatedAt"];
    let mut values = HashMap::new();
    values.insert(":updatedAt".to_string(), timestamp(now));

    if let Some(name) = &patch.name {
        clauses.push("#name = :name");
        values.insert(":name".to_string(), AttributeValue::S(name.clone()));
    }
    if let Some(description) = &patch.description {
        clauses.push("description = :description");
        values.insert(
            ":description".to_string(),
            AttributeValue::S(description.clone()),
        );
    }

    (format!("SET {}", clauses.join(", ")), values)
}

/// Classify a failed update condition from the old item DynamoDB returns
fn rejected_update(current: Option<&Record>) -> Result<UpdateOutcome> {
    match current {
        Some(record) => Ok(UpdateOutcome::Skewed(time_attr(record, "createdAt")?)),
        None => Ok(UpdateOutcome::Missing),
    }
}

impl DynamoStore {
    async fn try_update(
        &self,
        id: &str,
        patch: &ItemPatch,
        now: DateTime<Utc>,
    ) -> Result<UpdateOutcome> {
        let (expression, values) = update_expression(patch, now);

        let mut request = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .update_expression(expression)
            .set_expression_attribute_values(Some(values))
            .condition_expression(UPDATE_CONDITION)
            .return_values(ReturnValue::AllNew)
            .return_values_on_condition_check_failure(ReturnValuesOnConditionCheckFailure::AllOld);
        // `name` is a DynamoDB reserved word
        if patch.name.is_some() {
            request = request.expression_attribute_names("#name", "name");
        }

        match request.send().await {
            Ok(output) => Ok(UpdateOutcome::Applied(
                output.attributes.as_ref().map(from_record).transpose()?,
            )),
            Err(e) => {
                if let Some(UpdateItemError::ConditionalCheckFailedException(rejected)) =
                    e.as_service_error()
                {
                    return rejected_update(rejected.item());
                }
                Err(StoreError::Backend(format!(
                    "DynamoDB update_item failed: {e}"
                )))
            }
        }
    }
}

#[async_trait]
impl ItemStore for DynamoStore {
    fn backend(&self) -> &'static str {
        "dynamodb"
    }

    fn table_name(&self) -> Option<&str> {
        Some(&self.table_name)
    }

    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }

    async fn get(&self, id: &str) -> Result<Option<Item>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("DynamoDB get_item failed: {e}")))?;

        result.item.as_ref().map(from_record).transpose()
    }

    async fn list(&self) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        let mut start_key: Option<Record> = None;

        loop {
            let page = self
                .client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| StoreError::Backend(format!("DynamoDB scan failed: {e}")))?;

            for record in page.items.unwrap_or_default() {
                items.push(from_record(&record)?);
            }

            match page.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        debug!(table = %self.table_name, count = items.len(), "Scanned items");
        Ok(items)
    }

    async fn put(&self, item: &Item) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(to_record(item)))
            .condition_expression("attribute_not_exists(id)")
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception())
                {
                    StoreError::Conflict(item.id.clone())
                } else {
                    StoreError::Backend(format!("DynamoDB put_item failed: {e}"))
                }
            })?;

        debug!(id = %item.id, "Stored item in DynamoDB");
        Ok(())
    }

    async fn update(
        &self,
        id: &str,
        patch: &ItemPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Item>> {
        match self.try_update(id, patch, now).await? {
            UpdateOutcome::Applied(item) => Ok(item),
            UpdateOutcome::Missing => Ok(None),
            UpdateOutcome::Skewed(created_at) => {
                debug!(id, "Clock behind createdAt, retrying update at createdAt");
                match self.try_update(id, patch, created_at).await? {
                    UpdateOutcome::Applied(item) => Ok(item),
                    UpdateOutcome::Missing | UpdateOutcome::Skewed(_) => Ok(None),
                }
            }
        }
    }

    async fn delete(&self, id: &str) -> Result<Option<Item>> {
        let output = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("DynamoDB delete_item failed: {e}")))?;

        output.attributes.as_ref().map(from_record).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Item {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        Item::new("abc".into(), "A".into(), "B".into(), at)
    }

    #[test]
    fn test_record_conversion_preserves_fields() {
        let item = sample();
        let record = to_record(&item);
        assert_eq!(
            record.get("createdAt"),
            Some(&AttributeValue::S("2023-11-14T22:13:20.123Z".into()))
        );
        assert_eq!(from_record(&record).unwrap(), item);
    }

    #[test]
    fn test_from_record_rejects_missing_or_mistyped_attributes() {
        let mut record = to_record(&sample());
        record.remove("name");
        assert!(matches!(from_record(&record), Err(StoreError::Malformed(_))));

        let mut record = to_record(&sample());
        record.insert("createdAt".into(), AttributeValue::N("1".into()));
        assert!(matches!(from_record(&record), Err(StoreError::Malformed(_))));
    }

    #[test]
    fn test_update_expression_only_sets_supplied_fields() {
        let now = Utc.timestamp_millis_opt(0).unwrap();
        let patch = ItemPatch {
            name: None,
            description: Some("d".into()),
        };
        let (expression, values) = update_expression(&patch, now);
        assert_eq!(expression, "SET updatedAt = :updatedAt, description = :description");
        assert!(values.contains_key(":description"));
        assert!(!values.contains_key(":name"));
    }

    #[test]
    fn test_skewed_update_retries_at_created_at() {
        let item = sample();
        let behind = item.created_at - chrono::Duration::seconds(5);

        // The condition compares the stored createdAt string with :updatedAt
        assert!(UPDATE_CONDITION.contains("createdAt <= :updatedAt"));
        let record = to_record(&item);
        let (_, values) = update_expression(&ItemPatch::default(), behind);
        let (AttributeValue::S(written), AttributeValue::S(created)) =
            (&values[":updatedAt"], &record["createdAt"])
        else {
            panic!("timestamps are strings");
        };
        assert!(written < created);

        // A rejected write that returned the old item is retried at its createdAt
        let outcome = rejected_update(Some(&record)).unwrap();
        assert_eq!(outcome, UpdateOutcome::Skewed(item.created_at));
        let (_, values) = update_expression(&ItemPatch::default(), item.created_at);
        assert_eq!(values[":updatedAt"], record["createdAt"]);
    }

    #[test]
    fn test_rejected_update_without_item_is_missing() {
        assert_eq!(rejected_update(None).unwrap(), UpdateOutcome::Missing);
    }
}
