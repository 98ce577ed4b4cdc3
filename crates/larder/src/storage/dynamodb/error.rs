//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to [`StoreError`], keeping conditional-check failures
//! distinct so callers can translate them into their own semantics.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;

use crate::storage::store::StoreError;

/// Map a GetItem SDK error to StoreError.
pub fn map_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<GetItemError, R>,
) -> StoreError {
    match err.into_service_error() {
        GetItemError::ProvisionedThroughputExceededException(_) => {
            StoreError::Other("throughput exceeded, please retry".to_string())
        }
        GetItemError::RequestLimitExceeded(_) => {
            StoreError::Other("request limit exceeded, please retry".to_string())
        }
        err => StoreError::Other(format!("GetItem failed: {err:?}")),
    }
}

/// Map a PutItem SDK error to StoreError.
pub fn map_put_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<PutItemError, R>,
) -> StoreError {
    match err.into_service_error() {
        PutItemError::ConditionalCheckFailedException(_) => StoreError::ConditionFailed,
        PutItemError::ProvisionedThroughputExceededException(_) => {
            StoreError::Other("throughput exceeded, please retry".to_string())
        }
        PutItemError::RequestLimitExceeded(_) => {
            StoreError::Other("request limit exceeded, please retry".to_string())
        }
        PutItemError::TransactionConflictException(_) => {
            StoreError::Other("transaction conflict, please retry".to_string())
        }
        err => StoreError::Other(format!("PutItem failed: {err:?}")),
    }
}

/// Map an UpdateItem SDK error to StoreError.
pub fn map_update_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<UpdateItemError, R>,
) -> StoreError {
    match err.into_service_error() {
        UpdateItemError::ConditionalCheckFailedException(_) => StoreError::ConditionFailed,
        UpdateItemError::ProvisionedThroughputExceededException(_) => {
            StoreError::Other("throughput exceeded, please retry".to_string())
        }
        UpdateItemError::RequestLimitExceeded(_) => {
            StoreError::Other("request limit exceeded, please retry".to_string())
        }
        UpdateItemError::TransactionConflictException(_) => {
            StoreError::Other("transaction conflict, please retry".to_string())
        }
        err => StoreError::Other(format!("UpdateItem failed: {err:?}")),
    }
}

/// Map a DeleteItem SDK error to StoreError.
pub fn map_delete_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DeleteItemError, R>,
) -> StoreError {
    match err.into_service_error() {
        DeleteItemError::ConditionalCheckFailedException(_) => StoreError::ConditionFailed,
        DeleteItemError::ProvisionedThroughputExceededException(_) => {
            StoreError::Other("throughput exceeded, please retry".to_string())
        }
        DeleteItemError::RequestLimitExceeded(_) => {
            StoreError::Other("request limit exceeded, please retry".to_string())
        }
        err => StoreError::Other(format!("DeleteItem failed: {err:?}")),
    }
}

/// Map a Query SDK error to StoreError.
pub fn map_query_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<QueryError, R>,
) -> StoreError {
    match err.into_service_error() {
        QueryError::ResourceNotFoundException(_) => StoreError::Other("table not found".to_string()),
        QueryError::ProvisionedThroughputExceededException(_) => {
            StoreError::Other("throughput exceeded, please retry".to_string())
        }
        QueryError::RequestLimitExceeded(_) => {
            StoreError::Other("request limit exceeded, please retry".to_string())
        }
        err => StoreError::Other(format!("Query failed: {err:?}")),
    }
}
