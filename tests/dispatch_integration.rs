//! End-to-end dispatch against a stub upstream API.

mod common;

use std::sync::Arc;

use serde_json::json;

use api_gateway_mcp::domains::tools::{
    ContentBlock, Dispatcher, ErrorCategory, InvocationRequest, InvocationResult,
};
use common::{context, object, registry, spawn_upstream};

fn dispatcher() -> Dispatcher {
    Dispatcher::new(Arc::new(registry()))
}

#[tokio::test]
async fn get_user_returns_upstream_json() {
    let (url, upstream) = spawn_upstream().await;
    let context = context(&url, 5);

    let result = dispatcher()
        .dispatch(
            &context,
            InvocationRequest::new("get_user", object(json!({"user_id": "42"}))),
        )
        .await;

    assert_eq!(
        result,
        InvocationResult::Success(vec![ContentBlock::text(r#"{"name":"Ada"}"#)])
    );
    assert_eq!(upstream.hits(), 1);
}

#[tokio::test]
async fn invalid_arguments_make_no_outbound_call() {
    let (url, upstream) = spawn_upstream().await;
    let context = context(&url, 5);

    let result = dispatcher()
        .dispatch(&context, InvocationRequest::new("get_user", object(json!({}))))
        .await;

    match result {
        InvocationResult::Failure { category, message } => {
            assert_eq!(category, ErrorCategory::InvalidArgument);
            assert!(message.contains("user_id: field required"), "{message}");
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(upstream.hits(), 0);
}

#[tokio::test]
async fn oversized_limit_is_reported_against_its_field() {
    let (url, upstream) = spawn_upstream().await;
    let context = context(&url, 5);

    let result = dispatcher()
        .dispatch(
            &context,
            InvocationRequest::new(
                "search",
                object(json!({"query": "x", "limit": 5_000_000_000u64})),
            ),
        )
        .await;

    assert_eq!(
        result,
        InvocationResult::failure(
            ErrorCategory::InvalidArgument,
            "invalid input (1 errors) - limit: must be at most 4294967295, got 5000000000"
        )
    );
    assert_eq!(upstream.hits(), 0);
}

#[tokio::test]
async fn upstream_error_status_is_reported() {
    let (url, upstream) = spawn_upstream().await;
    let context = context(&url, 5);

    let result = dispatcher()
        .dispatch(
            &context,
            InvocationRequest::new("search", object(json!({"query": "x"}))),
        )
        .await;

    assert_eq!(
        result,
        InvocationResult::failure(ErrorCategory::UpstreamError, "503: request failed")
    );
    assert_eq!(upstream.hits(), 1);
}

#[tokio::test]
async fn upstream_not_found_is_upstream_error() {
    let (url, _upstream) = spawn_upstream().await;
    let context = context(&url, 5);

    let result = dispatcher()
        .dispatch(
            &context,
            InvocationRequest::new("get_user", object(json!({"user_id": "7"}))),
        )
        .await;

    assert_eq!(
        result,
        InvocationResult::failure(ErrorCategory::UpstreamError, "404: request failed")
    );
}

#[tokio::test]
async fn unknown_tool_is_not_found() {
    let (url, upstream) = spawn_upstream().await;
    let context = context(&url, 5);

    let result = dispatcher()
        .dispatch(&context, InvocationRequest::new("unknown_tool", object(json!({}))))
        .await;

    assert_eq!(
        result,
        InvocationResult::failure(ErrorCategory::NotFound, "unknown tool 'unknown_tool'")
    );
    assert_eq!(upstream.hits(), 0);
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let (url, _upstream) = spawn_upstream().await;
    let context = context(&url, 1);

    let result = dispatcher()
        .dispatch(&context, InvocationRequest::new("slow", object(json!({}))))
        .await;

    assert_eq!(
        result,
        InvocationResult::failure(ErrorCategory::UpstreamError, "request timed out")
    );
}

#[tokio::test]
async fn unreachable_upstream_is_internal() {
    // Nothing listens on the discard port.
    let context = context("http://127.0.0.1:9", 5);

    let result = dispatcher()
        .dispatch(
            &context,
            InvocationRequest::new("search", object(json!({"query": "x"}))),
        )
        .await;

    assert_eq!(
        result,
        InvocationResult::failure(
            ErrorCategory::Internal,
            "internal error while running tool 'search'"
        )
    );
}
