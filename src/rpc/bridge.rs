use super::stack::StackItem;
use crate::error::{ensure_non_empty, ContractCallError, CoreError, TransportFailure};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Argument passed to a contract method, serialized as `{ "type", "value" }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum ContractParam {
    String(String),
    /// Decimal text, so values beyond i64 survive the trip.
    Integer(String),
    Boolean(bool),
    Hash160(String),
    /// Base64 payload.
    ByteArray(String),
    Array(Vec<ContractParam>),
}

impl ContractParam {
    pub fn integer(value: i64) -> Self {
        ContractParam::Integer(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signer {
    pub account: String,
    pub scopes: String,
}

/// `result` of an `invokefunction` call, with the stack left as raw nodes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InvokeResult {
    #[serde(default)]
    pub script: Option<String>,
    pub state: String,
    #[serde(rename = "gasconsumed", default)]
    pub gas_consumed: String,
    #[serde(default)]
    pub exception: Option<String>,
    #[serde(default)]
    pub stack: Vec<Value>,
}

impl InvokeResult {
    /// The VM halts normally with state `HALT`; anything else carries an exception.
    pub fn ensure_halted(&self, method: &str) -> Result<(), CoreError> {
        if self.state == "HALT" {
            return Ok(());
        }
        Err(CoreError::UpstreamError(format!(
            "'{}' ended in state {}: {}",
            method,
            self.state,
            self.exception.as_deref().unwrap_or("no exception reported")
        )))
    }

    pub fn stack_items(&self) -> Result<Vec<StackItem>, CoreError> {
        StackItem::parse_stack(&self.stack)
    }
}

#[async_trait]
pub trait ContractInvoker: Send + Sync {
    async fn invoke(
        &self,
        method: &str,
        params: &[ContractParam],
    ) -> Result<InvokeResult, ContractCallError>;
}

/// JSON-RPC client for one contract on one NEO node.
pub struct RpcBridge {
    client: reqwest::Client,
    rpc_url: String,
    script_hash: String,
    signers: Vec<Signer>,
    next_id: AtomicU64,
}

impl RpcBridge {
    pub fn new(client: reqwest::Client, rpc_url: String, script_hash: String) -> Self {
        Self {
            client,
            rpc_url,
            script_hash,
            signers: Vec::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn with_signers(mut self, signers: Vec<Signer>) -> Self {
        self.signers = signers;
        self
    }

    fn transport_failure(&self, method: &str, reason: String) -> ContractCallError {
        warn!("[rpc] {} on {} failed: {}", method, self.rpc_url, reason);
        ContractCallError::Transport(TransportFailure {
            method: method.to_string(),
            reason,
        })
    }
}

#[async_trait]
impl ContractInvoker for RpcBridge {
    async fn invoke(
        &self,
        method: &str,
        params: &[ContractParam],
    ) -> Result<InvokeResult, ContractCallError> {
        ensure_non_empty("contract method", method)?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = invoke_request(id, &self.script_hash, method, params, &self.signers);
        debug!("[rpc] invokefunction {} (id {})", method, id);

        let resp = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_failure(method, format!("request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(self.transport_failure(method, format!("HTTP {}: {}", status, body)));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| self.transport_failure(method, format!("unreadable body: {}", e)))?;

        parse_invoke_response(body).map_err(|reason| self.transport_failure(method, reason))
    }
}

pub fn invoke_request(
    id: u64,
    script_hash: &str,
    method: &str,
    params: &[ContractParam],
    signers: &[Signer],
) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "invokefunction",
        "params": [script_hash, method, params, signers],
    })
}

/// Pull `result` out of a JSON-RPC reply. The error string describes why
/// there is no usable result.
pub fn parse_invoke_response(body: Value) -> Result<InvokeResult, String> {
    if let Some(error) = body.get("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(format!("rpc error {}: {}", code, message));
    }
    let result = body
        .get("result")
        .cloned()
        .ok_or_else(|| "reply has neither result nor error".to_string())?;
    serde_json::from_value(result).map_err(|e| format!("unexpected result shape: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_invokefunction_request() {
        let params = vec![
            ContractParam::integer(7),
            ContractParam::Array(vec![ContractParam::String("a".to_string())]),
        ];
        let signers = vec![Signer {
            account: "0xabc".to_string(),
            scopes: "CalledByEntry".to_string(),
        }];
        let request = invoke_request(3, "0x1234", "getDao", &params, &signers);
        assert_eq!(
            request,
            json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "invokefunction",
                "params": [
                    "0x1234",
                    "getDao",
                    [
                        { "type": "Integer", "value": "7" },
                        { "type": "Array", "value": [{ "type": "String", "value": "a" }] }
                    ],
                    [{ "account": "0xabc", "scopes": "CalledByEntry" }]
                ]
            })
        );
    }

    #[test]
    fn parses_result_and_stack() {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "script": "wh8MBGxpc3Q=",
                "state": "HALT",
                "gasconsumed": "1007390",
                "exception": null,
                "stack": [{ "type": "Integer", "value": "1" }]
            }
        });
        let result = parse_invoke_response(body).unwrap();
        assert_eq!(result.gas_consumed, "1007390");
        assert!(result.ensure_halted("listDaos").is_ok());
        assert_eq!(result.stack_items().unwrap(), vec![StackItem::Integer("1".to_string())]);
    }

    #[test]
    fn rpc_error_object_is_reported() {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32601, "message": "Method not found" }
        });
        let reason = parse_invoke_response(body).unwrap_err();
        assert!(reason.contains("-32601") && reason.contains("Method not found"));
        assert!(parse_invoke_response(json!({ "jsonrpc": "2.0", "id": 1 })).is_err());
    }

    #[test]
    fn fault_state_is_upstream_error() {
        let result = parse_invoke_response(json!({
            "result": { "state": "FAULT", "gasconsumed": "0", "exception": "ABORT", "stack": [] }
        }))
        .unwrap();
        match result.ensure_halted("getDao") {
            Err(CoreError::UpstreamError(msg)) => assert!(msg.contains("ABORT")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_method_is_rejected_before_io() {
        let bridge = RpcBridge::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1".to_string(),
            "0x00".to_string(),
        );
        let err = bridge.invoke("", &[]).await.unwrap_err();
        assert!(matches!(err, ContractCallError::Core(CoreError::InvalidArgument(_))));
    }
}
