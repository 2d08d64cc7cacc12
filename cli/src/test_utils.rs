use {
    base64::{prelude::BASE64_STANDARD, Engine},
    serde_json::{json, Value},
    solana_pubkey::Pubkey,
};

/// `UiAccount` JSON as returned by the RPC node for base64 encoding.
pub fn ui_account_json(owner: &Pubkey, data: &[u8]) -> Value {
    json!({
        "lamports": 2_039_280,
        "data": [BASE64_STANDARD.encode(data), "base64"],
        "owner": owner.to_string(),
        "executable": false,
        "rentEpoch": 0,
        "space": data.len(),
    })
}

pub fn rpc_response(value: Value) -> Value {
    json!({"context": {"slot": 1}, "value": value})
}
