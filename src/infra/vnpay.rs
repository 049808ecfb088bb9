//! VNPay payment gateway client.
//!
//! Outbound: a checkout URL whose sorted, form-encoded query string is
//! signed with HMAC-SHA512 over the merchant secret. Inbound: the return
//! callback is re-signed the same way and compared in constant time.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use ring::hmac;
use url::form_urlencoded::byte_serialize;
use uuid::Uuid;

use crate::config::{
    VnPaySettings, VNPAY_AMOUNT_MULTIPLIER, VNPAY_COMMAND, VNPAY_CURRENCY, VNPAY_EXPIRE_MINUTES,
    VNPAY_LOCALE, VNPAY_ORDER_TYPE, VNPAY_SUCCESS_CODE, VNPAY_UTC_OFFSET_SECONDS, VNPAY_VERSION,
};
use crate::domain::VnPaymentResponse;
use crate::errors::{AppError, AppResult};

const SECURE_HASH: &str = "vnp_SecureHash";
const SECURE_HASH_TYPE: &str = "vnp_SecureHashType";
const PAYMENT_METHOD: &str = "VnPay";

/// One checkout request
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// Sent as `vnp_TxnRef` and echoed back in the callback
    pub transaction_id: Uuid,
    /// VND
    pub amount: i64,
    pub description: String,
    pub client_ip: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct VnPayClient {
    settings: VnPaySettings,
    key: hmac::Key,
}

impl VnPayClient {
    pub fn new(settings: VnPaySettings) -> Self {
        let key = hmac::Key::new(hmac::HMAC_SHA512, settings.hash_secret().as_bytes());
        Self { settings, key }
    }

    /// Hex HMAC-SHA512 of `data`.
    pub fn sign(&self, data: &str) -> String {
        hex::encode(hmac::sign(&self.key, data.as_bytes()).as_ref())
    }

    /// Signed checkout URL for `request`.
    ///
    /// # Errors
    /// `BadRequest` when the amount does not fit the gateway's minor-unit
    /// field.
    pub fn payment_url(&self, request: &PaymentRequest) -> AppResult<String> {
        let gateway_amount = request
            .amount
            .checked_mul(VNPAY_AMOUNT_MULTIPLIER)
            .filter(|amount| *amount > 0)
            .ok_or_else(|| AppError::bad_request("Amount is out of range"))?;
        let expires_at = request.created_at + Duration::minutes(VNPAY_EXPIRE_MINUTES);

        let mut params = BTreeMap::new();
        params.insert("vnp_Version", VNPAY_VERSION.to_string());
        params.insert("vnp_Command", VNPAY_COMMAND.to_string());
        params.insert("vnp_TmnCode", self.settings.tmn_code.clone());
        params.insert("vnp_Amount", gateway_amount.to_string());
        params.insert("vnp_CreateDate", gateway_time(request.created_at));
        params.insert("vnp_ExpireDate", gateway_time(expires_at));
        params.insert("vnp_CurrCode", VNPAY_CURRENCY.to_string());
        params.insert("vnp_IpAddr", request.client_ip.clone());
        params.insert("vnp_Locale", VNPAY_LOCALE.to_string());
        params.insert("vnp_OrderInfo", request.description.clone());
        params.insert("vnp_OrderType", VNPAY_ORDER_TYPE.to_string());
        params.insert("vnp_ReturnUrl", self.settings.return_url.clone());
        params.insert("vnp_TxnRef", request.transaction_id.to_string());

        let query = query_string(&params);
        let signature = self.sign(&query);
        Ok(format!(
            "{}?{}&{}={}",
            self.settings.base_url, query, SECURE_HASH, signature
        ))
    }

    /// Check the signature of a return callback and read its fields.
    ///
    /// # Errors
    /// `BadRequest` when the signature is missing or wrong, or a required
    /// field is missing or malformed.
    pub fn parse_callback(&self, params: &HashMap<String, String>) -> AppResult<VnPaymentResponse> {
        let provided = params
            .get(SECURE_HASH)
            .ok_or_else(|| AppError::bad_request("Missing payment signature"))?;

        let signed: BTreeMap<&str, String> = params
            .iter()
            .filter(|(key, value)| {
                key.starts_with("vnp_")
                    && key.as_str() != SECURE_HASH
                    && key.as_str() != SECURE_HASH_TYPE
                    && !value.is_empty()
            })
            .map(|(key, value)| (key.as_str(), value.clone()))
            .collect();

        let signature = hex::decode(provided.trim().to_ascii_lowercase())
            .map_err(|_| AppError::bad_request("Invalid payment signature"))?;
        hmac::verify(&self.key, query_string(&signed).as_bytes(), &signature).map_err(|_| {
            tracing::warn!("VNPay callback failed signature check");
            AppError::bad_request("Invalid payment signature")
        })?;

        let field = |name: &str| params.get(name).cloned().unwrap_or_default();
        let amount = field("vnp_Amount")
            .parse::<i64>()
            .map_err(|_| AppError::bad_request("Invalid vnp_Amount"))?
            / VNPAY_AMOUNT_MULTIPLIER;
        let response_code = field("vnp_ResponseCode");

        Ok(VnPaymentResponse {
            success: response_code == VNPAY_SUCCESS_CODE,
            payment_method: PAYMENT_METHOD.to_string(),
            order_description: field("vnp_OrderInfo"),
            transaction_ref: field("vnp_TxnRef"),
            gateway_transaction_no: field("vnp_TransactionNo"),
            response_code,
            amount,
        })
    }
}

/// `yyyyMMddHHmmss` in Vietnam time (UTC+7).
fn gateway_time(at: DateTime<Utc>) -> String {
    (at + Duration::seconds(i64::from(VNPAY_UTC_OFFSET_SECONDS)))
        .format("%Y%m%d%H%M%S")
        .to_string()
}

fn encode(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

/// `key=value&...` in key order, form-encoded.
fn query_string<K: AsRef<str>>(params: &BTreeMap<K, String>) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", encode(key.as_ref()), encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}
