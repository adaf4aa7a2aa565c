//! Most of the structs in `web` module and their implementations live here.
//! Includes structs that need to be validated, their parsing implementations and tests for those

use lazy_regex::regex_is_match;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum_macros::AsRefStr;

// ###################################
// ->   STRUCTS
// ###################################
/// Deserializable Subscription
/// A subscription request that can be Deserialized but can have missing or invalid fields
#[derive(Debug, Default, Deserialize)]
pub struct DeserSubscription {
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub subscription_type: Option<String>,
}

impl DeserSubscription {
    pub fn new(
        email: Option<String>,
        phone_number: Option<String>,
        subscription_type: Option<String>,
    ) -> Self {
        Self {
            email,
            phone_number,
            subscription_type,
        }
    }
}

/// Validated Subscription
/// At least one of `email` and `phone_number` is present and every present field is valid.
#[derive(Debug, Clone)]
pub struct ValidSubscription {
    pub email: Option<ValidEmail>,
    pub phone_number: Option<ValidPhone>,
    pub subscription_type: SubscriptionType,
}

impl TryFrom<DeserSubscription> for ValidSubscription {
    type Error = DataParsingError;

    /// Checks run in a fixed order and the first failing one wins.
    fn try_from(deser_sub: DeserSubscription) -> Result<Self, Self::Error> {
        let email = non_empty(deser_sub.email);
        let phone_number = non_empty(deser_sub.phone_number);

        if email.is_none() && phone_number.is_none() {
            return Err(DataParsingError::ContactMissing);
        }

        let subscription_type = deser_sub
            .subscription_type
            .as_deref()
            .ok_or(DataParsingError::SubscriptionTypeInvalid)
            .and_then(SubscriptionType::try_from)?;

        Ok(ValidSubscription {
            email: email.map(ValidEmail::parse).transpose()?,
            phone_number: phone_number.map(ValidPhone::parse).transpose()?,
            subscription_type,
        })
    }
}

impl ValidSubscription {
    /// The row handed to the store. A new subscription is always active.
    pub fn to_record(&self) -> NewSubscription<'_> {
        NewSubscription {
            email: self.email.as_ref().map(AsRef::as_ref),
            phone_number: self.phone_number.as_ref().map(AsRef::as_ref),
            subscription_type: self.subscription_type,
            is_active: true,
        }
    }
}

/// Empty strings count as a missing field.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// The channel(s) a subscriber wants to be reached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionType {
    Email,
    Sms,
    Both,
}

impl TryFrom<&str> for SubscriptionType {
    type Error = DataParsingError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "email" => Ok(Self::Email),
            "sms" => Ok(Self::Sms),
            "both" => Ok(Self::Both),
            _ => Err(DataParsingError::SubscriptionTypeInvalid),
        }
    }
}

/// Validated Subscriber Email
#[derive(Debug, Clone)]
pub struct ValidEmail(String);

impl AsRef<str> for ValidEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl ValidEmail {
    pub fn parse<S>(value: S) -> Result<Self, DataParsingError>
    where
        S: AsRef<str>,
    {
        let value = value.as_ref();

        if regex_is_match!(r"^[^\s@]+@[^\s@]+\.[^\s@]+$", value) {
            Ok(ValidEmail(value.to_owned()))
        } else {
            Err(DataParsingError::EmailInvalid)
        }
    }
}

/// Validated Subscriber Phone Number
/// Only checks the character set: an optional leading `+`, digits, whitespace, parentheses and dashes.
#[derive(Debug, Clone)]
pub struct ValidPhone(String);

impl AsRef<str> for ValidPhone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl ValidPhone {
    pub fn parse<S>(value: S) -> Result<Self, DataParsingError>
    where
        S: AsRef<str>,
    {
        let value = value.as_ref();

        if regex_is_match!(r"^\+?[0-9\s()-]+$", value) {
            Ok(ValidPhone(value.to_owned()))
        } else {
            Err(DataParsingError::PhoneInvalid)
        }
    }
}

/// The record inserted into the store. Absent contact fields are left out of the payload.
#[derive(Debug, Serialize)]
pub struct NewSubscription<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<&'a str>,
    pub subscription_type: SubscriptionType,
    pub is_active: bool,
}

/// A row as the store returned it.
/// Columns other than the known ones (`id`, `created_at`, ...) are kept in `extra` and echoed back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub subscription_type: String,
    pub is_active: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of a successful `POST /subscribe`.
#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub success: bool,
    pub message: &'static str,
    pub data: Vec<SubscriptionRecord>,
}

impl SubscribeResponse {
    pub fn subscribed(data: Vec<SubscriptionRecord>) -> Self {
        Self {
            success: true,
            message: "Successfully subscribed",
            data,
        }
    }
}

// ###################################
// ->   ERROR
// ###################################
/// The `Display` output of every variant is sent to the client as is.
#[derive(Debug, thiserror::Error)]
pub enum DataParsingError {
    #[error("Email or phone number is required")]
    ContactMissing,
    #[error("Invalid subscription type")]
    SubscriptionTypeInvalid,
    #[error("Invalid email format")]
    EmailInvalid,
    #[error("Invalid phone number format")]
    PhoneInvalid,
}
