use serde::Deserialize;
use serde_aux::prelude::*;

/// `GET /api/v2/listings/collection/{slug}/all`
#[derive(Debug, Deserialize)]
pub struct ListingsResponse {
    pub listings: Vec<ListingItem>,
    // Cursor of the following page. Only the first page is consulted.
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListingItem {
    pub protocol_data: ProtocolData,
    pub price: ListingPrice,
}

#[derive(Debug, Deserialize)]
pub struct ProtocolData {
    pub parameters: OrderParameters,
}

#[derive(Debug, Deserialize)]
pub struct OrderParameters {
    pub offer: Vec<OfferItem>,
    #[serde(rename = "endTime", deserialize_with = "deserialize_number_from_string")]
    pub end_time: u64,
}

#[derive(Debug, Deserialize)]
pub struct OfferItem {
    #[serde(rename = "identifierOrCriteria", deserialize_with = "deserialize_string_from_number")]
    pub identifier_or_criteria: String,
}

#[derive(Debug, Deserialize)]
pub struct ListingPrice {
    pub current: CurrentPrice,
}

#[derive(Debug, Deserialize)]
pub struct CurrentPrice {
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub decimals: Option<u32>,
    /// Amount in base units, sent as a decimal string.
    #[serde(deserialize_with = "deserialize_string_from_number")]
    pub value: String,
}
