//! Structured business metadata extraction from JSON-LD.

use radar_core::{AggregateRating, BusinessIntelligence};
use serde_json::Value;

use crate::error::ProviderError;
use crate::html::{clean_text, json_ld_blocks};

const MAX_PRODUCTS: usize = 10;

const ORGANIZATION_TYPES: [&str; 12] = [
    "organization",
    "corporation",
    "localbusiness",
    "onlinebusiness",
    "onlinestore",
    "store",
    "professionalservice",
    "softwarecompany",
    "ngo",
    "educationalorganization",
    "medicalorganization",
    "restaurant",
];

/// Extracts organization metadata from the page's JSON-LD blocks.
///
/// The richest organization-like node wins (most populated fields). Product
/// nodes anywhere in the document contribute to the product list.
///
/// # Errors
///
/// Returns [`ProviderError::NoData`] when no JSON-LD block contains an
/// organization-like node.
pub fn analyze_business(html: &str) -> Result<BusinessIntelligence, ProviderError> {
    let mut organizations: Vec<&Value> = Vec::new();
    let mut products: Vec<String> = Vec::new();

    let parsed: Vec<Value> = json_ld_blocks(html)
        .iter()
        .filter_map(|raw| serde_json::from_str::<Value>(raw).ok())
        .collect();

    for value in &parsed {
        collect_nodes(value, &mut organizations, &mut products);
    }

    let Some(org) = organizations.into_iter().max_by_key(|node| richness(node)) else {
        return Err(ProviderError::NoData(
            "no organization structured data found".to_string(),
        ));
    };

    for offer in org.get("makesOffer").map(as_list).unwrap_or_default() {
        let name = offer
            .get("itemOffered")
            .and_then(|item| item.get("name"))
            .or_else(|| offer.get("name"))
            .and_then(Value::as_str);
        if let Some(name) = name {
            push_unique(&mut products, clean_text(name));
        }
    }
    products.truncate(MAX_PRODUCTS);

    Ok(BusinessIntelligence {
        name: text_field(org, "name").or_else(|| text_field(org, "legalName")),
        organization_type: node_types(org)
            .into_iter()
            .next()
            .unwrap_or_else(|| "Organization".to_string()),
        founding_date: text_field(org, "foundingDate"),
        employee_range: employee_count(org).map(employee_bucket),
        price_range: text_field(org, "priceRange"),
        rating: aggregate_rating(org),
        products,
        social_profiles: org
            .get("sameAs")
            .map(as_list)
            .unwrap_or_default()
            .into_iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        contact_channels: contact_channels(org),
    })
}

/// Returns whether any JSON-LD block on the page parses as JSON.
#[must_use]
pub fn has_structured_data(html: &str) -> bool {
    json_ld_blocks(html)
        .iter()
        .any(|raw| serde_json::from_str::<Value>(raw).is_ok())
}

fn collect_nodes<'a>(value: &'a Value, orgs: &mut Vec<&'a Value>, products: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            let types = node_types(value);
            if types.iter().any(|t| is_organization_type(t)) {
                orgs.push(value);
            }
            if types.iter().any(|t| t.eq_ignore_ascii_case("product")) {
                if let Some(name) = map.get("name").and_then(Value::as_str) {
                    push_unique(products, clean_text(name));
                }
            }
            for child in map.values() {
                collect_nodes(child, orgs, products);
            }
        }
        Value::Array(items) => {
            for child in items {
                collect_nodes(child, orgs, products);
            }
        }
        _ => {}
    }
}

fn node_types(node: &Value) -> Vec<String> {
    match node.get("@type") {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn is_organization_type(node_type: &str) -> bool {
    let lower = node_type.to_lowercase();
    ORGANIZATION_TYPES.contains(&lower.as_str())
}

fn richness(node: &Value) -> usize {
    node.as_object().map_or(0, serde_json::Map::len)
}

fn as_list(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

fn text_field(node: &Value, key: &str) -> Option<String> {
    let text = match node.get(key)? {
        Value::String(s) => clean_text(s),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn number_field(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }
}

fn employee_count(org: &Value) -> Option<u64> {
    let raw = org.get("numberOfEmployees")?;
    let count = match raw {
        Value::Object(_) => raw
            .get("value")
            .or_else(|| raw.get("maxValue"))
            .or_else(|| raw.get("minValue"))
            .and_then(number_field)?,
        other => number_field(other)?,
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = count.max(0.0) as u64;
    Some(count)
}

fn employee_bucket(count: u64) -> String {
    match count {
        0..=10 => "1-10",
        11..=50 => "11-50",
        51..=200 => "51-200",
        201..=1000 => "201-1000",
        _ => "1000+",
    }
    .to_string()
}

fn aggregate_rating(org: &Value) -> Option<AggregateRating> {
    let rating = org.get("aggregateRating")?;
    let value = rating.get("ratingValue").and_then(number_field)?;
    let count = rating
        .get("reviewCount")
        .or_else(|| rating.get("ratingCount"))
        .and_then(number_field);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = count.map(|c| c.max(0.0) as u64);
    Some(AggregateRating { value, count })
}

fn contact_channels(org: &Value) -> Vec<String> {
    let mut channels = Vec::new();
    if let Some(phone) = text_field(org, "telephone") {
        push_unique(&mut channels, format!("phone:{phone}"));
    }
    if let Some(email) = text_field(org, "email") {
        push_unique(&mut channels, format!("email:{}", email.trim_start_matches("mailto:")));
    }
    for point in org.get("contactPoint").map(as_list).unwrap_or_default() {
        if let Some(phone) = text_field(point, "telephone") {
            push_unique(&mut channels, format!("phone:{phone}"));
        }
        if let Some(email) = text_field(point, "email") {
            push_unique(&mut channels, format!("email:{}", email.trim_start_matches("mailto:")));
        }
        if let Some(url) = text_field(point, "url") {
            push_unique(&mut channels, format!("web:{url}"));
        }
    }
    channels
}

fn push_unique(list: &mut Vec<String>, item: String) {
    if !item.is_empty() && !list.contains(&item) {
        list.push(item);
    }
}
