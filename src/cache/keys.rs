/// Prefix shared by every cached company query.
pub const COMPANY_PREFIX: &str = "companies:";

/// Prefix shared by every cached device query.
pub const DEVICE_PREFIX: &str = "devices:";

const RATE_LIMIT_PREFIX: &str = "rate_limit:";

pub fn company_all_key() -> String {
    format!("{}all", COMPANY_PREFIX)
}

pub fn company_paginated_key(page_number: u32, page_size: u32) -> String {
    format!("{}paginated:{}:{}", COMPANY_PREFIX, page_number, page_size)
}

pub fn company_search_key(page_number: u32, page_size: u32, name: Option<&str>) -> String {
    format!(
        "{}search:{}:{}:{}",
        COMPANY_PREFIX,
        page_number,
        page_size,
        normalize(name)
    )
}

pub fn device_search_key(
    page_number: u32,
    page_size: u32,
    name: Option<&str>,
    device_id: Option<i32>,
    device_ip: Option<&str>,
) -> String {
    format!(
        "{}search:{}:{}:{}:{}:{}",
        DEVICE_PREFIX,
        page_number,
        page_size,
        normalize(name),
        device_id.map(|id| id.to_string()).unwrap_or_default(),
        normalize(device_ip)
    )
}

/// Key holding one client's consumption of one rate-limited route.
pub fn consumption_key(policy_id: &str, client: &str) -> String {
    format!("{}{}:{}", RATE_LIMIT_PREFIX, policy_id, client)
}

// searches are case-insensitive, so equivalent filters share a key
fn normalize(value: Option<&str>) -> String {
    value
        .map(|v| v.trim().to_lowercase())
        .unwrap_or_default()
}
