use crate::types::parse_positive_id;

pub fn check_snowflake(value: &str) -> Result<u64, String> {
    parse_positive_id(value, "id").map_err(|e| e.to_string())
}
