use chrono::NaiveDate;

pub fn parse_date_safe(date_str: &str) -> Option<NaiveDate> {
    if date_str.trim().is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_str, "%Y%m%d"))
        .ok()
}
