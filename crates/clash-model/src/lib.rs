pub mod convention;
pub mod dates;
pub mod error;
pub mod record;

pub use convention::{
    HierarchyOffsets, JoinKeyRule, ReportConvention, TokenLayout, load_conventions,
};
pub use dates::{format_date, parse_clash_date, parse_tracking_date};
pub use error::{ModelError, Result};
pub use record::{
    CANONICAL_COLUMNS, ClashRecord, ClashTable, FOLLOW_UP_COLUMNS, FollowUp, RESOLVED_STATUS, Usage,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes() {
        let record = ClashRecord {
            clash_id: "CL001".to_string(),
            view_name: "CL001_L01_20230715_PIPE_Clash with duct".to_string(),
            image_name: Some("cl001.jpg".to_string()),
            date_found: chrono::NaiveDate::from_ymd_opt(2023, 7, 15),
            main_zone: Some("North".to_string()),
            sub_zone: None,
            level: Some("L01".to_string()),
            discipline: Some("PIPE".to_string()),
            description: Some("Clash with duct".to_string()),
            assign_to: None,
            issue_type: None,
            issue_status: None,
            unique_key: "CL001_L01".to_string(),
            follow_up: FollowUp::new(chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            extra: std::collections::BTreeMap::new(),
        };

        let json = serde_json::to_string(&record).expect("serialize record");
        let round: ClashRecord = serde_json::from_str(&json).expect("deserialize record");
        assert_eq!(round, record);
    }

    #[test]
    fn convention_serializes() {
        let conv = ReportConvention::purple_line();
        let json = serde_json::to_string(&conv).expect("serialize convention");
        let round: ReportConvention = serde_json::from_str(&json).expect("deserialize convention");
        assert_eq!(round, conv);
    }
}
