#[cfg(test)]
mod tests {
    #[test]
    fn test_search_tokenization() {
        use crate::commands::students::search_tokens;

        assert_eq!(search_tokens("WASIKE KEMBOI"), vec!["WASIKE", "KEMBOI"]);
        assert_eq!(search_tokens("  WASIKE   KEMBOI  "), vec!["WASIKE", "KEMBOI"]);
        assert_eq!(search_tokens("wasike"), vec!["wasike"]);
        assert!(search_tokens("   ").is_empty());
        assert!(search_tokens("").is_empty());
    }

    /// Balance is plain subtraction; overpayment reads as a negative balance
    /// and is never rejected.
    #[test]
    fn test_outstanding_balance() {
        use crate::commands::fees::outstanding_balance;

        assert_eq!(outstanding_balance(60000, 25000), 35000);
        assert_eq!(outstanding_balance(60000, 60000), 0);
        assert_eq!(outstanding_balance(60000, 75000), -15000);
        assert_eq!(outstanding_balance(0, 0), 0);
    }

    #[test]
    fn test_grade_bands() {
        use crate::commands::academics::grade_for_score;

        assert_eq!(grade_for_score(100), "A");
        assert_eq!(grade_for_score(70), "A");
        assert_eq!(grade_for_score(69), "B");
        assert_eq!(grade_for_score(60), "B");
        assert_eq!(grade_for_score(59), "C");
        assert_eq!(grade_for_score(50), "C");
        assert_eq!(grade_for_score(49), "D");
        assert_eq!(grade_for_score(40), "D");
        assert_eq!(grade_for_score(39), "E");
        assert_eq!(grade_for_score(0), "E");
    }

    #[test]
    fn test_attendance_percentage() {
        use crate::commands::academics::attendance_percentage;

        // Late still counts as attended.
        assert_eq!(attendance_percentage(8, 1, 10), 90.0);
        assert_eq!(attendance_percentage(0, 0, 10), 0.0);
        assert_eq!(attendance_percentage(10, 0, 10), 100.0);
        // 2 of 3 attended -> 66.7 after one-decimal rounding.
        assert_eq!(attendance_percentage(2, 0, 3), 66.7);
        // No sessions held yet must not divide by zero.
        assert_eq!(attendance_percentage(0, 0, 0), 0.0);
    }

    #[test]
    fn test_procurement_transitions() {
        use crate::commands::procurement::transition_allowed;

        assert!(transition_allowed("PENDING", "APPROVED"));
        assert!(transition_allowed("PENDING", "REJECTED"));
        assert!(transition_allowed("APPROVED", "IN_PROGRESS"));
        assert!(transition_allowed("IN_PROGRESS", "COMPLETED"));

        assert!(!transition_allowed("PENDING", "IN_PROGRESS"));
        assert!(!transition_allowed("PENDING", "COMPLETED"));
        assert!(!transition_allowed("REJECTED", "APPROVED"));
        assert!(!transition_allowed("APPROVED", "COMPLETED"));
        assert!(!transition_allowed("COMPLETED", "IN_PROGRESS"));
        assert!(!transition_allowed("APPROVED", "PENDING"));
    }

    #[test]
    fn test_request_number_format() {
        use crate::commands::procurement::format_request_number;

        assert_eq!(format_request_number(2025, 1), "PR/2025/1");
        assert_eq!(format_request_number(2025, 42), "PR/2025/42");
    }

    #[test]
    fn test_date_parsing() {
        use crate::commands::utils::parse_date_safe;
        use chrono::NaiveDate;

        assert_eq!(
            parse_date_safe("2025-09-01"),
            Some(NaiveDate::from_ymd_opt(2025, 9, 1).unwrap())
        );
        assert_eq!(
            parse_date_safe("20250901"),
            Some(NaiveDate::from_ymd_opt(2025, 9, 1).unwrap())
        );
        assert_eq!(parse_date_safe("invalid"), None);
        assert_eq!(parse_date_safe(""), None);
    }

    /// An expired token must not decode; a fresh one round-trips its claims.
    #[test]
    fn test_token_expiry() {
        use crate::middleware::auth::{decode_token, get_jwt_secret, Claims};
        use jsonwebtoken::{encode, EncodingKey, Header};

        let expired = Claims {
            sub: 1,
            email: "staff@elimu.ac.ke".to_string(),
            role: "STAFF".to_string(),
            exp: (chrono::Utc::now() - chrono::Duration::hours(25)).timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &expired,
            &EncodingKey::from_secret(&get_jwt_secret()),
        )
        .unwrap();
        assert!(decode_token(&token).is_none());

        let fresh = Claims {
            exp: (chrono::Utc::now() + chrono::Duration::hours(24)).timestamp() as usize,
            ..expired
        };
        let token = encode(
            &Header::default(),
            &fresh,
            &EncodingKey::from_secret(&get_jwt_secret()),
        )
        .unwrap();
        let decoded = decode_token(&token).expect("fresh token should decode");
        assert_eq!(decoded.sub, 1);
        assert_eq!(decoded.role, "STAFF");
    }
}
