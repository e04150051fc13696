//! Key Codec Tests
//!
//! ## Test Scopes
//! - **Generation**: canonical ordering, defaults, and rejection of invalid values.
//! - **Parsing**: strict grammar checks and round-trips through `generate`.

#[cfg(test)]
mod tests {
    use crate::keys::{CacheKey, generate, is_valid_file_name, parse};
    use std::collections::HashMap;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, Vec<String>> {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in pairs {
            map.entry(name.to_string())
                .or_default()
                .push(value.to_string());
        }
        map
    }

    // ============================================================
    // GENERATION
    // ============================================================

    #[test]
    fn test_generate_empty_param_map() {
        let key = generate("test.jpg", &HashMap::new());
        assert_eq!(key.as_str(), "test.jpg?width=0&height=0&dpi=0");
    }

    #[test]
    fn test_generate_full_param_map() {
        let key = generate(
            "test.jpg",
            &params(&[("width", "300"), ("height", "450"), ("dpi", "96")]),
        );
        assert_eq!(key.as_str(), "test.jpg?width=300&height=450&dpi=96");
    }

    #[test]
    fn test_generate_negative_value_falls_back_to_default() {
        let key = generate(
            "test.jpg",
            &params(&[("width", "-10"), ("height", "450"), ("dpi", "96")]),
        );
        assert_eq!(key.as_str(), "test.jpg?width=0&height=450&dpi=96");
    }

    #[test]
    fn test_generate_non_numeric_value_falls_back_to_default() {
        let key = generate(
            "test.jpg",
            &params(&[("width", "foo-bar"), ("height", "450"), ("dpi", "96")]),
        );
        assert_eq!(key.as_str(), "test.jpg?width=0&height=450&dpi=96");
    }

    #[test]
    fn test_generate_partial_param_map() {
        let key = generate("test.jpg", &params(&[("width", "300"), ("dpi", "96")]));
        assert_eq!(key.as_str(), "test.jpg?width=300&height=0&dpi=96");

        let key = generate("test.jpg", &params(&[("height", "0"), ("width", "300")]));
        assert_eq!(key.as_str(), "test.jpg?width=300&height=0&dpi=0");
    }

    #[test]
    fn test_generate_ignores_insertion_order() {
        let orders: [&[(&str, &str)]; 3] = [
            &[("width", "300"), ("height", "450"), ("dpi", "96")],
            &[("dpi", "96"), ("width", "300"), ("height", "450")],
            &[("height", "450"), ("dpi", "96"), ("width", "300")],
        ];

        let keys: Vec<CacheKey> = orders
            .iter()
            .map(|pairs| generate("a.png", &params(pairs)))
            .collect();

        assert!(keys.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_generate_ignores_unknown_params() {
        let plain = generate("a.png", &params(&[("width", "10")]));
        let noisy = generate(
            "a.png",
            &params(&[("width", "10"), ("action", "blur"), ("quality", "80")]),
        );
        assert_eq!(plain, noisy);
    }

    #[test]
    fn test_generate_uses_first_value_only() {
        let key = generate("a.png", &params(&[("width", "10"), ("width", "20")]));
        assert_eq!(key.as_str(), "a.png?width=10&height=0&dpi=0");
    }

    #[test]
    fn test_generate_normalizes_equivalent_integers() {
        let padded = generate("a.png", &params(&[("width", "007")]));
        let signed = generate("a.png", &params(&[("width", "+7")]));
        let plain = generate("a.png", &params(&[("width", "7")]));
        assert_eq!(padded, plain);
        assert_eq!(signed, plain);
    }

    #[test]
    fn test_generate_overflowing_value_falls_back_to_default() {
        let key = generate("a.png", &params(&[("height", "99999999999999999999")]));
        assert_eq!(key.as_str(), "a.png?width=0&height=0&dpi=0");
    }

    #[test]
    fn test_generate_keeps_values_past_32_bits() {
        let key = generate("a.png", &params(&[("width", "4294967296"), ("dpi", "5000000000")]));
        assert_eq!(key.as_str(), "a.png?width=4294967296&height=0&dpi=5000000000");

        let parsed = parse(key.as_str()).unwrap();
        assert_eq!(parsed.param("width"), Some("4294967296"));
        assert_eq!(parsed.dimension("width"), u32::MAX);
    }

    #[test]
    fn test_generate_accepts_largest_signed_64_bit_value() {
        let key = generate("a.png", &params(&[("height", "9223372036854775807")]));
        assert_eq!(key.as_str(), "a.png?width=0&height=9223372036854775807&dpi=0");

        let key = generate("a.png", &params(&[("height", "9223372036854775808")]));
        assert_eq!(key.as_str(), "a.png?width=0&height=0&dpi=0");
    }

    // ============================================================
    // PARSING
    // ============================================================

    #[test]
    fn test_parse_key() {
        let parsed = parse("foo.jpg?width=300&height=400&dpi=0").unwrap();

        assert_eq!(parsed.file_name, "foo.jpg");
        assert_eq!(parsed.params.len(), 3);
        assert_eq!(parsed.param("width"), Some("300"));
        assert_eq!(parsed.param("height"), Some("400"));
        assert_eq!(parsed.param("dpi"), Some("0"));
        assert_eq!(parsed.dimension("width"), 300);
        assert_eq!(parsed.dimension("unknown"), 0);
    }

    #[test]
    fn test_parse_round_trip() {
        let inputs = [
            ("test.jpg", params(&[])),
            ("cat.png", params(&[("width", "640"), ("height", "-1")])),
            ("photo_01.gif", params(&[("dpi", "300"), ("junk", "x")])),
        ];

        for (file_name, raw) in inputs {
            let key = generate(file_name, &raw);
            let parsed = parse(key.as_str()).expect("generated key must parse");
            assert_eq!(parsed.file_name, file_name);

            let normalized: HashMap<String, Vec<String>> = parsed
                .params
                .iter()
                .map(|(name, value)| (name.to_string(), vec![value.clone()]))
                .collect();
            let regenerated = generate(&parsed.file_name, &normalized);
            assert_eq!(regenerated, key);
        }
    }

    #[test]
    fn test_parse_rejects_wrong_order() {
        assert!(parse("foo.jpg?height=400&width=300&dpi=0").is_err());
    }

    #[test]
    fn test_parse_rejects_missing_param() {
        assert!(parse("foo.jpg?width=300&height=400").is_err());
        assert!(parse("foo.jpg?").is_err());
        assert!(parse("foo.jpg").is_err());
    }

    #[test]
    fn test_parse_rejects_extra_param() {
        assert!(parse("foo.jpg?width=300&height=400&dpi=0&q=1").is_err());
        assert!(parse("foo.jpg?width=300&height=400&dpi=0&").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        assert!(parse("foo.jpg?width=&height=400&dpi=0").is_err());
        assert!(parse("foo.jpg?width=-1&height=400&dpi=0").is_err());
        assert!(parse("foo.jpg?width=007&height=400&dpi=0").is_err());
        assert!(parse("foo.jpg?width=abc&height=400&dpi=0").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_file_names() {
        assert!(parse("?width=0&height=0&dpi=0").is_err());
        assert!(parse("dir/foo.jpg?width=0&height=0&dpi=0").is_err());
        assert!(parse("foo bar.jpg?width=0&height=0&dpi=0").is_err());
    }

    #[test]
    fn test_cache_key_from_str_validates() {
        let key: CacheKey = "a.png?width=1&height=2&dpi=3".parse().unwrap();
        assert_eq!(key.to_string(), "a.png?width=1&height=2&dpi=3");

        assert!("a.png?width=1".parse::<CacheKey>().is_err());
    }

    #[test]
    fn test_file_name_validation() {
        assert!(is_valid_file_name("photo.jpg"));
        assert!(!is_valid_file_name(""));
        assert!(!is_valid_file_name("a?b"));
        assert!(!is_valid_file_name("a#b"));
        assert!(!is_valid_file_name("a&b"));
        assert!(!is_valid_file_name("a\tb"));
    }
}
