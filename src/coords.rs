//! Degree + minutes/cardinal token decoding

/// Rounds to the table's own precision (3 decimal places).
pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Decodes a (degrees, minutes+cardinal) token pair into signed decimal
/// degrees, e.g. `("41", "29.2N")` into `41.487`.
/// The minutes token must end with one of N/E/S/W; southern and western
/// values come out negative. Returns None whenever either token fails to
/// parse: upstream placeholder tokens are expected here and must degrade
/// to an absent field, not abort the row.
pub(crate) fn decode_latlon(deg: &str, min_card: &str) -> Option<f64> {
    let degrees = deg.parse::<f64>().ok()?;
    let minutes = min_card
        .trim_end_matches(['N', 'E', 'S', 'W'])
        .parse::<f64>()
        .ok()?;
    let mut value = degrees + minutes / 60.0;
    if min_card.ends_with('S') || min_card.ends_with('W') {
        value = -value;
    }
    Some(round3(value))
}

#[cfg(test)]
mod test {
    use super::{decode_latlon, round3};
    use rstest::rstest;

    #[rstest]
    #[case("41", "29.2N", Some(41.487))]
    #[case("162", "51.0W", Some(-162.85))]
    #[case("039", "59.7N", Some(39.995))]
    #[case("171", "44.9W", Some(-171.748))]
    #[case("13", "28.6S", Some(-13.477))]
    #[case("036", "48.6E", Some(36.81))]
    #[case("?", "?", None)]
    #[case("41", "?", None)]
    #[case("?", "29.2N", None)]
    #[case("-", "29.2N", None)]
    fn latlon_decoding(#[case] deg: &str, #[case] min_card: &str, #[case] expected: Option<f64>) {
        assert_eq!(
            decode_latlon(deg, min_card),
            expected,
            "wrong decoding for (\"{}\", \"{}\")",
            deg,
            min_card
        );
    }

    #[test]
    fn cardinal_sign() {
        for card in ["N", "E"] {
            let value = decode_latlon("10", &format!("30.0{}", card)).unwrap();
            assert!(value > 0.0, "{} must not negate", card);
        }
        for card in ["S", "W"] {
            let value = decode_latlon("10", &format!("30.0{}", card)).unwrap();
            assert!(value < 0.0, "{} must negate", card);
        }
    }

    #[test]
    fn rounding() {
        assert_eq!(round3(41.486666666), 41.487);
        assert_eq!(round3(-162.8500001), -162.85);
        assert_eq!(round3(0.0), 0.0);
    }
}
