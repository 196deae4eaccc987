use serde::Serialize;

/// Postback tag for event buttons
pub const MOTIONEYE_TAG: &str = "motioneye";

/// Decoded `<tag>_<value>_<value>...` postback
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Postback {
    pub tag: String,
    pub values: Vec<String>,
}

pub fn build_postback<T: ToString>(tag: &str, values: &[T]) -> String {
    std::iter::once(tag.to_string())
        .chain(values.iter().map(ToString::to_string))
        .collect::<Vec<_>>()
        .join("_")
}

pub fn parse_postback(postback: &str) -> Postback {
    let mut parts = postback.split('_').map(str::to_string);
    Postback {
        tag: parts.next().unwrap_or_default(),
        values: parts.collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_button_round_trip() {
        let postback = build_postback(MOTIONEYE_TAG, &[42]);
        assert_eq!(postback, "motioneye_42");
        assert_eq!(
            parse_postback(&postback),
            Postback {
                tag: "motioneye".to_string(),
                values: vec!["42".to_string()],
            }
        );
    }

    #[test]
    fn tag_only() {
        assert_eq!(build_postback::<i64>("ping", &[]), "ping");
        let parsed = parse_postback("ping");
        assert_eq!(parsed.tag, "ping");
        assert!(parsed.values.is_empty());
    }

    #[test]
    fn negative_numbers_survive() {
        assert_eq!(parse_postback(&build_postback(MOTIONEYE_TAG, &[-1])).values, ["-1"]);
    }
}
