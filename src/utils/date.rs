pub const DATE_FMT: &str = "%Y-%m-%dT%H:%M:%S%.f";

pub mod serializer {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde::de::Error;
    use crate::utils::date::DATE_FMT;

    pub fn serialize<S: Serializer>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        time_to_json(*time).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let str_time: String = Deserialize::deserialize(deserializer)?;
        let time = NaiveDateTime::parse_from_str(&str_time, DATE_FMT).map_err(D::Error::custom)?;
        Ok(time)
    }

    fn time_to_json(t: NaiveDateTime) -> String {
        format!("{}", t.format(DATE_FMT))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Serialize};
    use crate::utils::date::{DATE_FMT, serializer};

    #[derive(Serialize, Deserialize)]
    struct Stamp {
        #[serde(with = "serializer")]
        at: NaiveDateTime,
    }

    #[tokio::test]
    async fn test_should_parse_date_format() {
        let date = NaiveDateTime::parse_from_str("2024-02-26T03:03:28.000", DATE_FMT);
        assert!(date.is_ok());
    }

    #[tokio::test]
    async fn test_should_round_trip_timestamp() {
        let stamp = Stamp { at: chrono::Utc::now().naive_utc() };
        let json = serde_json::to_string(&stamp).expect("should serialize");
        let parsed: Stamp = serde_json::from_str(json.as_str()).expect("should deserialize");
        assert_eq!(stamp.at, parsed.at);
    }
}
