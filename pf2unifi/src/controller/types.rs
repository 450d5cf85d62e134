use serde::Deserialize;

/// Standard `{ "meta": ..., "data": [...] }` response wrapper.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// Entry from `self/sites`.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteSummary {
    pub name: String,
}

/// Entry from `rest/networkconf`.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConf {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// First network whose name equals `lan_name` case-insensitively.
pub fn find_network<'a>(networks: &'a [NetworkConf], lan_name: &str) -> Option<&'a NetworkConf> {
    let wanted = lan_name.trim().to_lowercase();
    networks.iter().find(|net| {
        net.name
            .as_deref()
            .is_some_and(|name| name.to_lowercase() == wanted)
    })
}

#[cfg(test)]
mod tests {
    use super::{find_network, ApiEnvelope, NetworkConf, SiteSummary};

    #[test]
    fn network_lookup_ignores_case_on_both_sides() {
        let envelope: ApiEnvelope<NetworkConf> = serde_json::from_str(
            r#"{"meta":{"rc":"ok"},"data":[
                {"_id":"wan1","name":"Internet 1","purpose":"wan"},
                {"_id":"abc123","name":"Default","purpose":"corporate"},
                {"_id":"noname"}
            ]}"#,
        )
        .expect("decode");

        let found = find_network(&envelope.data, "DEFAULT").expect("match");
        assert_eq!(found.id, "abc123");
        assert!(find_network(&envelope.data, "iot").is_none());
    }

    #[test]
    fn missing_data_decodes_as_empty() {
        let envelope: ApiEnvelope<SiteSummary> =
            serde_json::from_str(r#"{"meta":{"rc":"error"}}"#).expect("decode");
        assert!(envelope.data.is_empty());
    }
}
