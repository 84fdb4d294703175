use anyhow::{Context, Result};
use log::{error, info};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::{CloudflareConfig, Credentials};
use super::{timestamp, DnsUpdateResult};

pub struct CloudflareClient {
    client: Client,
    api_base: String,
    api_token: String,
    zone_id: String,
    record_type: String,
    ttl: u32,
    proxied: bool,
}

impl CloudflareClient {
    pub fn new(client: Client, config: &CloudflareConfig, credentials: &Credentials) -> Self {
        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_token: credentials.api_token.clone(),
            zone_id: credentials.zone_id.clone(),
            record_type: config.record_type.clone(),
            ttl: config.ttl,
            proxied: config.proxied,
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.api_token))
            .header("Content-Type", "application/json")
    }

    /// IDs of every record in the zone whose name equals `hostname` exactly,
    /// in the order the API lists them. Any failure yields an empty list.
    pub async fn list_record_ids(&self, hostname: &str) -> Vec<String> {
        match self.fetch_records().await {
            Ok(records) => records
                .into_iter()
                .filter(|record| record.name == hostname)
                .map(|record| record.id)
                .collect(),
            Err(e) => {
                error!("Error fetching DNS records: {:#}", e);
                Vec::new()
            }
        }
    }

    async fn fetch_records(&self) -> Result<Vec<DnsRecord>> {
        let url = format!("{}/zones/{}/dns_records", self.api_base, self.zone_id);

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .context("Failed to send request to Cloudflare")?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Cloudflare returned {}: {}", status, body);
        }

        let list: CloudflareListResponse = response
            .json()
            .await
            .context("Failed to parse Cloudflare response")?;

        Ok(list.result)
    }

    /// Points one record at `ip`. Never fails: the outcome, good or bad, is
    /// carried in the returned message.
    pub async fn update_record(&self, record_id: &str, hostname: &str, ip: &str) -> DnsUpdateResult {
        let url = format!(
            "{}/zones/{}/dns_records/{}",
            self.api_base, self.zone_id, record_id
        );

        let body = UpdateRecordRequest {
            record_type: self.record_type.clone(),
            name: hostname.to_string(),
            content: ip.to_string(),
            ttl: self.ttl,
            proxied: self.proxied,
        };

        let response = match self.authorized(self.client.put(&url)).json(&body).send().await {
            Ok(response) => response,
            Err(e) => {
                error!("cf_dns_change ERROR: ---- Time: {} ---- Error: {}", timestamp(), e);
                return DnsUpdateResult {
                    success: false,
                    message: format!("ip: {} 解析 {} 失败 (状态码: 请求异常)", ip, hostname),
                    record_id: record_id.to_string(),
                };
            }
        };

        let status = response.status();
        if status == StatusCode::OK {
            info!("cf_dns_change success: ---- Time: {} ---- ip: {}", timestamp(), ip);
            DnsUpdateResult {
                success: true,
                message: format!("ip: {} 解析 {} 成功", ip, hostname),
                record_id: record_id.to_string(),
            }
        } else {
            let text = response.text().await.unwrap_or_default();
            error!("cf_dns_change ERROR: ---- Time: {} ---- Response: {}", timestamp(), text);
            DnsUpdateResult {
                success: false,
                message: format!(
                    "ip: {} 解析 {} 失败 (状态码: {})",
                    ip,
                    hostname,
                    status.as_u16()
                ),
                record_id: record_id.to_string(),
            }
        }
    }
}

// Cloudflare API types

#[derive(Debug, Serialize)]
struct UpdateRecordRequest {
    #[serde(rename = "type")]
    record_type: String,
    name: String,
    content: String,
    ttl: u32,
    proxied: bool,
}

#[derive(Debug, Deserialize)]
struct CloudflareListResponse {
    #[serde(default)]
    result: Vec<DnsRecord>,
}

#[derive(Debug, Deserialize)]
struct DnsRecord {
    id: String,
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> CloudflareClient {
        client_at(server.uri())
    }

    fn client_at(api_base: String) -> CloudflareClient {
        let config = CloudflareConfig {
            api_base,
            ..CloudflareConfig::default()
        };
        let credentials = Credentials {
            api_token: "cf-token".to_string(),
            zone_id: "zone123".to_string(),
            dns_name: "cf.example.com".to_string(),
            pushplus_token: "push".to_string(),
        };
        CloudflareClient::new(Client::new(), &config, &credentials)
    }

    #[tokio::test]
    async fn test_list_filters_exact_name_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zones/zone123/dns_records"))
            .and(header("Authorization", "Bearer cf-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "result": [
                    {"id": "r3", "name": "cf.example.com", "type": "A", "content": "1.1.1.1"},
                    {"id": "r1", "name": "www.example.com", "type": "A", "content": "1.1.1.1"},
                    {"id": "r2", "name": "CF.example.com", "type": "A", "content": "1.1.1.1"},
                    {"id": "r9", "name": "a.cf.example.com", "type": "A", "content": "1.1.1.1"},
                    {"id": "r0", "name": "cf.example.com", "type": "A", "content": "1.1.1.1"}
                ]
            })))
            .mount(&server)
            .await;

        let ids = client_for(&server).list_record_ids("cf.example.com").await;
        assert_eq!(ids, vec!["r3", "r0"]);
    }

    #[tokio::test]
    async fn test_list_error_status_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zones/zone123/dns_records"))
            .respond_with(ResponseTemplate::new(403).set_body_string("{\"success\":false}"))
            .expect(1)
            .mount(&server)
            .await;

        let ids = client_for(&server).list_record_ids("cf.example.com").await;
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_update_sends_a_record_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/zones/zone123/dns_records/r1"))
            .and(header("Authorization", "Bearer cf-token"))
            .and(body_json(json!({
                "type": "A",
                "name": "cf.example.com",
                "content": "104.16.1.1",
                "ttl": 1,
                "proxied": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server)
            .update_record("r1", "cf.example.com", "104.16.1.1")
            .await;
        assert!(result.success);
        assert_eq!(result.message, "ip: 104.16.1.1 解析 cf.example.com 成功");
        assert_eq!(result.record_id, "r1");
    }

    #[tokio::test]
    async fn test_update_failure_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/zones/zone123/dns_records/r1"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let result = client_for(&server)
            .update_record("r1", "cf.example.com", "104.16.1.1")
            .await;
        assert!(!result.success);
        assert_eq!(result.message, "ip: 104.16.1.1 解析 cf.example.com 失败 (状态码: 403)");
    }

    #[tokio::test]
    async fn test_list_undecodable_body_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zones/zone123/dns_records"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .expect(1)
            .mount(&server)
            .await;

        let ids = client_for(&server).list_record_ids("cf.example.com").await;
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_list_unreachable_api_is_empty() {
        // Nothing listens on port 9 on loopback.
        let ids = client_at("http://127.0.0.1:9".to_string())
            .list_record_ids("cf.example.com")
            .await;
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_update_unreachable_api_reports_request_error() {
        let result = client_at("http://127.0.0.1:9".to_string())
            .update_record("r1", "cf.example.com", "104.16.1.1")
            .await;
        assert!(!result.success);
        assert_eq!(result.record_id, "r1");
        assert_eq!(result.message, "ip: 104.16.1.1 解析 cf.example.com 失败 (状态码: 请求异常)");
    }
}
